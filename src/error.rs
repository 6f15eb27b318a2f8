//! Error types
//!
//! Everything here is handled locally by the engine: construction errors are
//! logged and the offending box discarded, configuration errors are returned
//! to whoever loads settings.

use thiserror::Error;

use crate::sim::BoxId;

/// A freshly instantiated object lacks part of the capability surface the
/// engine needs (bounds for layout, a body for physics commands).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("box {0:?} has no visual bounds")]
    MissingBounds(BoxId),
    #[error("box {0:?} has no physics body")]
    MissingBody(BoxId),
    #[error("box {id:?} reported invalid bounds {width}x{height}")]
    InvalidBounds { id: BoxId, width: f32, height: f32 },
}

/// Settings could not be loaded or failed validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
