//! Box Tower - spawn, settle, sort and stack boxes
//!
//! Core modules:
//! - `sim`: Deterministic engine (settle detection, column sort, transitions, lifecycle)
//! - `settings`: Tunable configuration with JSON load/save
//! - `error`: Construction and configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, ConstructionError};
pub use settings::{Playfield, Settings};

/// Engine configuration defaults
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Number of boxes spawned at startup
    pub const BOX_COUNT: usize = 10;
    /// Still ticks required before a sort pass may run
    pub const STILL_FRAME_THRESHOLD: u32 = 5;

    /// Box size range (world units)
    pub const MIN_BOX_SIZE: f32 = 2.0;
    pub const MAX_BOX_SIZE: f32 = 8.0;

    /// Border scale applied to the unit border sprite
    pub const BORDER_THICKNESS: f32 = 10.0;
    /// Width of the unscaled border sprite (world units)
    pub const BORDER_SPRITE_WIDTH: f32 = 0.1;

    /// Seconds between two spawned boxes
    pub const SPAWN_INTERVAL: f32 = 0.2;
    /// Normalized transition progress per second
    pub const TRANSITION_SPEED: f32 = 1.0;
    /// Seconds between the freeze phase and the first collapse step
    pub const ARRANGE_DELAY: f32 = 0.5;

    /// Maximum horizontal force applied to each box on deletion
    pub const PUSH_FORCE: f32 = 400.0;
    /// Random draws below this push left, the rest push right
    pub const PUSH_SPLIT: f32 = 0.5;

    /// Gravity scale while frozen into columns (negative presses against the top border)
    pub const FREEZE_GRAVITY_SCALE: f32 = -1.0;

    /// Default RNG seed
    pub const DEFAULT_SEED: u64 = 0x5EED_B0C5;
}
