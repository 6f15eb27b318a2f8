//! Physics collaborator interface
//!
//! The engine never integrates motion itself. It reads position and velocity
//! from whatever stepped simulation sits behind this trait and commands body
//! parameters (type, constraints, gravity, impulses).

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::BoxId;

/// Rigid body mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Moved externally, still collidable
    Kinematic,
    /// Driven by gravity, forces and contacts
    Dynamic,
}

/// Motion constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Constraints {
    #[default]
    None,
    /// Horizontal position frozen, vertical motion free
    LockHorizontal,
}

/// Capability surface of a freshly instantiated object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectFacets {
    /// Width/height of the visual bounds, if the object renders
    pub bounds: Option<Vec2>,
    /// Whether the object carries a physics body
    pub body: bool,
}

impl ObjectFacets {
    /// An object with every facet present
    pub fn complete(bounds: Vec2) -> Self {
        Self {
            bounds: Some(bounds),
            body: true,
        }
    }
}

/// Stepped physics world the engine observes and commands
pub trait Physics {
    /// Instantiate a box of the given size and report which facets it has
    fn create_object(&mut self, id: BoxId, size: f32) -> ObjectFacets;
    /// Destroy the object (deleted or rejected)
    fn destroy_object(&mut self, id: BoxId);

    fn position(&self, id: BoxId) -> Vec3;
    fn set_position(&mut self, id: BoxId, position: Vec3);
    fn velocity(&self, id: BoxId) -> Vec2;
    /// Zero the object's euler angles
    fn reset_rotation(&mut self, id: BoxId);

    fn set_body_type(&mut self, id: BoxId, body_type: BodyType);
    fn set_constraints(&mut self, id: BoxId, constraints: Constraints);
    fn set_gravity_scale(&mut self, id: BoxId, scale: f32);
    fn set_simulated(&mut self, id: BoxId, simulated: bool);
    fn apply_force(&mut self, id: BoxId, force: Vec2);

    /// Enable or disable the upper barrier
    fn set_top_border_active(&mut self, active: bool);
}

/// Body parameters applied to a whole group at once
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySetup {
    pub gravity_scale: f32,
    pub constraints: Constraints,
    pub body_type: BodyType,
}

impl BodySetup {
    /// Full dynamic physics, normal gravity
    pub fn released() -> Self {
        Self {
            gravity_scale: 1.0,
            constraints: Constraints::None,
            body_type: BodyType::Dynamic,
        }
    }

    /// Vertical-only motion under the given gravity
    pub fn frozen(gravity_scale: f32) -> Self {
        Self {
            gravity_scale,
            constraints: Constraints::LockHorizontal,
            body_type: BodyType::Dynamic,
        }
    }
}

/// Apply a setup to every listed body (bodies are always re-enabled)
pub fn apply_setup<P: Physics + ?Sized>(physics: &mut P, ids: &[BoxId], setup: BodySetup) {
    for &id in ids {
        physics.set_gravity_scale(id, setup.gravity_scale);
        physics.set_constraints(id, setup.constraints);
        physics.set_simulated(id, true);
        physics.set_body_type(id, setup.body_type);
    }
}
