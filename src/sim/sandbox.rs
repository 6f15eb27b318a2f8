//! Reference physics collaborator
//!
//! A small stepped world good enough to drive the engine headless: gravity,
//! floor and side walls, an optional top border, horizontal locks, forces,
//! and crude vertical stacking between overlapping boxes. Bodies whose speed
//! drops below a rest threshold are snapped to a standstill so settle
//! detection can observe an exact zero velocity.

use glam::{Vec2, Vec3};
use slotmap::SecondaryMap;

use super::physics::{BodyType, Constraints, ObjectFacets, Physics};
use super::state::BoxId;
use crate::settings::Playfield;

/// Downward acceleration at gravity scale 1 (world units/s²)
pub const GRAVITY: f32 = 9.81;
/// Speeds below this are treated as rest
pub const REST_SPEED: f32 = 0.05;
/// Horizontal velocity kept per tick while touching a surface
pub const CONTACT_FRICTION: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec2,
    pub half: Vec2,
    /// Rotation around z (degrees)
    pub rotation: f32,
    pub body_type: BodyType,
    pub constraints: Constraints,
    pub gravity_scale: f32,
    pub simulated: bool,
    force: Vec2,
}

impl Body {
    fn mass(&self) -> f32 {
        (self.half.x * self.half.y * 4.0).max(1e-3)
    }

    fn is_driven(&self) -> bool {
        self.simulated && self.body_type == BodyType::Dynamic
    }
}

/// Deterministic stepped world
#[derive(Debug, Clone)]
pub struct Sandbox {
    pub playfield: Playfield,
    bodies: SecondaryMap<BoxId, Body>,
    /// Creation order, used for deterministic iteration
    order: Vec<BoxId>,
    top_border_active: bool,
    spawned: usize,
    /// When set, the next created object reports no bounds
    pub(crate) fail_next_bounds: bool,
}

impl Sandbox {
    pub fn new(playfield: Playfield) -> Self {
        Self {
            playfield,
            bodies: SecondaryMap::new(),
            order: Vec::new(),
            top_border_active: false,
            spawned: 0,
            fail_next_bounds: false,
        }
    }

    pub fn body(&self, id: BoxId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn top_border_active(&self) -> bool {
        self.top_border_active
    }

    /// Advance every driven body by `dt`
    pub fn step(&mut self, dt: f32) {
        let field = self.playfield;
        let top_active = self.top_border_active;

        for &id in &self.order {
            let Some(body) = self.bodies.get_mut(id) else {
                continue;
            };
            if !body.is_driven() {
                body.force = Vec2::ZERO;
                continue;
            }

            let mass = body.mass();
            body.velocity += body.force / mass * dt;
            body.force = Vec2::ZERO;
            body.velocity.y -= GRAVITY * body.gravity_scale * dt;
            if body.constraints == Constraints::LockHorizontal {
                body.velocity.x = 0.0;
            }

            body.position.x += body.velocity.x * dt;
            body.position.y += body.velocity.y * dt;

            let min_x = field.left_inner() + body.half.x;
            let max_x = field.right_inner() - body.half.x;
            if body.position.x < min_x || body.position.x > max_x {
                body.position.x = body.position.x.clamp(min_x.min(max_x), max_x.max(min_x));
                body.velocity.x = 0.0;
            }

            if body.position.y - body.half.y < field.bottom() {
                body.position.y = field.bottom() + body.half.y;
                body.velocity.y = 0.0;
                body.velocity.x *= CONTACT_FRICTION;
            }
            if top_active && body.position.y + body.half.y > field.top() {
                body.position.y = field.top() - body.half.y;
                body.velocity.y = 0.0;
                body.velocity.x *= CONTACT_FRICTION;
            }
        }

        self.resolve_stacking();

        for body in self.bodies.values_mut() {
            if body.velocity.length() < REST_SPEED {
                body.velocity = Vec2::ZERO;
            }
        }
    }

    /// Rest driven boxes on whatever they overlap in the direction they fall
    fn resolve_stacking(&mut self) {
        let mut falling: Vec<BoxId> = Vec::new();
        let mut rising: Vec<BoxId> = Vec::new();
        for &id in &self.order {
            if let Some(body) = self.bodies.get(id).filter(|b| b.is_driven()) {
                if body.gravity_scale >= 0.0 {
                    falling.push(id);
                } else {
                    rising.push(id);
                }
            }
        }

        let y_of = |bodies: &SecondaryMap<BoxId, Body>, id: BoxId| {
            bodies.get(id).map(|b| b.position.y).unwrap_or(0.0)
        };
        falling.sort_by(|a, b| y_of(&self.bodies, *a).total_cmp(&y_of(&self.bodies, *b)));
        rising.sort_by(|a, b| y_of(&self.bodies, *b).total_cmp(&y_of(&self.bodies, *a)));

        for (group, down) in [(falling, true), (rising, false)] {
            for (i, &id) in group.iter().enumerate() {
                let Some(mut body) = self.bodies.get(id).cloned() else {
                    continue;
                };
                for &other_id in &group[..i] {
                    let Some(other) = self.bodies.get(other_id) else {
                        continue;
                    };
                    let overlap_x = (body.position.x - other.position.x).abs()
                        < body.half.x + other.half.x - 1e-4;
                    let overlap_y = (body.position.y - other.position.y).abs()
                        < body.half.y + other.half.y;
                    if !(overlap_x && overlap_y) {
                        continue;
                    }
                    if down {
                        body.position.y = other.position.y + other.half.y + body.half.y;
                        body.velocity.y = body.velocity.y.max(0.0);
                    } else {
                        body.position.y = other.position.y - other.half.y - body.half.y;
                        body.velocity.y = body.velocity.y.min(0.0);
                    }
                    body.velocity.x *= CONTACT_FRICTION;
                }
                if let Some(slot) = self.bodies.get_mut(id) {
                    *slot = body;
                }
            }
        }
    }
}

impl Physics for Sandbox {
    fn create_object(&mut self, id: BoxId, size: f32) -> ObjectFacets {
        // Spread spawn points over five lanes so the pile does not stack on one spot
        let lane = (self.spawned % 5) as f32 - 2.0;
        self.spawned += 1;
        let half = Vec2::splat(size / 2.0);
        let body = Body {
            position: Vec3::new(lane * self.playfield.width / 8.0, self.playfield.top() - half.y, 0.0),
            velocity: Vec2::ZERO,
            half,
            rotation: 0.0,
            body_type: BodyType::Dynamic,
            constraints: Constraints::None,
            gravity_scale: 1.0,
            simulated: true,
            force: Vec2::ZERO,
        };
        self.bodies.insert(id, body);
        self.order.push(id);

        if std::mem::take(&mut self.fail_next_bounds) {
            ObjectFacets {
                bounds: None,
                body: true,
            }
        } else {
            ObjectFacets::complete(Vec2::splat(size))
        }
    }

    fn destroy_object(&mut self, id: BoxId) {
        self.bodies.remove(id);
        self.order.retain(|&other| other != id);
    }

    fn position(&self, id: BoxId) -> Vec3 {
        self.bodies.get(id).map(|b| b.position).unwrap_or(Vec3::ZERO)
    }

    fn set_position(&mut self, id: BoxId, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.position = position;
        }
    }

    fn velocity(&self, id: BoxId) -> Vec2 {
        self.bodies.get(id).map(|b| b.velocity).unwrap_or(Vec2::ZERO)
    }

    fn reset_rotation(&mut self, id: BoxId) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.rotation = 0.0;
        }
    }

    fn set_body_type(&mut self, id: BoxId, body_type: BodyType) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.body_type = body_type;
            if body_type == BodyType::Kinematic {
                body.velocity = Vec2::ZERO;
            }
        }
    }

    fn set_constraints(&mut self, id: BoxId, constraints: Constraints) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.constraints = constraints;
        }
    }

    fn set_gravity_scale(&mut self, id: BoxId, scale: f32) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.gravity_scale = scale;
        }
    }

    fn set_simulated(&mut self, id: BoxId, simulated: bool) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.simulated = simulated;
        }
    }

    fn apply_force(&mut self, id: BoxId, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(id) {
            body.force += force;
        }
    }

    fn set_top_border_active(&mut self, active: bool) {
        self.top_border_active = active;
    }
}
