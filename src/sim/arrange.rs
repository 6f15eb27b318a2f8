//! Post-sort rearrangement
//!
//! Freeze: the top border comes back and every box becomes a dynamic body
//! locked horizontally. Collapse: after a delay, boxes move one at a time,
//! last member first, to the horizontal center and get full gravity back.

use glam::Vec3;

use super::physics::{BodySetup, Physics, apply_setup};
use super::state::BoxId;
use super::transition::Transition;

/// Freeze the columns in place
pub fn freeze<P: Physics + ?Sized>(physics: &mut P, ids: &[BoxId], gravity_scale: f32) {
    physics.set_top_border_active(true);
    apply_setup(physics, ids, BodySetup::frozen(gravity_scale));
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    /// Initial delay
    Waiting { remaining: f32 },
    /// Moving one box to the center
    Centering { id: BoxId, transition: Transition },
    /// Box is centered, gravity is restored on the next tick
    Releasing { id: BoxId },
    Done,
}

/// What one collapse tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseProgress {
    /// Box whose gravity was restored this tick
    pub released: Option<BoxId>,
    pub finished: bool,
}

/// Sequential move of every box to the central tower
#[derive(Debug, Clone, PartialEq)]
pub struct Collapse {
    /// Boxes still to move, popped from the back
    queue: Vec<BoxId>,
    speed: f32,
    stage: Stage,
}

impl Collapse {
    pub fn new(order: Vec<BoxId>, delay: f32, speed: f32) -> Self {
        Self {
            queue: order,
            speed,
            stage: Stage::Waiting { remaining: delay },
        }
    }

    /// Boxes not yet started
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Begin centering the next box, or finish
    fn next_stage<P: Physics + ?Sized>(&mut self, physics: &P) -> Stage {
        match self.queue.pop() {
            Some(id) => {
                let start = physics.position(id);
                let target = Vec3::new(0.0, start.y, start.z);
                Stage::Centering {
                    id,
                    transition: Transition::new(start, target, self.speed),
                }
            }
            None => Stage::Done,
        }
    }

    /// Advance by one tick
    pub fn advance<P: Physics + ?Sized>(&mut self, physics: &mut P, dt: f32) -> CollapseProgress {
        let mut progress = CollapseProgress::default();

        match &mut self.stage {
            Stage::Waiting { remaining } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    self.stage = self.next_stage(physics);
                }
            }
            Stage::Centering { id, transition } => {
                let id = *id;
                physics.set_position(id, transition.advance(dt));
                if transition.is_finished() {
                    self.stage = Stage::Releasing { id };
                }
            }
            Stage::Releasing { id } => {
                let id = *id;
                physics.set_gravity_scale(id, 1.0);
                progress.released = Some(id);
                self.stage = self.next_stage(physics);
            }
            Stage::Done => {}
        }

        progress.finished = self.stage == Stage::Done;
        progress
    }
}
