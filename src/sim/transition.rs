//! Timed linear transitions
//!
//! A transition owns its normalized progress `t`. Each tick adds
//! `dt * speed`; the position is `start + (target - start) * min(t, 1)`.
//! Once `t >= 1` the exact target is reported, never an overshoot.

use glam::Vec3;

/// One box moving from where it was when the transition began
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    start: Vec3,
    target: Vec3,
    speed: f32,
    t: f32,
}

impl Transition {
    /// A non-positive speed never finishes; settings validation keeps it out.
    pub fn new(start: Vec3, target: Vec3, speed: f32) -> Self {
        if speed <= 0.0 {
            log::warn!("Transition with speed {} will never complete", speed);
        }
        Self {
            start,
            target,
            speed,
            t: 0.0,
        }
    }

    /// Advance by one tick and return the new position
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.t += dt * self.speed;
        self.position()
    }

    /// Position at the current progress
    pub fn position(&self) -> Vec3 {
        if self.is_finished() {
            self.target
        } else {
            self.start.lerp(self.target, self.t.max(0.0))
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.t >= 1.0
    }

    /// Progress clamped to [0, 1]
    #[inline]
    pub fn progress(&self) -> f32 {
        self.t.clamp(0.0, 1.0)
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }
}
