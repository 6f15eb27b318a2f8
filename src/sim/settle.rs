//! Settle detection
//!
//! Debounces "nothing is moving" over a threshold of consecutive ticks and
//! latches once a sort pass has been granted for the current cycle.

use glam::Vec2;

use super::physics::Physics;
use super::state::{BoxId, CycleState};

/// Outcome of observing one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleVerdict {
    /// Something moved, counter reset
    Moving,
    /// Still, but not for long enough yet
    Settling,
    /// Settled and the latch was clear: run a sort pass now
    Settled,
    /// Settled, but this cycle already sorted
    Latched,
    /// Settled with nothing to sort
    Empty,
}

/// Whether any listed body has a non-zero velocity
pub fn any_moving<P: Physics + ?Sized>(physics: &P, ids: &[BoxId]) -> bool {
    ids.iter().any(|&id| physics.velocity(id) != Vec2::ZERO)
}

/// Feed one tick's motion state into the cycle counters.
///
/// The counter climbs to `threshold + 1`; the tick after that grants the
/// sort and sets the latch. Only a cycle reset clears the latch again.
pub fn observe(
    cycle: &mut CycleState,
    moving: bool,
    threshold: u32,
    population: usize,
) -> SettleVerdict {
    if moving {
        cycle.still_frames = 0;
        return SettleVerdict::Moving;
    }
    if cycle.still_frames <= threshold {
        cycle.still_frames += 1;
        return SettleVerdict::Settling;
    }
    if cycle.already_sorted {
        return SettleVerdict::Latched;
    }
    if population == 0 {
        return SettleVerdict::Empty;
    }
    cycle.already_sorted = true;
    SettleVerdict::Settled
}
