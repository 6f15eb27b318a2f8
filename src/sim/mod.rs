//! Deterministic engine module
//!
//! All cycle logic lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (population order, creation order)
//! - Physics is observed and commanded, never integrated (except by `sandbox`)

pub mod arrange;
pub mod columns;
pub mod physics;
pub mod sandbox;
pub mod schedule;
pub mod settle;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod transition;

pub use arrange::{Collapse, freeze};
pub use columns::{Column, LayoutEntry, Placement, compare_boxes, compare_sizes, plan_columns};
pub use physics::{BodySetup, BodyType, Constraints, ObjectFacets, Physics};
pub use sandbox::Sandbox;
pub use schedule::{Completion, Scheduler, Task};
pub use settle::SettleVerdict;
pub use spawn::SpawnSequencer;
pub use state::{
    BoxEntity, BoxId, BoxSnapshot, CycleState, DeleteRegistry, GameEvent, GamePhase, GameState,
    Population, Snapshot,
};
pub use tick::{TickInput, delete_box, pointer_activated, random_push, sort_pass, tick};
pub use transition::Transition;
