//! Engine state and core types
//!
//! Everything the lifecycle owns lives here: the population, the cycle
//! bookkeeping, the task scheduler and the seeded RNG.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use super::columns::{Column, compare_boxes};
use super::physics::Physics;
use super::schedule::{Scheduler, Task};
use super::spawn::SpawnSequencer;
use crate::error::{ConfigError, ConstructionError};
use crate::settings::{Playfield, Settings};

new_key_type! {
    /// Stable handle for a box, never reused after deletion
    pub struct BoxId;
}

/// Current phase of the spawn/settle/sort/arrange cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Initial spawn sequence is running
    Spawning,
    /// Waiting for every box to come to rest
    WaitingToSettle,
    /// Boxes are moving into their columns
    Sorting,
    /// Columns frozen, collapsing into the central tower
    Arranging,
    /// Tower built, waiting for a deletion
    Idle,
}

/// Something observable that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BoxSpawned { id: BoxId, size: f32 },
    BoxRejected { size: f32, reason: String },
    SortStarted { count: usize },
    SortFinished,
    BoxCentered { id: BoxId },
    ArrangeFinished,
    BoxDeleted { id: BoxId },
    /// A deletion restarted the cycle, dropping `cancelled` pending tasks
    CycleReset { cancelled: usize },
}

/// One placeable, deletable box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxEntity {
    pub id: BoxId,
    /// Scalar size used for ranking
    pub size: f32,
    /// Visual bounds used for layout
    pub bounds: Vec2,
    /// Destination from the last sort pass of this cycle
    pub target: Option<Vec3>,
    /// Column chosen by the last sort pass of this cycle
    pub column: Option<Column>,
}

impl BoxEntity {
    fn new(id: BoxId, size: f32) -> Self {
        Self {
            id,
            size,
            bounds: Vec2::splat(size),
            target: None,
            column: None,
        }
    }
}

/// The live boxes, in insertion order until a sort pass reorders them
#[derive(Debug, Clone, Default)]
pub struct Population {
    boxes: SlotMap<BoxId, BoxEntity>,
    order: Vec<BoxId>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Member ids in population order
    pub fn ids(&self) -> &[BoxId] {
        &self.order
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.order.contains(&id)
    }

    pub fn get(&self, id: BoxId) -> Option<&BoxEntity> {
        self.boxes.get(id).filter(|_| self.order.contains(&id))
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut BoxEntity> {
        if !self.order.contains(&id) {
            return None;
        }
        self.boxes.get_mut(id)
    }

    /// Members in population order
    pub fn iter(&self) -> impl Iterator<Item = &BoxEntity> + '_ {
        self.order.iter().filter_map(|id| self.boxes.get(*id))
    }

    /// Reserve an id for an object that is about to be instantiated
    pub(crate) fn allocate(&mut self, size: f32) -> BoxId {
        self.boxes.insert_with_key(|id| BoxEntity::new(id, size))
    }

    /// Make an allocated box a member
    pub(crate) fn admit(&mut self, id: BoxId, bounds: Vec2) {
        if let Some(entity) = self.boxes.get_mut(id) {
            entity.bounds = bounds;
            self.order.push(id);
        }
    }

    /// Drop an allocated box that never became a member
    pub(crate) fn discard(&mut self, id: BoxId) {
        if !self.order.contains(&id) {
            self.boxes.remove(id);
        }
    }

    /// Remove a member
    pub fn remove(&mut self, id: BoxId) -> Option<BoxEntity> {
        let index = self.order.iter().position(|&member| member == id)?;
        self.order.remove(index);
        self.boxes.remove(id)
    }

    /// Stable ascending sort by size
    pub fn sort_by_size(&mut self) {
        let boxes = &self.boxes;
        self.order
            .sort_by(|a, b| compare_boxes(boxes.get(*a), boxes.get(*b)));
    }

    /// Forget every target and column (they belong to a finished cycle)
    pub fn clear_targets(&mut self) {
        for entity in self.boxes.values_mut() {
            entity.target = None;
            entity.column = None;
        }
    }
}

/// Boxes subscribed to the pointer deletion callback
#[derive(Debug, Clone, Default)]
pub struct DeleteRegistry {
    subscribed: SecondaryMap<BoxId, ()>,
}

impl DeleteRegistry {
    pub fn subscribe(&mut self, id: BoxId) {
        self.subscribed.insert(id, ());
    }

    /// Returns true if the box was subscribed
    pub fn unsubscribe(&mut self, id: BoxId) -> bool {
        self.subscribed.remove(id).is_some()
    }

    pub fn is_subscribed(&self, id: BoxId) -> bool {
        self.subscribed.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribed.is_empty()
    }
}

/// Per-cycle bookkeeping, reset whenever a deletion restarts the cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    /// Boxes emitted by the spawn sequencer
    pub spawn_index: usize,
    /// Consecutive ticks without motion
    pub still_frames: u32,
    /// Latch: a sort pass already ran this cycle
    pub already_sorted: bool,
}

impl CycleState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Complete engine state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub playfield: Playfield,
    /// Current phase
    pub phase: GamePhase,
    pub cycle: CycleState,
    pub population: Population,
    pub registry: DeleteRegistry,
    pub scheduler: Scheduler,
    /// Whether the upper barrier is currently enabled
    pub top_border_active: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events since the last `take_events`
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Validate settings and start the spawn sequence
    pub fn new(settings: Settings, playfield: Playfield) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut scheduler = Scheduler::new();
        scheduler.spawn(Task::Spawn(SpawnSequencer::new(
            settings.box_count,
            settings.min_box_size,
            settings.max_box_size,
            settings.spawn_interval,
        )));
        log::info!(
            "Spawning {} boxes ({}..={})",
            settings.box_count,
            settings.min_box_size,
            settings.max_box_size
        );

        Ok(Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            settings,
            playfield,
            phase: GamePhase::Spawning,
            cycle: CycleState::default(),
            population: Population::new(),
            registry: DeleteRegistry::default(),
            scheduler,
            top_border_active: false,
            time_ticks: 0,
            events: Vec::new(),
        })
    }

    /// Drain events recorded since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Instantiate a box through the physics factory and admit it.
    ///
    /// Objects missing a facet are destroyed again and never join the
    /// population.
    pub fn spawn_box<P: Physics + ?Sized>(
        &mut self,
        physics: &mut P,
        size: f32,
    ) -> Result<BoxId, ConstructionError> {
        let id = self.population.allocate(size);
        let facets = physics.create_object(id, size);

        let admitted = match (facets.bounds, facets.body) {
            (None, _) => Err(ConstructionError::MissingBounds(id)),
            (_, false) => Err(ConstructionError::MissingBody(id)),
            (Some(b), true) if !(b.x.is_finite() && b.y.is_finite() && b.x >= 0.0 && b.y >= 0.0) => {
                Err(ConstructionError::InvalidBounds {
                    id,
                    width: b.x,
                    height: b.y,
                })
            }
            (Some(bounds), true) => Ok(bounds),
        };

        match admitted {
            Ok(bounds) => {
                self.population.admit(id, bounds);
                self.registry.subscribe(id);
                self.events.push(GameEvent::BoxSpawned { id, size });
                log::debug!("Spawned box {:?} size {}", id, size);
                Ok(id)
            }
            Err(err) => {
                log::error!("Discarding instantiated object: {}", err);
                self.population.discard(id);
                physics.destroy_object(id);
                self.events.push(GameEvent::BoxRejected {
                    size,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Serializable view of the layout
    pub fn snapshot<P: Physics + ?Sized>(&self, physics: &P) -> Snapshot {
        Snapshot {
            tick: self.time_ticks,
            phase: self.phase,
            cycle: self.cycle,
            boxes: self
                .population
                .iter()
                .map(|b| BoxSnapshot {
                    id: b.id,
                    size: b.size,
                    position: physics.position(b.id),
                    target: b.target,
                    column: b.column,
                })
                .collect(),
        }
    }
}

/// Box entry of a [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSnapshot {
    pub id: BoxId,
    pub size: f32,
    pub position: Vec3,
    pub target: Option<Vec3>,
    pub column: Option<Column>,
}

/// Point-in-time view of the engine, for logging and the runner's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub cycle: CycleState,
    pub boxes: Vec<BoxSnapshot>,
}
