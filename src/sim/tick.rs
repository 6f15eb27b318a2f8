//! Fixed timestep engine tick
//!
//! Lifecycle: Spawning -> WaitingToSettle -> Sorting -> Arranging -> Idle.
//! A deletion from any phase cancels every pending task, restores full
//! physics with a random sideways push, spawns one replacement and goes back
//! to WaitingToSettle.

use glam::Vec2;
use rand::Rng;

use super::arrange::{Collapse, freeze};
use super::columns::{LayoutEntry, plan_columns};
use super::physics::{BodySetup, BodyType, Physics, apply_setup};
use super::schedule::{Completion, Fired, Task};
use super::settle::{self, SettleVerdict};
use super::state::{BoxId, GameEvent, GamePhase, GameState};
use super::transition::Transition;

/// Input collected for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Boxes the pointer activated since the last tick
    pub pointer_hits: Vec<BoxId>,
}

/// Advance the engine by one fixed timestep.
///
/// The physics world is stepped by the caller; this only observes it and
/// issues commands.
pub fn tick<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P, input: &TickInput, dt: f32) {
    state.time_ticks += 1;

    for &id in &input.pointer_hits {
        pointer_activated(state, physics, id);
    }

    run_tasks(state, physics, dt);

    // Nothing settles while the initial sequence is still adding boxes
    if state.phase == GamePhase::Spawning {
        return;
    }
    let moving = settle::any_moving(physics, state.population.ids());
    let verdict = settle::observe(
        &mut state.cycle,
        moving,
        state.settings.still_frame_threshold,
        state.population.len(),
    );
    if verdict == SettleVerdict::Settled {
        sort_pass(state, physics);
    }
}

/// Pointer callback for one box; ignored unless the box is subscribed
pub fn pointer_activated<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P, id: BoxId) -> bool {
    if !state.registry.is_subscribed(id) {
        log::warn!("Ignoring pointer hit on unknown box {:?}", id);
        return false;
    }
    delete_box(state, physics, id)
}

/// Poll every pending task once, then fire the completions that are still current
fn run_tasks<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P, dt: f32) {
    let tasks = state.scheduler.take_tasks();
    let mut survivors = Vec::with_capacity(tasks.len());
    let mut fired = Vec::new();

    for mut scheduled in tasks {
        match poll_task(state, physics, &mut scheduled.task, dt) {
            TaskPoll::Pending => survivors.push(scheduled),
            TaskPoll::Done(Some(completion)) => fired.push(Fired {
                epoch: scheduled.epoch,
                completion,
            }),
            TaskPoll::Done(None) => {}
        }
    }
    state.scheduler.restore(survivors);

    for fired in fired {
        if let Some(completion) = state.scheduler.accept(fired) {
            complete(state, physics, completion);
        }
    }
}

enum TaskPoll {
    Pending,
    Done(Option<Completion>),
}

fn poll_task<P: Physics + ?Sized>(
    state: &mut GameState,
    physics: &mut P,
    task: &mut Task,
    dt: f32,
) -> TaskPoll {
    match task {
        Task::Spawn(sequencer) => {
            if let Some(size) = sequencer.poll(dt) {
                state.cycle.spawn_index = sequencer.emitted();
                // Rejected objects are logged and skipped
                let _ = state.spawn_box(physics, size);
            }
            if sequencer.is_finished() {
                TaskPoll::Done(Some(Completion::SpawnFinished))
            } else {
                TaskPoll::Pending
            }
        }
        Task::Move {
            id,
            transition,
            on_done,
        } => {
            physics.set_position(*id, transition.advance(dt));
            if transition.is_finished() {
                TaskPoll::Done(on_done.take())
            } else {
                TaskPoll::Pending
            }
        }
        Task::Collapse(collapse) => {
            let progress = collapse.advance(physics, dt);
            if let Some(id) = progress.released {
                state.events.push(GameEvent::BoxCentered { id });
            }
            if progress.finished {
                TaskPoll::Done(Some(Completion::CollapseFinished))
            } else {
                TaskPoll::Pending
            }
        }
    }
}

fn complete<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P, completion: Completion) {
    match completion {
        Completion::SpawnFinished => {
            if state.phase == GamePhase::Spawning {
                log::info!("Spawned {} boxes, waiting to settle", state.population.len());
                state.cycle.still_frames = 0;
                state.phase = GamePhase::WaitingToSettle;
            }
        }
        Completion::SortComplete => {
            state.events.push(GameEvent::SortFinished);
            let ids = state.population.ids().to_vec();
            freeze(physics, &ids, state.settings.freeze_gravity_scale);
            state.top_border_active = true;
            state.scheduler.spawn(Task::Collapse(Collapse::new(
                ids,
                state.settings.arrange_delay,
                state.settings.transition_speed,
            )));
            log::info!("Columns frozen, collapsing");
            state.phase = GamePhase::Arranging;
        }
        Completion::CollapseFinished => {
            state.events.push(GameEvent::ArrangeFinished);
            log::info!("Tower arranged");
            state.phase = GamePhase::Idle;
        }
    }
}

/// Sort the population and start moving every box into its column.
///
/// The smallest box is placed last and its transition carries the
/// completion that starts the rearrangement.
pub fn sort_pass<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P) {
    if state.population.is_empty() {
        return;
    }
    state.population.sort_by_size();

    let entries: Vec<LayoutEntry> = state
        .population
        .iter()
        .map(|b| LayoutEntry {
            id: b.id,
            bounds: b.bounds,
            z: physics.position(b.id).z,
        })
        .collect();
    let plan = plan_columns(&entries, &state.playfield);

    log::info!("Sorting {} boxes into columns", plan.len());
    state.events.push(GameEvent::SortStarted { count: plan.len() });
    state.phase = GamePhase::Sorting;

    for placement in plan {
        let id = placement.id;
        physics.set_simulated(id, true);
        physics.set_body_type(id, BodyType::Kinematic);
        physics.reset_rotation(id);

        if let Some(entity) = state.population.get_mut(id) {
            entity.target = Some(placement.target);
            entity.column = Some(placement.column);
        }

        let start = physics.position(id);
        log::debug!(
            "Box {:?} rank {} -> {:?} {:?}",
            id,
            placement.rank,
            placement.column,
            placement.target
        );
        state.scheduler.spawn(Task::Move {
            id,
            transition: Transition::new(start, placement.target, state.settings.transition_speed),
            on_done: (placement.rank == 0).then_some(Completion::SortComplete),
        });
    }
}

/// Remove a box and restart the cycle around the survivors.
///
/// Returns false if the box is not a member.
pub fn delete_box<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P, id: BoxId) -> bool {
    if state.population.remove(id).is_none() {
        log::warn!("Delete requested for non-member box {:?}", id);
        return false;
    }
    state.registry.unsubscribe(id);
    physics.destroy_object(id);
    state.events.push(GameEvent::BoxDeleted { id });
    log::info!("Box {:?} deleted, {} left", id, state.population.len());

    reset_cycle(state, physics);
    push_all(state, physics);

    let size = state
        .rng
        .random_range(state.settings.min_box_size..=state.settings.max_box_size);
    // Rejected replacements are logged and skipped
    let _ = state.spawn_box(physics, size);

    state.phase = GamePhase::WaitingToSettle;
    true
}

/// Cancel the previous cycle and hand every box back to full physics
fn reset_cycle<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P) {
    let cancelled = state.scheduler.cancel_all();
    physics.set_top_border_active(false);
    state.top_border_active = false;
    state.cycle.reset();
    state.population.clear_targets();

    let ids = state.population.ids().to_vec();
    apply_setup(physics, &ids, BodySetup::released());

    log::debug!("Cycle reset, {} pending tasks cancelled", cancelled);
    state.events.push(GameEvent::CycleReset { cancelled });
}

/// Apply a random sideways push to every box
fn push_all<P: Physics + ?Sized>(state: &mut GameState, physics: &mut P) {
    let ids = state.population.ids().to_vec();
    for id in ids {
        let draw: f32 = state.rng.random_range(0.0..1.0);
        physics.apply_force(
            id,
            random_push(draw, state.settings.push_split, state.settings.push_force),
        );
    }
}

/// Horizontal push for one random draw in [0, 1).
///
/// The same draw picks the side (below `split` pushes left) and scales the
/// magnitude.
pub fn random_push(draw: f32, split: f32, max_force: f32) -> Vec2 {
    let magnitude = max_force * draw;
    if draw < split {
        Vec2::new(-magnitude, 0.0)
    } else {
        Vec2::new(magnitude, 0.0)
    }
}
