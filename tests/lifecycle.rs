use std::collections::HashMap;

use box_tower::sim::{
    BodyType, BoxId, Column, Constraints, GameEvent, GamePhase, GameState, ObjectFacets, Physics,
    TickInput, delete_box, sort_pass, tick,
};
use box_tower::{Playfield, Settings};
use glam::{Vec2, Vec3};

const DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, PartialEq)]
struct ScriptedBody {
    position: Vec3,
    body_type: BodyType,
    constraints: Constraints,
    gravity_scale: f32,
    simulated: bool,
    rotation_resets: u32,
    force: Vec2,
}

/// Physics double: bodies only move when the engine moves them, and report
/// motion only while `moving` is set.
#[derive(Debug, Default)]
struct ScriptedPhysics {
    bodies: HashMap<BoxId, ScriptedBody>,
    created: Vec<(BoxId, f32)>,
    destroyed: Vec<BoxId>,
    top_border: bool,
    moving: bool,
    /// Sizes that come back without a physics body
    bodiless_sizes: Vec<f32>,
}

impl Physics for ScriptedPhysics {
    fn create_object(&mut self, id: BoxId, size: f32) -> ObjectFacets {
        self.created.push((id, size));
        self.bodies.insert(
            id,
            ScriptedBody {
                position: Vec3::new(0.0, 0.0, 0.25),
                body_type: BodyType::Dynamic,
                constraints: Constraints::None,
                gravity_scale: 1.0,
                simulated: true,
                rotation_resets: 0,
                force: Vec2::ZERO,
            },
        );
        if self.bodiless_sizes.contains(&size) {
            ObjectFacets {
                bounds: Some(Vec2::splat(size)),
                body: false,
            }
        } else {
            ObjectFacets::complete(Vec2::splat(size))
        }
    }

    fn destroy_object(&mut self, id: BoxId) {
        self.bodies.remove(&id);
        self.destroyed.push(id);
    }

    fn position(&self, id: BoxId) -> Vec3 {
        self.bodies[&id].position
    }

    fn set_position(&mut self, id: BoxId, position: Vec3) {
        self.bodies.get_mut(&id).unwrap().position = position;
    }

    fn velocity(&self, _id: BoxId) -> Vec2 {
        if self.moving { Vec2::new(0.0, -1.0) } else { Vec2::ZERO }
    }

    fn reset_rotation(&mut self, id: BoxId) {
        self.bodies.get_mut(&id).unwrap().rotation_resets += 1;
    }

    fn set_body_type(&mut self, id: BoxId, body_type: BodyType) {
        self.bodies.get_mut(&id).unwrap().body_type = body_type;
    }

    fn set_constraints(&mut self, id: BoxId, constraints: Constraints) {
        self.bodies.get_mut(&id).unwrap().constraints = constraints;
    }

    fn set_gravity_scale(&mut self, id: BoxId, scale: f32) {
        self.bodies.get_mut(&id).unwrap().gravity_scale = scale;
    }

    fn set_simulated(&mut self, id: BoxId, simulated: bool) {
        self.bodies.get_mut(&id).unwrap().simulated = simulated;
    }

    fn apply_force(&mut self, id: BoxId, force: Vec2) {
        self.bodies.get_mut(&id).unwrap().force += force;
    }

    fn set_top_border_active(&mut self, active: bool) {
        self.top_border = active;
    }
}

fn field() -> Playfield {
    Playfield::new(30.0, 20.0, 1.0)
}

fn game(box_count: usize) -> (GameState, ScriptedPhysics) {
    let settings = Settings {
        box_count,
        min_box_size: 2.0,
        max_box_size: 8.0,
        spawn_interval: 0.2,
        ..Default::default()
    };
    (GameState::new(settings, field()).unwrap(), ScriptedPhysics::default())
}

/// Tick until `phase` is reached, collecting every event on the way
fn run_until(
    state: &mut GameState,
    physics: &mut ScriptedPhysics,
    phase: GamePhase,
    max_ticks: usize,
    events: &mut Vec<GameEvent>,
) -> usize {
    let input = TickInput::default();
    for ticks in 0..max_ticks {
        if state.phase == phase {
            return ticks;
        }
        tick(state, physics, &input, DT);
        events.extend(state.take_events());
    }
    assert_eq!(state.phase, phase, "phase not reached in {} ticks", max_ticks);
    max_ticks
}

fn id_of_size(state: &GameState, size: f32) -> BoxId {
    state
        .population
        .iter()
        .find(|b| b.size == size)
        .map(|b| b.id)
        .unwrap()
}

fn count_sorts(events: &[GameEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::SortStarted { .. }))
        .count()
}

#[test]
fn scenario_a_four_boxes_alternate_columns() {
    let (mut state, mut physics) = game(4);
    let mut events = Vec::new();

    run_until(&mut state, &mut physics, GamePhase::WaitingToSettle, 600, &mut events);
    let sizes: Vec<f32> = physics.created.iter().map(|(_, s)| *s).collect();
    assert_eq!(sizes, vec![2.0, 4.0, 6.0, 8.0]);
    assert_eq!(count_sorts(&events), 0);

    // The tick that finished spawning already counted as still; the counter
    // climbs to threshold + 1 and the next still tick sorts
    assert_eq!(state.cycle.still_frames, 1);
    let ticks = run_until(&mut state, &mut physics, GamePhase::Sorting, 100, &mut events);
    assert_eq!(ticks, 6);
    assert_eq!(count_sorts(&events), 1);

    let sorted: Vec<f32> = state.population.iter().map(|b| b.size).collect();
    assert_eq!(sorted, vec![2.0, 4.0, 6.0, 8.0]);

    let expect = [
        (8.0, Column::Right, Vec3::new(14.5 - 4.0, 10.0 - 4.0, 0.25)),
        (6.0, Column::Left, Vec3::new(-14.5 + 3.0, 10.0 - 3.0, 0.25)),
        (4.0, Column::Right, Vec3::new(14.5 - 2.0, 0.0, 0.25)),
        (2.0, Column::Left, Vec3::new(-14.5 + 1.0, 3.0, 0.25)),
    ];
    for (size, column, target) in expect {
        let id = id_of_size(&state, size);
        let entity = state.population.get(id).unwrap();
        assert_eq!(entity.column, Some(column), "size {}", size);
        assert_eq!(entity.target, Some(target), "size {}", size);

        let body = &physics.bodies[&id];
        assert_eq!(body.body_type, BodyType::Kinematic);
        assert!(body.simulated);
        assert_eq!(body.rotation_resets, 1);
    }
}

#[test]
fn scenario_b_resort_recomputes_every_target() {
    let (mut state, mut physics) = game(2);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::Sorting, 600, &mut events);

    let big = id_of_size(&state, 8.0);
    let small = id_of_size(&state, 2.0);
    assert_eq!(state.population.get(big).unwrap().column, Some(Column::Right));
    assert_eq!(state.population.get(small).unwrap().column, Some(Column::Left));

    let middle = state.spawn_box(&mut physics, 6.0).unwrap();
    sort_pass(&mut state, &mut physics);

    let order: Vec<BoxId> = state.population.ids().to_vec();
    assert_eq!(order, vec![small, middle, big]);

    // Largest is now rank 2: top of the left column
    let big_entity = state.population.get(big).unwrap();
    assert_eq!(big_entity.column, Some(Column::Left));
    assert_eq!(big_entity.target, Some(Vec3::new(-14.5 + 4.0, 6.0, 0.25)));

    let middle_entity = state.population.get(middle).unwrap();
    assert_eq!(middle_entity.column, Some(Column::Right));
    assert_eq!(middle_entity.target, Some(Vec3::new(14.5 - 3.0, 7.0, 0.25)));

    // Smallest stacks under the largest
    let small_entity = state.population.get(small).unwrap();
    assert_eq!(small_entity.column, Some(Column::Left));
    assert_eq!(small_entity.target, Some(Vec3::new(-14.5 + 1.0, 6.0 - 4.0 - 1.0, 0.25)));
}

#[test]
fn scenario_c_delete_only_box() {
    let (mut state, mut physics) = game(1);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::WaitingToSettle, 60, &mut events);
    assert_eq!(physics.created[0].1, 2.0);

    let only = state.population.ids()[0];
    let input = TickInput {
        pointer_hits: vec![only],
    };
    tick(&mut state, &mut physics, &input, DT);
    let events = state.take_events();

    assert_eq!(count_sorts(&events), 0);
    assert_eq!(state.phase, GamePhase::WaitingToSettle);
    assert_eq!(state.population.len(), 1);
    assert!(!state.population.contains(only));
    assert_eq!(physics.bodies.len(), 1);
    assert_eq!(physics.destroyed, vec![only]);

    let replacement = state.population.iter().next().unwrap();
    assert!((2.0..=8.0).contains(&replacement.size));
    assert!(state.registry.is_subscribed(replacement.id));
}

#[test]
fn settle_debounce_sorts_once_per_cycle() {
    let (mut state, mut physics) = game(3);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::WaitingToSettle, 600, &mut events);

    let input = TickInput::default();
    // Motion interrupts the count repeatedly
    for round in 0..5 {
        for _ in 0..4 {
            tick(&mut state, &mut physics, &input, DT);
        }
        physics.moving = true;
        tick(&mut state, &mut physics, &input, DT);
        physics.moving = false;
        assert_eq!(state.cycle.still_frames, 0, "round {}", round);
    }
    events.extend(state.take_events());
    assert_eq!(count_sorts(&events), 0);

    for _ in 0..7 {
        tick(&mut state, &mut physics, &input, DT);
    }
    events.extend(state.take_events());
    assert_eq!(count_sorts(&events), 1);
    assert!(state.cycle.already_sorted);

    // Any number of further still or moving ticks never sorts again
    for i in 0..600 {
        physics.moving = i % 50 < 10;
        tick(&mut state, &mut physics, &input, DT);
    }
    events.extend(state.take_events());
    assert_eq!(count_sorts(&events), 1);
}

#[test]
fn transitions_land_exactly_on_targets() {
    let (mut state, mut physics) = game(5);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::Arranging, 2000, &mut events);

    for entity in state.population.iter() {
        assert_eq!(physics.bodies[&entity.id].position, entity.target.unwrap());
    }
    assert!(events.contains(&GameEvent::SortFinished));
}

#[test]
fn arrange_freezes_then_collapses_to_center() {
    let (mut state, mut physics) = game(4);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::Arranging, 2000, &mut events);

    assert!(physics.top_border);
    assert!(state.top_border_active);
    for body in physics.bodies.values() {
        assert_eq!(body.gravity_scale, -1.0);
        assert_eq!(body.constraints, Constraints::LockHorizontal);
        assert_eq!(body.body_type, BodyType::Dynamic);
    }

    let ys: HashMap<BoxId, f32> = state
        .population
        .iter()
        .map(|b| (b.id, b.target.unwrap().y))
        .collect();

    run_until(&mut state, &mut physics, GamePhase::Idle, 2000, &mut events);
    for (id, y) in ys {
        let body = &physics.bodies[&id];
        assert_eq!(body.position.x, 0.0);
        assert_eq!(body.position.y, y);
        assert_eq!(body.gravity_scale, 1.0);
    }

    // Centered from the last member (largest) down to the first
    let centered: Vec<BoxId> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::BoxCentered { id } => Some(*id),
            _ => None,
        })
        .collect();
    let mut expected = state.population.ids().to_vec();
    expected.reverse();
    assert_eq!(centered, expected);
    assert!(events.contains(&GameEvent::ArrangeFinished));
    assert!(state.scheduler.is_empty());
}

#[test]
fn deletion_mid_sort_cancels_pending_transitions() {
    let (mut state, mut physics) = game(6);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::Sorting, 2000, &mut events);

    // Let the boxes travel part of the way
    for _ in 0..10 {
        tick(&mut state, &mut physics, &TickInput::default(), DT);
    }
    let pending = state.scheduler.moving_count();
    assert_eq!(pending, 6);

    let victim = state.population.ids()[2];
    let survivors: Vec<BoxId> = state
        .population
        .ids()
        .iter()
        .copied()
        .filter(|&id| id != victim)
        .collect();
    assert!(delete_box(&mut state, &mut physics, victim));
    let reset_events = state.take_events();
    assert!(reset_events.contains(&GameEvent::CycleReset { cancelled: pending }));
    assert!(state.scheduler.is_empty());
    assert!(!state.cycle.already_sorted);
    assert_eq!(state.cycle.still_frames, 0);
    assert_eq!(state.population.len(), 6);
    assert!(!state.population.contains(victim));
    assert!(state.population.iter().all(|b| b.target.is_none()));

    for id in &survivors {
        let body = &physics.bodies[id];
        assert_eq!(body.body_type, BodyType::Dynamic);
        assert_eq!(body.constraints, Constraints::None);
        assert_eq!(body.gravity_scale, 1.0);
        assert!(body.force.y == 0.0 && body.force.x.abs() <= 400.0);
    }

    // Keep things moving: the old cycle's completion must never fire
    physics.moving = true;
    for _ in 0..600 {
        tick(&mut state, &mut physics, &TickInput::default(), DT);
    }
    let later = state.take_events();
    assert!(!later.contains(&GameEvent::SortFinished));
    assert_eq!(state.phase, GamePhase::WaitingToSettle);

    // Once still again, the new cycle sorts exactly once
    physics.moving = false;
    for _ in 0..20 {
        tick(&mut state, &mut physics, &TickInput::default(), DT);
    }
    assert_eq!(count_sorts(&state.take_events()), 1);
}

#[test]
fn deletion_mid_collapse_restores_physics() {
    let (mut state, mut physics) = game(4);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::Arranging, 2000, &mut events);

    // Past the arrange delay, first box halfway to the center
    for _ in 0..60 {
        tick(&mut state, &mut physics, &TickInput::default(), DT);
    }
    events.extend(state.take_events());
    assert_eq!(state.phase, GamePhase::Arranging);
    assert_eq!(state.scheduler.len(), 1);
    assert!(physics.top_border);
    assert!(!events.iter().any(|e| matches!(e, GameEvent::BoxCentered { .. })));
    let centering = *state.population.ids().last().unwrap();
    let x = physics.bodies[&centering].position.x;
    assert!(x != 0.0 && x != state.population.get(centering).unwrap().target.unwrap().x);

    let victim = state.population.ids()[1];
    assert!(delete_box(&mut state, &mut physics, victim));
    assert!(state.take_events().contains(&GameEvent::CycleReset { cancelled: 1 }));
    assert_eq!(state.phase, GamePhase::WaitingToSettle);
    assert!(state.scheduler.is_empty());
    assert!(!physics.top_border);
    assert!(!state.top_border_active);
    for id in state.population.ids() {
        let body = &physics.bodies[id];
        assert_eq!(body.gravity_scale, 1.0);
        assert_eq!(body.constraints, Constraints::None);
        assert_eq!(body.body_type, BodyType::Dynamic);
        assert!(body.simulated);
    }

    // The cancelled collapse neither moves boxes nor reports progress
    let positions: Vec<Vec3> = state
        .population
        .ids()
        .iter()
        .map(|id| physics.bodies[id].position)
        .collect();
    physics.moving = true;
    for _ in 0..600 {
        tick(&mut state, &mut physics, &TickInput::default(), DT);
    }
    let later = state.take_events();
    assert!(!later.contains(&GameEvent::ArrangeFinished));
    assert!(!later.iter().any(|e| matches!(e, GameEvent::BoxCentered { .. })));
    assert_eq!(state.phase, GamePhase::WaitingToSettle);
    let after: Vec<Vec3> = state
        .population
        .ids()
        .iter()
        .map(|id| physics.bodies[id].position)
        .collect();
    assert_eq!(positions, after);
}

#[test]
fn bodiless_object_is_discarded() {
    let (mut state, mut physics) = game(4);
    physics.bodiless_sizes.push(4.0);
    let mut events = Vec::new();
    run_until(&mut state, &mut physics, GamePhase::WaitingToSettle, 600, &mut events);

    let sizes: Vec<f32> = state.population.iter().map(|b| b.size).collect();
    assert_eq!(sizes, vec![2.0, 6.0, 8.0]);
    assert_eq!(physics.destroyed.len(), 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::BoxRejected { size, .. } if *size == 4.0)));
}

#[test]
fn same_seed_same_rebuild() {
    let play = || {
        let (mut state, mut physics) = game(5);
        let mut events = Vec::new();
        run_until(&mut state, &mut physics, GamePhase::Idle, 3000, &mut events);
        let victim = state.population.ids()[1];
        delete_box(&mut state, &mut physics, victim);
        run_until(&mut state, &mut physics, GamePhase::Idle, 3000, &mut events);
        let forces: Vec<Vec2> = state
            .population
            .ids()
            .iter()
            .map(|id| physics.bodies[id].force)
            .collect();
        let sizes: Vec<f32> = state.population.iter().map(|b| b.size).collect();
        (sizes, forces, state.snapshot(&physics))
    };

    let (sizes_a, forces_a, snap_a) = play();
    let (sizes_b, forces_b, snap_b) = play();
    assert_eq!(sizes_a, sizes_b);
    assert_eq!(forces_a, forces_b);
    assert_eq!(snap_a.boxes.len(), snap_b.boxes.len());
    for (a, b) in snap_a.boxes.iter().zip(&snap_b.boxes) {
        assert_eq!(a.size, b.size);
        assert_eq!(a.position, b.position);
    }
}
