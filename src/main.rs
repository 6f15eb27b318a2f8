//! Box Tower headless runner
//!
//! Drives the engine against the sandbox physics on a fixed timestep,
//! prints the layout once the tower is built, deletes one box and prints
//! the layout again after the cycle has run a second time.
//!
//! Usage: `box-tower [settings.json]`

use box_tower::consts::*;
use box_tower::sim::{GameEvent, GamePhase, GameState, Sandbox, TickInput, tick};
use box_tower::{Playfield, Settings};

/// Camera used to derive the playfield
const ORTHOGRAPHIC_SIZE: f32 = 10.0;
const ASPECT: f32 = 16.0 / 9.0;
/// Render frame length the runner pretends to run at
const FRAME_DT: f32 = 1.0 / 50.0;
/// Frames to wait for a phase before giving up
const MAX_FRAMES: usize = 20_000;

/// Engine plus its physics world
struct Runner {
    state: GameState,
    sandbox: Sandbox,
    accumulator: f32,
    input: TickInput,
}

impl Runner {
    fn new(settings: Settings) -> Result<Self, box_tower::ConfigError> {
        let playfield = Playfield::from_camera(ORTHOGRAPHIC_SIZE, ASPECT, &settings);
        log::info!(
            "Playfield {}x{} (border {})",
            playfield.width,
            playfield.height,
            playfield.border_width
        );
        Ok(Self {
            state: GameState::new(settings, playfield)?,
            sandbox: Sandbox::new(playfield),
            accumulator: 0.0,
            input: TickInput::default(),
        })
    }

    /// Run the simulation ticks owed for one rendered frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &mut self.sandbox, &self.input, SIM_DT);
            self.sandbox.step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Pointer hits are one-shot
            self.input.pointer_hits.clear();
        }

        for event in self.state.take_events() {
            match event {
                GameEvent::SortStarted { count } => log::info!("Sort pass over {} boxes", count),
                GameEvent::BoxRejected { reason, .. } => log::warn!("Rejected box: {}", reason),
                other => log::debug!("{:?}", other),
            }
        }
    }

    fn run_until(&mut self, phase: GamePhase) -> bool {
        for _ in 0..MAX_FRAMES {
            if self.state.phase == phase {
                return true;
            }
            self.update(FRAME_DT);
        }
        self.state.phase == phase
    }

    fn print_snapshot(&self, label: &str) {
        let snapshot = self.state.snapshot(&self.sandbox);
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}:\n{}", label, json),
            Err(e) => log::error!("Failed to serialize snapshot: {}", e),
        }
    }
}

fn load_settings() -> Settings {
    match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Settings::default()
            }
        },
        None => Settings::default(),
    }
}

fn main() {
    env_logger::init();
    log::info!("Box Tower (headless) starting...");

    let mut runner = match Runner::new(load_settings()) {
        Ok(runner) => runner,
        Err(e) => {
            log::error!("Cannot start: {}", e);
            std::process::exit(1);
        }
    };

    if !runner.run_until(GamePhase::Idle) {
        log::warn!("Tower never finished, stopped in {:?}", runner.state.phase);
    }
    runner.print_snapshot("tower");

    let ids = runner.state.population.ids();
    if let Some(&victim) = ids.get(ids.len() / 2) {
        log::info!("Deleting box {:?}", victim);
        runner.input.pointer_hits.push(victim);
        runner.update(FRAME_DT);

        if !runner.run_until(GamePhase::Idle) {
            log::warn!("Rebuild never finished, stopped in {:?}", runner.state.phase);
        }
        runner.print_snapshot("rebuilt");
    }
}
