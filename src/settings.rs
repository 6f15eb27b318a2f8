//! Engine settings and playfield geometry
//!
//! Settings are plain data, persisted as JSON next to the runner.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Tunable engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Population ===
    /// Boxes created by the initial spawn sequence
    pub box_count: usize,
    /// Smallest box size (first spawned box)
    pub min_box_size: f32,
    /// Largest box size (last spawned box)
    pub max_box_size: f32,

    // === Timing ===
    /// Seconds between spawned boxes
    pub spawn_interval: f32,
    /// Transition progress per second (1.0 = one second per move)
    pub transition_speed: f32,
    /// Seconds between freezing the columns and collapsing them
    pub arrange_delay: f32,
    /// Consecutive still ticks tolerated before sorting
    pub still_frame_threshold: u32,

    // === Arena ===
    /// Scale of the side borders
    pub border_thickness: f32,

    // === Deletion ===
    /// Maximum horizontal push applied to surviving boxes
    pub push_force: f32,
    /// Random draws below this value push left
    pub push_split: f32,

    /// Gravity scale applied during the freeze phase
    pub freeze_gravity_scale: f32,

    /// RNG seed for replacement sizes and pushes
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            box_count: BOX_COUNT,
            min_box_size: MIN_BOX_SIZE,
            max_box_size: MAX_BOX_SIZE,

            spawn_interval: SPAWN_INTERVAL,
            transition_speed: TRANSITION_SPEED,
            arrange_delay: ARRANGE_DELAY,
            still_frame_threshold: STILL_FRAME_THRESHOLD,

            border_thickness: BORDER_THICKNESS,

            push_force: PUSH_FORCE,
            push_split: PUSH_SPLIT,

            freeze_gravity_scale: FREEZE_GRAVITY_SCALE,

            seed: DEFAULT_SEED,
        }
    }
}

impl Settings {
    /// Parse settings from JSON (missing fields fall back to defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.min_box_size,
            self.max_box_size,
            self.spawn_interval,
            self.transition_speed,
            self.arrange_delay,
            self.border_thickness,
            self.push_force,
            self.push_split,
            self.freeze_gravity_scale,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("values must be finite".into()));
        }
        if self.min_box_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_box_size must be positive, got {}",
                self.min_box_size
            )));
        }
        if self.min_box_size > self.max_box_size {
            return Err(ConfigError::Invalid(format!(
                "min_box_size {} exceeds max_box_size {}",
                self.min_box_size, self.max_box_size
            )));
        }
        // A zero speed would leave transitions running forever
        if self.transition_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "transition_speed must be positive, got {}",
                self.transition_speed
            )));
        }
        if self.spawn_interval < 0.0 || self.arrange_delay < 0.0 {
            return Err(ConfigError::Invalid("delays must not be negative".into()));
        }
        if self.border_thickness < 0.0 || self.push_force < 0.0 {
            return Err(ConfigError::Invalid(
                "border_thickness and push_force must not be negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.push_split) {
            return Err(ConfigError::Invalid(format!(
                "push_split must be within [0, 1], got {}",
                self.push_split
            )));
        }
        Ok(())
    }
}

/// Visible arena in world units, centered on the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    /// Full width of each side border
    pub border_width: f32,
}

impl Playfield {
    pub fn new(width: f32, height: f32, border_width: f32) -> Self {
        Self {
            width,
            height,
            border_width,
        }
    }

    /// Derive the arena from an orthographic camera
    pub fn from_camera(orthographic_size: f32, aspect: f32, settings: &Settings) -> Self {
        let height = orthographic_size * 2.0;
        let width = aspect * height;
        Self::new(width, height, settings.border_thickness * BORDER_SPRITE_WIDTH)
    }

    /// Top edge of the arena
    #[inline]
    pub fn top(&self) -> f32 {
        self.height / 2.0
    }

    /// Bottom edge of the arena
    #[inline]
    pub fn bottom(&self) -> f32 {
        -self.height / 2.0
    }

    /// X of the right border's inner face
    #[inline]
    pub fn right_inner(&self) -> f32 {
        self.width / 2.0 - self.border_width / 2.0
    }

    /// X of the left border's inner face
    #[inline]
    pub fn left_inner(&self) -> f32 {
        -self.width / 2.0 + self.border_width / 2.0
    }
}
