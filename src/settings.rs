//! Simulation settings
//!
//! Everything tunable about a session, grouped per component. Files are JSON;
//! missing fields fall back to defaults, and out-of-range values are clamped
//! by `Settings::sanitized` rather than rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;
use crate::sim::{CollisionSettings, PatternConfig, PoolSettings, SchedulerSettings, SpawnArea};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Multiplier on every spawn interval (>1 = sparser)
    pub fn interval_factor(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.4,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 0.7,
        }
    }

    /// Multiplier on every bullet speed
    pub fn speed_factor(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 0.8,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 1.25,
        }
    }

    /// Patterns running at once
    pub fn simultaneous(&self) -> usize {
        match self {
            DifficultyPreset::Easy | DifficultyPreset::Normal => 1,
            DifficultyPreset::Hard => 2,
        }
    }
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preset the pattern set was derived from
    pub preset: DifficultyPreset,
    /// RNG seed; same seed and inputs replay the same session
    pub seed: u64,
    pub pool: PoolSettings,
    pub spawn_area: SpawnArea,
    pub collision: CollisionSettings,
    pub scheduler: SchedulerSettings,
    /// Registered patterns, in rotation order
    pub patterns: Vec<PatternConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: DifficultyPreset::Normal,
            seed: 0,
            pool: PoolSettings::default(),
            spawn_area: SpawnArea::default(),
            collision: CollisionSettings::default(),
            scheduler: SchedulerSettings::default(),
            patterns: PatternConfig::default_set(),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Rebuild the pattern set from stock tuning scaled by `preset`
    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        self.preset = preset;
        self.patterns = PatternConfig::default_set()
            .into_iter()
            .map(|p| p.scaled(preset.interval_factor(), preset.speed_factor()))
            .collect();
        self.scheduler.simultaneous = preset.simultaneous();
    }

    /// Clamp every field into its valid range, warning about each change
    pub fn sanitized(mut self) -> Self {
        let pool = &mut self.pool;
        pool.capacity = clamp_count("pool.capacity", pool.capacity, 1);
        if pool.initial_size > pool.capacity {
            log::warn!(
                "pool.initial_size {} exceeds capacity, clamped to {}",
                pool.initial_size,
                pool.capacity
            );
            pool.initial_size = pool.capacity;
        }
        pool.lifetime = clamp_param("pool.lifetime", pool.lifetime, SIM_DT, f32::MAX);

        let area = &mut self.spawn_area;
        area.width = clamp_param("spawn_area.width", area.width, 0.0, f32::MAX);
        area.height = clamp_param("spawn_area.height", area.height, 0.0, f32::MAX);

        let collision = &mut self.collision;
        collision.check_interval = clamp_param(
            "collision.check_interval",
            collision.check_interval,
            MIN_CHECK_INTERVAL,
            f32::MAX,
        );
        collision.max_checks_per_pass =
            clamp_count("collision.max_checks_per_pass", collision.max_checks_per_pass, 1);
        collision.bullet_radius =
            clamp_param("collision.bullet_radius", collision.bullet_radius, 0.0, f32::MAX);
        collision.player_radius = clamp_param(
            "collision.player_radius",
            collision.player_radius,
            MIN_HITBOX_RADIUS,
            f32::MAX,
        );

        let scheduler = &mut self.scheduler;
        scheduler.switch_interval = clamp_param(
            "scheduler.switch_interval",
            scheduler.switch_interval,
            MIN_SWITCH_INTERVAL,
            f32::MAX,
        );
        scheduler.simultaneous = clamp_count("scheduler.simultaneous", scheduler.simultaneous, 1);

        self.patterns = self.patterns.into_iter().map(PatternConfig::sanitized).collect();
        self
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// Clamp a float parameter into `[min, max]`; NaN becomes `min`
pub(crate) fn clamp_param(name: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = if value.is_nan() { min } else { value.max(min).min(max) };
    if clamped != value {
        log::warn!("{} = {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

/// Clamp a count parameter to at least `min`
pub(crate) fn clamp_count(name: &str, value: usize, min: usize) -> usize {
    if value < min {
        log::warn!("{} = {} out of range, clamped to {}", name, value, min);
        min
    } else {
        value
    }
}
