//! Bullet Storm - bullet-hell simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (projectile pool, spawn patterns, scheduler, hit detection)
//! - `settings`: Data-driven tuning for every component
//! - `error`: Error taxonomy shared by the simulation and settings loader

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SettingsError, SimError};
pub use settings::{DifficultyPreset, Settings};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Projectile defaults
    pub const BULLET_LIFETIME: f32 = 10.0;
    pub const BULLET_RADIUS: f32 = 0.3;
    /// Sprites point "up" at rest, so travel direction is offset by 90 degrees
    pub const SPRITE_ANGLE_OFFSET: f32 = 90.0;

    /// Pool defaults
    pub const POOL_INITIAL_SIZE: usize = 100;
    pub const POOL_CAPACITY: usize = 500;

    /// Player hitbox defaults (smaller than the sprite for fair dodging)
    pub const PLAYER_HITBOX_RADIUS: f32 = 0.2;
    pub const MIN_HITBOX_RADIUS: f32 = 0.1;

    /// Collision pass defaults
    pub const CHECK_INTERVAL: f32 = 0.02;
    pub const MIN_CHECK_INTERVAL: f32 = 0.01;
    pub const MAX_CHECKS_PER_PASS: usize = 100;

    /// Scheduler defaults
    pub const SWITCH_INTERVAL: f32 = 10.0;
    pub const MIN_SWITCH_INTERVAL: f32 = 1.0;
}

/// Straight down in world space (y grows upward)
pub const DOWN: Vec2 = Vec2::NEG_Y;

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit direction for an angle in degrees (0° = +x, counter-clockwise)
#[inline]
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Bearing of a direction vector in degrees
#[inline]
pub fn degrees_from_direction(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x).to_degrees()
}
