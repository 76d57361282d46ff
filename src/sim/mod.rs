//! Deterministic simulation module
//!
//! All bullet logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (live-list order within a pass)
//! - No rendering, input or platform dependencies

pub mod collision;
pub mod pattern;
pub mod pool;
pub mod projectile;
pub mod scheduler;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{CollisionDetector, CollisionSettings, Hitbox, PassReport, circles_overlap};
pub use pattern::{
    AcceleratingParams, AcceleratingPattern, Pattern, PatternConfig, PatternStatus, Shape,
    SpiralParams, SpiralPattern, SpreadParams, SpreadPattern, StraightParams, StraightPattern,
    TargetedParams, TargetedPattern,
};
pub use pool::{PoolSettings, ProjectileHandle, ProjectilePool};
pub use projectile::{Acceleration, Deactivation, Projectile, ProjectileKind, StepOutcome};
pub use scheduler::{PatternScheduler, RotationMode, SchedulerPhase, SchedulerSettings};
pub use spawner::{SpawnArea, Spawner, SpawnerBinding, fan_angles};
pub use state::{Diagnostics, SessionStats, SimEvent, Simulation};
pub use tick::{TickInput, tick};
