//! Simulation context
//!
//! Owns every piece of mutable simulation state: the pool, the spawn band,
//! the seeded RNG, the scheduler with its patterns and the collision
//! detector. Outputs leave through an event queue drained by the caller.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::CollisionDetector;
use super::pattern::{Pattern, PatternStatus};
use super::pool::{ProjectileHandle, ProjectilePool};
use super::projectile::Deactivation;
use super::scheduler::{PatternScheduler, SchedulerPhase};
use super::spawner::{SpawnArea, Spawner};
use crate::settings::Settings;

/// Events emitted by the simulation, in tick order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// First confirmed hit of the session
    PlayerHit {
        projectile: ProjectileHandle,
        /// Hitbox center at the time of the hit
        position: Vec2,
        tick: u64,
    },
}

/// Per-session counters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Seconds spent with the gate high
    pub survival_time: f32,
    /// Bullets that expired or left the view without hitting the player
    pub dodged: u64,
    /// Bullets spawned by patterns
    pub spawned: u64,
}

/// Snapshot for HUDs, logs and tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub tick: u64,
    pub live: usize,
    pub free: usize,
    pub allocated: usize,
    pub capacity: usize,
    pub scheduler: SchedulerPhase,
    pub active_patterns: usize,
    pub patterns: Vec<PatternStatus>,
    pub stats: SessionStats,
    pub hit_reported: bool,
    pub invincible_for: f32,
}

/// Complete simulation state
pub struct Simulation {
    pub(crate) settings: Settings,
    pub(crate) pool: ProjectilePool,
    pub(crate) spawn_area: SpawnArea,
    pub(crate) rng: Pcg32,
    pub(crate) scheduler: PatternScheduler,
    pub(crate) detector: CollisionDetector,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) stats: SessionStats,
    /// Remaining granted invincibility (seconds)
    pub(crate) invincibility: f32,
    pub(crate) time_ticks: u64,
}

impl Simulation {
    /// Build a ready-to-run simulation; settings are sanitized first
    pub fn new(settings: Settings) -> Self {
        let settings = settings.sanitized();
        let patterns = settings.patterns.iter().map(Pattern::from_config).collect();

        let mut sim = Self {
            pool: ProjectilePool::new(&settings.pool),
            spawn_area: settings.spawn_area,
            rng: Pcg32::seed_from_u64(settings.seed),
            scheduler: PatternScheduler::new(&settings.scheduler, patterns),
            detector: CollisionDetector::new(&settings.collision),
            events: Vec::new(),
            stats: SessionStats::default(),
            invincibility: 0.0,
            time_ticks: 0,
            settings,
        };
        sim.bind_scheduler();
        log::info!(
            "Simulation ready: seed {}, {} patterns, pool capacity {}",
            sim.settings.seed,
            sim.scheduler.patterns().len(),
            sim.pool.capacity()
        );
        sim
    }

    /// Default settings with the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Settings {
            seed,
            ..Settings::default()
        })
    }

    fn bind_scheduler(&mut self) {
        let spawner = Spawner::new(&mut self.pool, &mut self.spawn_area, &mut self.rng);
        self.scheduler.bind(&spawner);
    }

    /// Spawn façade over this simulation's pool
    pub fn spawner(&mut self) -> Spawner<'_> {
        Spawner::new(&mut self.pool, &mut self.spawn_area, &mut self.rng)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pool(&self) -> &ProjectilePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ProjectilePool {
        &mut self.pool
    }

    pub fn scheduler(&self) -> &PatternScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PatternScheduler {
        &mut self.scheduler
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut CollisionDetector {
        &mut self.detector
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Move the random-top band; patterns are rebound to the new spawn line
    pub fn set_spawn_area(&mut self, width: f32, height: f32, top_y: f32) {
        self.spawner().set_spawn_area(width, height, top_y);
        self.bind_scheduler();
    }

    /// A bullet left the visible play area. Counts as dodged; no-op on stale handles.
    pub fn notify_out_of_view(&mut self, handle: ProjectileHandle) -> bool {
        if self.pool.deactivate(handle, Deactivation::OutOfBounds) {
            self.stats.dodged += 1;
            true
        } else {
            false
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Suppress hits for `seconds` of active time
    pub fn grant_invincibility(&mut self, seconds: f32) {
        self.invincibility = self.invincibility.max(seconds.max(0.0));
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0.0
    }

    /// Clear bullets, patterns, hit state and counters for a new session.
    ///
    /// The RNG is not reseeded; the scheduler restarts from its first block on
    /// the next active tick.
    pub fn reset_session(&mut self) {
        let cleared = self.pool.recycle_all();
        self.scheduler.reset();
        self.detector.reset();
        self.events.clear();
        self.stats = SessionStats::default();
        self.invincibility = 0.0;
        log::info!("Session reset ({} bullets cleared)", cleared);
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            tick: self.time_ticks,
            live: self.pool.live_count(),
            free: self.pool.free_count(),
            allocated: self.pool.allocated(),
            capacity: self.pool.capacity(),
            scheduler: self.scheduler.phase(),
            active_patterns: self.scheduler.active_count(),
            patterns: self.scheduler.pattern_status(),
            stats: self.stats,
            hit_reported: self.detector.has_reported_hit(),
            invincible_for: self.invincibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::ProjectileKind;

    #[test]
    fn test_new_binds_scheduler() {
        let sim = Simulation::with_seed(1);
        assert_eq!(sim.scheduler().phase(), SchedulerPhase::Ready);
        assert!(sim.scheduler().patterns().iter().all(Pattern::is_bound));
        assert_eq!(sim.pool().allocated(), crate::consts::POOL_INITIAL_SIZE);
    }

    #[test]
    fn test_out_of_view_counts_once() {
        let mut sim = Simulation::with_seed(1);
        let handle = sim
            .spawner()
            .spawn(Vec2::ZERO, Vec2::NEG_Y, 1.0, ProjectileKind::Normal)
            .unwrap();
        assert!(sim.notify_out_of_view(handle));
        assert!(!sim.notify_out_of_view(handle));
        assert_eq!(sim.stats().dodged, 1);
        assert_eq!(sim.pool().live_count(), 0);
    }

    #[test]
    fn test_reset_session_clears_everything() {
        let mut sim = Simulation::with_seed(1);
        for _ in 0..5 {
            sim.spawner()
                .spawn_from_random_top(2.0, ProjectileKind::Normal)
                .unwrap();
        }
        sim.grant_invincibility(3.0);
        sim.stats.dodged = 4;
        sim.reset_session();

        let diag = sim.diagnostics();
        assert_eq!(diag.live, 0);
        assert_eq!(diag.free, diag.allocated);
        assert_eq!(diag.stats, SessionStats::default());
        assert!(!sim.is_invincible());
    }

    #[test]
    fn test_set_spawn_area_rebinds_patterns() {
        let mut sim = Simulation::with_seed(1);
        sim.set_spawn_area(4.0, 1.0, 7.5);
        let h = sim
            .spawner()
            .spawn_from_random_top(1.0, ProjectileKind::Normal)
            .unwrap();
        let bullet = sim.pool().get(h).unwrap();
        assert_eq!(bullet.pos.y, 7.5);
        assert!(bullet.pos.x.abs() <= 2.0);
    }

    #[test]
    fn test_set_spawn_area_with_infinite_width_keeps_spawning() {
        let mut sim = Simulation::with_seed(1);
        sim.set_spawn_area(f32::INFINITY, 1.0, 5.0);
        let h = sim
            .spawner()
            .spawn_from_random_top(1.0, ProjectileKind::Normal)
            .unwrap();
        assert!(sim.pool().get(h).unwrap().pos.x.is_finite());
    }

    #[test]
    fn test_diagnostics_serialize() {
        let sim = Simulation::with_seed(5);
        let json = serde_json::to_string(&sim.diagnostics()).unwrap();
        assert!(json.contains("\"scheduler\":\"Ready\""));
        assert!(json.contains("StraightPattern"));
    }
}
