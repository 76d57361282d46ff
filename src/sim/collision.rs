//! Bullet vs. player hitbox detection
//!
//! Passes run on their own fixed interval rather than every tick, and each
//! pass tests at most `max_checks_per_pass` bullets. When the cap is smaller
//! than the live set, successive passes resume where the last one stopped so
//! every bullet is eventually tested.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::{ProjectileHandle, ProjectilePool};
use super::projectile::Deactivation;
use crate::consts::*;

/// Detector tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Seconds between passes
    pub check_interval: f32,
    pub max_checks_per_pass: usize,
    /// Base bullet collision radius (scaled per bullet)
    pub bullet_radius: f32,
    /// Player hitbox radius used by the headless driver
    pub player_radius: f32,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            check_interval: CHECK_INTERVAL,
            max_checks_per_pass: MAX_CHECKS_PER_PASS,
            bullet_radius: BULLET_RADIUS,
            player_radius: PLAYER_HITBOX_RADIUS,
        }
    }
}

/// Player hitbox as seen by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub center: Vec2,
    pub radius: f32,
}

impl Hitbox {
    /// Radius is clamped to `MIN_HITBOX_RADIUS`
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(MIN_HITBOX_RADIUS),
        }
    }
}

/// Circle-circle overlap (touching does not count)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Outcome of one detector pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    /// Live bullets examined
    pub checked: usize,
    /// Snapshot entries that were no longer live
    pub pruned: usize,
    /// Bullet credited with the hit, if any
    pub hit: Option<ProjectileHandle>,
}

pub struct CollisionDetector {
    check_interval: f32,
    max_checks_per_pass: usize,
    bullet_radius: f32,
    accumulator: f32,
    /// Live-set snapshot for the current sweep
    scratch: Vec<ProjectileHandle>,
    cursor: usize,
    hit_reported: bool,
}

impl CollisionDetector {
    pub fn new(settings: &CollisionSettings) -> Self {
        Self {
            check_interval: settings.check_interval.max(MIN_CHECK_INTERVAL),
            max_checks_per_pass: settings.max_checks_per_pass.max(1),
            bullet_radius: settings.bullet_radius.max(0.0),
            accumulator: 0.0,
            scratch: Vec::new(),
            cursor: 0,
            hit_reported: false,
        }
    }

    pub fn check_interval(&self) -> f32 {
        self.check_interval
    }

    pub fn set_check_interval(&mut self, seconds: f32) {
        self.check_interval = seconds.max(MIN_CHECK_INTERVAL);
    }

    pub fn set_max_checks_per_pass(&mut self, count: usize) {
        self.max_checks_per_pass = count.max(1);
    }

    pub fn bullet_radius(&self) -> f32 {
        self.bullet_radius
    }

    /// True once the session's terminal hit has been reported
    pub fn has_reported_hit(&self) -> bool {
        self.hit_reported
    }

    /// Forget the reported hit and all pass state (new session)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.scratch.clear();
        self.cursor = 0;
        self.hit_reported = false;
    }

    /// Advance the pass timer; runs a pass when it is due.
    ///
    /// Returns `None` when no pass ran this tick.
    pub fn update(
        &mut self,
        dt: f32,
        active: bool,
        hitbox: Option<Hitbox>,
        invincible: bool,
        pool: &mut ProjectilePool,
    ) -> Option<PassReport> {
        if !active {
            self.scratch.clear();
            self.accumulator = 0.0;
            return None;
        }

        self.accumulator += dt;
        if self.accumulator < self.check_interval {
            return None;
        }
        self.accumulator = 0.0;

        let Some(hitbox) = hitbox else {
            log::debug!("Collision pass skipped: no player hitbox");
            return None;
        };
        Some(self.pass(hitbox, invincible, pool))
    }

    /// One bounded pass over the live set.
    ///
    /// The live set is snapshotted at the start of each sweep; a sweep spans
    /// several passes when it holds more than `max_checks_per_pass` bullets,
    /// and entries that died in between are pruned. Bullets spawned on the
    /// pool's current tick are skipped. After the first hit the rest of the
    /// pass only prunes.
    pub fn pass(&mut self, hitbox: Hitbox, invincible: bool, pool: &mut ProjectilePool) -> PassReport {
        let mut report = PassReport::default();

        if self.cursor == 0 || self.cursor >= self.scratch.len() {
            self.scratch.clear();
            self.scratch.extend(pool.live_handles());
            self.cursor = 0;
        }

        let start = self.cursor;
        let end = (start + self.max_checks_per_pass).min(self.scratch.len());
        let tick = pool.current_tick();
        let scoring = !invincible && !self.hit_reported;

        for i in start..end {
            let handle = self.scratch[i];
            let Some(bullet) = pool.get(handle) else {
                report.pruned += 1;
                continue;
            };
            report.checked += 1;

            if !scoring || report.hit.is_some() || bullet.spawn_tick == tick {
                continue;
            }

            let radius = bullet.collision_radius(self.bullet_radius);
            if circles_overlap(hitbox.center, hitbox.radius, bullet.pos, radius) {
                pool.deactivate(handle, Deactivation::Collided);
                report.hit = Some(handle);
            }
        }
        self.cursor = if end >= self.scratch.len() { 0 } else { end };

        if report.pruned > 0 {
            log::trace!("Collision pass pruned {} stale entries", report.pruned);
        }
        if let Some(handle) = report.hit {
            self.hit_reported = true;
            log::info!("Player hit by projectile {}", handle);
        }
        report
    }
}
