//! Semantic spawn operations over the projectile pool
//!
//! The spawner is a short-lived view assembled once per tick from the pieces
//! the simulation owns (pool, spawn area, RNG). Patterns receive it by `&mut`
//! and never hold on to it.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::{ProjectileHandle, ProjectilePool};
use super::projectile::ProjectileKind;
use crate::error::SimError;
use crate::settings::clamp_param;
use crate::{DOWN, direction_from_degrees};

/// Band along the top of the play area where random bullets appear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnArea {
    /// Horizontal extent, centered on x = 0
    pub width: f32,
    /// Vertical extent (informational; spawns use `top_y`)
    pub height: f32,
    /// World y of the spawn line
    pub top_y: f32,
}

impl Default for SpawnArea {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 2.0,
            top_y: 5.0,
        }
    }
}

/// What a pattern keeps from the spawner it was initialized with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnerBinding {
    /// Spawn line y at bind time
    pub top_y: f32,
}

/// Angles (degrees) of `count` bullets fanned evenly across `spread` around `center`
///
/// A single bullet always flies at exactly `center`.
pub fn fan_angles(count: usize, center: f32, spread: f32) -> impl Iterator<Item = f32> {
    let start = center - spread * 0.5;
    let step = if count > 1 {
        spread / (count - 1) as f32
    } else {
        0.0
    };
    (0..count).map(move |i| {
        if count == 1 {
            center
        } else {
            start + step * i as f32
        }
    })
}

/// Spawn façade
pub struct Spawner<'a> {
    pool: &'a mut ProjectilePool,
    area: &'a mut SpawnArea,
    rng: &'a mut Pcg32,
}

impl<'a> Spawner<'a> {
    pub fn new(pool: &'a mut ProjectilePool, area: &'a mut SpawnArea, rng: &'a mut Pcg32) -> Self {
        Self { pool, area, rng }
    }

    /// Snapshot handed to patterns on initialization
    pub fn binding(&self) -> SpawnerBinding {
        SpawnerBinding {
            top_y: self.area.top_y,
        }
    }

    pub fn area(&self) -> &SpawnArea {
        &*self.area
    }

    /// Reconfigure the random-top band (e.g. after a viewport change)
    pub fn set_spawn_area(&mut self, width: f32, height: f32, top_y: f32) {
        self.area.width = clamp_param("spawn_area.width", width, 0.0, f32::MAX);
        self.area.height = clamp_param("spawn_area.height", height, 0.0, f32::MAX);
        if top_y.is_finite() {
            self.area.top_y = top_y;
        } else {
            log::warn!("spawn_area.top_y = {} ignored, keeping {}", top_y, self.area.top_y);
        }
    }

    /// Shared simulation RNG
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut *self.rng
    }

    pub fn pool(&self) -> &ProjectilePool {
        &*self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ProjectilePool {
        &mut *self.pool
    }

    /// Spawn one bullet
    pub fn spawn(
        &mut self,
        pos: Vec2,
        dir: Vec2,
        speed: f32,
        kind: ProjectileKind,
    ) -> Result<ProjectileHandle, SimError> {
        let result = self.pool.spawn(pos, dir, speed, kind);
        match &result {
            Ok(handle) => log::trace!("Spawned {:?} bullet {} at {}", kind, handle, pos),
            Err(err) => log::warn!("Spawn dropped: {}", err),
        }
        result
    }

    /// Spawn one bullet flying at `degrees`
    pub fn spawn_at_angle(
        &mut self,
        pos: Vec2,
        degrees: f32,
        speed: f32,
        kind: ProjectileKind,
    ) -> Result<ProjectileHandle, SimError> {
        self.spawn(pos, direction_from_degrees(degrees), speed, kind)
    }

    /// Spawn a falling bullet at a random x along the top band
    pub fn spawn_from_random_top(
        &mut self,
        speed: f32,
        kind: ProjectileKind,
    ) -> Result<ProjectileHandle, SimError> {
        let half = self.area.width * 0.5;
        let x = if half > 0.0 && half.is_finite() {
            self.rng.random_range(-half..half)
        } else {
            0.0
        };
        let pos = Vec2::new(x, self.area.top_y);
        self.spawn(pos, DOWN, speed, kind)
    }

    /// Spawn a fan of `count` bullets; returns how many made it out of the pool
    pub fn spawn_spread_fan(
        &mut self,
        center: Vec2,
        count: usize,
        speed: f32,
        center_angle: f32,
        spread_angle: f32,
        kind: ProjectileKind,
    ) -> usize {
        fan_angles(count, center_angle, spread_angle)
            .filter(|&angle| self.spawn_at_angle(center, angle, speed, kind).is_ok())
            .count()
    }

    /// Spawn `count` bullets evenly around a full circle
    pub fn spawn_ring(
        &mut self,
        center: Vec2,
        count: usize,
        speed: f32,
        start_angle: f32,
        kind: ProjectileKind,
    ) -> usize {
        if count == 0 {
            return 0;
        }
        let step = 360.0 / count as f32;
        (0..count)
            .filter(|&i| {
                self.spawn_at_angle(center, start_angle + step * i as f32, speed, kind)
                    .is_ok()
            })
            .count()
    }

    /// Spawn a bullet aimed at `target`; straight down when there is none
    pub fn spawn_targeted(
        &mut self,
        pos: Vec2,
        target: Option<Vec2>,
        speed: f32,
        kind: ProjectileKind,
    ) -> Result<ProjectileHandle, SimError> {
        let dir = target
            .map(|t| (t - pos).normalize_or_zero())
            .filter(|d| *d != Vec2::ZERO)
            .unwrap_or(DOWN);
        self.spawn(pos, dir, speed, kind)
    }

    /// Return a bullet to the pool (idempotent)
    pub fn recycle(&mut self, handle: ProjectileHandle) -> bool {
        self.pool.recycle(handle)
    }
}
