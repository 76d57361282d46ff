//! Pooled projectile entity
//!
//! A projectile lives in exactly one pool slot for its whole existence. The
//! pool flips it between dormant and active; while active it advances itself
//! once per tick (aging, acceleration, travel, spin).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::degrees_from_direction;

/// Which pattern family fired the projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectileKind {
    #[default]
    Normal,
    Spiral,
    Targeted,
    Accelerating,
}

/// Linear speed-up with a hard cap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    /// Speed gained per second
    pub rate: f32,
    /// Speed never exceeds this
    pub max_speed: f32,
}

/// Why an active projectile went back to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deactivation {
    /// Age reached lifetime
    Expired,
    /// View collaborator reported it left the play area
    OutOfBounds,
    /// Struck the player hitbox
    Collided,
    /// Returned explicitly (recycle / clear)
    Recycled,
}

/// Result of a single motion step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still active
    Moved,
    /// Lifetime elapsed this step; caller must return the slot
    Expired,
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Unit travel direction
    pub dir: Vec2,
    /// Base speed set at spawn
    pub speed: f32,
    /// Speed after acceleration
    pub current_speed: f32,
    pub acceleration: Option<Acceleration>,
    /// Sprite orientation (degrees)
    pub rotation: f32,
    /// Continuous spin (degrees/sec), independent of travel
    pub rotation_rate: f32,
    pub age: f32,
    pub lifetime: f32,
    pub kind: ProjectileKind,
    /// Multiplier on the configured collision radius
    pub radius_scale: f32,
    /// Tick on which it was last activated
    pub spawn_tick: u64,
    alive: bool,
}

impl Projectile {
    /// A dormant slot occupant
    pub fn dormant(lifetime: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            dir: Vec2::ZERO,
            speed: 0.0,
            current_speed: 0.0,
            acceleration: None,
            rotation: 0.0,
            rotation_rate: 0.0,
            age: 0.0,
            lifetime,
            kind: ProjectileKind::Normal,
            radius_scale: 1.0,
            spawn_tick: 0,
            alive: false,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Bring a dormant projectile to life
    pub fn activate(
        &mut self,
        pos: Vec2,
        dir: Vec2,
        speed: f32,
        kind: ProjectileKind,
        rotate_to_direction: bool,
        tick: u64,
    ) {
        self.pos = pos;
        self.speed = speed.max(0.0);
        self.current_speed = self.speed;
        self.acceleration = None;
        self.rotation = 0.0;
        self.rotation_rate = 0.0;
        self.age = 0.0;
        self.kind = kind;
        self.radius_scale = 1.0;
        self.spawn_tick = tick;
        self.alive = true;
        self.set_direction(dir, rotate_to_direction);
    }

    /// Set travel direction (normalized); optionally face it
    pub fn set_direction(&mut self, dir: Vec2, rotate_to_direction: bool) {
        self.dir = dir.normalize_or_zero();
        if rotate_to_direction && self.dir != Vec2::ZERO {
            self.rotation = degrees_from_direction(self.dir) - SPRITE_ANGLE_OFFSET;
        }
    }

    /// Override base speed (also resets the accelerated speed)
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
        self.current_speed = self.speed;
    }

    /// Enable acceleration toward `max_speed`
    pub fn set_acceleration(&mut self, rate: f32, max_speed: f32) {
        self.acceleration = Some(Acceleration {
            rate,
            max_speed: max_speed.max(0.0),
        });
    }

    /// Collision radius given the configured base radius
    #[inline]
    pub fn collision_radius(&self, base_radius: f32) -> f32 {
        base_radius * self.radius_scale.abs()
    }

    /// Advance one tick
    ///
    /// Aging is checked before motion: a projectile whose age reaches its
    /// lifetime does not move on that step.
    pub fn step(&mut self, dt: f32) -> StepOutcome {
        if !self.alive {
            return StepOutcome::Moved;
        }

        self.age += dt;
        if self.age >= self.lifetime {
            return StepOutcome::Expired;
        }

        if let Some(accel) = self.acceleration {
            self.current_speed = (self.current_speed + accel.rate * dt).min(accel.max_speed);
        }

        self.pos += self.dir * self.current_speed * dt;

        if self.rotation_rate != 0.0 {
            self.rotation = crate::wrap_degrees(self.rotation + self.rotation_rate * dt);
        }

        StepOutcome::Moved
    }

    /// Return to dormant; clears everything a pattern could observe.
    /// Returns false if it was already dormant.
    pub fn deactivate(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        let lifetime = self.lifetime;
        *self = Self::dormant(lifetime);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DOWN;

    fn active(speed: f32) -> Projectile {
        let mut p = Projectile::dormant(BULLET_LIFETIME);
        p.activate(Vec2::ZERO, Vec2::new(0.0, -2.0), speed, ProjectileKind::Normal, true, 1);
        p
    }

    #[test]
    fn test_activate_normalizes_and_faces_direction() {
        let p = active(3.0);
        assert!(p.is_alive());
        assert!((p.dir - DOWN).length() < 1e-6);
        assert_eq!(p.current_speed, 3.0);
        assert_eq!(p.age, 0.0);
        // atan2(-1, 0) = -90°, minus the sprite offset
        assert!((p.rotation + 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_step_moves_along_direction() {
        let mut p = active(3.0);
        assert_eq!(p.step(0.5), StepOutcome::Moved);
        assert!((p.pos - Vec2::new(0.0, -1.5)).length() < 1e-5);
    }

    #[test]
    fn test_acceleration_is_capped() {
        let mut p = active(2.0);
        p.set_acceleration(3.0, 8.0);
        for _ in 0..10 {
            p.step(1.0 / 60.0);
        }
        assert!((p.current_speed - 2.5).abs() < 1e-4);
        for _ in 0..5 {
            p.step(1.0);
        }
        assert_eq!(p.current_speed, 8.0);
    }

    #[test]
    fn test_expires_at_lifetime_without_moving() {
        let mut p = active(1.0);
        p.lifetime = 1.0;
        assert_eq!(p.step(0.5), StepOutcome::Moved);
        let before = p.pos;
        assert_eq!(p.step(0.5), StepOutcome::Expired);
        assert_eq!(p.pos, before);
    }

    #[test]
    fn test_spin_is_independent_of_travel() {
        let mut p = active(1.0);
        p.rotation_rate = 90.0;
        let start = p.rotation;
        p.step(1.0);
        assert!((p.dir - DOWN).length() < 1e-6);
        assert!((crate::wrap_degrees(start + 90.0) - p.rotation).abs() < 1e-3);
    }

    #[test]
    fn test_deactivate_is_idempotent_and_clears_state() {
        let mut p = active(4.0);
        p.kind = ProjectileKind::Spiral;
        p.set_acceleration(1.0, 5.0);
        assert!(p.deactivate());
        assert!(!p.deactivate());
        assert!(!p.is_alive());
        assert_eq!(p.kind, ProjectileKind::Normal);
        assert!(p.acceleration.is_none());
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.lifetime, BULLET_LIFETIME);
    }
}
