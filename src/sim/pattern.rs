//! Bullet patterns
//!
//! Every pattern is the same small state machine (idle/running plus a spawn
//! timer) wrapped around a shape that decides *what* to fire:
//!
//! - `Straight`: falling bullets from the top band, with optional difficulty ramp
//! - `Spiral`: rotating arms around an emitter
//! - `Spread`: a fixed fan
//! - `Targeted`: aimed at the player, single shot or fan
//! - `Accelerating`: slow bullets that speed up, optionally from a weaving origin
//!
//! Parameters come from `PatternConfig` records (data-driven tuning); the
//! runtime wrappers add the phase state each shape needs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::ProjectileKind;
use super::spawner::{Spawner, SpawnerBinding};
use crate::error::SimError;
use crate::settings::{clamp_count, clamp_param};
use crate::{DOWN, degrees_from_direction, wrap_degrees};

/// Shortest spawn interval any pattern accepts (seconds)
pub const MIN_SPAWN_INTERVAL: f32 = 0.01;

/// Straight-fall parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StraightParams {
    pub spawn_interval: f32,
    pub speed: f32,
    /// 1 = random x along the top band, N = evenly spaced across `spawn_width`
    pub bullets_per_spawn: usize,
    pub spawn_width: f32,
    pub difficulty_scaling: bool,
    /// Floor for the ramped interval
    pub min_interval: f32,
    /// Interval shrink per second of running time
    pub interval_decay: f32,
    /// Speed gain per second of running time
    pub speed_gain: f32,
}

impl Default for StraightParams {
    fn default() -> Self {
        Self {
            spawn_interval: 0.5,
            speed: 3.0,
            bullets_per_spawn: 1,
            spawn_width: 2.0,
            difficulty_scaling: true,
            min_interval: 0.1,
            interval_decay: 0.01,
            speed_gain: 0.01,
        }
    }
}

/// Rotating spiral parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralParams {
    pub spawn_interval: f32,
    pub speed: f32,
    pub origin: Vec2,
    pub center_offset: Vec2,
    /// Degrees per second
    pub rotation_speed: f32,
    pub arms: usize,
    pub clockwise: bool,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            spawn_interval: 0.1,
            speed: 3.0,
            origin: Vec2::new(0.0, 3.0),
            center_offset: Vec2::ZERO,
            rotation_speed: 180.0,
            arms: 1,
            clockwise: true,
        }
    }
}

/// Fixed fan parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    pub spawn_interval: f32,
    pub speed: f32,
    pub origin: Vec2,
    pub bullet_count: usize,
    /// Total fan width (degrees, 0..=360)
    pub spread_angle: f32,
    /// Fan bisector (degrees)
    pub center_angle: f32,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            spawn_interval: 1.0,
            speed: 3.0,
            origin: Vec2::new(0.0, 4.0),
            bullet_count: 8,
            spread_angle: 120.0,
            center_angle: -90.0,
        }
    }
}

/// Aimed-shot parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetedParams {
    pub spawn_interval: f32,
    pub speed: f32,
    pub origin: Vec2,
    pub bullets_per_shot: usize,
    /// Fan width around the bearing to the target (degrees)
    pub spread_angle: f32,
    /// Follow the player position every tick
    pub track_player: bool,
}

impl Default for TargetedParams {
    fn default() -> Self {
        Self {
            spawn_interval: 0.8,
            speed: 4.0,
            origin: Vec2::new(0.0, 4.5),
            bullets_per_shot: 1,
            spread_angle: 0.0,
            track_player: true,
        }
    }
}

/// Accelerating-bullet parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratingParams {
    pub spawn_interval: f32,
    pub initial_speed: f32,
    pub max_speed: f32,
    /// Speed gained per second by each bullet
    pub acceleration: f32,
    pub origin: Vec2,
    /// Weave the spawn x with a sine of running time
    pub wave: bool,
    pub wave_amplitude: f32,
    pub wave_frequency: f32,
}

impl Default for AcceleratingParams {
    fn default() -> Self {
        Self {
            spawn_interval: 0.6,
            initial_speed: 2.0,
            max_speed: 8.0,
            acceleration: 3.0,
            origin: Vec2::new(0.0, 5.0),
            wave: false,
            wave_amplitude: 1.0,
            wave_frequency: 2.0,
        }
    }
}

/// One registered pattern, as it appears in settings files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PatternConfig {
    Straight(StraightParams),
    Spiral(SpiralParams),
    Spread(SpreadParams),
    Targeted(TargetedParams),
    Accelerating(AcceleratingParams),
}

impl PatternConfig {
    /// One of each shape with stock tuning, in rotation order
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::Straight(StraightParams::default()),
            Self::Spiral(SpiralParams::default()),
            Self::Spread(SpreadParams::default()),
            Self::Targeted(TargetedParams::default()),
            Self::Accelerating(AcceleratingParams::default()),
        ]
    }

    /// Clamp every parameter into its valid range
    pub fn sanitized(self) -> Self {
        match self {
            Self::Straight(mut p) => {
                p.spawn_interval = clamp_param("straight.spawn_interval", p.spawn_interval, MIN_SPAWN_INTERVAL, f32::MAX);
                p.speed = clamp_param("straight.speed", p.speed, 0.0, f32::MAX);
                p.bullets_per_spawn = clamp_count("straight.bullets_per_spawn", p.bullets_per_spawn, 1);
                p.spawn_width = clamp_param("straight.spawn_width", p.spawn_width, 0.0, f32::MAX);
                p.min_interval = clamp_param("straight.min_interval", p.min_interval, MIN_SPAWN_INTERVAL, p.spawn_interval);
                p.interval_decay = clamp_param("straight.interval_decay", p.interval_decay, 0.0, f32::MAX);
                Self::Straight(p)
            }
            Self::Spiral(mut p) => {
                p.spawn_interval = clamp_param("spiral.spawn_interval", p.spawn_interval, MIN_SPAWN_INTERVAL, f32::MAX);
                p.speed = clamp_param("spiral.speed", p.speed, 0.0, f32::MAX);
                p.arms = clamp_count("spiral.arms", p.arms, 1);
                Self::Spiral(p)
            }
            Self::Spread(mut p) => {
                p.spawn_interval = clamp_param("spread.spawn_interval", p.spawn_interval, MIN_SPAWN_INTERVAL, f32::MAX);
                p.speed = clamp_param("spread.speed", p.speed, 0.0, f32::MAX);
                p.bullet_count = clamp_count("spread.bullet_count", p.bullet_count, 1);
                p.spread_angle = clamp_param("spread.spread_angle", p.spread_angle, 0.0, 360.0);
                Self::Spread(p)
            }
            Self::Targeted(mut p) => {
                p.spawn_interval = clamp_param("targeted.spawn_interval", p.spawn_interval, MIN_SPAWN_INTERVAL, f32::MAX);
                p.speed = clamp_param("targeted.speed", p.speed, 0.0, f32::MAX);
                p.bullets_per_shot = clamp_count("targeted.bullets_per_shot", p.bullets_per_shot, 1);
                p.spread_angle = clamp_param("targeted.spread_angle", p.spread_angle, 0.0, 360.0);
                Self::Targeted(p)
            }
            Self::Accelerating(mut p) => {
                p.spawn_interval = clamp_param("accelerating.spawn_interval", p.spawn_interval, MIN_SPAWN_INTERVAL, f32::MAX);
                p.initial_speed = clamp_param("accelerating.initial_speed", p.initial_speed, 0.0, f32::MAX);
                p.max_speed = clamp_param("accelerating.max_speed", p.max_speed, p.initial_speed, f32::MAX);
                Self::Accelerating(p)
            }
        }
    }

    /// Scale spawn intervals and bullet speeds (difficulty presets)
    pub fn scaled(self, interval_factor: f32, speed_factor: f32) -> Self {
        match self {
            Self::Straight(mut p) => {
                p.spawn_interval *= interval_factor;
                p.min_interval *= interval_factor;
                p.speed *= speed_factor;
                Self::Straight(p)
            }
            Self::Spiral(mut p) => {
                p.spawn_interval *= interval_factor;
                p.speed *= speed_factor;
                Self::Spiral(p)
            }
            Self::Spread(mut p) => {
                p.spawn_interval *= interval_factor;
                p.speed *= speed_factor;
                Self::Spread(p)
            }
            Self::Targeted(mut p) => {
                p.spawn_interval *= interval_factor;
                p.speed *= speed_factor;
                Self::Targeted(p)
            }
            Self::Accelerating(mut p) => {
                p.spawn_interval *= interval_factor;
                p.initial_speed *= speed_factor;
                p.max_speed *= speed_factor;
                Self::Accelerating(p)
            }
        }
    }
}

/// Straight-fall runtime
#[derive(Debug, Clone)]
pub struct StraightPattern {
    params: StraightParams,
    running_time: f32,
    current_interval: f32,
    current_speed: f32,
}

impl StraightPattern {
    pub fn new(params: StraightParams) -> Self {
        let mut pattern = Self {
            current_interval: params.spawn_interval,
            current_speed: params.speed,
            running_time: 0.0,
            params,
        };
        pattern.reset();
        pattern
    }

    pub fn params(&self) -> &StraightParams {
        &self.params
    }

    /// Back to base interval/speed, running time cleared
    pub fn reset(&mut self) {
        self.running_time = 0.0;
        self.current_interval = self.params.spawn_interval;
        self.current_speed = self.params.speed;
    }

    /// Current (interval, speed) after difficulty ramp
    pub fn difficulty_info(&self) -> (f32, f32) {
        (self.current_interval, self.current_speed)
    }

    /// New base interval; the ramp floor never sits above it
    pub fn set_spawn_interval(&mut self, interval: f32) {
        let p = &mut self.params;
        p.spawn_interval = clamp_param("straight.spawn_interval", interval, MIN_SPAWN_INTERVAL, f32::MAX);
        p.min_interval = p.min_interval.min(p.spawn_interval);
        self.ramp();
    }

    pub fn set_bullet_speed(&mut self, speed: f32) {
        self.params.speed = clamp_param("straight.speed", speed, 0.0, f32::MAX);
        self.ramp();
    }

    pub fn set_bullets_per_spawn(&mut self, count: usize) {
        self.params.bullets_per_spawn = clamp_count("straight.bullets_per_spawn", count, 1);
    }

    pub fn set_difficulty_scaling(&mut self, enabled: bool) {
        self.params.difficulty_scaling = enabled;
    }

    fn advance(&mut self, dt: f32) {
        if !self.params.difficulty_scaling {
            return;
        }
        self.running_time += dt;
        self.ramp();
    }

    fn ramp(&mut self) {
        let p = &self.params;
        self.current_interval =
            (p.spawn_interval - p.interval_decay * self.running_time).max(p.min_interval);
        self.current_speed = p.speed + p.speed_gain * self.running_time;
    }

    fn emit(&mut self, spawner: &mut Spawner, binding: SpawnerBinding) -> usize {
        let count = self.params.bullets_per_spawn;
        let speed = self.current_speed;
        if count <= 1 {
            return spawner
                .spawn_from_random_top(speed, ProjectileKind::Normal)
                .is_ok() as usize;
        }

        let width = self.params.spawn_width;
        let start = -width * 0.5;
        let step = width / (count - 1) as f32;
        (0..count)
            .filter(|&i| {
                let pos = Vec2::new(start + step * i as f32, binding.top_y);
                spawner.spawn(pos, DOWN, speed, ProjectileKind::Normal).is_ok()
            })
            .count()
    }
}

/// Spiral runtime
#[derive(Debug, Clone)]
pub struct SpiralPattern {
    params: SpiralParams,
    current_angle: f32,
}

impl SpiralPattern {
    pub fn new(params: SpiralParams) -> Self {
        Self {
            params,
            current_angle: 0.0,
        }
    }

    pub fn params(&self) -> &SpiralParams {
        &self.params
    }

    /// Angle of arm 0, wrapped to [0, 360)
    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    pub fn set_rotation_speed(&mut self, degrees_per_sec: f32) {
        self.params.rotation_speed = degrees_per_sec;
    }

    pub fn set_arms(&mut self, arms: usize) {
        self.params.arms = clamp_count("spiral.arms", arms, 1);
    }

    pub fn set_center_offset(&mut self, offset: Vec2) {
        self.params.center_offset = offset;
    }

    fn advance(&mut self, dt: f32) {
        let direction = if self.params.clockwise { 1.0 } else { -1.0 };
        self.current_angle =
            wrap_degrees(self.current_angle + self.params.rotation_speed * direction * dt);
    }

    fn emit(&mut self, spawner: &mut Spawner) -> usize {
        let arms = self.params.arms.max(1);
        let step = 360.0 / arms as f32;
        let center = self.params.origin + self.params.center_offset;
        (0..arms)
            .filter(|&i| {
                let angle = self.current_angle + step * i as f32;
                spawner
                    .spawn_at_angle(center, angle, self.params.speed, ProjectileKind::Spiral)
                    .is_ok()
            })
            .count()
    }
}

/// Fixed fan runtime
#[derive(Debug, Clone)]
pub struct SpreadPattern {
    params: SpreadParams,
}

impl SpreadPattern {
    pub fn new(params: SpreadParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SpreadParams {
        &self.params
    }

    pub fn set_bullet_count(&mut self, count: usize) {
        self.params.bullet_count = clamp_count("spread.bullet_count", count, 1);
    }

    pub fn set_spread_angle(&mut self, degrees: f32) {
        self.params.spread_angle = clamp_param("spread.spread_angle", degrees, 0.0, 360.0);
    }

    pub fn set_center_angle(&mut self, degrees: f32) {
        self.params.center_angle = degrees;
    }

    fn emit(&mut self, spawner: &mut Spawner) -> usize {
        let p = &self.params;
        spawner.spawn_spread_fan(
            p.origin,
            p.bullet_count,
            p.speed,
            p.center_angle,
            p.spread_angle,
            ProjectileKind::Normal,
        )
    }
}

/// Aimed-shot runtime
#[derive(Debug, Clone)]
pub struct TargetedPattern {
    params: TargetedParams,
    target: Option<Vec2>,
}

impl TargetedPattern {
    pub fn new(params: TargetedParams) -> Self {
        Self {
            params,
            target: None,
        }
    }

    pub fn params(&self) -> &TargetedParams {
        &self.params
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// Manually set (or clear) the target
    pub fn set_target(&mut self, target: Option<Vec2>) {
        self.target = target;
    }

    pub fn set_bullets_per_shot(&mut self, count: usize) {
        self.params.bullets_per_shot = clamp_count("targeted.bullets_per_shot", count, 1);
    }

    pub fn set_spread_angle(&mut self, degrees: f32) {
        self.params.spread_angle = clamp_param("targeted.spread_angle", degrees, 0.0, 360.0);
    }

    fn emit(&mut self, spawner: &mut Spawner) -> usize {
        let p = &self.params;
        let Some(target) = self.target else {
            // Nobody to aim at: plain falling shot
            return spawner
                .spawn_from_random_top(p.speed, ProjectileKind::Targeted)
                .is_ok() as usize;
        };

        if p.bullets_per_shot <= 1 {
            return spawner
                .spawn_targeted(p.origin, Some(target), p.speed, ProjectileKind::Targeted)
                .is_ok() as usize;
        }

        let to_target = (target - p.origin).normalize_or(DOWN);
        let bearing = degrees_from_direction(to_target);
        spawner.spawn_spread_fan(
            p.origin,
            p.bullets_per_shot,
            p.speed,
            bearing,
            p.spread_angle,
            ProjectileKind::Targeted,
        )
    }
}

/// Accelerating-bullet runtime
#[derive(Debug, Clone)]
pub struct AcceleratingPattern {
    params: AcceleratingParams,
    wave_time: f32,
}

impl AcceleratingPattern {
    pub fn new(params: AcceleratingParams) -> Self {
        Self {
            params,
            wave_time: 0.0,
        }
    }

    pub fn params(&self) -> &AcceleratingParams {
        &self.params
    }

    pub fn set_speed(&mut self, initial_speed: f32, max_speed: f32) {
        let p = &mut self.params;
        p.initial_speed = clamp_param("accelerating.initial_speed", initial_speed, 0.0, f32::MAX);
        p.max_speed = clamp_param("accelerating.max_speed", max_speed, p.initial_speed, f32::MAX);
    }

    pub fn set_acceleration(&mut self, acceleration: f32) {
        self.params.acceleration = acceleration;
    }

    pub fn set_wave(&mut self, enabled: bool, amplitude: f32, frequency: f32) {
        self.params.wave = enabled;
        self.params.wave_amplitude = amplitude;
        self.params.wave_frequency = frequency;
    }

    /// Spawn origin at the current wave phase
    pub fn spawn_origin(&self) -> Vec2 {
        let p = &self.params;
        let mut origin = p.origin;
        if p.wave {
            origin.x += (self.wave_time * p.wave_frequency).sin() * p.wave_amplitude;
        }
        origin
    }

    fn emit(&mut self, spawner: &mut Spawner) -> usize {
        let p = &self.params;
        let handle =
            match spawner.spawn(self.spawn_origin(), DOWN, p.initial_speed, ProjectileKind::Accelerating) {
                Ok(handle) => handle,
                Err(_) => return 0,
            };
        if let Err(err) = spawner
            .pool_mut()
            .set_acceleration(handle, p.acceleration, p.max_speed)
        {
            log::warn!("AcceleratingPattern: {}", err);
        }
        1
    }
}

/// Shape-specific half of a pattern
#[derive(Debug, Clone)]
pub enum Shape {
    Straight(StraightPattern),
    Spiral(SpiralPattern),
    Spread(SpreadPattern),
    Targeted(TargetedPattern),
    Accelerating(AcceleratingPattern),
}

impl Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::Straight(_) => "StraightPattern",
            Shape::Spiral(_) => "SpiralPattern",
            Shape::Spread(_) => "SpreadPattern",
            Shape::Targeted(_) => "TargetedPattern",
            Shape::Accelerating(_) => "AcceleratingPattern",
        }
    }

    fn spawn_interval(&self) -> f32 {
        match self {
            Shape::Straight(s) => s.current_interval,
            Shape::Spiral(s) => s.params.spawn_interval,
            Shape::Spread(s) => s.params.spawn_interval,
            Shape::Targeted(s) => s.params.spawn_interval,
            Shape::Accelerating(s) => s.params.spawn_interval,
        }
    }

    /// Reset phase state for a fresh run
    fn restart(&mut self) {
        match self {
            Shape::Straight(s) => s.reset(),
            Shape::Spiral(s) => s.current_angle = 0.0,
            Shape::Accelerating(s) => s.wave_time = 0.0,
            Shape::Spread(_) | Shape::Targeted(_) => {}
        }
    }

    /// Advance phase timers (runs every running tick, spawn or not)
    fn advance(&mut self, dt: f32) {
        match self {
            Shape::Straight(s) => s.advance(dt),
            Shape::Spiral(s) => s.advance(dt),
            Shape::Accelerating(s) => s.wave_time += dt,
            Shape::Spread(_) | Shape::Targeted(_) => {}
        }
    }

    fn emit(&mut self, spawner: &mut Spawner, binding: SpawnerBinding) -> usize {
        match self {
            Shape::Straight(s) => s.emit(spawner, binding),
            Shape::Spiral(s) => s.emit(spawner),
            Shape::Spread(s) => s.emit(spawner),
            Shape::Targeted(s) => s.emit(spawner),
            Shape::Accelerating(s) => s.emit(spawner),
        }
    }
}

/// Diagnostics view of one pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternStatus {
    pub name: String,
    pub running: bool,
    pub bound: bool,
}

/// A bullet pattern: idle/running state machine around a shape
#[derive(Debug, Clone)]
pub struct Pattern {
    shape: Shape,
    binding: Option<SpawnerBinding>,
    running: bool,
    timer: f32,
}

impl Pattern {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            binding: None,
            running: false,
            timer: 0.0,
        }
    }

    pub fn from_config(config: &PatternConfig) -> Self {
        let shape = match config.clone() {
            PatternConfig::Straight(p) => Shape::Straight(StraightPattern::new(p)),
            PatternConfig::Spiral(p) => Shape::Spiral(SpiralPattern::new(p)),
            PatternConfig::Spread(p) => Shape::Spread(SpreadPattern::new(p)),
            PatternConfig::Targeted(p) => Shape::Targeted(TargetedPattern::new(p)),
            PatternConfig::Accelerating(p) => Shape::Accelerating(AcceleratingPattern::new(p)),
        };
        Self::new(shape)
    }

    pub fn name(&self) -> &'static str {
        self.shape.name()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    /// Bind to a spawner; required before `execute`
    pub fn initialize(&mut self, spawner: &Spawner) {
        self.bind(spawner.binding());
    }

    pub(crate) fn bind(&mut self, binding: SpawnerBinding) {
        self.binding = Some(binding);
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Effective spawn interval right now
    pub fn spawn_interval(&self) -> f32 {
        self.shape.spawn_interval()
    }

    /// Start running from a fresh phase
    pub fn execute(&mut self) -> Result<(), SimError> {
        if self.binding.is_none() {
            let err = SimError::UnboundCollaborator {
                component: self.name(),
            };
            log::warn!("{}", err);
            return Err(err);
        }
        self.running = true;
        self.timer = 0.0;
        self.shape.restart();
        log::debug!("{} running", self.name());
        Ok(())
    }

    /// Go idle; parameters are kept for the next `execute`
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("{} stopped", self.name());
        }
        self.running = false;
    }

    /// Feed the player position to patterns that aim
    pub fn track_target(&mut self, target: Option<Vec2>) {
        if let Shape::Targeted(t) = &mut self.shape {
            if t.params.track_player {
                t.target = target;
            }
        }
    }

    /// Advance one tick; returns bullets spawned
    pub fn update(&mut self, dt: f32, spawner: &mut Spawner) -> usize {
        if !self.running {
            return 0;
        }
        let Some(binding) = self.binding else {
            return 0;
        };

        self.timer += dt;
        self.shape.advance(dt);

        if self.timer >= self.shape.spawn_interval() {
            self.timer = 0.0;
            return self.shape.emit(spawner, binding);
        }
        0
    }

    pub fn status(&self) -> PatternStatus {
        PatternStatus {
            name: self.name().to_string(),
            running: self.running,
            bound: self.is_bound(),
        }
    }
}
