//! Pattern rotation
//!
//! The scheduler owns every registered pattern and keeps `simultaneous` of
//! them running, swapping the active subset every `switch_interval` seconds.
//! It only runs while the external "simulation active" gate is high.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pattern::{Pattern, PatternStatus};
use super::spawner::{Spawner, SpawnerBinding};
use crate::consts::*;

/// How the next active subset is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Contiguous block after a rotating cursor
    #[default]
    Sequential,
    /// Shuffled sample, preferring idle patterns
    Random,
}

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerPhase {
    /// No spawner bound yet
    Uninitialized,
    /// Bound, never started
    Ready,
    /// Gate high, patterns running
    Running,
    /// Gate low, everything stopped
    Idle,
}

/// Scheduler tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Seconds between rotations
    pub switch_interval: f32,
    pub rotation: RotationMode,
    /// Patterns running at once
    pub simultaneous: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            switch_interval: SWITCH_INTERVAL,
            rotation: RotationMode::Sequential,
            simultaneous: 1,
        }
    }
}

pub struct PatternScheduler {
    patterns: Vec<Pattern>,
    binding: Option<SpawnerBinding>,
    phase: SchedulerPhase,
    mode: RotationMode,
    switch_interval: f32,
    simultaneous: usize,
    switch_timer: f32,
    cursor: usize,
    warned_unbound: bool,
}

impl PatternScheduler {
    pub fn new(settings: &SchedulerSettings, patterns: Vec<Pattern>) -> Self {
        Self {
            patterns,
            binding: None,
            phase: SchedulerPhase::Uninitialized,
            mode: settings.rotation,
            switch_interval: settings.switch_interval.max(MIN_SWITCH_INTERVAL),
            simultaneous: settings.simultaneous.max(1),
            switch_timer: 0.0,
            cursor: 0,
            warned_unbound: false,
        }
    }

    /// Bind the spawner and initialize every registered pattern
    pub fn bind(&mut self, spawner: &Spawner) {
        let binding = spawner.binding();
        for pattern in &mut self.patterns {
            pattern.bind(binding);
        }
        self.binding = Some(binding);
        if self.phase == SchedulerPhase::Uninitialized {
            self.phase = SchedulerPhase::Ready;
        }
        log::debug!("PatternScheduler bound with {} patterns", self.patterns.len());
    }

    /// Register another pattern; initialized immediately if already bound
    pub fn add_pattern(&mut self, mut pattern: Pattern) -> usize {
        if let Some(binding) = self.binding {
            pattern.bind(binding);
        }
        self.patterns.push(pattern);
        self.patterns.len() - 1
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern_mut(&mut self, index: usize) -> Option<&mut Pattern> {
        self.patterns.get_mut(index)
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn switch_interval(&self) -> f32 {
        self.switch_interval
    }

    /// Patterns currently running
    pub fn active_count(&self) -> usize {
        self.patterns.iter().filter(|p| p.is_running()).count()
    }

    /// Running-at-once target after clamping to the registered set
    pub fn effective_simultaneous(&self) -> usize {
        if self.patterns.is_empty() {
            0
        } else {
            self.simultaneous.clamp(1, self.patterns.len())
        }
    }

    pub fn set_switch_interval(&mut self, seconds: f32) {
        self.switch_interval = seconds.max(MIN_SWITCH_INTERVAL);
    }

    pub fn set_simultaneous(&mut self, count: usize) {
        self.simultaneous = count.max(1);
    }

    pub fn set_random(&mut self, random: bool) {
        self.mode = if random {
            RotationMode::Random
        } else {
            RotationMode::Sequential
        };
    }

    /// Forward the player position to aiming patterns
    pub fn set_target(&mut self, target: Option<Vec2>) {
        for pattern in &mut self.patterns {
            pattern.track_target(target);
        }
    }

    pub fn pattern_status(&self) -> Vec<PatternStatus> {
        self.patterns.iter().map(Pattern::status).collect()
    }

    /// Run one pattern by hand; false if there is no such pattern or it is unbound
    pub fn execute_pattern(&mut self, index: usize) -> bool {
        match self.patterns.get_mut(index) {
            Some(pattern) => pattern.execute().is_ok(),
            None => {
                log::warn!("execute_pattern: no pattern at index {}", index);
                false
            }
        }
    }

    pub fn stop_pattern(&mut self, index: usize) -> bool {
        match self.patterns.get_mut(index) {
            Some(pattern) => {
                pattern.stop();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for pattern in &mut self.patterns {
            pattern.stop();
        }
    }

    /// Stop everything and wait for the next rising edge of the gate
    pub fn reset(&mut self) {
        self.stop_all();
        self.cursor = 0;
        self.switch_timer = 0.0;
        if self.binding.is_some() {
            self.phase = SchedulerPhase::Ready;
        }
    }

    /// Reset the rotation and run the first block
    pub fn start(&mut self, rng: &mut Pcg32) {
        if self.binding.is_none() {
            self.warn_unbound();
            return;
        }
        self.cursor = 0;
        self.switch_timer = 0.0;
        self.phase = SchedulerPhase::Running;
        self.activate_next(rng);
    }

    /// Advance one tick; returns bullets spawned by all running patterns
    pub fn update(&mut self, dt: f32, active: bool, spawner: &mut Spawner) -> usize {
        if self.phase == SchedulerPhase::Uninitialized {
            self.warn_unbound();
            return 0;
        }

        if !active {
            if self.phase == SchedulerPhase::Running {
                log::info!("PatternScheduler idle");
            }
            self.stop_all();
            self.phase = SchedulerPhase::Idle;
            return 0;
        }

        if self.phase == SchedulerPhase::Running {
            self.switch_timer += dt;
            if self.switch_timer >= self.switch_interval {
                self.switch_timer = 0.0;
                self.activate_next(spawner.rng());
            }
        } else {
            self.start(spawner.rng());
        }

        self.patterns
            .iter_mut()
            .map(|pattern| pattern.update(dt, spawner))
            .sum()
    }

    fn activate_next(&mut self, rng: &mut Pcg32) {
        let count = self.effective_simultaneous();
        if count == 0 {
            return;
        }
        let chosen = match self.mode {
            RotationMode::Sequential => self.next_block(count),
            RotationMode::Random => self.random_sample(count, rng),
        };

        self.stop_all();
        for &index in &chosen {
            if let Err(err) = self.patterns[index].execute() {
                log::warn!("PatternScheduler: {}", err);
            }
        }
        log::info!(
            "Active patterns: {}",
            chosen
                .iter()
                .map(|&i| self.patterns[i].name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    fn next_block(&mut self, count: usize) -> Vec<usize> {
        let len = self.patterns.len();
        let block = (0..count).map(|i| (self.cursor + i) % len).collect();
        self.cursor = (self.cursor + count) % len;
        block
    }

    fn random_sample(&self, count: usize, rng: &mut Pcg32) -> Vec<usize> {
        let mut candidates: Vec<usize> = (0..self.patterns.len())
            .filter(|&i| !self.patterns[i].is_running())
            .collect();
        if candidates.len() < count {
            candidates = (0..self.patterns.len()).collect();
        }
        candidates.shuffle(rng);
        candidates.truncate(count);
        candidates
    }

    fn warn_unbound(&mut self) {
        if !self.warned_unbound {
            log::warn!("PatternScheduler: no spawner bound, nothing will spawn");
            self.warned_unbound = true;
        }
    }
}
