//! Fixed timestep simulation tick
//!
//! Order within a tick:
//! 1. external out-of-view notifications
//! 2. scheduler / pattern spawns
//! 3. projectile motion and aging
//! 4. collision pass (on its own interval)
//!
//! Bullets spawned in step 2 carry the current tick and are skipped by step 4,
//! so nothing can hit the player on the tick it appears.

use glam::Vec2;

use super::collision::Hitbox;
use super::pool::ProjectileHandle;
use super::spawner::Spawner;
use super::state::{SimEvent, Simulation};

/// Collaborator inputs for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player hitbox; `None` while there is no player
    pub player: Option<Hitbox>,
    /// Simulation active gate (session is in its playing state)
    pub active: bool,
    /// Suppress hit reports this tick
    pub invincible: bool,
    /// Bullets the view reported as having left the play area
    pub out_of_view: Vec<ProjectileHandle>,
}

impl TickInput {
    /// Active tick with the player at `pos`
    pub fn playing(pos: Vec2, radius: f32) -> Self {
        Self {
            player: Some(Hitbox::new(pos, radius)),
            active: true,
            ..Default::default()
        }
    }
}

/// Advance the simulation by one fixed timestep
pub fn tick(sim: &mut Simulation, input: &TickInput, dt: f32) {
    sim.time_ticks += 1;
    sim.pool.begin_tick(sim.time_ticks);

    for &handle in &input.out_of_view {
        sim.notify_out_of_view(handle);
    }

    if input.active {
        sim.stats.survival_time += dt;
        sim.invincibility = (sim.invincibility - dt).max(0.0);
    }

    sim.scheduler.set_target(input.player.map(|p| p.center));
    let spawned = {
        let mut spawner = Spawner::new(&mut sim.pool, &mut sim.spawn_area, &mut sim.rng);
        sim.scheduler.update(dt, input.active, &mut spawner)
    };
    sim.stats.spawned += spawned as u64;

    // Motion is frozen while the gate is low
    if input.active {
        let expired = sim.pool.advance(dt);
        sim.stats.dodged += expired as u64;
    }

    let invincible = input.invincible || sim.invincibility > 0.0;
    let report = sim
        .detector
        .update(dt, input.active, input.player, invincible, &mut sim.pool);

    if let (Some(report), Some(player)) = (report, input.player) {
        if let Some(projectile) = report.hit {
            sim.events.push(SimEvent::PlayerHit {
                projectile,
                position: player.center,
                tick: sim.time_ticks,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::projectile::ProjectileKind;
    use crate::sim::scheduler::SchedulerPhase;

    fn far_player() -> TickInput {
        TickInput::playing(Vec2::new(0.0, -50.0), 0.2)
    }

    #[test]
    fn test_inactive_tick_spawns_nothing() {
        let mut sim = Simulation::with_seed(3);
        for _ in 0..120 {
            tick(&mut sim, &TickInput::default(), SIM_DT);
        }
        assert_eq!(sim.pool().live_count(), 0);
        assert_eq!(sim.stats().survival_time, 0.0);
        assert_eq!(sim.scheduler().phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn test_active_ticks_spawn_and_count_time() {
        let mut sim = Simulation::with_seed(3);
        let input = far_player();
        for _ in 0..120 {
            tick(&mut sim, &input, SIM_DT);
        }
        assert!(sim.pool().live_count() > 0);
        assert_eq!(sim.stats().spawned as usize, sim.pool().live_count());
        assert!((sim.stats().survival_time - 2.0).abs() < 1e-3);
        assert_eq!(sim.scheduler().phase(), SchedulerPhase::Running);
    }

    #[test]
    fn test_motion_frozen_while_inactive() {
        let mut sim = Simulation::with_seed(3);
        let h = sim
            .spawner()
            .spawn(Vec2::ZERO, Vec2::NEG_Y, 2.0, ProjectileKind::Normal)
            .unwrap();
        tick(&mut sim, &TickInput::default(), SIM_DT);
        assert_eq!(sim.pool().get(h).unwrap().pos, Vec2::ZERO);
        tick(&mut sim, &far_player(), SIM_DT);
        assert!(sim.pool().get(h).unwrap().pos.y < 0.0);
    }

    #[test]
    fn test_hit_emits_single_event() {
        let mut sim = Simulation::with_seed(3);
        sim.scheduler_mut().stop_all();
        let player = Vec2::new(2.0, 0.0);
        for dx in [0.0, 0.05] {
            sim.spawner()
                .spawn(player + Vec2::new(dx, 0.0), Vec2::NEG_Y, 0.0, ProjectileKind::Normal)
                .unwrap();
        }
        let input = TickInput::playing(player, 0.2);
        for _ in 0..30 {
            tick(&mut sim, &input, SIM_DT);
        }
        let events = sim.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SimEvent::PlayerHit { position, .. } if position == player));
        assert!(sim.drain_events().is_empty());
        assert!(sim.diagnostics().hit_reported);
    }

    #[test]
    fn test_invincibility_suppresses_then_expires() {
        let mut sim = Simulation::with_seed(3);
        let player = Vec2::new(-2.0, -1.0);
        sim.spawner()
            .spawn(player, Vec2::NEG_Y, 0.0, ProjectileKind::Normal)
            .unwrap();
        sim.grant_invincibility(0.5);
        let input = TickInput::playing(player, 0.2);

        for _ in 0..20 {
            tick(&mut sim, &input, SIM_DT);
        }
        assert!(sim.drain_events().is_empty());
        assert!(sim.is_invincible());

        for _ in 0..20 {
            tick(&mut sim, &input, SIM_DT);
        }
        assert!(!sim.is_invincible());
        assert_eq!(sim.drain_events().len(), 1);
    }

    #[test]
    fn test_out_of_view_input_recycles() {
        let mut sim = Simulation::with_seed(3);
        let h = sim
            .spawner()
            .spawn(Vec2::new(9.0, 9.0), Vec2::Y, 1.0, ProjectileKind::Normal)
            .unwrap();
        let input = TickInput {
            out_of_view: vec![h, h],
            ..far_player()
        };
        tick(&mut sim, &input, SIM_DT);
        assert!(!sim.pool().is_live(h));
        assert_eq!(sim.stats().dodged, 1);
    }
}
