use bullet_storm::consts::SIM_DT;
use bullet_storm::sim::{
    PatternConfig, PoolSettings, ProjectileKind, ProjectilePool, RotationMode, SchedulerSettings,
    Shape, SimEvent, Simulation, SpiralParams, SpreadParams, TargetedParams, TickInput, tick,
};
use bullet_storm::{DifficultyPreset, Settings, SimError, wrap_degrees};
use glam::Vec2;

fn quiet_settings(patterns: Vec<PatternConfig>) -> Settings {
    Settings {
        seed: 77,
        patterns,
        ..Settings::default()
    }
}

fn run(sim: &mut Simulation, input: &TickInput, ticks: usize) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        tick(sim, input, SIM_DT);
        events.extend(sim.drain_events());
    }
    events
}

#[test]
fn test_pool_capacity_five_scenario() {
    let mut pool = ProjectilePool::new(&PoolSettings {
        initial_size: 0,
        capacity: 5,
        ..Default::default()
    });
    for _ in 0..5 {
        assert!(pool.spawn(Vec2::ZERO, Vec2::NEG_Y, 1.0, ProjectileKind::Normal).is_ok());
    }
    assert_eq!(
        pool.spawn(Vec2::ZERO, Vec2::NEG_Y, 1.0, ProjectileKind::Normal),
        Err(SimError::PoolExhausted { capacity: 5 })
    );
    assert_eq!(pool.live_count(), 5);
}

#[test]
fn test_sequential_rotation_through_session() {
    let spreads = (1..=3)
        .map(|n| {
            PatternConfig::Spread(SpreadParams {
                bullet_count: n,
                ..Default::default()
            })
        })
        .collect();
    let mut settings = quiet_settings(spreads);
    settings.scheduler = SchedulerSettings {
        switch_interval: 1.0,
        rotation: RotationMode::Sequential,
        simultaneous: 1,
    };
    let mut sim = Simulation::new(settings);
    let input = TickInput::playing(Vec2::new(0.0, -50.0), 0.2);

    let mut order: Vec<usize> = Vec::new();
    for _ in 0..(3 * 60 + 30) {
        tick(&mut sim, &input, SIM_DT);
        let running: Vec<usize> = sim
            .scheduler()
            .patterns()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_running())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(running.len(), 1);
        if order.last() != Some(&running[0]) {
            order.push(running[0]);
        }
    }
    assert_eq!(order, vec![0, 1, 2, 0]);
}

#[test]
fn test_collision_boundary_through_session() {
    for (offset, expect_hit) in [(0.59, true), (0.61, false)] {
        let mut sim = Simulation::new(quiet_settings(vec![]));
        let player = Vec2::new(1.0, -2.0);
        sim.spawner()
            .spawn(player + Vec2::new(offset, 0.0), Vec2::NEG_Y, 0.0, ProjectileKind::Normal)
            .unwrap();
        let events = run(&mut sim, &TickInput::playing(player, 0.3), 10);
        assert_eq!(events.len(), expect_hit as usize, "offset {}", offset);
    }
}

#[test]
fn test_spiral_angle_follows_rotation_speed() {
    let mut sim = Simulation::new(quiet_settings(vec![PatternConfig::Spiral(SpiralParams {
        arms: 4,
        rotation_speed: 180.0,
        ..Default::default()
    })]));
    let input = TickInput::playing(Vec2::new(0.0, -50.0), 0.2);

    let mut ticks = 0;
    for checkpoint in [30, 90, 150, 200] {
        run(&mut sim, &input, checkpoint - ticks);
        ticks = checkpoint;

        let Shape::Spiral(spiral) = sim.scheduler().patterns()[0].shape() else {
            panic!("expected spiral");
        };
        let expected = wrap_degrees(180.0 * ticks as f32 * SIM_DT);
        let diff = (spiral.current_angle() - expected).abs();
        assert!(diff.min(360.0 - diff) < 0.05, "t={} got {}", ticks, spiral.current_angle());
    }
}

#[test]
fn test_aimed_session_reports_single_hit() {
    let mut sim = Simulation::new(quiet_settings(vec![PatternConfig::Targeted(
        TargetedParams::default(),
    )]));
    let player = Vec2::new(0.5, -3.0);
    let input = TickInput::playing(player, 0.2);

    let events = run(&mut sim, &input, 10 * 60);
    assert_eq!(events.len(), 1);
    let SimEvent::PlayerHit { tick: hit_tick, position, .. } = events[0];
    assert_eq!(position, player);
    // First shot after 0.8 s, ~7.5 units at speed 4
    assert!(hit_tick > 60 && hit_tick < 4 * 60, "hit on tick {}", hit_tick);

    let diag = sim.diagnostics();
    assert!(diag.hit_reported);
    assert!(diag.stats.spawned > 1);

    sim.reset_session();
    let again = run(&mut sim, &input, 5 * 60);
    assert_eq!(again.len(), 1);
}

#[test]
fn test_pool_exhaustion_degrades_density() {
    let mut settings = quiet_settings(vec![PatternConfig::Spread(SpreadParams {
        bullet_count: 8,
        spawn_interval: 0.1,
        ..Default::default()
    })]);
    settings.pool = PoolSettings {
        initial_size: 0,
        capacity: 5,
        ..Default::default()
    };
    let mut sim = Simulation::new(settings);
    let input = TickInput::playing(Vec2::new(0.0, -50.0), 0.2);
    run(&mut sim, &input, 120);

    let diag = sim.diagnostics();
    assert_eq!(diag.live, 5);
    assert_eq!(diag.allocated, 5);
    assert_eq!(diag.stats.spawned, 5);
}

#[test]
fn test_gate_low_clears_running_patterns() {
    let mut sim = Simulation::new(Settings::from_preset(DifficultyPreset::Hard));
    let input = TickInput::playing(Vec2::new(0.0, -50.0), 0.2);
    run(&mut sim, &input, 30);
    assert_eq!(sim.diagnostics().active_patterns, 2);

    let paused = TickInput {
        active: false,
        ..input.clone()
    };
    run(&mut sim, &paused, 30);
    let diag = sim.diagnostics();
    assert_eq!(diag.active_patterns, 0);
    assert!((diag.stats.survival_time - 0.5).abs() < 1e-3);
}
