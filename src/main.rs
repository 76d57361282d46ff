//! Bullet Storm headless driver
//!
//! Runs a seeded session against a scripted dodging player and prints the
//! final diagnostics as JSON. Verbosity comes from `RUST_LOG`.
//!
//! Usage: bullet-storm [--settings FILE] [--preset easy|normal|hard] [--seed N] [--seconds S]

use bullet_storm::{
    DifficultyPreset, Settings,
    consts::*,
    sim::{Hitbox, SimEvent, Simulation, TickInput, tick},
};
use glam::Vec2;

/// Render frame length the driver pretends to run at (deliberately not SIM_DT)
const FRAME_DT: f32 = 1.0 / 50.0;

/// Visible play area; bullets outside it are reported out of view
const VIEW_HALF_WIDTH: f32 = 7.0;
const VIEW_BOTTOM: f32 = -6.0;
const VIEW_TOP: f32 = 8.0;

struct Options {
    settings_path: Option<String>,
    preset: DifficultyPreset,
    seed: Option<u64>,
    seconds: f32,
}

impl Options {
    fn parse() -> Result<Self, String> {
        let mut options = Options {
            settings_path: None,
            preset: DifficultyPreset::Normal,
            seed: None,
            seconds: 60.0,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{} needs a value", arg));
            match arg.as_str() {
                "--settings" => options.settings_path = Some(value()?),
                "--preset" => {
                    let name = value()?;
                    options.preset = DifficultyPreset::from_str(&name)
                        .ok_or_else(|| format!("unknown preset '{}'", name))?;
                }
                "--seed" => {
                    options.seed = Some(value()?.parse().map_err(|e| format!("--seed: {}", e))?)
                }
                "--seconds" => {
                    options.seconds = value()?.parse().map_err(|e| format!("--seconds: {}", e))?
                }
                other => return Err(format!("unknown argument '{}'", other)),
            }
        }
        Ok(options)
    }
}

/// Scripted player: drifts on a sine and sidesteps the nearest bullet overhead
struct Dodger {
    pos: Vec2,
    radius: f32,
    time: f32,
}

impl Dodger {
    const SPEED: f32 = 4.0;
    const LANE_Y: f32 = -3.0;
    const HALF_RANGE: f32 = 3.5;

    fn new(radius: f32) -> Self {
        Self {
            pos: Vec2::new(0.0, Self::LANE_Y),
            radius,
            time: 0.0,
        }
    }

    fn hitbox(&self) -> Hitbox {
        Hitbox::new(self.pos, self.radius)
    }

    fn step(&mut self, sim: &Simulation, dt: f32) {
        self.time += dt;
        let drift = (self.time * 0.7).sin() * Self::HALF_RANGE;

        let threat = sim
            .pool()
            .iter_live()
            .map(|(_, b)| b.pos)
            .filter(|p| p.y > self.pos.y && (p.x - self.pos.x).abs() < 1.0)
            .min_by(|a, b| a.distance_squared(self.pos).total_cmp(&b.distance_squared(self.pos)));

        let goal = match threat {
            Some(p) if p.x >= self.pos.x => self.pos.x - 1.5,
            Some(_) => self.pos.x + 1.5,
            None => drift,
        };
        let step = (goal - self.pos.x).clamp(-Self::SPEED * dt, Self::SPEED * dt);
        self.pos.x = (self.pos.x + step).clamp(-Self::HALF_RANGE, Self::HALF_RANGE);
    }
}

fn load_settings(options: &Options) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &options.settings_path {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::from_preset(options.preset),
    };
    if let Some(seed) = options.seed {
        settings.seed = seed;
    }
    Ok(settings)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let options = Options::parse()?;
    let settings = load_settings(&options)?;
    log::info!(
        "Bullet Storm (headless) starting: preset {}, seed {}, {}s",
        settings.preset.as_str(),
        settings.seed,
        options.seconds
    );

    let mut player = Dodger::new(settings.collision.player_radius);
    let mut sim = Simulation::new(settings);
    let mut input = TickInput::playing(player.pos, player.radius);

    let total_ticks = (options.seconds / SIM_DT).ceil() as u64;
    let mut accumulator = 0.0;
    let mut hit = None;

    'frames: while sim.time_ticks() < total_ticks {
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            player.step(&sim, SIM_DT);
            input.player = Some(player.hitbox());
            input.out_of_view = sim
                .pool()
                .iter_live()
                .filter(|(_, b)| {
                    b.pos.y < VIEW_BOTTOM || b.pos.y > VIEW_TOP || b.pos.x.abs() > VIEW_HALF_WIDTH
                })
                .map(|(h, _)| h)
                .collect();

            tick(&mut sim, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;

            if sim.time_ticks() % 60 == 0 {
                let diag = sim.diagnostics();
                log::info!(
                    "t={:.0}s live={} free={} patterns={} dodged={}",
                    diag.stats.survival_time,
                    diag.live,
                    diag.free,
                    diag.active_patterns,
                    diag.stats.dodged
                );
            }

            if let Some(SimEvent::PlayerHit {
                projectile,
                tick: at_tick,
                ..
            }) = sim.drain_events().into_iter().next()
            {
                log::info!("Player hit by {} on tick {}", projectile, at_tick);
                hit = Some(at_tick);
                break 'frames;
            }
        }
    }

    let diag = sim.diagnostics();
    match hit {
        Some(at_tick) => println!("Hit after {:.2}s (tick {})", at_tick as f32 * SIM_DT, at_tick),
        None => println!("Survived {:.2}s", diag.stats.survival_time),
    }
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}
