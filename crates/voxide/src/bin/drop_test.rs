//! # Drop Test
//!
//! Headless check of the whole stack: bodies fall from their configured
//! positions onto a voxel floor whose top face is at y = 0.
//!
//! Usage: `drop_test [config.toml]`

use std::process::ExitCode;
use std::sync::Arc;

use voxide::core::Elapsed;
use voxide::physics::{Aabb, Grounded, Length, Position, Vec3, Velocity, VoxelGeometry};
use voxide::{BodyConfig, Engine, EngineConfig};

/// Simulated time to run.
const DURATION_SECS: f64 = 4.0;
/// Frame time fed to the clock, roughly 60 FPS.
const FRAME_MS: f64 = 16.0;

fn default_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.bodies.push(BodyConfig {
        position: Vec3::from_si([0.5, 10.0, 0.5]),
        velocity: Vec3::from_si([0.5, 0.0, 0.0]),
        colliders: vec![Aabb::footprint(Length::meters(0.6), Length::meters(1.8))],
        gravity: None,
    });
    config
}

fn load_config() -> Result<EngineConfig, voxide::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path),
        None => Ok(default_config()),
    }
}

fn main() -> ExitCode {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           VOXIDE DROP TEST                                       ║");
    println!("║           Config → Bodies → Fixed Steps → Floor                  ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = match load_config() {
        Ok(config) => config,
        Err(error) => {
            println!("✗ {error}");
            return ExitCode::FAILURE;
        }
    };

    let floor = Arc::new(VoxelGeometry::new());
    floor.fill((-32, -1, -32), (32, -1, 32));

    let mut engine = match Engine::new(&config, floor) {
        Ok(engine) => engine,
        Err(error) => {
            println!("✗ {error}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Bodies: {}   Step: {:.1} ms   Max steps/frame: {}",
        engine.bodies().len(),
        engine.clock().step().as_secs_f64() * 1000.0,
        config.tick.max_steps_per_frame
    );
    println!();

    let frame = Elapsed::from_millis(FRAME_MS);
    let mut simulated = 0.0;
    let mut next_report = 0.0;
    while simulated < DURATION_SECS {
        engine.frame(frame);
        simulated += frame.as_secs_f64();

        if simulated >= next_report {
            next_report += 0.5;
            for (index, body) in engine.bodies().iter().enumerate() {
                let position = body.get::<Position>().ok().flatten();
                let grounded = body.has::<Grounded>().unwrap_or(false);
                if let Some(Position(p)) = position {
                    println!(
                        "│ t={simulated:>5.2}s  body {index}: ({:>6.2}, {:>6.2}, {:>6.2}) {}",
                        p.x.as_meters(),
                        p.y.as_meters(),
                        p.z.as_meters(),
                        if grounded { "grounded" } else { "" }
                    );
                }
            }
        }
    }

    println!();
    println!("┌─ FINAL STATE ────────────────────────────────────────────────────┐");
    let mut all_landed = true;
    for (index, body) in engine.bodies().iter().enumerate() {
        let grounded = body.has::<Grounded>().unwrap_or(false);
        let velocity = body.get::<Velocity>().ok().flatten().map(|v| v.0);
        all_landed &= grounded;
        println!(
            "│ body {index}: {}  velocity {:?}",
            if grounded { "✓ landed" } else { "✗ airborne" },
            velocity.map(|v| v.si())
        );
    }
    println!("│ Steps run: {}", engine.clock().total_steps());
    println!("└──────────────────────────────────────────────────────────────────┘");

    if all_landed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
