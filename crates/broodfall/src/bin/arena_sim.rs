//! # Arena Simulation
//!
//! Runs the swarm headless in a walled arena against a scripted player who
//! strafes in a circle and shoots at the nearest spider.
//!
//! ```text
//! cargo run -p broodfall --features sim --bin arena_sim -- [config.toml] [seconds]
//! RUST_LOG=debug cargo run -p broodfall --features sim --bin arena_sim
//! ```

use std::time::{Duration, Instant};

use broodfall::{
    BoxWorld, PlayerSnapshot, SharedTransforms, SpiderConfig, SpiderEvent,
    SpiderManager, Vec3,
};
use broodfall_shared::constants::FRAME_MS;
use tracing_subscriber::EnvFilter;

/// Half-width of the arena floor.
const ARENA_HALF_EXTENT: f32 = 40.0;

/// Radius of the player's strafing circle.
const PLAYER_ORBIT: f32 = 6.0;

/// Frames between shots.
const FIRE_EVERY: u64 = 12;

/// Default run length.
const DEFAULT_SECONDS: u64 = 90;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match SpiderConfig::from_toml_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => SpiderConfig::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SECONDS);

    let (mut swarm, events) = match SpiderManager::with_event_bus(config) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let transforms = SharedTransforms::new();
    swarm.attach_sink(Box::new(transforms.clone()));
    swarm.set_model_ready(true);
    let _ = swarm.start_spawning();

    let level = BoxWorld::walled_arena(ARENA_HALF_EXTENT, 4.0, 1.0);
    let frame = Duration::from_millis(FRAME_MS);
    let frames = seconds * 1000 / FRAME_MS;

    let mut bites = 0u32;
    let mut shots = 0u32;
    let mut player_killed_at = None;
    let started = Instant::now();

    for n in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let angle = n as f32 * 0.01;
        let position = Vec3::new(angle.cos() * PLAYER_ORBIT, 1.6, angle.sin() * PLAYER_ORBIT);
        let nearest = swarm
            .spiders()
            .iter()
            .map(|s| s.position())
            .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));
        let forward = nearest.map_or(Vec3::FORWARD, |target| (target - position).normalize_or_zero());
        let player = PlayerSnapshot::new(position, forward, true);

        if n % FIRE_EVERY == 0 && nearest.is_some() {
            let _ = swarm.fire_projectile(position, forward);
            shots += 1;
        }

        swarm.tick(Some(&player), Some(&level), frame);

        for event in events.drain() {
            match event {
                SpiderEvent::PlayerDamaged { .. } => bites += 1,
                SpiderEvent::PlayerKilled { .. } => player_killed_at = Some(swarm.clock()),
                _ => {}
            }
        }

        if player_killed_at.is_some() {
            break;
        }
    }

    let hud = swarm.hud();
    println!("=== ARENA SUMMARY ===");
    println!("simulated:      {:.1} s", swarm.clock().as_secs_f32());
    println!("wall time:      {:.1} ms", started.elapsed().as_secs_f64() * 1000.0);
    println!("spawned:        {}/{}", hud.spawned, hud.total);
    println!("killed:         {}", hud.killed);
    println!("alive:          {} ({} placed)", hud.live, transforms.len());
    println!("shots fired:    {shots}");
    println!("bites taken:    {bites}");
    println!("player health:  {}", hud.player_health);
    match player_killed_at {
        Some(at) => println!("player died at {:.1} s", at.as_secs_f32()),
        None => println!("player survived"),
    }
}
