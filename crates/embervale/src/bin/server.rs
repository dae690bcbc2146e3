//! # EMBERVALE Server
//!
//! The authoritative world server. Headless: no sessions attached here,
//! just the full simulation running at tick cadence with a scripted
//! patrol player so the world has something human-shaped in it.
//!
//! ```bash
//! # Run with defaults
//! ./embervale_server
//!
//! # Run with a config file
//! ./embervale_server server.toml
//! ```

use std::time::{Duration, Instant};

use embervale::actor::{AmClientCommand, Clock, SystemClock};
use embervale::shared::{ClientCmd, GridCell, MonsterKind};
use embervale::world::{MapTerrain, WorldError};
use embervale::{ServerConfig, TickLedger, WorldLoop};

const EMBERFIELD: u32 = 1;
const DUSKHOLLOW: u32 = 2;

/// Corners the demo player patrols, clockwise.
const PATROL: [GridCell; 4] = [
    GridCell { x: 4, y: 4 },
    GridCell { x: 40, y: 4 },
    GridCell { x: 40, y: 40 },
    GridCell { x: 4, y: 40 },
];

fn main() {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    EMBERVALE SERVER v{}", env!("CARGO_PKG_VERSION"));
    println!("                         HEADLESS MODE");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    // === 1. CONFIG ===
    let config = match load_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("   ✗ FATAL: {message}");
            std::process::exit(1);
        }
    };
    println!("   ✓ Config: tick {}ms, mailboxes {}", config.tick_ms, config.mailbox_capacity);

    // === 2. WORLD BOOT ===
    let (mut world, patrol_uid) = match boot_world(config) {
        Ok(booted) => booted,
        Err(error) => {
            eprintln!("   ✗ FATAL: world boot failed: {error}");
            std::process::exit(1);
        }
    };
    println!("   ✓ Maps: {} online", world.atlas().len());
    println!("   ✓ Pods: {} live (service, keepers, creatures)", world.pod_count());
    println!();
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    SERVER RUNNING");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("   Ticking... (Press Ctrl+C to stop)");
    println!();

    // === 3. MAIN LOOP ===
    let clock = SystemClock::new();
    let tick_duration = Duration::from_millis(config.tick_ms);
    let mut ledger = TickLedger::default();
    let mut waypoint = 0usize;

    loop {
        let tick_start = Instant::now();

        // 3a. Simulate one tick
        let summary = world.run_tick(clock.now_ms());
        ledger.record(&summary);

        // 3b. Steer the patrol player, one step order per second
        if summary.tick % 10 == 0 {
            waypoint = steer_patrol(&world, patrol_uid, waypoint);
        }

        // 3c. Operator stats
        if summary.tick % 100 == 0 {
            println!(
                "   📊 Tick {} | pods {} | routes {} | msgs {} | cmds {} | reaped {} | dropped {}",
                summary.tick,
                world.pod_count(),
                world.live_routes(),
                ledger.messages(),
                ledger.commands(),
                ledger.reaped(),
                world.dropped_deliveries(),
            );
            ledger.reset();
        }

        // 3d. Hold cadence
        let elapsed = tick_start.elapsed();
        if elapsed < tick_duration {
            std::thread::sleep(tick_duration - elapsed);
        }
    }
}

/// Reads the config file named on the command line, or defaults.
fn load_config() -> Result<ServerConfig, String> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(ServerConfig::default());
    };
    let text =
        std::fs::read_to_string(&path).map_err(|error| format!("read {path}: {error}"))?;
    ServerConfig::from_toml(&text).map_err(|error| format!("parse {path}: {error}"))
}

/// Builds the demo world: two maps, a handful of monsters, one patrol
/// player bound to a synthetic session.
fn boot_world(config: ServerConfig) -> Result<(WorldLoop, u64), WorldError> {
    let mut world = WorldLoop::new(config)?;

    let mut emberfield = MapTerrain::new(EMBERFIELD, 48, 48);
    for x in 14..=22 {
        emberfield.block(GridCell { x, y: 17 });
    }
    for y in 8..=14 {
        emberfield.block(GridCell { x: 30, y });
    }
    world.spawn_map(emberfield)?;

    let mut duskhollow = MapTerrain::new(DUSKHOLLOW, 24, 24);
    for x in 6..=10 {
        duskhollow.block(GridCell { x, y: 6 });
    }
    world.spawn_map(duskhollow)?;

    world.spawn_monster(MonsterKind::Deer, EMBERFIELD, GridCell { x: 10, y: 10 })?;
    world.spawn_monster(MonsterKind::Deer, EMBERFIELD, GridCell { x: 26, y: 30 })?;
    world.spawn_monster(MonsterKind::Pheasant, EMBERFIELD, GridCell { x: 38, y: 12 })?;
    world.spawn_monster(MonsterKind::Pheasant, EMBERFIELD, GridCell { x: 12, y: 36 })?;
    world.spawn_monster(MonsterKind::Zuma, DUSKHOLLOW, GridCell { x: 8, y: 12 })?;
    world.spawn_monster(MonsterKind::Zuma, DUSKHOLLOW, GridCell { x: 16, y: 12 })?;
    world.spawn_monster(MonsterKind::ZumaGuardian, DUSKHOLLOW, GridCell { x: 12, y: 18 })?;

    let patrol_uid = world.spawn_player(EMBERFIELD, PATROL[0])?;
    world.bind_session(patrol_uid, 1)?;

    Ok((world, patrol_uid))
}

/// Orders the patrol player one step toward its waypoint, advancing to
/// the next corner once the current one is reached.
fn steer_patrol(world: &WorldLoop, uid: u64, waypoint: usize) -> usize {
    let Some(terrain) = world.atlas().terrain(EMBERFIELD) else {
        return waypoint;
    };
    let Some(cell) = terrain.position_of(uid) else {
        return waypoint;
    };

    let next = if cell == PATROL[waypoint] {
        (waypoint + 1) % PATROL.len()
    } else {
        waypoint
    };
    let goal = PATROL[next];
    world
        .send_client_command(
            uid,
            AmClientCommand {
                uid,
                target: 0,
                command: ClientCmd::Move as u32,
                param: 0,
                x: goal.x,
                y: goal.y,
            },
        )
        .ok();
    next
}
