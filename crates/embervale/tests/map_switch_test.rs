//! Integration test for brokered map travel.
//!
//! The world service relays a switch to the destination keeper, which
//! seats the arrival cell before the origin map lets go. Refusals of
//! every flavor leave the traveler exactly where it was.

use embervale::actor::{AmAction, AmClientCommand, Envelope, MessageKind};
use embervale::shared::{ActionKind, ActorKind, ClientCmd, GridCell, TICK_MS};
use embervale::world::MapTerrain;
use embervale::{ServerConfig, WorldLoop};

fn switch_command(uid: u64, map_id: u32, destination: GridCell) -> AmClientCommand {
    AmClientCommand {
        uid,
        target: 0,
        command: ClientCmd::MapSwitch as u32,
        param: map_id,
        x: destination.x,
        y: destination.y,
    }
}

fn run(world: &mut WorldLoop, now: &mut u64, ticks: usize) {
    for _ in 0..ticks {
        *now += TICK_MS;
        world.run_tick(*now);
    }
}

#[test]
fn test_switch_commits_bounces_and_rejects() {
    let mut world = WorldLoop::new(ServerConfig::default()).unwrap();
    world.spawn_map(MapTerrain::new(1, 8, 8)).unwrap();
    let mut second = MapTerrain::new(2, 8, 8);
    second.block(GridCell { x: 7, y: 7 });
    world.spawn_map(second).unwrap();
    let traveler = world.spawn_player(1, GridCell { x: 3, y: 3 }).unwrap();

    let watcher = 9_000;
    let (watcher_addr, watcher_rx) = world.shared().router.register(256);
    world
        .shared()
        .directory
        .register(watcher, watcher_addr, ActorKind::Player)
        .unwrap();
    let far_side = world.atlas().terrain(2).unwrap();
    assert!(far_side.occupy(watcher, GridCell { x: 1, y: 1 }));
    let home = world.atlas().terrain(1).unwrap();

    let mut now = 10_000;

    // A switch onto a wall bounces; the traveler never leaves home.
    world
        .send_client_command(traveler, switch_command(traveler, 2, GridCell { x: 7, y: 7 }))
        .unwrap();
    run(&mut world, &mut now, 4);
    assert_eq!(home.position_of(traveler), Some(GridCell { x: 3, y: 3 }));
    assert_eq!(far_side.position_of(traveler), None);

    // A legal switch seats the arrival first, then frees the origin.
    world
        .send_client_command(traveler, switch_command(traveler, 2, GridCell { x: 5, y: 5 }))
        .unwrap();
    run(&mut world, &mut now, 4);
    assert_eq!(home.position_of(traveler), None);
    assert_eq!(far_side.position_of(traveler), Some(GridCell { x: 5, y: 5 }));
    let record = world.shared().directory.resolve(traveler).unwrap();
    assert_eq!(record.kind, ActorKind::Player);

    // The new neighbors saw the arrival announce itself.
    let seen: Vec<Envelope> = std::iter::from_fn(|| watcher_rx.try_recv().ok()).collect();
    let stood = seen.iter().any(|envelope| {
        envelope.message.kind == MessageKind::Action
            && envelope
                .message
                .payload
                .decode::<AmAction>()
                .map_or(false, |am| {
                    am.uid == traveler
                        && am.action == ActionKind::Stand as u32
                        && am.x == 5
                        && am.y == 5
                })
    });
    assert!(stood);

    // A switch to a map nobody keeps is bounced by the service, with
    // nothing dropped on the floor along the way.
    let dropped_before = world.dropped_deliveries();
    world
        .send_client_command(traveler, switch_command(traveler, 9, GridCell { x: 1, y: 1 }))
        .unwrap();
    run(&mut world, &mut now, 3);
    assert_eq!(far_side.position_of(traveler), Some(GridCell { x: 5, y: 5 }));
    assert_eq!(world.dropped_deliveries(), dropped_before);
}
