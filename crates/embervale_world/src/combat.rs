//! # Combat
//!
//! Attacks resolve against the attacker's *cached* view of the target,
//! not the authoritative grid. A fresh sighting strikes immediately; a
//! stale one turns into a `QueryLocation` round-trip whose reply resumes
//! the swing. Landing the hit is the victim's decision: the attacker
//! only forwards power and class, the victim applies armor and hp.
//!
//! ```text
//!   attack_uid ── fresh cache ──> resolve_strike ──> AmAttack to target
//!        │                            │
//!        │ stale cache                │ out of melee band
//!        v                            v
//!   QueryLocation ... Location    track_uid (one chase step)
//! ```
//!
//! The attack lock is held only while a location query for a strike is
//! in flight; `resolve_strike` releases it before anything else, on both
//! the fresh and the resumed path.

use tracing::{debug, warn};

use embervale_actor::{
    ActorContext, AmAttack, AmLocation, AmQueryLocation, AmUpdateHp, Envelope, Message, MessageKind,
};
use embervale_path::{find_path, OccupancyView, ServerCostModel};
use embervale_shared::{ActionKind, DamageClass, Direction, GridCell, Motion, Stance};

use crate::char_core::{AttackIntent, Creature, LocationRecord, Pending};
use crate::lifecycle::go_die;
use crate::movement::{dispatch_action, request_move};

/// Whether the entity owns `class` and can pay its resource gate.
#[must_use]
pub fn class_usable<E: Creature>(e: &E, class: DamageClass) -> bool {
    if !e.damage_classes().contains(&class) {
        return false;
    }
    let cost = class.cost();
    let ability = e.core().ability;
    ability.hp >= cost.hp && ability.mp >= cost.mp
}

/// Starts a swing at `target` with `class`.
///
/// With a fresh cached sighting the strike resolves in place. With a
/// stale one, the attack lock is taken and a location query goes out;
/// the `Location` reply resumes the swing. Returns whether the swing
/// (or the chase it degraded into) was set in motion.
pub fn attack_uid<E: Creature>(
    e: &mut E,
    target: u64,
    class: DamageClass,
    ctx: &mut ActorContext<'_, E>,
) -> bool {
    let now_ms = ctx.now_ms;
    if target == 0 || target == e.uid() {
        return false;
    }
    if !e.can_attack(now_ms) {
        return false;
    }
    if !class_usable(e, class) {
        return false;
    }

    if let Some(sighting) = e.core().fresh_location(target, now_ms) {
        e.core_mut().attack_lock = true;
        return resolve_strike(e, target, class, sighting, ctx);
    }

    e.core_mut().attack_lock = true;
    if query_location(e, target, AttackIntent::Strike(class), ctx) {
        true
    } else {
        e.core_mut().attack_lock = false;
        false
    }
}

/// Lands the swing against a located target.
///
/// The attack lock drops first no matter what happens next, so a failed
/// resolution can never wedge the entity. A target outside the melee
/// band converts the swing into one chase step toward it.
pub fn resolve_strike<E: Creature>(
    e: &mut E,
    target: u64,
    class: DamageClass,
    sighting: LocationRecord,
    ctx: &mut ActorContext<'_, E>,
) -> bool {
    e.core_mut().attack_lock = false;

    if sighting.map_id != e.core().map_id {
        debug!(uid = e.uid(), target, "strike target on another map");
        return false;
    }
    let distance2 = e.core().cell.distance2(sighting.cell);
    let Some(stance) = Stance::from_distance2(distance2) else {
        return track_uid(e, target, ctx);
    };
    let Some(record) = ctx.directory.resolve(target) else {
        // The target despawned between sighting and swing.
        e.core_mut().evict_target(target);
        return false;
    };

    let origin = e.core().cell;
    let facing = Direction::between(origin, sighting.cell);
    if facing != Direction::None {
        e.core_mut().direction = facing;
    }
    dispatch_action(e, ctx, ActionKind::Attack, stance as u32, origin, sighting.cell);

    let cost = class.cost();
    let core = e.core_mut();
    core.ability.mp = core.ability.mp.saturating_sub(cost.mp);
    core.last_attack_ms = ctx.now_ms;
    let power = core.attack_power();

    let am = AmAttack {
        uid: e.uid(),
        map_id: e.core().map_id,
        damage_class: class as u32,
        power,
        x: origin.x,
        y: origin.y,
        _padding: 0,
    };
    match Message::with_payload(MessageKind::Attack, &am) {
        Ok(message) => {
            ctx.forward(message, record.address);
            true
        }
        Err(error) => {
            warn!(uid = e.uid(), %error, "attack encode failed");
            false
        }
    }
}

/// Takes one walk step toward `target`, querying its location first if
/// the cached sighting has gone stale.
pub fn track_uid<E: Creature>(e: &mut E, target: u64, ctx: &mut ActorContext<'_, E>) -> bool {
    let now_ms = ctx.now_ms;
    if !e.can_move(now_ms) {
        return false;
    }
    if ctx.directory.resolve(target).is_none() {
        e.core_mut().evict_target(target);
        return false;
    }
    if let Some(sighting) = e.core().fresh_location(target, now_ms) {
        if sighting.map_id != e.core().map_id {
            e.core_mut().evict_target(target);
            return false;
        }
        return resolve_chase(e, sighting.cell, ctx);
    }
    query_location(e, target, AttackIntent::Chase, ctx)
}

/// Steps toward `destination`, or reports success if already adjacent.
pub fn resolve_chase<E: Creature>(
    e: &mut E,
    destination: GridCell,
    ctx: &mut ActorContext<'_, E>,
) -> bool {
    if e.core().cell.distance2(destination) <= 2 {
        return true;
    }
    let Some(step) = next_step_toward(e, destination) else {
        return false;
    };
    request_move(e, Motion::Walk, step, ctx)
}

/// Picks the next cell of an advisory route toward `destination`.
///
/// The direct neighbor wins when it is free; otherwise a weighted search
/// prices a detour around whatever is in the way. The keeper still has
/// the last word on the step itself.
pub(crate) fn next_step_toward<E: Creature>(e: &E, destination: GridCell) -> Option<GridCell> {
    let core = e.core();
    let origin = core.cell;
    let (dx, dy) = Direction::between(origin, destination).offset();
    let direct = origin.offset(dx, dy);
    if direct != origin && core.terrain.walkable(direct) && !core.terrain.occupied(direct) {
        return Some(direct);
    }
    let model = ServerCostModel::new(core.terrain.as_ref(), core.costs);
    match find_path(&model, origin, destination, core.costs.max_expansions) {
        Ok(Some(path)) => path.get(1).copied(),
        Ok(None) | Err(_) => None,
    }
}

/// Asks `target` where it is. The reply resumes whatever `intent` the
/// caller recorded. Fails without side effects when another request is
/// already in flight or the target is gone from the directory.
pub fn query_location<E: Creature>(
    e: &mut E,
    target: u64,
    intent: AttackIntent,
    ctx: &mut ActorContext<'_, E>,
) -> bool {
    if e.core().pending != Pending::Idle {
        return false;
    }
    let Some(record) = ctx.directory.resolve(target) else {
        e.core_mut().evict_target(target);
        return false;
    };

    let request_id = e.core_mut().next_request_id();
    let am = AmQueryLocation {
        uid: e.uid(),
        map_id: e.core().map_id,
        _padding: 0,
    };
    let message = match Message::with_payload(MessageKind::QueryLocation, &am) {
        Ok(message) => message.expecting_reply(request_id),
        Err(error) => {
            warn!(uid = e.uid(), %error, "location query encode failed");
            return false;
        }
    };
    ctx.forward(message, record.address);
    e.core_mut().pending = Pending::AwaitingLocation {
        target,
        request_id,
        issued_ms: ctx.now_ms,
        intent,
    };
    true
}

/// One combat-brain step: engage the front aggro target.
///
/// Tries every owned damage class against the focus, then a chase step;
/// any success refreshes the focus, total failure rotates the deque so a
/// blocked target cannot starve the rest.
pub fn track_attack<E: Creature>(e: &mut E, ctx: &mut ActorContext<'_, E>) -> bool {
    let now_ms = ctx.now_ms;
    e.core_mut().prune_front_expired(now_ms);
    let Some(target) = e.core().front_target() else {
        return false;
    };
    if ctx.directory.resolve(target).is_none() {
        e.core_mut().evict_target(target);
        return false;
    }
    for class in e.damage_classes() {
        if attack_uid(e, target, class, ctx) {
            e.core_mut().refresh_target(target, now_ms);
            return true;
        }
    }
    if track_uid(e, target, ctx) {
        e.core_mut().refresh_target(target, now_ms);
        return true;
    }
    e.core_mut().rotate_target();
    false
}

/// Applies an incoming hit. The victim owns the armor math and the death
/// decision. Returns the attacker's uid when the hit landed, so callers
/// with a retaliation policy can aggro it.
pub fn handle_attack<E: Creature>(
    e: &mut E,
    envelope: &Envelope,
    ctx: &mut ActorContext<'_, E>,
) -> Option<u64> {
    let Ok(am) = envelope.message.payload.decode::<AmAttack>() else {
        warn!(uid = e.uid(), "malformed attack dropped");
        return None;
    };
    let Some(class) = DamageClass::from_u32(am.damage_class) else {
        warn!(uid = e.uid(), raw = am.damage_class, "attack with bad damage class dropped");
        return None;
    };
    if e.core().dead || e.core().ghost {
        return None;
    }
    if am.map_id != e.core().map_id {
        return None;
    }

    let strike_cell = GridCell::new(am.x, am.y);
    let armor = match class {
        DamageClass::PhysicalPlain | DamageClass::PhysicalWideSword => e.core().ability.ac,
        DamageClass::MagicFire | DamageClass::MagicExplode => e.core().ability.mac,
    };
    let damage = am.power.saturating_sub(armor);

    let own_cell = e.core().cell;
    let core = e.core_mut();
    core.ability.hp = core.ability.hp.saturating_sub(damage);
    let facing = Direction::between(own_cell, strike_cell);
    if facing != Direction::None {
        core.direction = facing;
    }
    core.record_location(
        am.uid,
        LocationRecord {
            cell: strike_cell,
            direction: Direction::between(strike_cell, own_cell),
            map_id: am.map_id,
            recorded_ms: ctx.now_ms,
        },
    );

    dispatch_action(e, ctx, ActionKind::UnderAttack, class as u32, own_cell, own_cell);
    broadcast_hp(e, ctx);

    if e.core().ability.hp == 0 {
        go_die(e, ctx);
    }
    Some(am.uid)
}

/// Reports current hit points to the keeper for view fan-out.
pub fn broadcast_hp<E: Creature>(e: &E, ctx: &ActorContext<'_, E>) {
    let core = e.core();
    if core.keeper_addr.is_null() {
        return;
    }
    let am = AmUpdateHp {
        uid: core.uid,
        map_id: core.map_id,
        hp: core.ability.hp,
        hp_max: core.ability.hp_max,
        _padding: 0,
    };
    match Message::with_payload(MessageKind::UpdateHp, &am) {
        Ok(message) => ctx.forward(message, core.keeper_addr),
        Err(error) => warn!(uid = core.uid, %error, "hp broadcast encode failed"),
    }
}

/// Answers a location query. Ghosts stay silent; everyone else replies
/// even mid-move, reporting the last committed cell.
pub fn handle_query_location<E: Creature>(e: &E, envelope: &Envelope, ctx: &ActorContext<'_, E>) {
    if envelope.from.is_null() || e.core().ghost {
        return;
    }
    let core = e.core();
    let am = AmLocation {
        uid: core.uid,
        map_id: core.map_id,
        x: core.cell.x,
        y: core.cell.y,
        direction: core.direction as u32,
    };
    match Message::with_payload(MessageKind::Location, &am) {
        Ok(message) => {
            ctx.forward(message.replying_to(envelope.message.request_id), envelope.from);
        }
        Err(error) => warn!(uid = core.uid, %error, "location reply encode failed"),
    }
}

/// Absorbs a location report: always refresh the cache, and resume the
/// pending strike or chase when the reply correlates with it.
pub fn handle_location<E: Creature>(
    e: &mut E,
    envelope: &Envelope,
    ctx: &mut ActorContext<'_, E>,
) {
    let Ok(am) = envelope.message.payload.decode::<AmLocation>() else {
        warn!(uid = e.uid(), "malformed location report dropped");
        return;
    };
    let Some(direction) = Direction::from_u32(am.direction) else {
        warn!(uid = e.uid(), raw = am.direction, "location report with bad facing dropped");
        return;
    };
    let sighting = LocationRecord {
        cell: GridCell::new(am.x, am.y),
        direction,
        map_id: am.map_id,
        recorded_ms: ctx.now_ms,
    };
    e.core_mut().record_location(am.uid, sighting);

    let Pending::AwaitingLocation {
        target,
        request_id,
        intent,
        ..
    } = e.core().pending
    else {
        return;
    };
    if envelope.message.response_id != request_id || am.uid != target {
        return;
    }
    e.core_mut().pending = Pending::Idle;

    // Death while the query was in flight: the intent is void, but a
    // strike's lock must not leak.
    if e.core().dead {
        e.core_mut().attack_lock = false;
        return;
    }
    match intent {
        AttackIntent::Strike(class) => {
            resolve_strike(e, target, class, sighting, ctx);
        }
        AttackIntent::Chase => {
            if sighting.map_id == e.core().map_id {
                resolve_chase(e, sighting.cell, ctx);
            } else {
                e.core_mut().evict_target(target);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::{Monster, MonsterSpawn};
    use crate::stats::{StatRegistry, WorldTuning};
    use crate::terrain::MapTerrain;
    use embervale_actor::{Address, DisposalQueue, Router, UidDirectory};
    use embervale_path::PathCosts;
    use embervale_shared::{ActorKind, MonsterKind};
    use std::sync::Arc;

    struct Rig {
        router: Router,
        directory: UidDirectory,
        disposal: DisposalQueue,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                router: Router::new(),
                directory: UidDirectory::new(),
                disposal: DisposalQueue::new(16),
            }
        }
    }

    fn monster(uid: u64, kind: MonsterKind, cell: GridCell) -> Monster {
        let terrain = Arc::new(MapTerrain::new(1, 20, 20));
        Monster::new(
            uid,
            kind,
            MonsterSpawn {
                map_id: 1,
                cell,
                registry: Arc::new(StatRegistry::builtin()),
                terrain,
                tuning: WorldTuning::default(),
                costs: PathCosts::default(),
            },
        )
        .unwrap()
    }

    fn sighting_at(cell: GridCell, now_ms: u64) -> LocationRecord {
        LocationRecord {
            cell,
            direction: Direction::Down,
            map_id: 1,
            recorded_ms: now_ms,
        }
    }

    #[test]
    fn test_adjacent_strike_lands() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, keeper_rx) = rig.router.register(16);
        let (target_addr, target_rx) = rig.router.register(16);
        rig.directory
            .register(9, target_addr, ActorKind::Player)
            .unwrap();

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;
        zuma.core_mut().record_location(9, sighting_at(GridCell::new(6, 5), 10_000));

        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(attack_uid(&mut zuma, 9, DamageClass::PhysicalPlain, &mut ctx));

        // The swing faces the target and is never left locked.
        assert_eq!(zuma.core().direction, Direction::Right);
        assert!(!zuma.core().attack_lock);
        assert_eq!(zuma.core().last_attack_ms, 10_000);

        // Keeper sees the swing with its orthogonal stance.
        let action = keeper_rx.try_recv().unwrap();
        assert_eq!(action.message.kind, MessageKind::Action);
        let am = action.message.payload.decode::<embervale_actor::AmAction>().unwrap();
        assert_eq!(am.action, ActionKind::Attack as u32);
        assert_eq!(am.param, Stance::Orthogonal as u32);

        // Target takes the hit with power inside the zuma band.
        let hit = target_rx.try_recv().unwrap();
        assert_eq!(hit.message.kind, MessageKind::Attack);
        let am = hit.message.payload.decode::<AmAttack>().unwrap();
        assert_eq!(am.uid, 7);
        assert!((4..=9).contains(&am.power));
        assert_eq!(GridCell::new(am.x, am.y), GridCell::new(5, 5));
    }

    #[test]
    fn test_out_of_band_attack_becomes_chase() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, keeper_rx) = rig.router.register(16);
        let (target_addr, target_rx) = rig.router.register(16);
        rig.directory
            .register(9, target_addr, ActorKind::Player)
            .unwrap();

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;
        // Two cells away: outside the melee band.
        zuma.core_mut().record_location(9, sighting_at(GridCell::new(7, 5), 10_000));

        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(attack_uid(&mut zuma, 9, DamageClass::PhysicalPlain, &mut ctx));

        // No swing reached the target; a step request reached the keeper.
        assert!(target_rx.try_recv().is_err());
        let step = keeper_rx.try_recv().unwrap();
        assert_eq!(step.message.kind, MessageKind::TryMove);
        let am = step.message.payload.decode::<embervale_actor::AmTryMove>().unwrap();
        assert_eq!(GridCell::new(am.end_x, am.end_y), GridCell::new(6, 5));
        assert!(zuma.core().move_lock);
        assert!(!zuma.core().attack_lock);
    }

    #[test]
    fn test_stale_sighting_queries_then_strikes_on_reply() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, _keeper_rx) = rig.router.register(16);
        let (target_addr, target_rx) = rig.router.register(16);
        rig.directory
            .register(9, target_addr, ActorKind::Player)
            .unwrap();

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;

        // No sighting at all: the swing starts with a location query and
        // holds the attack lock while it waits.
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(attack_uid(&mut zuma, 9, DamageClass::PhysicalPlain, &mut ctx));
        assert!(zuma.core().attack_lock);
        let query = target_rx.try_recv().unwrap();
        assert_eq!(query.message.kind, MessageKind::QueryLocation);
        let request_id = query.message.request_id;
        assert_ne!(request_id, 0);

        // A second swing while the query is out is refused by the lock.
        assert!(!attack_uid(&mut zuma, 9, DamageClass::PhysicalPlain, &mut ctx));

        // The reply resumes the swing against the reported cell.
        let reply = Message::with_payload(
            MessageKind::Location,
            &AmLocation {
                uid: 9,
                map_id: 1,
                x: 6,
                y: 6,
                direction: Direction::Up as u32,
            },
        )
        .unwrap()
        .replying_to(request_id);
        handle_location(
            &mut zuma,
            &Envelope {
                message: reply,
                from: target_addr,
            },
            &mut ctx,
        );
        assert!(!zuma.core().attack_lock);
        assert_eq!(zuma.core().pending, Pending::Idle);
        let hit = target_rx.try_recv().unwrap();
        assert_eq!(hit.message.kind, MessageKind::Attack);
    }

    #[test]
    fn test_stray_location_report_only_feeds_cache() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (target_addr, _target_rx) = rig.router.register(16);

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);

        let report = Message::with_payload(
            MessageKind::Location,
            &AmLocation {
                uid: 31,
                map_id: 1,
                x: 2,
                y: 3,
                direction: Direction::Left as u32,
            },
        )
        .unwrap();
        handle_location(
            &mut zuma,
            &Envelope {
                message: report,
                from: target_addr,
            },
            &mut ctx,
        );
        assert_eq!(zuma.core().pending, Pending::Idle);
        let cached = zuma.core().fresh_location(31, 10_000).unwrap();
        assert_eq!(cached.cell, GridCell::new(2, 3));
    }

    #[test]
    fn test_victim_applies_armor_and_reports() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, keeper_rx) = rig.router.register(16);

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;

        let strike = Message::with_payload(
            MessageKind::Attack,
            &AmAttack {
                uid: 77,
                map_id: 1,
                damage_class: DamageClass::PhysicalPlain as u32,
                power: 10,
                x: 6,
                y: 5,
                _padding: 0,
            },
        )
        .unwrap();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        let attacker = handle_attack(
            &mut zuma,
            &Envelope {
                message: strike,
                from: Address::NULL,
            },
            &mut ctx,
        );
        assert_eq!(attacker, Some(77));

        // Zuma armor 2 against power 10: 8 off the 40 hp pool.
        assert_eq!(zuma.core().ability.hp, 32);
        assert_eq!(zuma.core().direction, Direction::Right);
        // The striker's position is now a usable sighting.
        assert_eq!(
            zuma.core().fresh_location(77, 10_000).unwrap().cell,
            GridCell::new(6, 5)
        );

        let flinch = keeper_rx.try_recv().unwrap();
        assert_eq!(flinch.message.kind, MessageKind::Action);
        let am = flinch.message.payload.decode::<embervale_actor::AmAction>().unwrap();
        assert_eq!(am.action, ActionKind::UnderAttack as u32);
        let hp = keeper_rx.try_recv().unwrap();
        assert_eq!(hp.message.kind, MessageKind::UpdateHp);
        let am = hp.message.payload.decode::<AmUpdateHp>().unwrap();
        assert_eq!(am.hp, 32);
        assert_eq!(am.hp_max, 40);
    }

    #[test]
    fn test_lethal_hit_starts_death_and_corpse_ignores_more() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, keeper_rx) = rig.router.register(16);

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;

        let strike = Message::with_payload(
            MessageKind::Attack,
            &AmAttack {
                uid: 77,
                map_id: 1,
                damage_class: DamageClass::PhysicalPlain as u32,
                power: 100,
                x: 6,
                y: 5,
                _padding: 0,
            },
        )
        .unwrap();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        let attacker = handle_attack(
            &mut zuma,
            &Envelope {
                message: strike,
                from: Address::NULL,
            },
            &mut ctx,
        );
        assert_eq!(attacker, Some(77));
        assert_eq!(zuma.core().ability.hp, 0);
        assert!(zuma.core().dead);
        // Ghost transition is scheduled, not immediate.
        assert_eq!(ctx.pending_delays(), 1);

        // UnderAttack, UpdateHp, then the Die action.
        let kinds: Vec<MessageKind> = std::iter::from_fn(|| keeper_rx.try_recv().ok())
            .map(|envelope| envelope.message.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![MessageKind::Action, MessageKind::UpdateHp, MessageKind::Action]
        );

        // A corpse absorbs nothing further.
        let again = Message::with_payload(
            MessageKind::Attack,
            &AmAttack {
                uid: 78,
                map_id: 1,
                damage_class: DamageClass::PhysicalPlain as u32,
                power: 10,
                x: 4,
                y: 5,
                _padding: 0,
            },
        )
        .unwrap();
        let more = handle_attack(
            &mut zuma,
            &Envelope {
                message: again,
                from: Address::NULL,
            },
            &mut ctx,
        );
        assert_eq!(more, None);
    }

    #[test]
    fn test_track_attack_rotates_on_total_failure() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, _keeper_rx) = rig.router.register(16);
        let (a_addr, _a_rx) = rig.router.register(16);
        let (b_addr, _b_rx) = rig.router.register(16);
        rig.directory
            .register(8, a_addr, ActorKind::Player)
            .unwrap();
        rig.directory
            .register(9, b_addr, ActorKind::Player)
            .unwrap();

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;
        zuma.core_mut().add_target(8, 10_000);
        zuma.core_mut().add_target(9, 10_000);
        // Death makes every approach fail without touching the deque
        // entries themselves.
        zuma.core_mut().dead = true;

        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(!track_attack(&mut zuma, &mut ctx));
        assert_eq!(zuma.core().front_target(), Some(9));
    }

    #[test]
    fn test_track_attack_evicts_despawned_focus() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (keeper_addr, _keeper_rx) = rig.router.register(16);

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        zuma.core_mut().keeper_addr = keeper_addr;
        zuma.core_mut().add_target(99, 10_000);

        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(!track_attack(&mut zuma, &mut ctx));
        assert!(zuma.core().targets.is_empty());
        assert!(!zuma.core().locations.contains_key(&99));
    }

    #[test]
    fn test_query_reply_for_ghost_stays_silent() {
        let rig = Rig::new();
        let sender = rig.disposal.sender();
        let (asker_addr, asker_rx) = rig.router.register(16);

        let mut zuma = monster(7, MonsterKind::Zuma, GridCell::new(5, 5));
        let ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);

        let query = Message::bare(MessageKind::QueryLocation).expecting_reply(3);
        handle_query_location(
            &zuma,
            &Envelope {
                message: query,
                from: asker_addr,
            },
            &ctx,
        );
        let reply = asker_rx.try_recv().unwrap();
        assert_eq!(reply.message.kind, MessageKind::Location);
        assert_eq!(reply.message.response_id, 3);

        zuma.core_mut().ghost = true;
        handle_query_location(
            &zuma,
            &Envelope {
                message: query,
                from: asker_addr,
            },
            &ctx,
        );
        assert!(asker_rx.try_recv().is_err());
    }
}
