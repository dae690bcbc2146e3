//! # Creature Core
//!
//! [`CharCore`] is the state every living entity composes: position,
//! lifecycle flags, intent locks, the one-slot pending machine, the
//! location cache and the target deque. [`Creature`] is the trait that
//! exposes the core to the shared movement, combat and lifecycle rules.
//!
//! ## Locks and the pending slot
//!
//! `move_lock` and `attack_lock` serialize intents, not threads: an entity
//! with a step in flight refuses a second step instead of queueing it.
//! The [`Pending`] slot records which reply the entity is waiting for; at
//! most one request is ever in flight per entity, which is what makes the
//! single `request_id` counter sufficient for correlation.
//!
//! ```text
//!   Idle --RequestMove--> AwaitingMoveAck --MoveOk/MoveError--> Idle
//!   Idle --QueryLocation--> AwaitingLocation --Location--> Idle
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use embervale_actor::{Actor, Address};
use embervale_path::PathCosts;
use embervale_shared::{ActorKind, DamageClass, Direction, GridCell};

use crate::error::WorldError;
use crate::stats::{AbilityScores, WorldTuning};
use crate::terrain::MapTerrain;

/// A cached sighting of another entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationRecord {
    /// Cell the entity was seen on.
    pub cell: GridCell,
    /// Facing at sighting time.
    pub direction: Direction,
    /// Map the sighting happened on.
    pub map_id: u32,
    /// When the sighting was recorded.
    pub recorded_ms: u64,
}

/// One entry in the aggro deque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetRecord {
    /// The hostile entity.
    pub uid: u64,
    /// Last time this target was engaged or refreshed.
    pub active_ms: u64,
}

/// What an awaited location reply will be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackIntent {
    /// Swing with this class once the target is located.
    Strike(DamageClass),
    /// Step toward the target once located.
    Chase,
}

/// The one-slot reply machine. At most one request is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Pending {
    /// Nothing awaited.
    #[default]
    Idle,
    /// A `TryMove` (or map switch) is awaiting its keeper verdict.
    AwaitingMoveAck {
        /// Requested destination cell.
        destination: GridCell,
        /// Correlation id stamped on the request.
        request_id: u32,
        /// When the request left.
        issued_ms: u64,
    },
    /// A `QueryLocation` is awaiting the target's reply.
    AwaitingLocation {
        /// The queried entity.
        target: u64,
        /// Correlation id stamped on the query.
        request_id: u32,
        /// When the query left.
        issued_ms: u64,
        /// What the answer will be used for.
        intent: AttackIntent,
    },
}

/// Spawn-time parameters for a creature core.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Map to spawn on.
    pub map_id: u32,
    /// Cell to spawn on.
    pub cell: GridCell,
    /// Starting attributes.
    pub ability: AbilityScores,
    /// Walk cooldown in milliseconds.
    pub walk_wait_ms: u64,
    /// Attack cooldown in milliseconds.
    pub attack_wait_ms: u64,
    /// Shared timing knobs.
    pub tuning: WorldTuning,
    /// Path cost family for advisory planning.
    pub costs: PathCosts,
}

/// State composed into every living entity.
pub struct CharCore {
    /// Stable identity.
    pub uid: u64,
    /// Map the entity stands on.
    pub map_id: u32,
    /// Current cell.
    pub cell: GridCell,
    /// Current facing.
    pub direction: Direction,
    /// Set once by `GoDie`; never cleared.
    pub dead: bool,
    /// Set once by `GoGhost`; implies `dead`.
    pub ghost: bool,
    /// Administratively inert: no moving, no fighting.
    pub phantom: bool,
    /// Immune to `GoDie`.
    pub never_die: bool,
    /// A step request is in flight.
    pub move_lock: bool,
    /// A location query for an attack is in flight.
    pub attack_lock: bool,
    /// The one awaited reply.
    pub pending: Pending,
    /// Animation speed hint carried on action broadcasts.
    pub speed: u32,
    /// Live attributes.
    pub ability: AbilityScores,
    /// Milliseconds between steps.
    pub walk_wait_ms: u64,
    /// Milliseconds between swings.
    pub attack_wait_ms: u64,
    /// When the last step committed.
    pub last_move_ms: u64,
    /// When the last swing was dispatched.
    pub last_attack_ms: u64,
    /// Shared timing knobs.
    pub tuning: WorldTuning,
    /// Address of this entity's map keeper.
    pub keeper_addr: Address,
    /// Address of the world service.
    pub service_addr: Address,
    /// Advisory view of the home map.
    pub terrain: Arc<MapTerrain>,
    /// Path cost family for advisory planning.
    pub costs: PathCosts,
    /// Aggro deque, FIFO with lazy front expiry.
    pub targets: VecDeque<TargetRecord>,
    /// Last known locations of other entities.
    pub locations: HashMap<u64, LocationRecord>,
    rng: ChaCha8Rng,
    next_request_id: u32,
}

impl CharCore {
    /// Builds a core at its spawn point. The RNG is seeded from the uid,
    /// so a respawned world replays identically.
    #[must_use]
    pub fn new(uid: u64, config: CoreConfig, terrain: Arc<MapTerrain>) -> Self {
        Self {
            uid,
            map_id: config.map_id,
            cell: config.cell,
            direction: Direction::Down,
            dead: false,
            ghost: false,
            phantom: false,
            never_die: false,
            move_lock: false,
            attack_lock: false,
            pending: Pending::Idle,
            speed: 100,
            ability: config.ability,
            walk_wait_ms: config.walk_wait_ms,
            attack_wait_ms: config.attack_wait_ms,
            last_move_ms: 0,
            last_attack_ms: 0,
            tuning: config.tuning,
            keeper_addr: Address::NULL,
            service_addr: Address::NULL,
            terrain,
            costs: config.costs,
            targets: VecDeque::new(),
            locations: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(uid),
            next_request_id: 0,
        }
    }

    /// Movement precondition: alive, not inert, no step in flight, walk
    /// cooldown elapsed.
    #[must_use]
    pub fn can_move_base(&self, now_ms: u64) -> bool {
        !self.dead
            && !self.phantom
            && !self.move_lock
            && now_ms >= self.last_move_ms.saturating_add(self.walk_wait_ms)
    }

    /// Combat precondition: alive, not inert, no attack in flight, attack
    /// cooldown elapsed.
    #[must_use]
    pub fn can_attack_base(&self, now_ms: u64) -> bool {
        !self.dead
            && !self.phantom
            && !self.attack_lock
            && now_ms >= self.last_attack_ms.saturating_add(self.attack_wait_ms)
    }

    /// Allocates the next correlation id, skipping zero.
    pub fn next_request_id(&mut self) -> u32 {
        self.next_request_id = self.next_request_id.wrapping_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        self.next_request_id
    }

    /// Adds a hostile to the aggro deque, or refreshes it if present. The
    /// deque never grows a duplicate entry.
    pub fn add_target(&mut self, uid: u64, now_ms: u64) {
        if uid == 0 || uid == self.uid {
            return;
        }
        if let Some(record) = self.targets.iter_mut().find(|record| record.uid == uid) {
            record.active_ms = now_ms;
            return;
        }
        self.targets.push_back(TargetRecord {
            uid,
            active_ms: now_ms,
        });
    }

    /// Drops a target everywhere it is tracked.
    pub fn evict_target(&mut self, uid: u64) {
        self.targets.retain(|record| record.uid != uid);
        self.locations.remove(&uid);
    }

    /// Refreshes a target's activity stamp.
    pub fn refresh_target(&mut self, uid: u64, now_ms: u64) {
        if let Some(record) = self.targets.iter_mut().find(|record| record.uid == uid) {
            record.active_ms = now_ms;
        }
    }

    /// Pops expired records off the deque front. Expiry is lazy by
    /// design: records behind a live front entry wait their turn.
    pub fn prune_front_expired(&mut self, now_ms: u64) {
        while let Some(front) = self.targets.front() {
            if front.active_ms.saturating_add(self.tuning.target_expire_ms) <= now_ms {
                self.targets.pop_front();
            } else {
                break;
            }
        }
    }

    /// The current aggro focus.
    #[must_use]
    pub fn front_target(&self) -> Option<u64> {
        self.targets.front().map(|record| record.uid)
    }

    /// Round-robin: sends the front target to the back of the deque.
    pub fn rotate_target(&mut self) {
        if let Some(front) = self.targets.pop_front() {
            self.targets.push_back(front);
        }
    }

    /// Caches a sighting of another entity.
    pub fn record_location(&mut self, uid: u64, record: LocationRecord) {
        if uid == 0 || uid == self.uid {
            return;
        }
        self.locations.insert(uid, record);
    }

    /// A cached sighting young enough to act on, if any.
    #[must_use]
    pub fn fresh_location(&self, uid: u64, now_ms: u64) -> Option<LocationRecord> {
        let record = self.locations.get(&uid)?;
        if now_ms.saturating_sub(record.recorded_ms) <= self.tuning.location_staleness_ms {
            Some(*record)
        } else {
            None
        }
    }

    /// Rolls attack power from the ability score band.
    pub fn attack_power(&mut self) -> u32 {
        let lo = self.ability.dc_min.min(self.ability.dc_max);
        let hi = self.ability.dc_min.max(self.ability.dc_max);
        self.rng.gen_range(lo..=hi)
    }

    /// The entity's deterministic RNG.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

/// A living entity: player or monster.
///
/// The provided preconditions are overridable; monsters add a stat-table
/// validity check on top of the base rules.
pub trait Creature: Actor<Error = WorldError> + Send {
    /// The composed core, read side.
    fn core(&self) -> &CharCore;

    /// The composed core, write side.
    fn core_mut(&mut self) -> &mut CharCore;

    /// Which directory kind this creature registers as.
    fn creature_kind(&self) -> ActorKind;

    /// Damage classes available right now, in preference order.
    fn damage_classes(&self) -> Vec<DamageClass>;

    /// Whether a step may be requested at `now_ms`.
    fn can_move(&self, now_ms: u64) -> bool {
        self.core().can_move_base(now_ms)
    }

    /// Whether a swing may be started at `now_ms`.
    fn can_attack(&self, now_ms: u64) -> bool {
        self.core().can_attack_base(now_ms)
    }
}

// =============================================================================
// TESTS
// =============================================================================
