//! # World Loop
//!
//! The composition root. Owns the routing fabric, the uid directory, the
//! map atlas and every live pod; one call to [`WorldLoop::run_tick`]
//! beats the metronome across the population, lets each pod drain its
//! mailbox and delayed commands, then sweeps disposals so retired uids
//! leave the directory and the pod list inside the same tick.
//!
//! Spawning goes through here as well. Keepers claim whole maps,
//! creatures claim cells, and every pod is wired, hooked and activated
//! in one place so entity code never runs half-connected.

use std::sync::Arc;

use tracing::{debug, info};

use embervale_actor::{
    ActorPod, Address, AmBindSession, AmClientCommand, DisposalQueue, Message, MessageKind,
    Router, RunPod, RuntimeShared, TickWork, UidDirectory,
};
use embervale_shared::{ActorKind, GridCell, MonsterKind};
use embervale_world::lifecycle::pending_watchdog;
use embervale_world::{
    Creature, MapAtlas, MapEntry, MapKeeper, MapTerrain, Monster, MonsterSpawn, Player,
    PlayerSpawn, StatRegistry, WorldError, WorldResult, WorldService, PLAYER_BASELINE,
};

use crate::config::ServerConfig;

// =============================================================================
// TICK ACCOUNTING
// =============================================================================

/// What one whole tick did across the population.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickSummary {
    /// Tick ordinal, starting at 1.
    pub tick: u64,
    /// Timestamp the tick ran at.
    pub now_ms: u64,
    /// Work tallied across every pod.
    pub work: TickWork,
    /// Pods retired by the disposal sweep.
    pub reaped: usize,
}

/// Running totals over many ticks, for periodic operator reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickLedger {
    ticks: u64,
    messages: usize,
    commands: usize,
    hooks: usize,
    reaped: usize,
}

impl TickLedger {
    /// Folds one tick's summary into the totals.
    pub fn record(&mut self, summary: &TickSummary) {
        self.ticks += 1;
        self.messages += summary.work.messages_handled;
        self.commands += summary.work.commands_run;
        self.hooks += summary.work.hooks_ran;
        self.reaped += summary.reaped;
    }

    /// Ticks recorded since the last reset.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Mailbox messages handled since the last reset.
    #[must_use]
    pub fn messages(&self) -> usize {
        self.messages
    }

    /// Delayed commands executed since the last reset.
    #[must_use]
    pub fn commands(&self) -> usize {
        self.commands
    }

    /// Hooks that reported work since the last reset.
    #[must_use]
    pub fn hooks(&self) -> usize {
        self.hooks
    }

    /// Pods retired since the last reset.
    #[must_use]
    pub fn reaped(&self) -> usize {
        self.reaped
    }

    /// Clears the totals for the next reporting window.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// WORLD LOOP
// =============================================================================

/// The server's single-threaded composition root.
pub struct WorldLoop {
    config: ServerConfig,
    shared: RuntimeShared,
    disposal: DisposalQueue,
    atlas: Arc<MapAtlas>,
    registry: Arc<StatRegistry>,
    pods: Vec<Box<dyn RunPod>>,
    service_uid: u64,
    service_addr: Address,
    tick: u64,
}

impl WorldLoop {
    /// Boots an empty world on the built-in stat table.
    ///
    /// # Errors
    ///
    /// Returns an error when the world service cannot be registered.
    pub fn new(config: ServerConfig) -> WorldResult<Self> {
        Self::with_registry(config, Arc::new(StatRegistry::builtin()))
    }

    /// Boots an empty world on a caller-supplied stat table.
    ///
    /// The cross-map service is the first pod alive; everything spawned
    /// later gets its address so map switches always have a broker.
    ///
    /// # Errors
    ///
    /// Returns an error when the world service cannot be registered.
    pub fn with_registry(config: ServerConfig, registry: Arc<StatRegistry>) -> WorldResult<Self> {
        let disposal = DisposalQueue::new(config.mailbox_capacity);
        let shared = RuntimeShared {
            router: Arc::new(Router::new()),
            directory: Arc::new(UidDirectory::new()),
            disposal: disposal.sender(),
        };
        let atlas = Arc::new(MapAtlas::new());

        let service_uid = shared.directory.allocate_uid();
        let service = WorldService::new(service_uid, Arc::clone(&atlas));
        let mut pod = ActorPod::new(service, config.mailbox_capacity);
        let service_addr = pod.activate(&shared.router);
        shared
            .directory
            .register(service_uid, service_addr, ActorKind::WorldService)?;
        info!(service_uid, "world service online");

        Ok(Self {
            config,
            shared,
            disposal,
            atlas,
            registry,
            pods: vec![Box::new(pod)],
            service_uid,
            service_addr,
            tick: 0,
        })
    }

    /// Brings a map online under a fresh keeper.
    ///
    /// Returns the keeper's uid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateMap`] when the map id is already
    /// kept, or a registration failure from the directory.
    pub fn spawn_map(&mut self, terrain: MapTerrain) -> WorldResult<u64> {
        let map_id = terrain.map_id();
        if self.atlas.entry(map_id).is_some() {
            return Err(WorldError::DuplicateMap { map_id });
        }

        let terrain = Arc::new(terrain);
        let keeper_uid = self.shared.directory.allocate_uid();
        let keeper = MapKeeper::new(keeper_uid, Arc::clone(&terrain));
        let mut pod = ActorPod::new(keeper, self.config.mailbox_capacity);
        let keeper_addr = pod.activate(&self.shared.router);
        self.shared
            .directory
            .register(keeper_uid, keeper_addr, ActorKind::MapKeeper)?;

        let fresh = self.atlas.insert(
            map_id,
            MapEntry {
                keeper_uid,
                keeper_addr,
                terrain,
            },
        );
        debug_assert!(fresh);
        self.pods.push(Box::new(pod));
        info!(map_id, keeper_uid, "map online");
        Ok(keeper_uid)
    }

    /// Spawns a monster of `kind` on `cell`, claiming the cell first.
    ///
    /// Returns the monster's uid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownMap`] for an unkept map,
    /// [`WorldError::SpawnBlocked`] when the cell cannot be claimed, or
    /// a stat-table miss from the monster constructor.
    pub fn spawn_monster(
        &mut self,
        kind: MonsterKind,
        map_id: u32,
        cell: GridCell,
    ) -> WorldResult<u64> {
        let entry = self
            .atlas
            .entry(map_id)
            .ok_or(WorldError::UnknownMap { map_id })?;
        let uid = self.shared.directory.allocate_uid();
        if !entry.terrain.occupy(uid, cell) {
            return Err(WorldError::SpawnBlocked {
                map_id,
                x: cell.x,
                y: cell.y,
            });
        }

        let spawn = MonsterSpawn {
            map_id,
            cell,
            registry: Arc::clone(&self.registry),
            terrain: Arc::clone(&entry.terrain),
            tuning: self.config.tuning,
            costs: self.config.costs,
        };
        let monster = match Monster::new(uid, kind, spawn) {
            Ok(monster) => monster,
            Err(error) => {
                entry.terrain.vacate(uid);
                return Err(error);
            }
        };

        let mut pod = ActorPod::new(monster, self.config.mailbox_capacity);
        pod.entity_mut().core_mut().keeper_addr = entry.keeper_addr;
        pod.install_hook("pending_watchdog", |entity, ctx| {
            pending_watchdog(entity, ctx)
        });
        let address = pod.activate(&self.shared.router);
        self.shared.directory.register(uid, address, ActorKind::Monster)?;
        self.pods.push(Box::new(pod));
        info!(uid, kind = kind.as_str(), map_id, x = cell.x, y = cell.y, "monster spawned");
        Ok(uid)
    }

    /// Spawns a player on `cell` with the baseline ability block.
    ///
    /// Returns the player's uid. The player stays invisible to its
    /// neighbors until its first action broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownMap`] for an unkept map or
    /// [`WorldError::SpawnBlocked`] when the cell cannot be claimed.
    pub fn spawn_player(&mut self, map_id: u32, cell: GridCell) -> WorldResult<u64> {
        let entry = self
            .atlas
            .entry(map_id)
            .ok_or(WorldError::UnknownMap { map_id })?;
        let uid = self.shared.directory.allocate_uid();
        if !entry.terrain.occupy(uid, cell) {
            return Err(WorldError::SpawnBlocked {
                map_id,
                x: cell.x,
                y: cell.y,
            });
        }

        let spawn = PlayerSpawn {
            map_id,
            cell,
            ability: PLAYER_BASELINE,
            atlas: Arc::clone(&self.atlas),
            tuning: self.config.tuning,
            costs: self.config.costs,
        };
        let player = match Player::new(uid, spawn) {
            Ok(player) => player,
            Err(error) => {
                entry.terrain.vacate(uid);
                return Err(error);
            }
        };

        let mut pod = ActorPod::new(player, self.config.mailbox_capacity);
        pod.entity_mut().core_mut().service_addr = self.service_addr;
        pod.install_hook("pending_watchdog", |entity, ctx| {
            pending_watchdog(entity, ctx)
        });
        let address = pod.activate(&self.shared.router);
        self.shared.directory.register(uid, address, ActorKind::Player)?;
        self.pods.push(Box::new(pod));
        info!(uid, map_id, x = cell.x, y = cell.y, "player spawned");
        Ok(uid)
    }

    /// Delivers a client command into a player's mailbox.
    ///
    /// Returns `false` when the uid is unknown or the mailbox refused
    /// the message.
    ///
    /// # Errors
    ///
    /// Returns an encoding failure from the message layer.
    pub fn send_client_command(&self, uid: u64, command: AmClientCommand) -> WorldResult<bool> {
        let Some(record) = self.shared.directory.resolve(uid) else {
            return Ok(false);
        };
        let message = Message::with_payload(MessageKind::ClientCommand, &command)?;
        Ok(self
            .shared
            .router
            .deliver(message, record.address, Address::NULL))
    }

    /// Binds a session id to a player's mailbox.
    ///
    /// Returns `false` when the uid is unknown or the mailbox refused
    /// the message.
    ///
    /// # Errors
    ///
    /// Returns an encoding failure from the message layer.
    pub fn bind_session(&self, uid: u64, session_id: u64) -> WorldResult<bool> {
        let Some(record) = self.shared.directory.resolve(uid) else {
            return Ok(false);
        };
        let am = AmBindSession { uid, session_id };
        let message = Message::with_payload(MessageKind::BindSession, &am)?;
        Ok(self
            .shared
            .router
            .deliver(message, record.address, Address::NULL))
    }

    /// Runs one tick at `now_ms`: metronome, pod work, disposal sweep.
    pub fn run_tick(&mut self, now_ms: u64) -> TickSummary {
        self.tick += 1;

        let beat = Message::bare(MessageKind::Metronome);
        for pod in &self.pods {
            self.shared.router.forward(beat, pod.address(), Address::NULL);
        }

        let mut work = TickWork::default();
        for pod in &mut self.pods {
            work.absorb(pod.run_tick(&self.shared, now_ms));
        }

        let dead = self.disposal.drain();
        let reaped = dead.len();
        if reaped > 0 {
            for uid in &dead {
                self.shared.directory.erase(*uid);
            }
            self.pods.retain(|pod| !dead.contains(&pod.uid()));
            debug!(reaped, tick = self.tick, "disposal sweep");
        }

        TickSummary {
            tick: self.tick,
            now_ms,
            work,
            reaped,
        }
    }

    /// The configuration the loop was booted with.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared runtime handles: router, directory, disposal sender.
    #[must_use]
    pub fn shared(&self) -> &RuntimeShared {
        &self.shared
    }

    /// The map atlas.
    #[must_use]
    pub fn atlas(&self) -> &Arc<MapAtlas> {
        &self.atlas
    }

    /// The stat table monsters are built from.
    #[must_use]
    pub fn registry(&self) -> &Arc<StatRegistry> {
        &self.registry
    }

    /// Uid of the cross-map world service.
    #[must_use]
    pub fn service_uid(&self) -> u64 {
        self.service_uid
    }

    /// Address of the cross-map world service.
    #[must_use]
    pub fn service_address(&self) -> Address {
        self.service_addr
    }

    /// Ticks run since boot.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Live pods, the world service included.
    #[must_use]
    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    /// Messages dropped at sealed or saturated mailboxes since boot.
    #[must_use]
    pub fn dropped_deliveries(&self) -> u64 {
        self.shared.router.dropped_deliveries()
    }

    /// Mailboxes currently routable.
    #[must_use]
    pub fn live_routes(&self) -> usize {
        self.shared.router.live_routes()
    }
}

// =============================================================================
// TESTS
// =============================================================================
