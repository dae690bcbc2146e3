//! # Player
//!
//! The human-driven creature. A player actor owns the authoritative state
//! of one character; the network layer binds a session to it once and then
//! feeds it decoded `ClientCommand` messages. Inside the world a player
//! speaks the same movement and combat protocol as everything else.
//!
//! Players are the only entities that cross maps. A switch is a
//! request/commit round trip brokered by the world service: the
//! destination keeper seats the arrival cell first, the grant rebinds
//! this actor's keeper and advisory terrain, and only then does the old
//! map receive its `Leave`.

use std::sync::Arc;

use tracing::{debug, error, warn};

use embervale_actor::{
    Actor, ActorContext, Address, AmAction, AmBindSession, AmClientCommand, AmLeave, AmMapSwitch,
    AmMapSwitchOk, AmUpdateHp, Envelope, Message, MessageKind,
};
use embervale_path::PathCosts;
use embervale_shared::{ActionKind, ActorKind, ClientCmd, DamageClass, Direction, GridCell, Motion};

use crate::char_core::{CharCore, CoreConfig, Creature, LocationRecord, Pending};
use crate::combat::{
    attack_uid, handle_attack, handle_location, handle_query_location, next_step_toward,
};
use crate::error::{WorldError, WorldResult};
use crate::movement::{dispatch_action, handle_move_error, handle_move_ok, request_move};
use crate::stats::{AbilityScores, WorldTuning};
use crate::terrain::MapAtlas;

/// Attributes of a freshly created character.
pub const PLAYER_BASELINE: AbilityScores = AbilityScores {
    hp: 10,
    hp_max: 10,
    mp: 10,
    mp_max: 10,
    dc_min: 1,
    dc_max: 2,
    ac: 0,
    mac: 0,
};

/// Spawn-time wiring for a player actor.
#[derive(Clone)]
pub struct PlayerSpawn {
    /// Map to spawn on. Must already be in the atlas.
    pub map_id: u32,
    /// Cell to spawn on.
    pub cell: GridCell,
    /// Starting attributes.
    pub ability: AbilityScores,
    /// Registry of live maps, shared with the world loop.
    pub atlas: Arc<MapAtlas>,
    /// Shared timing knobs.
    pub tuning: WorldTuning,
    /// Path cost family for advisory planning.
    pub costs: PathCosts,
}

/// A human-driven creature.
pub struct Player {
    core: CharCore,
    atlas: Arc<MapAtlas>,
    session_id: Option<u64>,
}

impl Player {
    /// Builds a player on `spawn.map_id` at `spawn.cell`, with its keeper
    /// and advisory terrain resolved from the atlas.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownMap`] when the atlas has no entry for the
    /// spawn map.
    pub fn new(uid: u64, spawn: PlayerSpawn) -> WorldResult<Self> {
        let entry = spawn.atlas.entry(spawn.map_id).ok_or(WorldError::UnknownMap {
            map_id: spawn.map_id,
        })?;
        let mut core = CharCore::new(
            uid,
            CoreConfig {
                map_id: spawn.map_id,
                cell: spawn.cell,
                ability: spawn.ability,
                walk_wait_ms: spawn.tuning.player_walk_wait_ms,
                attack_wait_ms: spawn.tuning.player_attack_wait_ms,
                tuning: spawn.tuning,
                costs: spawn.costs,
            },
            entry.terrain,
        );
        core.keeper_addr = entry.keeper_addr;
        Ok(Self {
            core,
            atlas: spawn.atlas,
            session_id: None,
        })
    }

    /// The bound network session, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    /// Binds the network session that owns this character. Rebinding the
    /// same session is a no-op.
    ///
    /// # Errors
    ///
    /// [`WorldError::SessionCollision`] when a different session is
    /// already bound.
    pub fn bind_session(&mut self, session_id: u64) -> WorldResult<()> {
        match self.session_id {
            None => {
                self.session_id = Some(session_id);
                Ok(())
            }
            Some(existing) if existing == session_id => Ok(()),
            Some(existing) => Err(WorldError::SessionCollision {
                existing,
                rejected: session_id,
            }),
        }
    }

    /// Broadcasts a stand on the authoritative cell. Sent after any
    /// rejected request so the client view snaps back to where the
    /// server says the character is.
    fn report_stand(&mut self, ctx: &ActorContext<'_, Self>) {
        let cell = self.core.cell;
        dispatch_action(self, ctx, ActionKind::Stand, 0, cell, cell);
    }

    /// Asks the world service for a switch to `cell` on `map_id`. Returns
    /// `true` if the request left; the switch commits only when the
    /// destination keeper's grant arrives.
    pub fn request_map_switch(
        &mut self,
        map_id: u32,
        cell: GridCell,
        ctx: &mut ActorContext<'_, Self>,
    ) -> bool {
        let now_ms = ctx.now_ms;
        if !self.can_move(now_ms) {
            return false;
        }
        if self.core.pending != Pending::Idle {
            return false;
        }
        if map_id == self.core.map_id {
            debug!(uid = self.core.uid, map_id, "switch to the current map refused");
            return false;
        }
        let service = self.core.service_addr;
        if service.is_null() {
            warn!(uid = self.core.uid, "map switch with no service bound");
            return false;
        }

        let request_id = self.core.next_request_id();
        let am = AmMapSwitch {
            uid: self.core.uid,
            map_id,
            x: cell.x,
            y: cell.y,
            _padding: 0,
        };
        let message = match Message::with_payload(MessageKind::MapSwitch, &am) {
            Ok(message) => message.expecting_reply(request_id),
            Err(error) => {
                warn!(uid = self.core.uid, %error, "map-switch encode failed");
                return false;
            }
        };
        ctx.forward(message, service);

        self.core.move_lock = true;
        self.core.pending = Pending::AwaitingMoveAck {
            destination: cell,
            request_id,
            issued_ms: now_ms,
        };
        true
    }

    /// Commits a granted map switch: `Leave` to the old keeper, then the
    /// core rebinds to the destination entry from the atlas. Sightings and
    /// aggro from the old map are dropped wholesale.
    fn handle_map_switch_ok(
        &mut self,
        envelope: &Envelope,
        ctx: &mut ActorContext<'_, Self>,
    ) -> bool {
        let Ok(am) = envelope.message.payload.decode::<AmMapSwitchOk>() else {
            warn!(uid = self.core.uid, "malformed switch grant dropped");
            return false;
        };
        let Pending::AwaitingMoveAck { request_id, .. } = self.core.pending else {
            debug!(uid = self.core.uid, "switch grant with nothing pending dropped");
            return false;
        };
        if envelope.message.response_id != request_id {
            debug!(uid = self.core.uid, "stale switch grant dropped");
            return false;
        }
        if self.core.dead {
            // The destination keeper already seated the arrival cell;
            // give it back, since the corpse is staying put.
            self.core.move_lock = false;
            self.core.pending = Pending::Idle;
            if let Some(entry) = self.atlas.entry(am.map_id) {
                self.send_leave(am.map_id, GridCell::new(am.x, am.y), entry.keeper_addr, ctx);
            }
            return false;
        }
        let Some(entry) = self.atlas.entry(am.map_id) else {
            warn!(
                uid = self.core.uid,
                map_id = am.map_id,
                "switch granted to a map not in the atlas"
            );
            self.core.move_lock = false;
            self.core.pending = Pending::Idle;
            self.report_stand(ctx);
            return false;
        };
        if entry.keeper_uid != am.keeper_uid {
            // The atlas is the wiring authority; the grant's keeper uid is
            // informational.
            warn!(
                uid = self.core.uid,
                map_id = am.map_id,
                granted = am.keeper_uid,
                atlas = entry.keeper_uid,
                "switch grant names a keeper the atlas does not"
            );
        }

        let old_map = self.core.map_id;
        let old_cell = self.core.cell;
        let old_keeper = self.core.keeper_addr;
        self.send_leave(old_map, old_cell, old_keeper, ctx);

        let core = &mut self.core;
        core.map_id = am.map_id;
        core.cell = GridCell::new(am.x, am.y);
        core.keeper_addr = entry.keeper_addr;
        core.terrain = entry.terrain;
        core.locations.clear();
        core.targets.clear();
        core.move_lock = false;
        core.pending = Pending::Idle;

        // Announce the arrival so the new map's viewers pick us up.
        self.report_stand(ctx);
        true
    }

    fn send_leave(
        &self,
        map_id: u32,
        cell: GridCell,
        keeper: Address,
        ctx: &ActorContext<'_, Self>,
    ) {
        if keeper.is_null() {
            return;
        }
        let am = AmLeave {
            uid: self.core.uid,
            map_id,
            x: cell.x,
            y: cell.y,
            _padding: 0,
        };
        match Message::with_payload(MessageKind::Leave, &am) {
            Ok(message) => ctx.forward(message, keeper),
            Err(error) => warn!(uid = self.core.uid, %error, "leave encode failed"),
        }
    }

    /// Folds a peer's action broadcast into the location cache. Players
    /// never auto-aggro from sight; the deque only grows through explicit
    /// attack commands.
    fn observe_action(&mut self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        let Ok(am) = envelope.message.payload.decode::<AmAction>() else {
            warn!(uid = self.core.uid, "malformed action broadcast dropped");
            return;
        };
        if am.uid == 0 || am.uid == self.core.uid {
            return;
        }
        let Some(action) = ActionKind::from_u32(am.action) else {
            warn!(uid = self.core.uid, raw = am.action, "unknown action kind dropped");
            return;
        };
        let Some(direction) = Direction::from_u32(am.direction) else {
            warn!(uid = self.core.uid, raw = am.direction, "unknown direction dropped");
            return;
        };
        self.core.record_location(
            am.uid,
            LocationRecord {
                cell: GridCell::new(am.end_x, am.end_y),
                direction,
                map_id: am.map_id,
                recorded_ms: ctx.now_ms,
            },
        );
        if action == ActionKind::Die {
            self.core.evict_target(am.uid);
        }
    }

    fn observe_hp(&self, envelope: &Envelope) {
        let Ok(am) = envelope.message.payload.decode::<AmUpdateHp>() else {
            warn!(uid = self.core.uid, "malformed hp report dropped");
            return;
        };
        debug!(uid = self.core.uid, peer = am.uid, hp = am.hp, hp_max = am.hp_max, "peer hp seen");
    }

    /// A corrupted session bind retires the actor: the character's state
    /// can no longer be trusted to belong to one session, so it leaves the
    /// map and seals rather than keep acting on a disputed identity.
    fn handle_bind(&mut self, envelope: &Envelope, ctx: &mut ActorContext<'_, Self>) {
        let Ok(am) = envelope.message.payload.decode::<AmBindSession>() else {
            warn!(uid = self.core.uid, "malformed session bind dropped");
            return;
        };
        if am.uid != self.core.uid {
            warn!(
                uid = self.core.uid,
                bound = am.uid,
                "session bind for another character dropped"
            );
            return;
        }
        if let Err(error) = self.bind_session(am.session_id) {
            error!(uid = self.core.uid, %error, "session bind conflict, retiring the player");
            let cell = self.core.cell;
            self.send_leave(self.core.map_id, cell, self.core.keeper_addr, ctx);
            ctx.request_seal();
            ctx.dispose(self.core.uid);
        }
    }

    /// Runs one decoded session command. Commands are best-effort: a
    /// refused one is dropped and the client learns the truth from the
    /// next broadcast.
    fn handle_client_command(&mut self, envelope: &Envelope, ctx: &mut ActorContext<'_, Self>) {
        let Ok(am) = envelope.message.payload.decode::<AmClientCommand>() else {
            warn!(uid = self.core.uid, "malformed client command dropped");
            return;
        };
        if am.uid != self.core.uid {
            warn!(
                uid = self.core.uid,
                commanded = am.uid,
                "client command for another character dropped"
            );
            return;
        }
        let Some(command) = ClientCmd::from_u32(am.command) else {
            warn!(uid = self.core.uid, raw = am.command, "unknown client command dropped");
            return;
        };
        match command {
            ClientCmd::Move => {
                let destination = GridCell::new(am.x, am.y);
                if destination == self.core.cell {
                    return;
                }
                // The client names the cell it wants; the server walks one
                // validated step toward it per command.
                let step = if self.core.cell.within_step(destination, 1) {
                    Some(destination)
                } else {
                    next_step_toward(self, destination)
                };
                let Some(step) = step else {
                    debug!(uid = self.core.uid, ?destination, "no step toward destination");
                    return;
                };
                if !request_move(self, Motion::Walk, step, ctx) {
                    debug!(uid = self.core.uid, "move command refused");
                }
            }
            ClientCmd::Attack => {
                if am.target == 0 {
                    warn!(uid = self.core.uid, "attack command without a target dropped");
                    return;
                }
                let class = if am.param == 0 {
                    DamageClass::PhysicalPlain
                } else {
                    match DamageClass::from_u32(am.param) {
                        Some(class) => class,
                        None => {
                            warn!(uid = self.core.uid, raw = am.param, "unknown damage class dropped");
                            return;
                        }
                    }
                };
                self.core.add_target(am.target, ctx.now_ms);
                if !attack_uid(self, am.target, class, ctx) {
                    debug!(uid = self.core.uid, target = am.target, "attack command refused");
                }
            }
            ClientCmd::MapSwitch => {
                if !self.request_map_switch(am.param, GridCell::new(am.x, am.y), ctx) {
                    debug!(uid = self.core.uid, map_id = am.param, "switch command refused");
                }
            }
        }
    }
}

impl Actor for Player {
    type Error = WorldError;

    fn uid(&self) -> u64 {
        self.core.uid
    }

    fn operate(&mut self, envelope: Envelope, ctx: &mut ActorContext<'_, Self>) {
        match envelope.message.kind {
            // Players have no tick brain; everything is reactive.
            MessageKind::Metronome => {}
            MessageKind::MoveOk => {
                handle_move_ok(self, &envelope, ctx);
            }
            MessageKind::MoveError => {
                if handle_move_error(self, &envelope) {
                    self.report_stand(ctx);
                }
            }
            MessageKind::QueryLocation => handle_query_location(self, &envelope, ctx),
            MessageKind::Location => handle_location(self, &envelope, ctx),
            MessageKind::Action => self.observe_action(&envelope, ctx),
            MessageKind::Attack => {
                handle_attack(self, &envelope, ctx);
            }
            MessageKind::UpdateHp => self.observe_hp(&envelope),
            MessageKind::MapSwitchOk => {
                self.handle_map_switch_ok(&envelope, ctx);
            }
            MessageKind::MapSwitchError => {
                if handle_move_error(self, &envelope) {
                    self.report_stand(ctx);
                }
            }
            MessageKind::BindSession => self.handle_bind(&envelope, ctx),
            MessageKind::ClientCommand => self.handle_client_command(&envelope, ctx),
            other => {
                warn!(uid = self.core.uid, kind = ?other, "message not for a player");
            }
        }
    }
}

impl Creature for Player {
    fn core(&self) -> &CharCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CharCore {
        &mut self.core
    }

    fn creature_kind(&self) -> ActorKind {
        ActorKind::Player
    }

    fn damage_classes(&self) -> Vec<DamageClass> {
        vec![DamageClass::PhysicalPlain]
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use embervale_actor::{AmTryMove, DisposalQueue, Router, UidDirectory};

    use crate::terrain::{MapEntry, MapTerrain};

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

    fn spawn_on(atlas: Arc<MapAtlas>, map_id: u32, cell: GridCell) -> PlayerSpawn {
        PlayerSpawn {
            map_id,
            cell,
            ability: PLAYER_BASELINE,
            atlas,
            tuning: WorldTuning::default(),
            costs: PathCosts::default(),
        }
    }

    #[test]
    fn test_bind_session_rejects_second_session() {
        let rig = Rig::new();
        let (keeper_addr, _keeper_rx) = rig.router.register(16);
        let atlas = Arc::new(MapAtlas::new());
        assert!(atlas.insert(
            1,
            MapEntry {
                keeper_uid: 100,
                keeper_addr,
                terrain: Arc::new(MapTerrain::new(1, 20, 20)),
            },
        ));
        let mut player = Player::new(7, spawn_on(atlas, 1, GridCell::new(5, 5))).unwrap();

        assert!(player.bind_session(900).is_ok());
        assert!(player.bind_session(900).is_ok());
        let error = player.bind_session(901).unwrap_err();
        assert!(matches!(
            error,
            WorldError::SessionCollision {
                existing: 900,
                rejected: 901,
            }
        ));
        assert_eq!(player.session_id(), Some(900));

        // Through the mailbox the conflict is fatal: the player leaves the
        // map, seals, and queues its own disposal.
        let sender = rig.disposal.sender();
        let mut ctx = ActorContext::new(1_000, Address::NULL, &rig.router, &rig.directory, &sender);
        let bind = Message::with_payload(
            MessageKind::BindSession,
            &AmBindSession {
                uid: 7,
                session_id: 901,
            },
        )
        .unwrap();
        player.operate(
            Envelope {
                message: bind,
                from: Address::NULL,
            },
            &mut ctx,
        );
        assert!(ctx.is_seal_requested());
        assert_eq!(rig.disposal.drain(), vec![7]);
    }

    #[test]
    fn test_move_command_walks_one_step() {
        let rig = Rig::new();
        let (keeper_addr, keeper_rx) = rig.router.register(16);
        let atlas = Arc::new(MapAtlas::new());
        assert!(atlas.insert(
            1,
            MapEntry {
                keeper_uid: 100,
                keeper_addr,
                terrain: Arc::new(MapTerrain::new(1, 20, 20)),
            },
        ));
        let mut player = Player::new(7, spawn_on(atlas, 1, GridCell::new(5, 5))).unwrap();

        let sender = rig.disposal.sender();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        let command = Message::with_payload(
            MessageKind::ClientCommand,
            &AmClientCommand {
                uid: 7,
                target: 0,
                command: ClientCmd::Move as u32,
                param: 0,
                x: 9,
                y: 5,
            },
        )
        .unwrap();
        player.operate(
            Envelope {
                message: command,
                from: Address::NULL,
            },
            &mut ctx,
        );

        // Far destination, so exactly one step toward it goes out.
        let step = keeper_rx.try_recv().unwrap();
        assert_eq!(step.message.kind, MessageKind::TryMove);
        let am = step.message.payload.decode::<AmTryMove>().unwrap();
        assert_eq!(GridCell::new(am.x, am.y), GridCell::new(5, 5));
        assert_eq!(GridCell::new(am.end_x, am.end_y), GridCell::new(6, 5));
        assert!(player.core().move_lock);
    }

    #[test]
    fn test_rejected_move_reports_stand() {
        let rig = Rig::new();
        let (keeper_addr, keeper_rx) = rig.router.register(16);
        let atlas = Arc::new(MapAtlas::new());
        assert!(atlas.insert(
            1,
            MapEntry {
                keeper_uid: 100,
                keeper_addr,
                terrain: Arc::new(MapTerrain::new(1, 20, 20)),
            },
        ));
        let mut player = Player::new(7, spawn_on(atlas, 1, GridCell::new(5, 5))).unwrap();

        let sender = rig.disposal.sender();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(request_move(
            &mut player,
            Motion::Walk,
            GridCell::new(6, 5),
            &mut ctx,
        ));
        let request = keeper_rx.try_recv().unwrap();
        let request_id = request.message.request_id;

        let rejection = Message::bare(MessageKind::MoveError).replying_to(request_id);
        player.operate(
            Envelope {
                message: rejection,
                from: keeper_addr,
            },
            &mut ctx,
        );

        assert!(!player.core().move_lock);
        assert_eq!(player.core().cell, GridCell::new(5, 5));
        // The corrective stand pins the client back to the real cell.
        let stand = keeper_rx.try_recv().unwrap();
        let am = stand.message.payload.decode::<AmAction>().unwrap();
        assert_eq!(am.action, ActionKind::Stand as u32);
        assert_eq!(GridCell::new(am.x, am.y), GridCell::new(5, 5));
    }

    #[test]
    fn test_attack_command_swings_at_cached_target() {
        let rig = Rig::new();
        let (keeper_addr, keeper_rx) = rig.router.register(16);
        let (monster_addr, monster_rx) = rig.router.register(16);
        rig.directory
            .register(50, monster_addr, ActorKind::Monster)
            .unwrap();
        let atlas = Arc::new(MapAtlas::new());
        assert!(atlas.insert(
            1,
            MapEntry {
                keeper_uid: 100,
                keeper_addr,
                terrain: Arc::new(MapTerrain::new(1, 20, 20)),
            },
        ));
        let mut player = Player::new(7, spawn_on(atlas, 1, GridCell::new(5, 5))).unwrap();

        let sender = rig.disposal.sender();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);

        // The monster was seen next door a moment ago.
        let seen = Message::with_payload(
            MessageKind::Action,
            &AmAction {
                uid: 50,
                map_id: 1,
                action: ActionKind::Move as u32,
                param: 0,
                speed: 100,
                direction: Direction::Left as u32,
                x: 7,
                y: 5,
                end_x: 6,
                end_y: 5,
                _padding: 0,
            },
        )
        .unwrap();
        player.operate(
            Envelope {
                message: seen,
                from: keeper_addr,
            },
            &mut ctx,
        );

        let command = Message::with_payload(
            MessageKind::ClientCommand,
            &AmClientCommand {
                uid: 7,
                target: 50,
                command: ClientCmd::Attack as u32,
                param: 0,
                x: 0,
                y: 0,
            },
        )
        .unwrap();
        player.operate(
            Envelope {
                message: command,
                from: Address::NULL,
            },
            &mut ctx,
        );

        let hit = monster_rx.try_recv().unwrap();
        assert_eq!(hit.message.kind, MessageKind::Attack);
        let am = hit.message.payload.decode::<embervale_actor::AmAttack>().unwrap();
        assert_eq!(am.uid, 7);
        assert_eq!(am.damage_class, DamageClass::PhysicalPlain as u32);
        assert!((1..=2).contains(&am.power));
        // The swing shows to the rest of the map as well.
        let action = keeper_rx.try_recv().unwrap();
        let broadcast = action.message.payload.decode::<AmAction>().unwrap();
        assert_eq!(broadcast.action, ActionKind::Attack as u32);
        assert_eq!(player.core().front_target(), Some(50));
    }

    #[test]
    fn test_map_switch_commits_and_leaves_old_map() {
        let rig = Rig::new();
        let (old_keeper, old_rx) = rig.router.register(16);
        let (new_keeper, new_rx) = rig.router.register(16);
        let (service_addr, service_rx) = rig.router.register(16);
        let atlas = Arc::new(MapAtlas::new());
        let new_terrain = Arc::new(MapTerrain::new(2, 30, 30));
        assert!(atlas.insert(
            1,
            MapEntry {
                keeper_uid: 100,
                keeper_addr: old_keeper,
                terrain: Arc::new(MapTerrain::new(1, 20, 20)),
            },
        ));
        assert!(atlas.insert(
            2,
            MapEntry {
                keeper_uid: 200,
                keeper_addr: new_keeper,
                terrain: Arc::clone(&new_terrain),
            },
        ));
        let mut player =
            Player::new(7, spawn_on(Arc::clone(&atlas), 1, GridCell::new(5, 5))).unwrap();
        player.core_mut().service_addr = service_addr;
        player.core_mut().add_target(50, 9_000);
        player.core_mut().record_location(
            50,
            LocationRecord {
                cell: GridCell::new(6, 5),
                direction: Direction::Down,
                map_id: 1,
                recorded_ms: 9_000,
            },
        );

        let sender = rig.disposal.sender();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(player.request_map_switch(2, GridCell::new(12, 12), &mut ctx));
        assert!(player.core().move_lock);

        let request = service_rx.try_recv().unwrap();
        assert_eq!(request.message.kind, MessageKind::MapSwitch);
        let request_id = request.message.request_id;

        let grant = Message::with_payload(
            MessageKind::MapSwitchOk,
            &AmMapSwitchOk {
                uid: 7,
                keeper_uid: 200,
                map_id: 2,
                x: 12,
                y: 12,
                _padding: 0,
            },
        )
        .unwrap()
        .replying_to(request_id);
        player.operate(
            Envelope {
                message: grant,
                from: new_keeper,
            },
            &mut ctx,
        );

        // Old map got the leave, new map the arrival stand.
        let leave = old_rx.try_recv().unwrap();
        assert_eq!(leave.message.kind, MessageKind::Leave);
        let am = leave.message.payload.decode::<AmLeave>().unwrap();
        assert_eq!(am.map_id, 1);
        assert_eq!(GridCell::new(am.x, am.y), GridCell::new(5, 5));
        let stand = new_rx.try_recv().unwrap();
        assert_eq!(stand.message.kind, MessageKind::Action);

        let core = player.core();
        assert_eq!(core.map_id, 2);
        assert_eq!(core.cell, GridCell::new(12, 12));
        assert_eq!(core.keeper_addr, new_keeper);
        assert!(Arc::ptr_eq(&core.terrain, &new_terrain));
        assert!(!core.move_lock);
        assert_eq!(core.pending, Pending::Idle);
        // Cross-map memory is gone.
        assert_eq!(core.front_target(), None);
        assert!(core.locations.is_empty());
    }

    #[test]
    fn test_rejected_switch_releases_and_stands() {
        let rig = Rig::new();
        let (keeper_addr, keeper_rx) = rig.router.register(16);
        let (service_addr, service_rx) = rig.router.register(16);
        let atlas = Arc::new(MapAtlas::new());
        assert!(atlas.insert(
            1,
            MapEntry {
                keeper_uid: 100,
                keeper_addr,
                terrain: Arc::new(MapTerrain::new(1, 20, 20)),
            },
        ));
        let mut player = Player::new(7, spawn_on(atlas, 1, GridCell::new(5, 5))).unwrap();
        player.core_mut().service_addr = service_addr;

        let sender = rig.disposal.sender();
        let mut ctx = ActorContext::new(10_000, Address::NULL, &rig.router, &rig.directory, &sender);
        assert!(player.request_map_switch(9, GridCell::new(1, 1), &mut ctx));
        let request_id = service_rx.try_recv().unwrap().message.request_id;

        let rejection = Message::bare(MessageKind::MapSwitchError).replying_to(request_id);
        player.operate(
            Envelope {
                message: rejection,
                from: service_addr,
            },
            &mut ctx,
        );

        assert!(!player.core().move_lock);
        assert_eq!(player.core().pending, Pending::Idle);
        assert_eq!(player.core().map_id, 1);
        let stand = keeper_rx.try_recv().unwrap();
        let am = stand.message.payload.decode::<AmAction>().unwrap();
        assert_eq!(am.action, ActionKind::Stand as u32);
    }
}
