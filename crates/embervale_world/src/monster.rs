//! # Monster
//!
//! A monster is a creature pod driven entirely by its own metronome tick:
//! engage the aggro focus if there is one, otherwise wander. Everything
//! it knows about the world arrives as action broadcasts from its keeper,
//! which it folds into the location cache and, if its mode says so, into
//! the aggro deque.
//!
//! Behavior is profile-driven. The stat registry is consulted on every
//! decision and a missing profile fails closed: no profile, no acting.

use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use embervale_actor::{Actor, ActorContext, AmAction, Envelope, MessageKind};
use embervale_path::{OccupancyView, PathCosts};
use embervale_shared::{
    ActionKind, ActorKind, AttackMode, DamageClass, Direction, GridCell, MonsterKind, Motion,
};

use crate::char_core::{CharCore, CoreConfig, Creature, LocationRecord};
use crate::combat::{handle_attack, handle_location, handle_query_location, track_attack};
use crate::error::{WorldError, WorldResult};
use crate::movement::{dispatch_action, handle_move_error, handle_move_ok, request_move};
use crate::stats::{StatRegistry, WorldTuning};
use crate::terrain::MapTerrain;

/// Spawn-time parameters for a monster.
#[derive(Clone)]
pub struct MonsterSpawn {
    /// Map to spawn on.
    pub map_id: u32,
    /// Cell to spawn on.
    pub cell: GridCell,
    /// Stat table to resolve the profile from.
    pub registry: Arc<StatRegistry>,
    /// Advisory view of the home map.
    pub terrain: Arc<MapTerrain>,
    /// Shared timing knobs.
    pub tuning: WorldTuning,
    /// Path cost family for chase planning.
    pub costs: PathCosts,
}

/// An AI-driven creature.
pub struct Monster {
    core: CharCore,
    kind: MonsterKind,
    registry: Arc<StatRegistry>,
    attack_mode: AttackMode,
}

impl Monster {
    /// Spawns a monster of `kind`.
    ///
    /// # Errors
    ///
    /// [`WorldError::MissingProfile`] when the stat table has no entry
    /// for the kind.
    pub fn new(uid: u64, kind: MonsterKind, spawn: MonsterSpawn) -> WorldResult<Self> {
        let profile = spawn
            .registry
            .profile(kind)
            .ok_or(WorldError::MissingProfile { kind })?;
        let core = CharCore::new(
            uid,
            CoreConfig {
                map_id: spawn.map_id,
                cell: spawn.cell,
                ability: profile.ability,
                walk_wait_ms: profile.walk_wait_ms,
                attack_wait_ms: profile.attack_wait_ms,
                tuning: spawn.tuning,
                costs: spawn.costs,
            },
            Arc::clone(&spawn.terrain),
        );
        let attack_mode = profile.attack_mode;
        Ok(Self {
            core,
            kind,
            registry: spawn.registry,
            attack_mode,
        })
    }

    /// The species this monster spawned as.
    #[must_use]
    pub fn kind(&self) -> MonsterKind {
        self.kind
    }

    /// Current target acquisition mode.
    #[must_use]
    pub fn attack_mode(&self) -> AttackMode {
        self.attack_mode
    }

    /// Overrides the profile's target acquisition mode at runtime.
    pub fn set_attack_mode(&mut self, mode: AttackMode) {
        self.attack_mode = mode;
    }

    /// One brain step, run on every metronome tick: fight if something is
    /// on the aggro deque, otherwise wander.
    pub fn update(&mut self, ctx: &mut ActorContext<'_, Self>) {
        if self.core.dead || self.core.ghost || self.core.phantom {
            return;
        }
        if track_attack(self, ctx) {
            return;
        }
        self.random_move(ctx);
    }

    /// Wanders one step in a random direction, skipping a quarter of the
    /// opportunities so herds drift instead of marching. A step that needs
    /// a new facing turns this tick and walks the next one.
    fn random_move(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        if !self.can_move(ctx.now_ms) {
            return false;
        }
        let Some(profile) = self.registry.profile(self.kind) else {
            return false;
        };
        let step = profile.walk_step;
        if self.core.rng().gen_ratio(1, 4) {
            return false;
        }
        let start = self.core.rng().gen_range(0..Direction::ALL.len());
        let origin = self.core.cell;
        for turn in 0..Direction::ALL.len() {
            let direction = Direction::ALL[(start + turn) % Direction::ALL.len()];
            let (dx, dy) = direction.offset();
            let candidate = origin.offset(dx * step, dy * step);
            if !self.core.terrain.walkable(candidate) || self.core.terrain.occupied(candidate) {
                continue;
            }
            if step == 2 {
                // A run passes through the midpoint cell as well.
                let midpoint = origin.offset(dx, dy);
                if !self.core.terrain.walkable(midpoint) || self.core.terrain.occupied(midpoint) {
                    continue;
                }
            }
            if self.core.direction == direction {
                let motion = if step == 2 { Motion::Run } else { Motion::Walk };
                return request_move(self, motion, candidate, ctx);
            }
            self.core.direction = direction;
            dispatch_action(self, ctx, ActionKind::Stand, 0, origin, origin);
            return true;
        }
        false
    }

    /// Folds an action broadcast into the cache and, for an aggressive
    /// mode, into the aggro deque.
    fn observe_action(&mut self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        let Ok(am) = envelope.message.payload.decode::<AmAction>() else {
            warn!(uid = self.core.uid, "malformed action broadcast dropped");
            return;
        };
        if am.uid == 0 || am.uid == self.core.uid {
            return;
        }
        let Some(action) = ActionKind::from_u32(am.action) else {
            warn!(uid = self.core.uid, raw = am.action, "action with unknown verb dropped");
            return;
        };
        let Some(direction) = Direction::from_u32(am.direction) else {
            warn!(uid = self.core.uid, raw = am.direction, "action with bad facing dropped");
            return;
        };

        let acted_cell = GridCell::new(am.end_x, am.end_y);
        self.core.record_location(
            am.uid,
            LocationRecord {
                cell: acted_cell,
                direction,
                map_id: am.map_id,
                recorded_ms: ctx.now_ms,
            },
        );

        if action == ActionKind::Die {
            self.core.evict_target(am.uid);
            return;
        }
        if self.attack_mode != AttackMode::AttackAll || am.map_id != self.core.map_id {
            return;
        }
        let Some(record) = ctx.directory.resolve(am.uid) else {
            return;
        };
        if !record.kind.is_creature() {
            return;
        }
        let Some(profile) = self.registry.profile(self.kind) else {
            return;
        };
        let view2 = profile.view_range * profile.view_range;
        if self.core.cell.distance2(acted_cell) <= view2 {
            self.core.add_target(am.uid, ctx.now_ms);
        }
    }
}

impl Actor for Monster {
    type Error = WorldError;

    fn uid(&self) -> u64 {
        self.core.uid
    }

    fn operate(&mut self, envelope: Envelope, ctx: &mut ActorContext<'_, Self>) {
        match envelope.message.kind {
            MessageKind::Metronome => self.update(ctx),
            MessageKind::MoveOk => {
                handle_move_ok(self, &envelope, ctx);
            }
            MessageKind::MoveError => {
                handle_move_error(self, &envelope);
            }
            MessageKind::QueryLocation => handle_query_location(self, &envelope, ctx),
            MessageKind::Location => handle_location(self, &envelope, ctx),
            MessageKind::Action => self.observe_action(&envelope, ctx),
            MessageKind::Attack => {
                if let Some(attacker) = handle_attack(self, &envelope, ctx) {
                    if self.attack_mode != AttackMode::Passive {
                        self.core.add_target(attacker, ctx.now_ms);
                    }
                }
            }
            // Keepers fan peer hp reports out to every viewer; monsters
            // track targets by sight, not by health bar.
            MessageKind::UpdateHp => {}
            other => {
                warn!(uid = self.core.uid, kind = ?other, "message not for a monster");
            }
        }
    }
}

impl Creature for Monster {
    fn core(&self) -> &CharCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CharCore {
        &mut self.core
    }

    fn creature_kind(&self) -> ActorKind {
        ActorKind::Monster
    }

    fn damage_classes(&self) -> Vec<DamageClass> {
        self.registry
            .profile(self.kind)
            .map(|profile| profile.damage_classes.clone())
            .unwrap_or_default()
    }

    fn can_move(&self, now_ms: u64) -> bool {
        self.registry.profile(self.kind).is_some() && self.core.can_move_base(now_ms)
    }

    fn can_attack(&self, now_ms: u64) -> bool {
        self.registry.profile(self.kind).is_some() && self.core.can_attack_base(now_ms)
    }
}

// =============================================================================
// TESTS
// =============================================================================
