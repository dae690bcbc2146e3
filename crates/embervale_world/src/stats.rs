//! # Stat Tables and Tuning
//!
//! Monster behavior is profile-driven: one [`MonsterProfile`] per
//! [`MonsterKind`], resolved from the [`StatRegistry`] at spawn time and
//! re-checked on every movement decision. A missing record fails closed:
//! the monster refuses to act until the table says otherwise.
//!
//! The registry ships with built-in profiles and accepts TOML overrides.
//! A table that fails to parse or validate is rejected whole; a world
//! running on half a stat table is worse than one that refuses to start.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use embervale_shared::constants::{
    DEFAULT_ATTACK_WAIT_MS, DEFAULT_WALK_WAIT_MS, GHOST_DELAY_MS, LOCATION_STALENESS_MS,
    PENDING_TIMEOUT_MS, TARGET_EXPIRE_MS,
};
use embervale_shared::{AttackMode, DamageClass, MonsterKind};

use crate::error::{WorldError, WorldResult};

/// Combat-relevant attributes of a creature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub hp_max: u32,
    /// Current mana.
    pub mp: u32,
    /// Maximum mana.
    pub mp_max: u32,
    /// Minimum rolled attack power.
    pub dc_min: u32,
    /// Maximum rolled attack power.
    pub dc_max: u32,
    /// Armor against physical classes.
    pub ac: u32,
    /// Armor against magic classes.
    pub mac: u32,
}

/// Everything the world needs to know about one monster kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonsterProfile {
    /// The kind this profile describes.
    pub kind: MonsterKind,
    /// Milliseconds between steps.
    pub walk_wait_ms: u64,
    /// Milliseconds between swings.
    pub attack_wait_ms: u64,
    /// Cells covered per wander step: 1 walks, 2 runs straight.
    pub walk_step: i32,
    /// Aggro radius in cells.
    pub view_range: i64,
    /// How this kind acquires targets.
    #[serde(default)]
    pub attack_mode: AttackMode,
    /// Damage classes the kind can use, in preference order.
    #[serde(default)]
    pub damage_classes: Vec<DamageClass>,
    /// Base attributes at spawn.
    pub ability: AbilityScores,
}

#[derive(Debug, Deserialize)]
struct MonsterTable {
    #[serde(default)]
    monster: Vec<MonsterProfile>,
}

/// Immutable registry of monster profiles, shared by every spawner.
pub struct StatRegistry {
    profiles: HashMap<MonsterKind, MonsterProfile>,
}

impl StatRegistry {
    /// The built-in table the server runs on when no override is given.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = [
            MonsterProfile {
                kind: MonsterKind::Deer,
                walk_wait_ms: 1_400,
                attack_wait_ms: 2_000,
                walk_step: 1,
                view_range: 10,
                attack_mode: AttackMode::Passive,
                damage_classes: Vec::new(),
                ability: AbilityScores {
                    hp: 15,
                    hp_max: 15,
                    mp: 0,
                    mp_max: 0,
                    dc_min: 0,
                    dc_max: 0,
                    ac: 0,
                    mac: 0,
                },
            },
            MonsterProfile {
                kind: MonsterKind::Pheasant,
                walk_wait_ms: 1_000,
                attack_wait_ms: 2_000,
                walk_step: 1,
                view_range: 10,
                attack_mode: AttackMode::Passive,
                damage_classes: Vec::new(),
                ability: AbilityScores {
                    hp: 10,
                    hp_max: 10,
                    mp: 0,
                    mp_max: 0,
                    dc_min: 0,
                    dc_max: 0,
                    ac: 0,
                    mac: 0,
                },
            },
            MonsterProfile {
                kind: MonsterKind::Zuma,
                walk_wait_ms: 1_200,
                attack_wait_ms: 1_600,
                walk_step: 1,
                view_range: 20,
                attack_mode: AttackMode::AttackAll,
                damage_classes: vec![DamageClass::PhysicalPlain],
                ability: AbilityScores {
                    hp: 40,
                    hp_max: 40,
                    mp: 0,
                    mp_max: 0,
                    dc_min: 4,
                    dc_max: 9,
                    ac: 2,
                    mac: 1,
                },
            },
            MonsterProfile {
                kind: MonsterKind::ZumaGuardian,
                walk_wait_ms: 900,
                attack_wait_ms: 1_400,
                walk_step: 2,
                view_range: 20,
                attack_mode: AttackMode::AttackAll,
                damage_classes: vec![DamageClass::PhysicalWideSword, DamageClass::PhysicalPlain],
                ability: AbilityScores {
                    hp: 70,
                    hp_max: 70,
                    mp: 30,
                    mp_max: 30,
                    dc_min: 8,
                    dc_max: 14,
                    ac: 4,
                    mac: 3,
                },
            },
        ];
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.kind, profile))
                .collect(),
        }
    }

    /// The built-in table with TOML overrides applied on top. An override
    /// replaces the whole profile for its kind.
    ///
    /// # Errors
    ///
    /// [`WorldError::StatTableParse`] if the TOML fails to parse;
    /// [`WorldError::StatTableInvalid`] if any entry carries impossible
    /// data. Either way the override is rejected whole.
    pub fn with_overrides(toml_text: &str) -> WorldResult<Self> {
        let table: MonsterTable = toml::from_str(toml_text)?;
        let mut registry = Self::builtin();
        for profile in table.monster {
            validate_profile(&profile)?;
            info!(kind = profile.kind.as_str(), "stat table override applied");
            registry.profiles.insert(profile.kind, profile);
        }
        Ok(registry)
    }

    /// Resolves the profile for a kind. `None` means the kind must not
    /// act; movement and combat both fail closed on it.
    #[must_use]
    pub fn profile(&self, kind: MonsterKind) -> Option<&MonsterProfile> {
        self.profiles.get(&kind)
    }

    /// Number of kinds with a profile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `true` when the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn validate_profile(profile: &MonsterProfile) -> WorldResult<()> {
    let kind = profile.kind.as_str();
    if !matches!(profile.walk_step, 1 | 2) {
        return Err(WorldError::StatTableInvalid(format!(
            "{kind}: walk_step must be 1 or 2, got {}",
            profile.walk_step
        )));
    }
    if profile.ability.hp_max == 0 || profile.ability.hp > profile.ability.hp_max {
        return Err(WorldError::StatTableInvalid(format!(
            "{kind}: hp {}/{} out of range",
            profile.ability.hp, profile.ability.hp_max
        )));
    }
    if profile.ability.dc_min > profile.ability.dc_max {
        return Err(WorldError::StatTableInvalid(format!(
            "{kind}: dc_min {} exceeds dc_max {}",
            profile.ability.dc_min, profile.ability.dc_max
        )));
    }
    if profile.damage_classes.is_empty() && !matches!(profile.attack_mode, AttackMode::Passive) {
        return Err(WorldError::StatTableInvalid(format!(
            "{kind}: aggressive kind with no damage classes"
        )));
    }
    if profile.view_range <= 0 {
        return Err(WorldError::StatTableInvalid(format!(
            "{kind}: view_range must be positive, got {}",
            profile.view_range
        )));
    }
    Ok(())
}

/// Timing knobs shared by every creature, loadable from config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Milliseconds until an untouched target record expires.
    pub target_expire_ms: u64,
    /// Milliseconds a cached location stays trustworthy.
    pub location_staleness_ms: u64,
    /// Milliseconds before an awaited reply is written off as lost.
    pub pending_timeout_ms: u64,
    /// Milliseconds between death and the corpse fading out.
    pub ghost_delay_ms: u64,
    /// Player walk cooldown in milliseconds.
    pub player_walk_wait_ms: u64,
    /// Player attack cooldown in milliseconds.
    pub player_attack_wait_ms: u64,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            target_expire_ms: TARGET_EXPIRE_MS,
            location_staleness_ms: LOCATION_STALENESS_MS,
            pending_timeout_ms: PENDING_TIMEOUT_MS,
            ghost_delay_ms: GHOST_DELAY_MS,
            player_walk_wait_ms: DEFAULT_WALK_WAIT_MS,
            player_attack_wait_ms: DEFAULT_ATTACK_WAIT_MS,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
