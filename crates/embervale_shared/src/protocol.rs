//! World protocol enums shared between entities, the map keeper and tests.
//!
//! Every enum here crosses a message boundary as a raw integer, so each one
//! carries an explicit discriminant and a checked `from_u32` decoder.
//! A value that fails to decode is a protocol error: the receiver logs a
//! warning and drops the message, it never guesses.

use crate::grid::GridCell;
use serde::{Deserialize, Serialize};

/// Facing of an entity, clockwise from `Up`. `None` keeps the current facing.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// No facing change
    #[default]
    None = 0,
    /// North
    Up = 1,
    /// North-east
    UpRight = 2,
    /// East
    Right = 3,
    /// South-east
    DownRight = 4,
    /// South
    Down = 5,
    /// South-west
    DownLeft = 6,
    /// West
    Left = 7,
    /// North-west
    UpLeft = 8,
}

/// Facing table indexed by `[dy + 1][dx + 1]` of the target offset.
const FACING: [[Direction; 3]; 3] = [
    [Direction::UpLeft, Direction::Up, Direction::UpRight],
    [Direction::Left, Direction::None, Direction::Right],
    [Direction::DownLeft, Direction::Down, Direction::DownRight],
];

impl Direction {
    /// All eight real directions, clockwise from `Up`
    pub const ALL: [Self; 8] = [
        Self::Up,
        Self::UpRight,
        Self::Right,
        Self::DownRight,
        Self::Down,
        Self::DownLeft,
        Self::Left,
        Self::UpLeft,
    ];

    /// The unit cell offset for this facing (`None` stays put)
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::None => (0, 0),
            Self::Up => (0, -1),
            Self::UpRight => (1, -1),
            Self::Right => (1, 0),
            Self::DownRight => (1, 1),
            Self::Down => (0, 1),
            Self::DownLeft => (-1, 1),
            Self::Left => (-1, 0),
            Self::UpLeft => (-1, -1),
        }
    }

    /// The facing that looks from `from` toward `to`.
    ///
    /// Same cell yields `None` (keep the current facing).
    #[must_use]
    pub fn between(from: GridCell, to: GridCell) -> Self {
        let dx = (to.x - from.x).signum();
        let dy = (to.y - from.y).signum();
        FACING[(dy + 1) as usize][(dx + 1) as usize]
    }

    /// Decodes a wire value; `None` for anything out of range
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Up),
            2 => Some(Self::UpRight),
            3 => Some(Self::Right),
            4 => Some(Self::DownRight),
            5 => Some(Self::Down),
            6 => Some(Self::DownLeft),
            7 => Some(Self::Left),
            8 => Some(Self::UpLeft),
            _ => None,
        }
    }
}

/// Gait of a movement request.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    /// One cell per step
    Walk = 1,
    /// Two cells per step, straight line only
    Run = 2,
}

impl Motion {
    /// Cells covered by one step at this gait
    #[must_use]
    pub const fn step(self) -> i32 {
        match self {
            Self::Walk => 1,
            Self::Run => 2,
        }
    }

    /// Decodes a wire value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Walk),
            2 => Some(Self::Run),
            _ => None,
        }
    }
}

/// Broadcast action verbs, fanned out to everything in view range.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Standing still (also used for pure facing changes)
    Stand = 1,
    /// Committed movement to a new cell
    Move = 2,
    /// Swinging at a target cell
    Attack = 3,
    /// Hit by an attack
    UnderAttack = 4,
    /// Death animation start
    Die = 5,
}

impl ActionKind {
    /// Decodes a wire value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Stand),
            2 => Some(Self::Move),
            3 => Some(Self::Attack),
            4 => Some(Self::UnderAttack),
            5 => Some(Self::Die),
            _ => None,
        }
    }
}

/// Resource cost of using a damage class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DcCost {
    /// Hit points required (not consumed) to use the class
    pub hp: u32,
    /// Mana consumed per use
    pub mp: u32,
}

/// Damage classes an entity may be able to deal.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageClass {
    /// Plain physical swing
    PhysicalPlain = 1,
    /// Wide sword arc
    PhysicalWideSword = 2,
    /// Fire bolt
    MagicFire = 3,
    /// Explosion
    MagicExplode = 4,
}

impl DamageClass {
    /// Resource gate for this class
    #[must_use]
    pub const fn cost(self) -> DcCost {
        match self {
            Self::PhysicalPlain => DcCost { hp: 1, mp: 0 },
            Self::PhysicalWideSword => DcCost { hp: 1, mp: 3 },
            Self::MagicFire => DcCost { hp: 1, mp: 10 },
            Self::MagicExplode => DcCost { hp: 1, mp: 15 },
        }
    }

    /// Decodes a wire value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::PhysicalPlain),
            2 => Some(Self::PhysicalWideSword),
            3 => Some(Self::MagicFire),
            4 => Some(Self::MagicExplode),
            _ => None,
        }
    }
}

/// Melee stance derived from the squared distance to the target.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stance {
    /// Target on the same cell; keep the current facing
    Point = 0,
    /// Target orthogonally adjacent
    Orthogonal = 1,
    /// Target diagonally adjacent
    Diagonal = 2,
}

impl Stance {
    /// Maps a melee-band squared distance (0, 1 or 2) to a stance
    #[must_use]
    pub const fn from_distance2(distance2: i64) -> Option<Self> {
        match distance2 {
            0 => Some(Self::Point),
            1 => Some(Self::Orthogonal),
            2 => Some(Self::Diagonal),
            _ => None,
        }
    }

    /// Baseline step cost of the stance, matching the default path costs
    #[must_use]
    pub const fn step_cost(self) -> f64 {
        match self {
            Self::Point => 0.0,
            Self::Orthogonal => 1.0,
            Self::Diagonal => 1.1,
        }
    }

    /// Decodes a wire value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Point),
            1 => Some(Self::Orthogonal),
            2 => Some(Self::Diagonal),
            _ => None,
        }
    }
}

/// Kind tag carried by the identity directory for every registered actor.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorKind {
    /// A player-controlled creature
    Player = 1,
    /// An AI-controlled creature
    Monster = 2,
    /// The per-map occupancy authority
    MapKeeper = 3,
    /// The cross-map routing service
    WorldService = 4,
}

impl ActorKind {
    /// Whether this kind is a living creature (as opposed to infrastructure)
    #[must_use]
    pub const fn is_creature(self) -> bool {
        matches!(self, Self::Player | Self::Monster)
    }
}

/// Monster species with a stat-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterKind {
    /// Passive grazer
    Deer,
    /// Passive bird
    Pheasant,
    /// Basic melee aggressor
    Zuma,
    /// Tougher melee aggressor
    ZumaGuardian,
}

impl MonsterKind {
    /// Stable name for logs and config tables
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deer => "deer",
            Self::Pheasant => "pheasant",
            Self::Zuma => "zuma",
            Self::ZumaGuardian => "zuma_guardian",
        }
    }
}

/// How a monster acquires targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    /// Never fights, never retaliates
    Passive,
    /// Retaliates when struck
    #[default]
    Normal,
    /// Attacks any creature it sees acting in view range
    AttackAll,
}

/// Session commands a player actor accepts, decoded from the network layer.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientCmd {
    /// Walk one cell toward the command cell
    Move = 1,
    /// Attack the command target with the plain physical class
    Attack = 2,
    /// Switch to the map named by the command parameter
    MapSwitch = 3,
}

impl ClientCmd {
    /// Decodes a wire value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Move),
            2 => Some(Self::Attack),
            3 => Some(Self::MapSwitch),
            _ => None,
        }
    }
}
