use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

new_key_type! {
    pub struct UnitId;
}

/// Grid cell, 1-indexed. Ordering is row-major so ordered collections scan like the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pose {
    #[default]
    Idle,
    Walk,
    Attack,
}

/// Badge shown over an enemy while the enemy phase runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Move,
    Attack,
    Wait,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Player,
    Enemy,
    FreeExplore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    /// Fled or left unresolved by the combat subsystem.
    Ongoing,
}

/// Rejected engine command. The client turns these into toasts or ignores them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("an action is already in progress")]
    Busy,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("the session is over")]
    Finished,
    #[error("no unit is selected")]
    NoSelection,
    #[error("that unit cannot act this turn")]
    CannotAct,
    #[error("cell is not reachable")]
    Unreachable,
    #[error("enemy out of range")]
    OutOfRange,
    #[error("no enemies in the engagement zone")]
    NoTargets,
    #[error("unknown unit")]
    UnknownUnit,
    #[error("battle unavailable: {0}")]
    BattleUnavailable(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    PhaseChanged { phase: Phase, turn: u32 },
    UnitMoved { unit: UnitId, from: Pos, to: Pos },
    IntentChanged { unit: UnitId, intent: Intent },
    EncounterStarted { initiator: UnitId, allies: Vec<UnitId>, enemies: Vec<UnitId> },
    EncounterResolved { outcome: BattleOutcome },
    UnitDied { unit: UnitId },
    RunFinished { outcome: Outcome },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Banner,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notification {
    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, text: text.into() }
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Banner, text: text.into() }
    }
}
