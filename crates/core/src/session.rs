//! Wire shapes for the remote session store.
//! This module exists so the engine and the sync worker agree on one JSON contract.
//! It does not own transport, retries or local file layout.

use serde::{Deserialize, Serialize};

use crate::types::{Phase, Pos};
use crate::unit::UnitSpec;

fn first_turn() -> u32 {
    1
}

/// Full map state as fetched at load and posted after every turn transition and movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub cols: i32,
    pub rows: i32,
    #[serde(default)]
    pub walls: Vec<Pos>,
    pub units: Vec<UnitSpec>,
    #[serde(default = "first_turn")]
    pub turn: u32,
    #[serde(default)]
    pub phase: Phase,
    /// Unit keys that already acted this turn.
    #[serde(default)]
    pub acted: Vec<String>,
}

/// A completed player move, logged best-effort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub session_id: String,
    pub unit: String,
    pub from: Pos,
    pub to: Pos,
    pub turn: u32,
}

/// Outbound persistence work produced by the engine and drained by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncRequest {
    State(SessionSnapshot),
    Move(MoveRecord),
}
