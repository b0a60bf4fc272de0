//! Map units and the two team rosters that own them.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::types::*;

/// Fractional cell coordinates used for drawing while a tween is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderPos {
    pub x: f32,
    pub y: f32,
    /// Upward bounce offset in cells.
    pub lift: f32,
}

impl RenderPos {
    pub fn at(pos: Pos) -> Self {
        Self { x: pos.x as f32, y: pos.y as f32, lift: 0.0 }
    }
}

#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    /// Stable wire identifier, e.g. `"hero_1"`.
    pub key: String,
    pub name: String,
    pub team: Team,
    pub combat_key: String,
    pub pos: Pos,
    pub hp: i32,
    pub max_hp: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub attack: i32,
    pub defense: i32,
    pub move_range: u32,
    pub attack_range: u32,
    pub has_moved: bool,
    pub has_acted: bool,
    pub facing: Facing,
    pub pose: Pose,
    pub intent: Option<Intent>,
    /// HP hit zero; waiting for the death animation before leaving the roster.
    pub pending_death: bool,
    pub render: RenderPos,
}

impl Unit {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

fn default_move_range() -> u32 {
    4
}

fn default_attack_range() -> u32 {
    1
}

/// Lightweight unit description as it appears in map configs and session payloads.
/// Optional fields are filled at construction so `Unit` never carries "maybe present" stats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    pub team: Team,
    #[serde(default)]
    pub combat_key: Option<String>,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    #[serde(default)]
    pub max_hp: Option<i32>,
    #[serde(default, alias = "mp", alias = "sp")]
    pub mana: i32,
    #[serde(default, alias = "maxMp", alias = "max_mp")]
    pub max_mana: Option<i32>,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default = "default_move_range")]
    pub move_range: u32,
    #[serde(default = "default_attack_range")]
    pub attack_range: u32,
    #[serde(default)]
    pub has_moved: bool,
    #[serde(default)]
    pub has_acted: bool,
    #[serde(default)]
    pub facing: Facing,
}

impl UnitSpec {
    pub fn new(key: &str, team: Team, pos: Pos, hp: i32) -> Self {
        Self {
            key: key.to_string(),
            name: None,
            team,
            combat_key: None,
            x: pos.x,
            y: pos.y,
            hp,
            max_hp: None,
            mana: 0,
            max_mana: None,
            attack: 5,
            defense: 0,
            move_range: default_move_range(),
            attack_range: default_attack_range(),
            has_moved: false,
            has_acted: false,
            facing: Facing::default(),
        }
    }

    pub fn with_ranges(mut self, move_range: u32, attack_range: u32) -> Self {
        self.move_range = move_range;
        self.attack_range = attack_range;
        self
    }

    pub fn with_combat_key(mut self, combat_key: &str) -> Self {
        self.combat_key = Some(combat_key.to_string());
        self
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y)
    }

    fn into_unit(self) -> Unit {
        let pos = self.pos();
        let max_hp = self.max_hp.unwrap_or(self.hp).max(self.hp);
        let max_mana = self.max_mana.unwrap_or(self.mana).max(self.mana);
        Unit {
            id: UnitId::default(),
            name: self.name.unwrap_or_else(|| self.key.clone()),
            combat_key: self.combat_key.unwrap_or_else(|| self.key.clone()),
            key: self.key,
            team: self.team,
            pos,
            hp: self.hp,
            max_hp,
            mana: self.mana,
            max_mana,
            attack: self.attack,
            defense: self.defense,
            move_range: self.move_range,
            attack_range: self.attack_range,
            has_moved: self.has_moved,
            has_acted: self.has_acted,
            facing: self.facing,
            pose: Pose::Idle,
            intent: None,
            pending_death: false,
            render: RenderPos::at(pos),
        }
    }
}

impl From<&Unit> for UnitSpec {
    fn from(unit: &Unit) -> Self {
        Self {
            key: unit.key.clone(),
            name: Some(unit.name.clone()),
            team: unit.team,
            combat_key: Some(unit.combat_key.clone()),
            x: unit.pos.x,
            y: unit.pos.y,
            hp: unit.hp,
            max_hp: Some(unit.max_hp),
            mana: unit.mana,
            max_mana: Some(unit.max_mana),
            attack: unit.attack,
            defense: unit.defense,
            move_range: unit.move_range,
            attack_range: unit.attack_range,
            has_moved: unit.has_moved,
            has_acted: unit.has_acted,
            facing: unit.facing,
        }
    }
}

/// Unit arena plus per-team roster order. Roster order drives the enemy loop.
#[derive(Clone, Debug, Default)]
pub struct Units {
    arena: SlotMap<UnitId, Unit>,
    players: Vec<UnitId>,
    enemies: Vec<UnitId>,
}

impl Units {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: UnitSpec) -> UnitId {
        let team = spec.team;
        let id = self.arena.insert(spec.into_unit());
        self.arena[id].id = id;
        self.roster_mut(team).push(id);
        id
    }

    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.arena.remove(id)?;
        self.roster_mut(unit.team).retain(|other| *other != id);
        Some(unit)
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.arena.get_mut(id)
    }

    pub fn by_key(&self, key: &str) -> Option<&Unit> {
        self.all().find(|unit| unit.key == key)
    }

    pub fn roster(&self, team: Team) -> &[UnitId] {
        match team {
            Team::Player => &self.players,
            Team::Enemy => &self.enemies,
        }
    }

    fn roster_mut(&mut self, team: Team) -> &mut Vec<UnitId> {
        match team {
            Team::Player => &mut self.players,
            Team::Enemy => &mut self.enemies,
        }
    }

    /// Every unit, players first, each team in roster order.
    pub fn all(&self) -> impl Iterator<Item = &Unit> {
        self.players.iter().chain(self.enemies.iter()).filter_map(|id| self.arena.get(*id))
    }

    pub fn team(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.roster(team).iter().filter_map(|id| self.arena.get(*id))
    }

    pub fn living(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.team(team).filter(|unit| unit.is_alive())
    }

    pub fn any_alive(&self, team: Team) -> bool {
        self.living(team).next().is_some()
    }

    /// Living unit on `pos`. Pending-death units never occupy a cell.
    pub fn unit_at(&self, pos: Pos) -> Option<&Unit> {
        self.all().find(|unit| unit.is_alive() && unit.pos == pos)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.arena.values_mut()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
