//! Hand-off between the map and a turn-based combat subsystem.
//!
//! The map side builds full combat entities from lightweight units plus static
//! definitions, then hands them to a `BattleResolver`. Resolvers report vitals
//! while the fight runs and a terminal report when it ends; the map applies both.

use thiserror::Error;

use crate::content::{Attributes, CombatData, SkillDef, SkillEffect};
use crate::types::{BattleOutcome, Team, UnitId};
use crate::unit::{Unit, Units};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("no combat definition for `{0}`")]
    MissingEntity(String),
    #[error("entity `{entity}` lists unknown skill `{skill}`")]
    MissingSkill { entity: String, skill: String },
    #[error("combat subsystem unavailable")]
    ResolverUnavailable,
    #[error("a battle is already running")]
    AlreadyRunning,
    #[error("unit is no longer on the map")]
    UnknownUnit,
}

/// Packaged engagement, ready to become a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterRequest {
    pub initiator: UnitId,
    pub allies: Vec<UnitId>,
    pub enemies: Vec<UnitId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CombatEntity {
    pub unit: UnitId,
    pub name: String,
    pub team: Team,
    pub hp: i32,
    pub max_hp: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub attack: i32,
    pub defense: i32,
    pub attributes: Attributes,
    pub skills: Vec<SkillDef>,
}

impl CombatEntity {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Encounter {
    pub initiator: UnitId,
    pub allies: Vec<CombatEntity>,
    pub enemies: Vec<CombatEntity>,
}

/// Expand every participant. Fails before anything is mutated if a definition is missing.
pub fn build_encounter(
    units: &Units,
    data: &dyn CombatData,
    request: &EncounterRequest,
) -> Result<Encounter, BridgeError> {
    let expand = |ids: &[UnitId]| -> Result<Vec<CombatEntity>, BridgeError> {
        ids.iter()
            .map(|id| {
                let unit = units.get(*id).ok_or(BridgeError::UnknownUnit)?;
                combat_entity(unit, data)
            })
            .collect()
    };
    Ok(Encounter {
        initiator: request.initiator,
        allies: expand(&request.allies)?,
        enemies: expand(&request.enemies)?,
    })
}

fn combat_entity(unit: &Unit, data: &dyn CombatData) -> Result<CombatEntity, BridgeError> {
    let def = data
        .entity(&unit.combat_key)
        .ok_or_else(|| BridgeError::MissingEntity(unit.combat_key.clone()))?;
    let skills = def
        .skills
        .iter()
        .map(|id| {
            data.skill(id).cloned().ok_or_else(|| BridgeError::MissingSkill {
                entity: unit.combat_key.clone(),
                skill: id.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Map stats win when set; attributes add a small derived bonus on top.
    let attack = unit.attack.max(def.base.attack) + def.attributes.strength / 3;
    let defense = unit.defense.max(def.base.defense) + def.attributes.vitality / 3;
    let max_mana = unit.max_mana.max(def.base.mana);
    Ok(CombatEntity {
        unit: unit.id,
        name: unit.name.clone(),
        team: unit.team,
        hp: unit.hp,
        max_hp: unit.max_hp,
        mana: if unit.max_mana == 0 { def.base.mana } else { unit.mana },
        max_mana,
        attack,
        defense,
        attributes: def.attributes,
        skills,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VitalsSync {
    pub unit: UnitId,
    pub hp: i32,
    pub mana: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleReport {
    /// From the initiator's side.
    pub outcome: BattleOutcome,
    pub vitals: Vec<VitalsSync>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BattlePoll {
    Pending,
    Sync(Vec<VitalsSync>),
    Finished(BattleReport),
}

/// A combat subsystem the map can hand an encounter to.
pub trait BattleResolver {
    /// Accept the encounter or refuse it; refusing must leave the resolver idle.
    fn begin(&mut self, encounter: Encounter) -> Result<(), BridgeError>;
    /// Called once per tick while a battle runs.
    fn poll(&mut self) -> BattlePoll;
}

/// Stand-in for a missing combat subsystem: refuses every encounter.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableResolver;

impl BattleResolver for UnavailableResolver {
    fn begin(&mut self, _encounter: Encounter) -> Result<(), BridgeError> {
        Err(BridgeError::ResolverUnavailable)
    }

    fn poll(&mut self) -> BattlePoll {
        BattlePoll::Pending
    }
}

/// Headless resolver: one exchange round per poll until a side falls or the cap hits.
#[derive(Clone, Debug)]
pub struct AutoResolver {
    max_rounds: u32,
    battle: Option<AutoBattle>,
}

#[derive(Clone, Debug)]
struct AutoBattle {
    allies: Vec<CombatEntity>,
    enemies: Vec<CombatEntity>,
    round: u32,
}

impl AutoResolver {
    pub fn new(max_rounds: u32) -> Self {
        Self { max_rounds: max_rounds.max(1), battle: None }
    }

    pub fn is_running(&self) -> bool {
        self.battle.is_some()
    }
}

impl Default for AutoResolver {
    fn default() -> Self {
        Self::new(8)
    }
}

impl BattleResolver for AutoResolver {
    fn begin(&mut self, encounter: Encounter) -> Result<(), BridgeError> {
        if self.battle.is_some() {
            return Err(BridgeError::AlreadyRunning);
        }
        self.battle = Some(AutoBattle { allies: encounter.allies, enemies: encounter.enemies, round: 0 });
        Ok(())
    }

    fn poll(&mut self) -> BattlePoll {
        let Some(battle) = self.battle.as_mut() else {
            return BattlePoll::Pending;
        };
        battle.play_round();
        let vitals = battle.vitals();
        let outcome = if !battle.allies.iter().any(CombatEntity::is_alive) {
            Some(BattleOutcome::Defeat)
        } else if !battle.enemies.iter().any(CombatEntity::is_alive) {
            Some(BattleOutcome::Victory)
        } else if battle.round >= self.max_rounds {
            Some(BattleOutcome::Ongoing)
        } else {
            None
        };
        match outcome {
            Some(outcome) => {
                self.battle = None;
                BattlePoll::Finished(BattleReport { outcome, vitals })
            }
            None => BattlePoll::Sync(vitals),
        }
    }
}

impl AutoBattle {
    fn play_round(&mut self) {
        self.round += 1;
        for index in 0..self.allies.len() {
            act(&mut self.allies, &mut self.enemies, index);
        }
        for index in 0..self.enemies.len() {
            act(&mut self.enemies, &mut self.allies, index);
        }
    }

    fn vitals(&self) -> Vec<VitalsSync> {
        self.allies
            .iter()
            .chain(self.enemies.iter())
            .map(|entity| VitalsSync { unit: entity.unit, hp: entity.hp, mana: entity.mana })
            .collect()
    }
}

fn act(side: &mut [CombatEntity], foes: &mut [CombatEntity], index: usize) {
    if !side[index].is_alive() || !foes.iter().any(CombatEntity::is_alive) {
        return;
    }
    let wounded = side
        .iter()
        .enumerate()
        .filter(|(_, ally)| ally.is_alive() && ally.hp < ally.max_hp)
        .min_by_key(|(_, ally)| i64::from(ally.hp) * 100 / i64::from(ally.max_hp.max(1)))
        .map(|(slot, _)| slot);

    let actor = &side[index];
    let skill = actor
        .skills
        .iter()
        .rev()
        .find(|skill| {
            skill.mana_cost <= actor.mana && (skill.effect == SkillEffect::Damage || wounded.is_some())
        })
        .cloned();
    let Some(skill) = skill else {
        return;
    };
    let power = (actor.attack as f32 * skill.multiplier).round() as i32;
    side[index].mana -= skill.mana_cost;

    match skill.effect {
        SkillEffect::Damage => {
            if let Some(target) = foes.iter_mut().find(|foe| foe.is_alive()) {
                let damage = power.saturating_sub(target.defense).max(1);
                target.hp = (target.hp - damage).max(0);
            }
        }
        SkillEffect::Heal => {
            if let Some(slot) = wounded {
                let target = &mut side[slot];
                target.hp = target.hp.saturating_add(power.max(1)).min(target.max_hp);
            }
        }
    }
}
