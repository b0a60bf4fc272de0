//! Static entity and skill definitions keyed by combat key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod keys {
    pub const ENTITY_KNIGHT: &str = "knight";
    pub const ENTITY_ARCHER: &str = "archer";
    pub const ENTITY_CLERIC: &str = "cleric";
    pub const ENTITY_GOBLIN: &str = "goblin";
    pub const ENTITY_ORC: &str = "orc";
    pub const ENTITY_SHAMAN: &str = "shaman";

    pub const SKILL_SLASH: &str = "slash";
    pub const SKILL_SHIELD_BASH: &str = "shield_bash";
    pub const SKILL_ARROW: &str = "arrow";
    pub const SKILL_VOLLEY: &str = "volley";
    pub const SKILL_MACE: &str = "mace";
    pub const SKILL_MEND: &str = "mend";
    pub const SKILL_STAB: &str = "stab";
    pub const SKILL_CLEAVE: &str = "cleave";
    pub const SKILL_HEX: &str = "hex";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub agility: i32,
    pub intellect: i32,
    pub vitality: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: i32,
    pub mana: i32,
    pub attack: i32,
    pub defense: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub attributes: Attributes,
    pub skills: Vec<String>,
    pub base: BaseStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillEffect {
    Damage,
    Heal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    /// Scales the user's attack for damage, or is a flat multiplier on attack for heals.
    pub multiplier: f32,
    #[serde(default)]
    pub mana_cost: i32,
    pub effect: SkillEffect,
}

/// Read-only lookup the combat bridge uses to expand a map unit.
pub trait CombatData {
    fn entity(&self, combat_key: &str) -> Option<&EntityDef>;
    fn skill(&self, skill_id: &str) -> Option<&SkillDef>;
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entity `{entity}` references unknown skill `{skill}`")]
    UnknownSkill { entity: String, skill: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentPack {
    pub entities: BTreeMap<String, EntityDef>,
    pub skills: BTreeMap<String, SkillDef>,
}

impl ContentPack {
    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let pack: Self = serde_json::from_str(json)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Every skill an entity lists must exist.
    pub fn validate(&self) -> Result<(), ContentError> {
        for (key, entity) in &self.entities {
            if let Some(missing) = entity.skills.iter().find(|id| !self.skills.contains_key(*id)) {
                return Err(ContentError::UnknownSkill {
                    entity: key.clone(),
                    skill: missing.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn build_default() -> Self {
        let mut pack = Self::default();
        for skill in [
            skill(keys::SKILL_SLASH, "Slash", 1.0, 0, SkillEffect::Damage),
            skill(keys::SKILL_SHIELD_BASH, "Shield Bash", 1.4, 4, SkillEffect::Damage),
            skill(keys::SKILL_ARROW, "Arrow", 1.0, 0, SkillEffect::Damage),
            skill(keys::SKILL_VOLLEY, "Volley", 1.6, 6, SkillEffect::Damage),
            skill(keys::SKILL_MACE, "Mace", 0.8, 0, SkillEffect::Damage),
            skill(keys::SKILL_MEND, "Mend", 1.5, 5, SkillEffect::Heal),
            skill(keys::SKILL_STAB, "Stab", 1.0, 0, SkillEffect::Damage),
            skill(keys::SKILL_CLEAVE, "Cleave", 1.3, 3, SkillEffect::Damage),
            skill(keys::SKILL_HEX, "Hex", 1.5, 5, SkillEffect::Damage),
        ] {
            pack.skills.insert(skill.id.clone(), skill);
        }

        let entities = [
            (
                keys::ENTITY_KNIGHT,
                entity("Knight", [6, 3, 1, 6], [keys::SKILL_SLASH, keys::SKILL_SHIELD_BASH], [
                    32, 10, 7, 4,
                ]),
            ),
            (
                keys::ENTITY_ARCHER,
                entity("Archer", [3, 7, 2, 3], [keys::SKILL_ARROW, keys::SKILL_VOLLEY], [
                    24, 12, 6, 2,
                ]),
            ),
            (
                keys::ENTITY_CLERIC,
                entity("Cleric", [2, 3, 7, 4], [keys::SKILL_MACE, keys::SKILL_MEND], [
                    22, 20, 4, 2,
                ]),
            ),
            (keys::ENTITY_GOBLIN, entity("Goblin", [3, 5, 1, 2], [keys::SKILL_STAB], [14, 0, 4, 1])),
            (
                keys::ENTITY_ORC,
                entity("Orc", [7, 2, 1, 6], [keys::SKILL_SLASH, keys::SKILL_CLEAVE], [
                    30, 6, 7, 3,
                ]),
            ),
            (keys::ENTITY_SHAMAN, entity("Shaman", [2, 3, 6, 3], [keys::SKILL_HEX], [18, 15, 5, 1])),
        ];
        for (key, def) in entities {
            pack.entities.insert(key.to_string(), def);
        }
        pack
    }
}

impl CombatData for ContentPack {
    fn entity(&self, combat_key: &str) -> Option<&EntityDef> {
        self.entities.get(combat_key)
    }

    fn skill(&self, skill_id: &str) -> Option<&SkillDef> {
        self.skills.get(skill_id)
    }
}

fn skill(id: &str, name: &str, multiplier: f32, mana_cost: i32, effect: SkillEffect) -> SkillDef {
    SkillDef { id: id.to_string(), name: name.to_string(), multiplier, mana_cost, effect }
}

fn entity<const N: usize>(
    name: &str,
    [strength, agility, intellect, vitality]: [i32; 4],
    skills: [&str; N],
    [hp, mana, attack, defense]: [i32; 4],
) -> EntityDef {
    EntityDef {
        name: name.to_string(),
        attributes: Attributes { strength, agility, intellect, vitality },
        skills: skills.iter().map(|id| id.to_string()).collect(),
        base: BaseStats { hp, mana, attack, defense },
    }
}
