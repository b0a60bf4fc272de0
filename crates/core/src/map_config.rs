//! TOML map descriptions and layout validation.
//!
//! A map file names the board size, the wall set and the starting roster. The same
//! layout checks run on session payloads fetched from the server.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::keys;
use crate::session::SessionSnapshot;
use crate::types::{Phase, Pos, Team};
use crate::unit::UnitSpec;

#[derive(Debug, Error)]
pub enum MapConfigError {
    #[error("map TOML is malformed: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("board must be at least 1x1, got {cols}x{rows}")]
    BadSize { cols: i32, rows: i32 },
    #[error("unit `{key}` at {pos:?} is off the board")]
    OutOfBounds { key: String, pos: Pos },
    #[error("unit `{key}` starts on a wall")]
    OnWall { key: String },
    #[error("units `{first}` and `{second}` share a cell")]
    Overlap { first: String, second: String },
    #[error("unit key `{0}` is used twice")]
    DuplicateKey(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    pub cols: i32,
    pub rows: i32,
    #[serde(default)]
    pub walls: Vec<Pos>,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
}

impl MapConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, MapConfigError> {
        let config: Self = toml::from_str(text)?;
        validate_layout(config.cols, config.rows, &config.walls, &config.units)?;
        Ok(config)
    }

    pub fn into_snapshot(self, session_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.to_string(),
            cols: self.cols,
            rows: self.rows,
            walls: self.walls,
            units: self.units,
            turn: 1,
            phase: Phase::Player,
            acted: Vec::new(),
        }
    }

    /// Built-in skirmish used when no map is given or the session fetch fails.
    pub fn default_skirmish() -> Self {
        let mut walls = Vec::new();
        for y in 3..=6 {
            walls.push(Pos::new(6, y));
        }
        walls.extend([Pos::new(9, 2), Pos::new(10, 2), Pos::new(3, 8), Pos::new(4, 8)]);

        let unit = |key: &str, combat_key: &str, team, x, y, hp, mana, attack, defense| UnitSpec {
            mana,
            max_mana: Some(mana),
            attack,
            defense,
            ..UnitSpec::new(key, team, Pos::new(x, y), hp).with_combat_key(combat_key)
        };
        let units = vec![
            unit("hero_knight", keys::ENTITY_KNIGHT, Team::Player, 2, 4, 32, 10, 7, 4),
            unit("hero_archer", keys::ENTITY_ARCHER, Team::Player, 2, 6, 24, 12, 6, 2)
                .with_ranges(4, 3),
            unit("hero_cleric", keys::ENTITY_CLERIC, Team::Player, 1, 5, 22, 20, 4, 2)
                .with_ranges(3, 1),
            unit("enemy_goblin_1", keys::ENTITY_GOBLIN, Team::Enemy, 10, 4, 14, 0, 4, 1)
                .with_ranges(4, 1),
            unit("enemy_goblin_2", keys::ENTITY_GOBLIN, Team::Enemy, 11, 7, 14, 0, 4, 1)
                .with_ranges(4, 1),
            unit("enemy_orc", keys::ENTITY_ORC, Team::Enemy, 12, 5, 30, 6, 7, 3).with_ranges(3, 1),
            unit("enemy_shaman", keys::ENTITY_SHAMAN, Team::Enemy, 13, 3, 18, 15, 5, 1)
                .with_ranges(3, 2),
        ];
        Self { cols: 14, rows: 10, walls, units }
    }
}

/// Board size, bounds, walls, overlap and key uniqueness. Dead units are ignored for overlap.
pub fn validate_layout(
    cols: i32,
    rows: i32,
    walls: &[Pos],
    units: &[UnitSpec],
) -> Result<(), MapConfigError> {
    if cols < 1 || rows < 1 {
        return Err(MapConfigError::BadSize { cols, rows });
    }
    let walls: BTreeSet<Pos> = walls.iter().copied().collect();
    let mut keys = BTreeSet::new();
    let mut occupied: BTreeMap<Pos, &str> = BTreeMap::new();
    for spec in units {
        if !keys.insert(spec.key.as_str()) {
            return Err(MapConfigError::DuplicateKey(spec.key.clone()));
        }
        let pos = spec.pos();
        if pos.x < 1 || pos.y < 1 || pos.x > cols || pos.y > rows {
            return Err(MapConfigError::OutOfBounds { key: spec.key.clone(), pos });
        }
        if spec.hp <= 0 {
            continue;
        }
        if walls.contains(&pos) {
            return Err(MapConfigError::OnWall { key: spec.key.clone() });
        }
        if let Some(first) = occupied.insert(pos, &spec.key) {
            return Err(MapConfigError::Overlap {
                first: first.to_string(),
                second: spec.key.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skirmish_is_valid() {
        let config = MapConfig::default_skirmish();
        validate_layout(config.cols, config.rows, &config.walls, &config.units).expect("valid");
        assert!(config.units.iter().any(|unit| unit.team == Team::Player));
        assert!(config.units.iter().any(|unit| unit.team == Team::Enemy));
    }

    #[test]
    fn parses_toml_map() {
        let text = r#"
            cols = 6
            rows = 4
            walls = [{ x = 3, y = 1 }, { x = 3, y = 2 }]

            [[units]]
            key = "hero"
            team = "player"
            combat_key = "knight"
            x = 1
            y = 1
            hp = 20

            [[units]]
            key = "slime"
            team = "enemy"
            x = 6
            y = 4
            hp = 8
            move_range = 2
        "#;
        let config = MapConfig::from_toml_str(text).expect("map");
        assert_eq!(config.walls, vec![Pos::new(3, 1), Pos::new(3, 2)]);
        assert_eq!(config.units[1].move_range, 2);
        assert_eq!(config.units[0].attack_range, 1);
        let snapshot = config.into_snapshot("s1");
        assert_eq!(snapshot.turn, 1);
        assert_eq!(snapshot.session_id, "s1");
    }

    #[test]
    fn rejects_units_on_walls_and_stacked_units() {
        let hero = UnitSpec::new("hero", Team::Player, Pos::new(2, 2), 10);
        let err = validate_layout(4, 4, &[Pos::new(2, 2)], &[hero.clone()])
            .expect_err("on wall");
        assert!(matches!(err, MapConfigError::OnWall { .. }));

        let twin = UnitSpec::new("twin", Team::Enemy, Pos::new(2, 2), 10);
        let err = validate_layout(4, 4, &[], &[hero.clone(), twin]).expect_err("overlap");
        assert!(matches!(err, MapConfigError::Overlap { .. }));

        let err = validate_layout(4, 4, &[], &[hero.clone(), hero]).expect_err("dup");
        assert!(matches!(err, MapConfigError::DuplicateKey(_)));
    }

    #[test]
    fn dead_units_may_share_cells() {
        let hero = UnitSpec::new("hero", Team::Player, Pos::new(2, 2), 10);
        let corpse = UnitSpec::new("corpse", Team::Enemy, Pos::new(2, 2), 0);
        validate_layout(4, 4, &[], &[hero, corpse]).expect("dead units do not occupy");
    }
}
