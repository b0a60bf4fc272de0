//! Shared test fixtures for the `game` submodule test suites.
//! This module exists to avoid repeating board and roster setup across many tests.
//! It does not own production gameplay logic.

use super::*;
use crate::content::keys;

pub(super) fn snapshot_with(size: i32, units: Vec<UnitSpec>) -> SessionSnapshot {
    SessionSnapshot {
        session_id: "test".to_string(),
        cols: size,
        rows: size,
        walls: Vec::new(),
        units,
        turn: 1,
        phase: Phase::Player,
        acted: Vec::new(),
    }
}

fn hero(pos: Pos) -> UnitSpec {
    UnitSpec::new("hero", Team::Player, pos, 20).with_combat_key(keys::ENTITY_KNIGHT)
}

fn goblin(pos: Pos, move_range: u32) -> UnitSpec {
    UnitSpec::new("goblin", Team::Enemy, pos, 12)
        .with_combat_key(keys::ENTITY_GOBLIN)
        .with_ranges(move_range, 1)
}

/// 10x10 board, one knight and one goblin.
pub(super) fn duel_fixture(hero_pos: Pos, enemy_pos: Pos) -> (Game, UnitId, UnitId) {
    open_field_fixture(10, hero_pos, enemy_pos, 4)
}

/// Square open board of `size` with one knight and one goblin of the given move range.
pub(super) fn open_field_fixture(
    size: i32,
    hero_pos: Pos,
    enemy_pos: Pos,
    enemy_move_range: u32,
) -> (Game, UnitId, UnitId) {
    let snapshot = snapshot_with(size, vec![hero(hero_pos), goblin(enemy_pos, enemy_move_range)]);
    let game = Game::new(snapshot, EngineConfig::default()).expect("fixture game");
    let hero = game.units.roster(Team::Player)[0];
    let enemy = game.units.roster(Team::Enemy)[0];
    (game, hero, enemy)
}

pub(super) fn run_until_idle(game: &mut Game) {
    for _ in 0..2_000 {
        game.update(1.0 / 60.0);
        if !game.state.is_animating && game.moves.is_empty() {
            return;
        }
    }
    panic!("game never went idle");
}

pub(super) fn run_until_player_phase(game: &mut Game) {
    for _ in 0..20_000 {
        game.update(1.0 / 60.0);
        if game.state.phase != Phase::Enemy && !game.state.is_animating {
            return;
        }
    }
    panic!("enemy phase never finished");
}
