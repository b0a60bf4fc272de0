use tactics_core::content::keys;
use tactics_core::grid::{Board, GridView};
use tactics_core::pathfinding::{find_path, reachable_cells};
use tactics_core::{
    EngineConfig, Game, GameError, Intent, LogEvent, Outcome, Phase, Pos, SessionSnapshot, Team,
    UnitId, UnitSpec, Units,
};

fn snapshot(cols: i32, rows: i32, walls: Vec<Pos>, units: Vec<UnitSpec>) -> SessionSnapshot {
    SessionSnapshot {
        session_id: "scenario".to_string(),
        cols,
        rows,
        walls,
        units,
        turn: 1,
        phase: Phase::Player,
        acted: Vec::new(),
    }
}

fn knight(key: &str, pos: Pos) -> UnitSpec {
    UnitSpec::new(key, Team::Player, pos, 30).with_combat_key(keys::ENTITY_KNIGHT)
}

fn goblin(key: &str, pos: Pos, hp: i32, move_range: u32) -> UnitSpec {
    UnitSpec { max_hp: Some(hp), ..UnitSpec::new(key, Team::Enemy, pos, hp) }
        .with_combat_key(keys::ENTITY_GOBLIN)
        .with_ranges(move_range, 1)
}

fn unit_id(game: &Game, key: &str) -> UnitId {
    game.units().by_key(key).map(|unit| unit.id).expect("unit present")
}

fn run_until_player_phase(game: &mut Game) {
    for _ in 0..30_000 {
        game.update(1.0 / 60.0);
        if game.state().phase != Phase::Enemy && !game.is_busy() {
            return;
        }
    }
    panic!("enemy phase never finished");
}

fn run_until_idle(game: &mut Game) {
    for _ in 0..5_000 {
        game.update(1.0 / 60.0);
        if !game.is_busy() {
            return;
        }
    }
    panic!("game never went idle");
}

#[test]
fn straight_move_along_the_row() {
    let mut game = Game::new(
        snapshot(10, 10, Vec::new(), vec![knight("hero", Pos::new(1, 1)), goblin(
            "gob",
            Pos::new(10, 10),
            10,
            4,
        )]),
        EngineConfig::default(),
    )
    .expect("game");
    let view = GridView::new(game.board(), game.units());
    let path = find_path(&view, Pos::new(1, 1), Pos::new(5, 1), None);
    assert_eq!(path, vec![Pos::new(2, 1), Pos::new(3, 1), Pos::new(4, 1), Pos::new(5, 1)]);
    assert!(find_path(&view, Pos::new(1, 1), Pos::new(1, 1), None).is_empty());

    game.click_cell(Pos::new(1, 1)).expect("select");
    game.click_cell(Pos::new(5, 1)).expect("move");
    run_until_idle(&mut game);
    let hero = unit_id(&game, "hero");
    assert_eq!(game.unit(hero).map(|unit| unit.pos), Some(Pos::new(5, 1)));
    assert!(game.log().iter().any(|event| matches!(
        event,
        LogEvent::UnitMoved { from, to, .. } if *from == Pos::new(1, 1) && *to == Pos::new(5, 1)
    )));
}

#[test]
fn wall_forces_a_detour() {
    let board = Board::new(10, 10, [Pos::new(2, 1), Pos::new(2, 2)]);
    let mut units = Units::new();
    units.insert(knight("hero", Pos::new(1, 1)));
    let view = GridView::new(&board, &units);

    let path = find_path(&view, Pos::new(1, 1), Pos::new(3, 1), None);
    assert!(path.len() > 2);
    assert_eq!(path.last(), Some(&Pos::new(3, 1)));
    assert!(path.iter().all(|cell| !board.is_wall(*cell)));

    let reachable = reachable_cells(&view, Pos::new(1, 1), 4);
    assert!(!reachable.contains_key(&Pos::new(3, 1)), "detour is longer than the move range");
}

#[test]
fn engagement_zone_pulls_in_neighbours_of_the_initiator() {
    let mut game = Game::new(
        snapshot(10, 10, Vec::new(), vec![
            knight("hero", Pos::new(5, 5)),
            knight("ally", Pos::new(5, 6)),
            goblin("near", Pos::new(6, 5), 10, 4),
            goblin("far", Pos::new(8, 8), 10, 4),
        ]),
        EngineConfig::default(),
    )
    .expect("game");
    let (hero, ally, near, far) = (
        unit_id(&game, "hero"),
        unit_id(&game, "ally"),
        unit_id(&game, "near"),
        unit_id(&game, "far"),
    );

    game.click_cell(Pos::new(5, 5)).expect("select");
    game.click_cell(Pos::new(6, 5)).expect("preview near enemy");
    let engagement = game.engagement().expect("targeting");
    assert_eq!(engagement.allies, vec![hero, ally]);
    assert_eq!(engagement.enemies, vec![near]);
    assert!(!engagement.enemies.contains(&far));

    assert_eq!(game.click_cell(Pos::new(8, 8)), Err(GameError::OutOfRange));
}

#[test]
fn confirmed_battle_marks_every_participating_player() {
    let mut game = Game::new(
        snapshot(10, 10, Vec::new(), vec![
            knight("hero", Pos::new(5, 5)),
            knight("ally", Pos::new(5, 6)),
            knight("reserve", Pos::new(1, 1)),
            goblin("near", Pos::new(6, 5), 400, 4),
        ]),
        EngineConfig::default(),
    )
    .expect("game");
    game.click_cell(Pos::new(5, 5)).expect("select");
    game.click_cell(Pos::new(6, 5)).expect("preview");
    game.confirm_engagement().expect("confirm");
    assert!(game.is_battle_running());
    run_until_idle(&mut game);

    let acted = &game.state().acted_this_turn;
    assert!(acted.contains(&unit_id(&game, "hero")));
    assert!(acted.contains(&unit_id(&game, "ally")));
    assert!(!acted.contains(&unit_id(&game, "reserve")));
    assert_eq!(game.state().phase, Phase::Player, "reserve has not acted yet");
}

#[test]
fn enemy_closes_in_then_attacks() {
    let mut game = Game::new(
        snapshot(12, 12, Vec::new(), vec![
            knight("hero", Pos::new(1, 1)),
            goblin("gob", Pos::new(11, 1), 500, 3),
        ]),
        EngineConfig::default(),
    )
    .expect("game");
    let gob = unit_id(&game, "gob");

    game.end_turn().expect("end turn 1");
    run_until_player_phase(&mut game);
    let enemy = game.unit(gob).expect("goblin");
    assert_eq!(enemy.pos, Pos::new(8, 1));
    assert_eq!(enemy.intent, Some(Intent::Move));
    assert!(!game.log().iter().any(|event| matches!(event, LogEvent::EncounterStarted { .. })));

    game.end_turn().expect("end turn 2");
    run_until_player_phase(&mut game);
    assert_eq!(game.unit(gob).map(|unit| unit.pos), Some(Pos::new(5, 1)));

    game.end_turn().expect("end turn 3");
    run_until_player_phase(&mut game);
    let enemy = game.unit(gob).expect("goblin");
    assert_eq!(enemy.pos, Pos::new(2, 1));
    assert_eq!(enemy.intent, Some(Intent::Attack));
    assert!(game.log().iter().any(|event| matches!(
        event,
        LogEvent::EncounterStarted { initiator, .. } if *initiator == gob
    )));
    assert_eq!(game.state().turn, 4);
}

#[test]
fn clearing_the_last_enemy_enters_free_explore() {
    let mut game = Game::new(
        snapshot(8, 8, Vec::new(), vec![
            knight("hero", Pos::new(3, 3)),
            goblin("gob", Pos::new(4, 3), 1, 4),
        ]),
        EngineConfig::default(),
    )
    .expect("game");
    game.click_cell(Pos::new(3, 3)).expect("select");
    game.click_cell(Pos::new(4, 3)).expect("preview");
    game.confirm_engagement().expect("confirm");
    run_until_idle(&mut game);
    for _ in 0..120 {
        game.update(1.0 / 60.0);
    }

    assert_eq!(game.state().phase, Phase::FreeExplore);
    assert!(game.state().free_explore);
    assert!(game.units().roster(Team::Enemy).is_empty(), "dead enemy left the roster");
    assert_eq!(game.end_turn(), Ok(()));
    assert_eq!(game.state().phase, Phase::FreeExplore);

    let hero = unit_id(&game, "hero");
    game.click_cell(Pos::new(3, 3)).expect("select");
    game.click_cell(Pos::new(3, 6)).expect("move");
    run_until_idle(&mut game);
    game.click_cell(Pos::new(3, 6)).expect("reselect");
    game.click_cell(Pos::new(6, 6)).expect("move again, no turn consumed");
    run_until_idle(&mut game);
    assert_eq!(game.unit(hero).map(|unit| unit.pos), Some(Pos::new(6, 6)));
}

#[test]
fn snapshot_survives_a_reload() {
    let mut game = Game::new(
        snapshot(8, 8, vec![Pos::new(4, 4)], vec![
            knight("hero", Pos::new(1, 1)),
            knight("ally", Pos::new(1, 2)),
            goblin("gob", Pos::new(8, 8), 10, 4),
        ]),
        EngineConfig::default(),
    )
    .expect("game");
    game.click_cell(Pos::new(1, 1)).expect("select");
    game.wait_selected().expect("wait");

    let saved = game.snapshot();
    assert_eq!(saved.acted, vec!["hero".to_string()]);
    let reloaded = Game::new(saved, EngineConfig::default()).expect("reload");
    assert_eq!(reloaded.snapshot_hash(), game.snapshot_hash());
    assert!(reloaded.walls().contains(&Pos::new(4, 4)));
}

#[test]
fn won_session_reloads_as_a_victory() {
    let mut game = Game::new(
        snapshot(8, 8, Vec::new(), vec![
            knight("hero", Pos::new(3, 3)),
            goblin("gob", Pos::new(4, 3), 1, 4),
        ]),
        EngineConfig::default(),
    )
    .expect("game");
    game.click_cell(Pos::new(3, 3)).expect("select");
    game.click_cell(Pos::new(4, 3)).expect("preview");
    game.confirm_engagement().expect("confirm");
    run_until_idle(&mut game);
    for _ in 0..120 {
        game.update(1.0 / 60.0);
    }
    assert_eq!(game.state().outcome, Some(Outcome::Victory));

    let reloaded = Game::new(game.snapshot(), EngineConfig::default()).expect("reload");
    assert_eq!(reloaded.state().phase, Phase::FreeExplore);
    assert!(reloaded.state().free_explore);
    assert_eq!(reloaded.state().outcome, Some(Outcome::Victory));
    assert_eq!(reloaded.snapshot_hash(), game.snapshot_hash());
}

#[test]
fn free_explore_payload_with_living_enemies_loads_as_player_phase() {
    let saved = SessionSnapshot {
        phase: Phase::FreeExplore,
        ..snapshot(8, 8, Vec::new(), vec![
            knight("hero", Pos::new(1, 1)),
            goblin("gob", Pos::new(8, 8), 10, 4),
        ])
    };
    let game = Game::new(saved, EngineConfig::default()).expect("game");
    assert_eq!(game.state().phase, Phase::Player);
    assert!(!game.state().free_explore);
    assert_eq!(game.state().outcome, None);
    assert!(game.units().any_alive(Team::Enemy));
}

#[test]
fn acted_flags_agree_after_loading() {
    let flagged = UnitSpec { has_acted: true, ..knight("flagged", Pos::new(1, 1)) };
    let saved = SessionSnapshot {
        acted: vec!["listed".to_string()],
        ..snapshot(8, 8, Vec::new(), vec![
            flagged,
            knight("listed", Pos::new(1, 2)),
            knight("fresh", Pos::new(1, 3)),
            goblin("gob", Pos::new(8, 8), 10, 4),
        ])
    };
    let game = Game::new(saved, EngineConfig::default()).expect("game");
    for key in ["flagged", "listed"] {
        let id = unit_id(&game, key);
        assert!(!game.can_act(id), "{key} already acted");
        assert!(game.unit(id).is_some_and(|unit| unit.has_acted));
    }
    let fresh = unit_id(&game, "fresh");
    assert!(game.can_act(fresh));
    assert!(game.unit(fresh).is_some_and(|unit| !unit.has_acted));
}
