use tactics_core::{EngineConfig, Game, MapConfig, Phase};

fn scripted_run() -> (Vec<u64>, usize) {
    let snapshot = MapConfig::default_skirmish().into_snapshot("determinism");
    let mut game = Game::new(snapshot, EngineConfig::default()).expect("default map loads");
    let mut hashes = Vec::new();

    for _ in 0..6 {
        if game.state().outcome.is_some() {
            break;
        }
        game.end_turn().expect("player phase accepts end turn");
        for _ in 0..30_000 {
            game.update(1.0 / 60.0);
            if game.state().phase != Phase::Enemy && !game.is_busy() {
                break;
            }
        }
        hashes.push(game.snapshot_hash());
    }
    (hashes, game.log().len())
}

#[test]
fn identical_runs_produce_identical_hashes() {
    let (first, first_log) = scripted_run();
    let (second, second_log) = scripted_run();
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(first_log, second_log);
}

#[test]
fn enemy_turns_change_state() {
    let (hashes, _) = scripted_run();
    assert!(hashes.windows(2).any(|pair| pair[0] != pair[1]));
}
