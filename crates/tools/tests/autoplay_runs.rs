use tactics_core::{EngineConfig, Game, MapConfig};
use tactics_tools::autoplay::Autoplay;
use tactics_tools::summary::RunSummary;

fn run(max_turns: u32) -> RunSummary {
    let snapshot = MapConfig::default_skirmish().into_snapshot("autoplay-run");
    let mut game = Game::new(snapshot, EngineConfig::default()).expect("default map");
    let mut autoplay = Autoplay::new();
    autoplay.play(&mut game, max_turns);
    RunSummary::collect(&game, autoplay.frames())
}

#[test]
fn skirmish_autoplay_is_deterministic() {
    let first = run(8);
    let second = run(8);
    assert_eq!(first, second);
}

#[test]
fn autoplay_respects_the_turn_cap() {
    let summary = run(3);
    assert!(summary.turns <= 4, "played past the cap: {}", summary.turns);
    assert!(summary.frames > 0);
}

#[test]
fn fighting_happens_within_a_few_turns() {
    let summary = run(6);
    assert!(summary.battles > 0);
}
