//! End-of-run report printed by `simulate`.

use serde::Serialize;
use tactics_core::{Game, LogEvent, Outcome, Team};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub session_id: String,
    pub outcome: Option<Outcome>,
    pub turns: u32,
    pub battles: usize,
    pub deaths: usize,
    pub players_left: Vec<String>,
    pub enemies_left: Vec<String>,
    pub frames: u64,
    pub snapshot_hash: String,
}

impl RunSummary {
    pub fn collect(game: &Game, frames: u64) -> Self {
        let survivors = |team: Team| -> Vec<String> {
            game.units().living(team).map(|unit| format!("{} ({} hp)", unit.key, unit.hp)).collect()
        };
        let count = |pred: fn(&LogEvent) -> bool| game.log().iter().filter(|e| pred(e)).count();
        Self {
            session_id: game.session_id().to_string(),
            outcome: game.state().outcome,
            turns: game.state().turn,
            battles: count(|event| matches!(event, LogEvent::EncounterResolved { .. })),
            deaths: count(|event| matches!(event, LogEvent::UnitDied { .. })),
            players_left: survivors(Team::Player),
            enemies_left: survivors(Team::Enemy),
            frames,
            snapshot_hash: format!("0x{:016x}", game.snapshot_hash()),
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self.outcome {
            Some(Outcome::Victory) => "victory",
            Some(Outcome::Defeat) => "defeat",
            None => "unfinished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::{EngineConfig, MapConfig};

    #[test]
    fn fresh_session_summary() {
        let snapshot = MapConfig::default_skirmish().into_snapshot("summary");
        let game = Game::new(snapshot, EngineConfig::default()).expect("default map");
        let summary = RunSummary::collect(&game, 0);
        assert_eq!(summary.outcome_label(), "unfinished");
        assert_eq!(summary.turns, 1);
        assert_eq!(summary.battles, 0);
        assert_eq!(summary.players_left.len(), 3);
        assert_eq!(summary.enemies_left.len(), 4);
        assert_eq!(summary.snapshot_hash.len(), 18);
    }
}
