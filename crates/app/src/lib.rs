pub mod app_loop;
pub mod camera_file;
pub mod config;
pub mod session_store;

use tactics_core::{Outcome, Phase};

pub const APP_NAME: &str = "Tactics";

/// Short status line for the header strip.
pub fn phase_label(turn: u32, phase: Phase, outcome: Option<Outcome>) -> String {
    match (phase, outcome) {
        (_, Some(Outcome::Defeat)) => format!("Turn {turn} | Defeat"),
        (Phase::FreeExplore, _) => "Free explore".to_string(),
        (Phase::Player, _) => format!("Turn {turn} | Player phase"),
        (Phase::Enemy, _) => format!("Turn {turn} | Enemy phase"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_labels() {
        assert_eq!(phase_label(3, Phase::Player, None), "Turn 3 | Player phase");
        assert_eq!(phase_label(3, Phase::Enemy, None), "Turn 3 | Enemy phase");
        assert_eq!(phase_label(5, Phase::FreeExplore, Some(Outcome::Victory)), "Free explore");
        assert_eq!(phase_label(4, Phase::Enemy, Some(Outcome::Defeat)), "Turn 4 | Defeat");
    }
}
