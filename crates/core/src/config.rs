//! Engine tuning knobs. Every field has a baked-in default so partial files load.

use serde::{Deserialize, Serialize};

use crate::animation::{Easing, MoveProfile};
use crate::types::Team;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pixel size of one grid cell at zoom 1.0.
    pub tile_px: f32,
    pub player_move: MoveProfile,
    pub enemy_move: MoveProfile,
    /// Per-tick lerp factor for manual camera moves (drag release, zoom, centering).
    pub camera_manual_ease: f32,
    /// Softer lerp factor used while following an enemy move.
    pub camera_follow_ease: f32,
    pub banner_secs: f32,
    pub death_anim_secs: f32,
    /// Pause on each enemy after the camera starts panning to it.
    pub enemy_pan_secs: f32,
    pub attack_pose_secs: f32,
    /// Exchange rounds before the standalone resolver calls a fight unresolved.
    pub auto_resolver_rounds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_px: 48.0,
            player_move: MoveProfile { duration_ms: 180, easing: Easing::OutCubic, bounce: 0.08 },
            enemy_move: MoveProfile { duration_ms: 260, easing: Easing::InOutCubic, bounce: 0.16 },
            camera_manual_ease: 0.2,
            camera_follow_ease: 0.08,
            banner_secs: 1.2,
            death_anim_secs: 0.6,
            enemy_pan_secs: 0.35,
            attack_pose_secs: 0.3,
            auto_resolver_rounds: 8,
        }
    }
}

impl EngineConfig {
    pub fn move_profile(&self, team: Team) -> MoveProfile {
        match team {
            Team::Player => self.player_move,
            Team::Enemy => self.enemy_move,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_moves_are_snappier_than_enemy_moves() {
        let config = EngineConfig::default();
        let player = config.move_profile(Team::Player);
        let enemy = config.move_profile(Team::Enemy);
        assert!(player.duration_ms < enemy.duration_ms);
        assert!(player.bounce < enemy.bounce);
        assert!(config.camera_follow_ease < config.camera_manual_ease);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"banner_secs": 0.5}"#).expect("config");
        assert_eq!(config.banner_secs, 0.5);
        assert_eq!(config.tile_px, EngineConfig::default().tile_px);
    }
}
