//! Per-tick advancement of every in-flight sequence.

use super::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// The camera reached its target (or a manual move ended) this tick.
    pub camera_settled: bool,
}

impl Game {
    /// Advance timers, tweens, the running battle and the enemy loop by `dt` seconds.
    /// Order matters: moves land before the enemy loop looks at positions, and a battle
    /// that finishes this tick is visible to the loop on the same tick.
    pub fn update(&mut self, dt: f32) -> UpdateReport {
        let dt = dt.max(0.0);
        self.tick_banner(dt);
        self.tick_poses(dt);
        self.advance_moves(dt);
        self.poll_battle();
        self.advance_enemy_turn(dt);
        self.tick_dying(dt);
        let camera_settled = self.camera.update(dt);
        if self.camera.has_target() || self.camera.shake() > 0.0 {
            self.needs_redraw = true;
        }
        UpdateReport { camera_settled }
    }
}
