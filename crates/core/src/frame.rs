//! Frame pacing between the engine and whatever draws it.
//!
//! One `tick` per display frame: advance the game, collect fresh effects, age the
//! live ones and decide whether this frame needs drawing.

use crate::effects::ActiveEffect;
use crate::game::Game;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub redraw: bool,
    /// Persist the camera now.
    pub camera_settled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FrameDriver {
    frame: u64,
    effects: Vec<ActiveEffect>,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic frame counter, used for pulsing highlights.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn tick(&mut self, game: &mut Game, dt: f32) -> FrameReport {
        self.frame = self.frame.wrapping_add(1);
        let update = game.update(dt);

        for effect in &mut self.effects {
            effect.age += dt;
        }
        self.effects.retain(|effect| !effect.is_expired());
        self.effects.extend(game.drain_effects().into_iter().map(ActiveEffect::new));

        let any_alive = game.units().all().any(|unit| unit.is_alive());
        let redraw = game.take_redraw()
            || any_alive
            || game.has_animation_in_flight()
            || !self.effects.is_empty();
        FrameReport { frame: self.frame, redraw, camera_settled: update.camera_settled }
    }
}
