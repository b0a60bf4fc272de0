//! A scripted player for headless runs.
//!
//! Each player unit, in roster order: attack if an enemy is already in range, otherwise
//! step to the reachable cell closest to any enemy, then attack if that brought one into
//! range, otherwise wait. Everything goes through the same commands a human would issue,
//! so the engine's guards are exercised exactly as in the client.

use tactics_core::grid::{chebyshev, manhattan};
use tactics_core::{Game, GameError, Outcome, Phase, Pos, Team, UnitId};
use tracing::debug;

pub const STEP_DT: f32 = 1.0 / 30.0;
const MAX_SETTLE_FRAMES: u32 = 20_000;

pub struct Autoplay<F: FnMut(&Game)> {
    on_frame: F,
    frames: u64,
}

impl Autoplay<fn(&Game)> {
    pub fn new() -> Self {
        Self { on_frame: |_| {}, frames: 0 }
    }
}

impl Default for Autoplay<fn(&Game)> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FnMut(&Game)> Autoplay<F> {
    /// Run `on_frame` after every engine update, e.g. to check invariants.
    pub fn with_observer(on_frame: F) -> Self {
        Self { on_frame, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Tick until nothing is animating and no banner is up. Returns false if the engine
    /// never went idle.
    pub fn settle(&mut self, game: &mut Game) -> bool {
        for _ in 0..MAX_SETTLE_FRAMES {
            if !game.is_busy() && game.banner().is_none() {
                return true;
            }
            self.step(game);
        }
        false
    }

    fn step(&mut self, game: &mut Game) {
        game.update(STEP_DT);
        self.frames += 1;
        (self.on_frame)(game);
    }

    /// Play until an outcome or until `max_turns` player turns have passed. Returns the
    /// outcome, if any.
    pub fn play(&mut self, game: &mut Game, max_turns: u32) -> Option<Outcome> {
        while game.state().outcome.is_none() && game.state().turn <= max_turns {
            if !self.settle(game) {
                debug!(turn = game.state().turn, "engine never went idle");
                break;
            }
            match game.state().phase {
                Phase::Player => self.play_turn(game),
                Phase::Enemy => self.step(game),
                Phase::FreeExplore => break,
            }
        }
        self.settle(game);
        game.state().outcome
    }

    /// One player phase. Ends the turn explicitly if auto-end did not already.
    pub fn play_turn(&mut self, game: &mut Game) {
        let roster = game.units().roster(Team::Player).to_vec();
        for id in roster {
            if game.state().phase != Phase::Player {
                return;
            }
            if !game.can_act(id) {
                continue;
            }
            if let Err(err) = self.play_unit(game, id) {
                debug!(%err, "command rejected, waiting instead");
                let _ = game.wait_selected();
            }
            self.settle(game);
        }
        if game.state().phase == Phase::Player && game.state().outcome.is_none() {
            let _ = game.end_turn();
        }
    }

    fn play_unit(&mut self, game: &mut Game, id: UnitId) -> Result<(), GameError> {
        let pos = game.unit(id).map(|unit| unit.pos).ok_or(GameError::UnknownUnit)?;
        game.click_cell(pos)?;
        if let Some(target) = target_in_range(game, id) {
            return self.attack(game, target);
        }

        if let Some(dest) = best_step(game, id) {
            game.click_cell(dest)?;
            self.settle(game);
        }
        match target_in_range(game, id) {
            Some(target) => self.attack(game, target),
            None => game.wait_selected(),
        }
    }

    fn attack(&mut self, game: &mut Game, target: Pos) -> Result<(), GameError> {
        game.click_cell(target)?;
        game.confirm_engagement()?;
        self.settle(game);
        Ok(())
    }
}

/// Closest living enemy within the unit's attack range.
pub fn target_in_range(game: &Game, id: UnitId) -> Option<Pos> {
    let unit = game.unit(id)?;
    game.units()
        .living(Team::Enemy)
        .filter(|enemy| chebyshev(unit.pos, enemy.pos) <= unit.attack_range)
        .min_by_key(|enemy| chebyshev(unit.pos, enemy.pos))
        .map(|enemy| enemy.pos)
}

/// Reachable cell that most reduces the distance to the nearest enemy.
pub fn best_step(game: &Game, id: UnitId) -> Option<Pos> {
    let unit = game.unit(id)?;
    let distance = |from: Pos| {
        game.units().living(Team::Enemy).map(|enemy| manhattan(from, enemy.pos)).min()
    };
    let current = distance(unit.pos)?;
    let reachable = game.reachable()?;
    reachable
        .keys()
        .filter_map(|cell| distance(*cell).map(|d| (d, *cell)))
        .filter(|(d, _)| *d < current)
        .min()
        .map(|(_, cell)| cell)
}
