//! Phase transitions: player → enemy → player, free-explore and run outcome.
//! This module exists so every transition resets the same flags in the same order.
//! It does not run the enemy loop itself.

use super::*;

impl Game {
    pub(super) fn show_banner(&mut self, text: &str) {
        self.banner = Some(Banner { text: text.to_string(), remaining: self.config.banner_secs });
        self.notify(Notification::banner(text));
        self.needs_redraw = true;
    }

    pub(super) fn tick_banner(&mut self, dt: f32) {
        if let Some(banner) = self.banner.as_mut() {
            banner.remaining -= dt;
            if banner.remaining <= 0.0 {
                self.banner = None;
                self.needs_redraw = true;
            }
        }
    }

    /// Hand the turn to the enemy side. The loop waits for the banner to expire.
    pub(super) fn begin_enemy_phase(&mut self) {
        self.state.selection = Selection::None;
        self.state.phase = Phase::Enemy;
        self.state.is_animating = true;
        for id in self.units.roster(Team::Enemy).to_vec() {
            if let Some(unit) = self.units.get_mut(id) {
                unit.intent = None;
            }
        }
        self.log.push(LogEvent::PhaseChanged { phase: Phase::Enemy, turn: self.state.turn });
        info!(turn = self.state.turn, "enemy phase");
        self.show_banner("Enemy Turn");
        self.enemy_turn = Some(EnemyTurn::new(self.units.roster(Team::Enemy).to_vec()));
        self.push_state_sync();
    }

    /// Pick up an enemy phase loaded from a session, skipping enemies that already acted.
    pub(super) fn resume_enemy_phase(&mut self) {
        let queue = self
            .units
            .roster(Team::Enemy)
            .iter()
            .copied()
            .filter(|id| !self.state.acted_this_turn.contains(id))
            .collect();
        self.state.is_animating = true;
        self.enemy_turn = Some(EnemyTurn::new(queue));
    }

    pub(super) fn finish_enemy_phase(&mut self) {
        self.enemy_turn = None;
        if self.state.outcome == Some(Outcome::Defeat) {
            self.state.is_animating = false;
            return;
        }
        if self.state.free_explore {
            self.state.is_animating = false;
            return;
        }
        self.state.turn += 1;
        self.state.acted_this_turn.clear();
        for unit in self.units.iter_mut() {
            unit.has_acted = false;
            unit.has_moved = false;
        }
        self.state.phase = Phase::Player;
        self.state.is_animating = false;
        self.log.push(LogEvent::PhaseChanged { phase: Phase::Player, turn: self.state.turn });
        info!(turn = self.state.turn, "player phase");
        self.show_banner(&format!("Turn {}", self.state.turn));
        self.push_state_sync();
    }

    /// End the player phase once every living player unit has acted.
    pub(super) fn maybe_auto_end_turn(&mut self) {
        if self.state.phase != Phase::Player
            || self.state.free_explore
            || self.state.outcome.is_some()
            || self.battle.is_some()
        {
            return;
        }
        let all_acted = self
            .units
            .living(Team::Player)
            .all(|unit| self.state.acted_this_turn.contains(&unit.id));
        if all_acted && self.units.any_alive(Team::Player) {
            debug!(turn = self.state.turn, "every player unit acted, ending turn");
            self.begin_enemy_phase();
        }
    }

    /// Victory enters free-explore; defeat ends the run. Both are idempotent.
    pub(super) fn check_outcome(&mut self) {
        if !self.units.any_alive(Team::Enemy) {
            self.enter_free_explore();
        } else if !self.units.any_alive(Team::Player) && self.state.outcome.is_none() {
            self.state.outcome = Some(Outcome::Defeat);
            self.state.selection = Selection::None;
            self.log.push(LogEvent::RunFinished { outcome: Outcome::Defeat });
            info!(turn = self.state.turn, "defeat");
            self.show_banner("Defeat");
        }
    }

    pub(super) fn enter_free_explore(&mut self) {
        if self.state.free_explore && self.state.phase == Phase::FreeExplore {
            return;
        }
        self.state.free_explore = true;
        self.state.phase = Phase::FreeExplore;
        self.state.acted_this_turn.clear();
        for unit in self.units.iter_mut() {
            unit.has_acted = false;
            unit.has_moved = false;
            unit.intent = None;
        }
        self.enemy_turn = None;
        if self.moves.is_empty() && self.battle.is_none() {
            self.state.is_animating = false;
        }
        self.log.push(LogEvent::PhaseChanged { phase: Phase::FreeExplore, turn: self.state.turn });
        if self.state.outcome.is_none() {
            self.state.outcome = Some(Outcome::Victory);
            self.log.push(LogEvent::RunFinished { outcome: Outcome::Victory });
            info!(turn = self.state.turn, "all enemies defeated, free explore");
            self.show_banner("Victory");
        }
        self.push_state_sync();
    }
}
