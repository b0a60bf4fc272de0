//! Player commands.
//! This module exists to route clicks and menu actions through the selection machine
//! and to reject anything the current state does not allow.
//! It does not animate or resolve anything; it only starts sequences.

use super::*;
use crate::engagement::resolve_engagement;
use crate::grid::chebyshev;
use crate::pathfinding::find_path;

impl Game {
    fn guard_player_input(&self) -> Result<(), GameError> {
        if self.state.outcome == Some(Outcome::Defeat) {
            return Err(GameError::Finished);
        }
        if self.state.is_animating {
            return Err(GameError::Busy);
        }
        if self.state.phase == Phase::Enemy {
            return Err(GameError::NotPlayerTurn);
        }
        Ok(())
    }

    /// Route a click on a grid cell through the selection machine.
    pub fn click_cell(&mut self, pos: Pos) -> Result<(), GameError> {
        self.guard_player_input()?;
        let clicked = self.units.unit_at(pos).map(|unit| (unit.id, unit.team));
        self.needs_redraw = true;

        if let Selection::Targeting { engagement } = &self.state.selection {
            let initiator = engagement.initiator;
            return match clicked {
                Some((target, Team::Enemy)) => self.preview_attack(initiator, target),
                _ => self.cancel_engagement(),
            };
        }

        match clicked {
            Some((id, Team::Player)) => self.select_unit(id),
            Some((target, Team::Enemy)) => {
                let initiator = self.state.selection.unit().ok_or(GameError::NoSelection)?;
                self.preview_attack(initiator, target)
            }
            None => self.move_selected_to(pos),
        }
    }

    fn select_unit(&mut self, id: UnitId) -> Result<(), GameError> {
        if !self.can_act(id) {
            return Err(GameError::CannotAct);
        }
        let has_moved = self.units.get(id).is_some_and(|unit| unit.has_moved);
        self.state.selection = if has_moved && !self.state.free_explore {
            Selection::ActionMenu { unit: id }
        } else {
            Selection::Unit { unit: id, reachable: self.reachable_for(id) }
        };
        debug!(?id, "unit selected");
        Ok(())
    }

    fn move_selected_to(&mut self, pos: Pos) -> Result<(), GameError> {
        let Selection::Unit { unit: id, reachable } = &self.state.selection else {
            return match self.state.selection {
                Selection::None => Ok(()),
                _ => Err(GameError::Unreachable),
            };
        };
        let id = *id;
        if !reachable.contains_key(&pos) {
            return Err(GameError::Unreachable);
        }
        let (from, move_range) = self
            .units
            .get(id)
            .map(|unit| (unit.pos, unit.move_range))
            .ok_or(GameError::UnknownUnit)?;
        let path = find_path(&self.view(), from, pos, Some(move_range));
        if path.is_empty() || path.len() > move_range as usize {
            return Err(GameError::Unreachable);
        }
        self.state.selection = Selection::None;
        self.state.is_animating = true;
        if !self.start_move(id, path, false) {
            self.state.is_animating = false;
            return Err(GameError::Busy);
        }
        Ok(())
    }

    /// Open the engagement preview against a clicked enemy. Enemies beyond the
    /// initiator's Chebyshev attack range are rejected with a notification.
    fn preview_attack(&mut self, initiator: UnitId, target: UnitId) -> Result<(), GameError> {
        if !self.can_act(initiator) {
            return Err(GameError::CannotAct);
        }
        let (Some(source), Some(enemy)) = (self.units.get(initiator), self.units.get(target)) else {
            return Err(GameError::UnknownUnit);
        };
        if chebyshev(source.pos, enemy.pos) > source.attack_range {
            self.notify(Notification::info("Enemy out of range"));
            return Err(GameError::OutOfRange);
        }
        let engagement =
            resolve_engagement(&self.units, initiator, Some(target)).ok_or(GameError::CannotAct)?;
        self.state.selection = Selection::Targeting { engagement };
        Ok(())
    }

    /// Attack action from the menu: show the zone around the selected unit with no target.
    pub fn open_attack_preview(&mut self) -> Result<(), GameError> {
        self.guard_player_input()?;
        let id = self.state.selection.unit().ok_or(GameError::NoSelection)?;
        if !self.can_act(id) {
            return Err(GameError::CannotAct);
        }
        let engagement = resolve_engagement(&self.units, id, None).ok_or(GameError::CannotAct)?;
        self.state.selection = Selection::Targeting { engagement };
        self.needs_redraw = true;
        Ok(())
    }

    /// Hand the previewed engagement to the combat bridge. On bridge failure the preview
    /// stays open and nothing else changes.
    pub fn confirm_engagement(&mut self) -> Result<(), GameError> {
        self.guard_player_input()?;
        let Selection::Targeting { engagement } = &self.state.selection else {
            return Err(GameError::NoSelection);
        };
        if !engagement.can_confirm() {
            return Err(GameError::NoTargets);
        }
        let request = engagement.to_request();
        match self.start_battle(request) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.report_bridge_failure(&err);
                Err(GameError::BattleUnavailable(err.to_string()))
            }
        }
    }

    /// Drop the preview and return to the initiator's action menu.
    pub fn cancel_engagement(&mut self) -> Result<(), GameError> {
        let Selection::Targeting { engagement } = &self.state.selection else {
            return Err(GameError::NoSelection);
        };
        self.state.selection = Selection::ActionMenu { unit: engagement.initiator };
        self.needs_redraw = true;
        Ok(())
    }

    /// End the selected unit's turn without fighting.
    pub fn wait_selected(&mut self) -> Result<(), GameError> {
        self.guard_player_input()?;
        let id = self.state.selection.unit().ok_or(GameError::NoSelection)?;
        self.state.selection = Selection::None;
        self.needs_redraw = true;
        if self.state.free_explore {
            return Ok(());
        }
        if !self.can_act(id) {
            return Err(GameError::CannotAct);
        }
        self.mark_acted(id);
        self.push_state_sync();
        self.maybe_auto_end_turn();
        Ok(())
    }

    pub fn deselect(&mut self) {
        if !matches!(self.state.selection, Selection::None) {
            self.state.selection = Selection::None;
            self.needs_redraw = true;
        }
    }

    /// Explicit end-turn. A no-op in free-explore, which has no enemy phase.
    pub fn end_turn(&mut self) -> Result<(), GameError> {
        self.guard_player_input()?;
        if self.state.phase == Phase::FreeExplore {
            return Ok(());
        }
        self.begin_enemy_phase();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::game::test_support::*;
    use super::*;
    use crate::combat::UnavailableResolver;
    use crate::content::ContentPack;

    #[test]
    fn straight_row_move_and_self_click() {
        let (mut game, hero, _) = open_field_fixture(10, Pos::new(1, 1), Pos::new(10, 10), 4);
        game.click_cell(Pos::new(1, 1)).expect("select");
        assert!(game.reachable().expect("highlights").contains_key(&Pos::new(5, 1)));

        let path = find_path(&game.view(), Pos::new(1, 1), Pos::new(1, 1), Some(4));
        assert!(path.is_empty());

        game.click_cell(Pos::new(5, 1)).expect("move");
        assert!(game.is_busy());
        assert_eq!(game.click_cell(Pos::new(4, 1)), Err(GameError::Busy));
        run_until_idle(&mut game);
        assert_eq!(game.units.get(hero).expect("hero").pos, Pos::new(5, 1));
        assert_eq!(game.state.selection, Selection::ActionMenu { unit: hero });
    }

    #[test]
    fn unreachable_click_keeps_selection() {
        let (mut game, hero, _) = duel_fixture(Pos::new(1, 1), Pos::new(9, 9));
        game.click_cell(Pos::new(1, 1)).expect("select");
        assert_eq!(game.click_cell(Pos::new(8, 8)), Err(GameError::Unreachable));
        assert_eq!(game.state.selection.unit(), Some(hero));
    }

    #[test]
    fn out_of_range_enemy_is_rejected_with_notice() {
        let (mut game, _, _) = duel_fixture(Pos::new(1, 1), Pos::new(9, 9));
        game.click_cell(Pos::new(1, 1)).expect("select");
        assert_eq!(game.click_cell(Pos::new(9, 9)), Err(GameError::OutOfRange));
        let notes = game.drain_notifications();
        assert!(notes.iter().any(|note| note.text == "Enemy out of range"));
    }

    #[test]
    fn adjacent_enemy_opens_preview_and_cancel_restores_menu() {
        let (mut game, hero, enemy) = duel_fixture(Pos::new(4, 4), Pos::new(5, 5));
        game.click_cell(Pos::new(4, 4)).expect("select");
        game.click_cell(Pos::new(5, 5)).expect("preview");
        let engagement = game.engagement().expect("targeting");
        assert_eq!(engagement.enemies, vec![enemy]);
        assert!(engagement.can_confirm());

        game.cancel_engagement().expect("cancel");
        assert_eq!(game.state.selection, Selection::ActionMenu { unit: hero });
    }

    #[test]
    fn empty_zone_cannot_be_confirmed() {
        let (mut game, _, _) = duel_fixture(Pos::new(1, 1), Pos::new(9, 9));
        game.click_cell(Pos::new(1, 1)).expect("select");
        game.open_attack_preview().expect("preview");
        assert!(game.engagement().is_some());
        assert_eq!(game.confirm_engagement(), Err(GameError::NoTargets));
    }

    #[test]
    fn waiting_last_unit_ends_the_turn() {
        let (mut game, hero, _) = duel_fixture(Pos::new(1, 1), Pos::new(9, 9));
        game.click_cell(Pos::new(1, 1)).expect("select");
        game.wait_selected().expect("wait");
        assert!(game.state.acted_this_turn.contains(&hero));
        assert_eq!(game.state.phase, Phase::Enemy);
        assert_eq!(game.click_cell(Pos::new(1, 1)), Err(GameError::Busy));
    }

    #[test]
    fn acted_units_cannot_be_selected() {
        let (mut game, hero, _) = duel_fixture(Pos::new(1, 1), Pos::new(9, 9));
        game.units.insert(UnitSpec::new("second", Team::Player, Pos::new(2, 1), 10));
        game.click_cell(Pos::new(1, 1)).expect("select");
        game.wait_selected().expect("wait");
        assert_eq!(game.state.phase, Phase::Player);
        assert_eq!(game.click_cell(Pos::new(1, 1)), Err(GameError::CannotAct));
        assert!(game.state.acted_this_turn.contains(&hero));
    }

    #[test]
    fn refused_battle_keeps_the_preview_and_warns() {
        let (game, _, enemy) = duel_fixture(Pos::new(4, 4), Pos::new(5, 4));
        let mut game = game.with_combat(ContentPack::build_default(), UnavailableResolver);
        game.click_cell(Pos::new(4, 4)).expect("select");
        game.click_cell(Pos::new(5, 4)).expect("preview");
        game.drain_notifications();
        let before = game.snapshot_hash();

        assert!(matches!(game.confirm_engagement(), Err(GameError::BattleUnavailable(_))));
        let notes = game.drain_notifications();
        assert!(notes.iter().any(|note| note.kind == NoticeKind::Warning));
        let engagement = game.engagement().expect("preview still open");
        assert_eq!(engagement.enemies, vec![enemy]);
        assert!(!game.is_busy());
        assert_eq!(game.snapshot_hash(), before);
    }

    #[test]
    fn missing_combat_data_reports_unavailable_battle() {
        let (mut game, _, enemy) = duel_fixture(Pos::new(4, 4), Pos::new(5, 4));
        game.units.get_mut(enemy).expect("enemy").combat_key = "wyvern".to_string();
        game.click_cell(Pos::new(4, 4)).expect("select");
        game.click_cell(Pos::new(5, 4)).expect("preview");
        game.drain_notifications();
        let before = game.snapshot_hash();

        assert!(matches!(game.confirm_engagement(), Err(GameError::BattleUnavailable(_))));
        let notes = game.drain_notifications();
        assert!(notes.iter().any(|note| {
            note.kind == NoticeKind::Warning && note.text == "Battle data unavailable"
        }));
        assert!(matches!(game.state.selection, Selection::Targeting { .. }));
        assert!(!game.is_busy());
        assert_eq!(game.snapshot_hash(), before);
    }
}
