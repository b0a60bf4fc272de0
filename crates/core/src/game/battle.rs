//! Battle hand-off and reconciliation.
//! This module exists to keep the map side of a fight in one place: build and start the
//! encounter, apply vitals while it runs, and settle deaths and turn flags when it ends.
//! It does not resolve skills or damage; the resolver does.

use tracing::warn;

use super::*;
use crate::combat::{BattlePoll, BridgeError, EncounterRequest, VitalsSync, build_encounter};
use crate::effects::NumberKind;

const HIT_SHAKE: f32 = 4.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct ActiveBattle {
    pub(super) request: EncounterRequest,
    pub(super) initiator_team: Team,
}

impl Game {
    /// Build every combat entity and get the resolver to accept the fight before touching
    /// map state. Any failure leaves the map exactly as it was.
    pub(super) fn start_battle(&mut self, request: EncounterRequest) -> Result<(), BridgeError> {
        if self.battle.is_some() {
            return Err(BridgeError::AlreadyRunning);
        }
        let initiator_team =
            self.units.get(request.initiator).map(|unit| unit.team).ok_or(BridgeError::UnknownUnit)?;
        let encounter = build_encounter(&self.units, self.data.as_ref(), &request)?;
        self.resolver.begin(encounter)?;

        info!(
            allies = request.allies.len(),
            enemies = request.enemies.len(),
            ?initiator_team,
            "encounter started"
        );
        self.state.is_animating = true;
        self.state.selection = Selection::None;
        let pose_secs = self.config.attack_pose_secs;
        if let Some(unit) = self.units.get_mut(request.initiator) {
            unit.pose = Pose::Attack;
            self.posing.push((request.initiator, pose_secs));
        }
        if let Some(target) = request.enemies.first().and_then(|id| self.units.get(*id)) {
            self.effects.push(Effect::Slash { at: target.pos });
        }
        self.log.push(LogEvent::EncounterStarted {
            initiator: request.initiator,
            allies: request.allies.clone(),
            enemies: request.enemies.clone(),
        });
        self.battle = Some(ActiveBattle { request, initiator_team });
        self.needs_redraw = true;
        Ok(())
    }

    pub(super) fn poll_battle(&mut self) {
        if self.battle.is_none() {
            return;
        }
        match self.resolver.poll() {
            BattlePoll::Pending => {}
            BattlePoll::Sync(vitals) => self.apply_vitals(&vitals),
            BattlePoll::Finished(report) => {
                self.apply_vitals(&report.vitals);
                self.finish_battle(report.outcome);
            }
        }
    }

    fn apply_vitals(&mut self, vitals: &[VitalsSync]) {
        for sync in vitals {
            let Some(unit) = self.units.get_mut(sync.unit) else {
                continue;
            };
            if unit.pending_death {
                continue;
            }
            let at = unit.pos;
            let hp = sync.hp.clamp(0, unit.max_hp);
            let delta = hp - unit.hp;
            unit.hp = hp;
            unit.mana = sync.mana.max(0);
            unit.max_mana = unit.max_mana.max(unit.mana);
            if delta < 0 {
                self.effects.push(Effect::Impact { at });
                self.effects.push(Effect::FloatingNumber {
                    at,
                    value: -delta,
                    kind: NumberKind::Damage,
                });
                self.camera.add_shake(HIT_SHAKE);
            } else if delta > 0 {
                self.effects.push(Effect::Heal { at });
                self.effects.push(Effect::FloatingNumber { at, value: delta, kind: NumberKind::Heal });
            }
            if hp <= 0 {
                self.begin_death(sync.unit);
            }
        }
        self.needs_redraw = true;
    }

    /// Flag the unit pending-death and start its death animation. Roster removal waits
    /// for the timer in `tick_dying`.
    fn begin_death(&mut self, id: UnitId) {
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };
        unit.pending_death = true;
        unit.intent = None;
        let at = unit.pos;
        debug!(unit = %unit.key, "unit down");
        self.effects.push(Effect::Death { at });
        self.dying.push((id, self.config.death_anim_secs));
        self.log.push(LogEvent::UnitDied { unit: id });
        if self.state.selection.unit() == Some(id) {
            self.state.selection = Selection::None;
        }
    }

    pub(super) fn tick_dying(&mut self, dt: f32) {
        if self.dying.is_empty() {
            return;
        }
        for (_, remaining) in &mut self.dying {
            *remaining -= dt;
        }
        let (expired, alive): (Vec<_>, Vec<_>) =
            self.dying.drain(..).partition(|(_, remaining)| *remaining <= 0.0);
        self.dying = alive;
        for (id, _) in expired {
            if let Some(unit) = self.units.remove(id) {
                debug!(unit = %unit.key, "removed from roster");
            }
            self.state.acted_this_turn.remove(&id);
        }
        self.needs_redraw = true;
    }

    pub(super) fn tick_poses(&mut self, dt: f32) {
        if self.posing.is_empty() {
            return;
        }
        for (_, remaining) in &mut self.posing {
            *remaining -= dt;
        }
        let mut i = 0;
        while i < self.posing.len() {
            if self.posing[i].1 > 0.0 {
                i += 1;
                continue;
            }
            let (id, _) = self.posing.swap_remove(i);
            if let Some(unit) = self.units.get_mut(id)
                && unit.pose == Pose::Attack
            {
                unit.pose = Pose::Idle;
            }
        }
        self.needs_redraw = true;
    }

    fn finish_battle(&mut self, outcome: BattleOutcome) {
        let Some(battle) = self.battle.take() else {
            return;
        };
        info!(?outcome, "encounter resolved");
        self.log.push(LogEvent::EncounterResolved { outcome });

        let participants =
            battle.request.allies.iter().chain(battle.request.enemies.iter()).copied();
        let players: Vec<UnitId> = participants
            .filter(|id| self.units.get(*id).is_some_and(|unit| unit.team == Team::Player))
            .collect();
        for id in players {
            self.mark_acted(id);
        }

        self.check_outcome();
        if battle.initiator_team == Team::Player {
            if self.moves.is_empty() {
                self.state.is_animating = false;
            }
            self.maybe_auto_end_turn();
        }
        self.push_state_sync();
    }

    /// Surface a bridge failure to the player without touching map state.
    pub(super) fn report_bridge_failure(&mut self, err: &BridgeError) {
        warn!(%err, "encounter aborted");
        let text = match err {
            BridgeError::MissingEntity(_) | BridgeError::MissingSkill { .. } => {
                "Battle data unavailable".to_string()
            }
            other => format!("Battle unavailable: {other}"),
        };
        self.notify(Notification::warning(text));
    }
}

#[cfg(test)]
mod tests {
    use crate::game::test_support::*;
    use super::*;
    use crate::combat::UnavailableResolver;
    use crate::content::ContentPack;

    #[test]
    fn failed_hand_off_leaves_map_untouched() {
        let (game, hero, enemy) = duel_fixture(Pos::new(4, 4), Pos::new(5, 4));
        let mut game = game.with_combat(ContentPack::build_default(), UnavailableResolver);
        let before = game.snapshot_hash();
        let request = EncounterRequest { initiator: hero, allies: vec![hero], enemies: vec![enemy] };

        let err = game.start_battle(request).expect_err("resolver refuses");
        assert_eq!(err, BridgeError::ResolverUnavailable);
        assert!(game.battle.is_none());
        assert!(!game.state.is_animating);
        assert_eq!(game.snapshot_hash(), before);
    }

    #[test]
    fn missing_combat_key_aborts_before_the_resolver() {
        let (mut game, hero, enemy) = duel_fixture(Pos::new(4, 4), Pos::new(5, 4));
        game.units.get_mut(enemy).expect("enemy").combat_key = "wyvern".to_string();
        let request = EncounterRequest { initiator: hero, allies: vec![hero], enemies: vec![enemy] };
        assert_eq!(
            game.start_battle(request),
            Err(BridgeError::MissingEntity("wyvern".to_string()))
        );
        assert!(game.battle.is_none());
    }

    #[test]
    fn death_waits_for_animation_before_roster_removal() {
        let (mut game, _, enemy) = duel_fixture(Pos::new(4, 4), Pos::new(5, 4));
        game.apply_vitals(&[VitalsSync { unit: enemy, hp: 0, mana: 0 }]);

        let unit = game.units.get(enemy).expect("still in roster");
        assert!(unit.pending_death);
        assert!(game.unit_at(Pos::new(5, 4)).is_none(), "pending-death units free their cell");
        assert!(game.drain_effects().iter().any(|effect| matches!(effect, Effect::Death { .. })));

        game.tick_dying(game.config.death_anim_secs + 0.01);
        assert!(game.units.get(enemy).is_none());
        assert!(game.units.roster(Team::Enemy).is_empty());
    }

    #[test]
    fn vitals_sync_spawns_numbers() {
        let (mut game, hero, _) = duel_fixture(Pos::new(4, 4), Pos::new(5, 4));
        game.apply_vitals(&[VitalsSync { unit: hero, hp: 15, mana: 0 }]);
        assert_eq!(game.units.get(hero).expect("hero").hp, 15);
        let effects = game.drain_effects();
        assert!(effects.contains(&Effect::FloatingNumber {
            at: Pos::new(4, 4),
            value: 5,
            kind: NumberKind::Damage,
        }));
        assert!(game.camera.shake() > 0.0);
    }
}
