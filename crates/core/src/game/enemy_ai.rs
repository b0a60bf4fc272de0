//! Enemy phase loop.
//! This module exists to run enemies one at a time in roster order, as a stage machine
//! advanced from `update`. It does not own pathfinding rules or battle reconciliation.

use std::collections::VecDeque;

use super::*;
use crate::combat::EncounterRequest;
use crate::engagement::resolve_engagement;
use crate::grid::{chebyshev, manhattan};
use crate::pathfinding::{approach_path, trim_to_range};

#[derive(Clone, Debug, PartialEq)]
pub(super) enum EnemyStage {
    /// Pick the next enemy from the queue.
    Next,
    /// Camera is panning onto the enemy; hold before it acts.
    PanLeadIn { unit: UnitId, remaining: f32 },
    Moving { unit: UnitId },
    /// Suspended until the battle this enemy started resolves.
    Fighting { unit: UnitId },
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct EnemyTurn {
    pub(super) queue: VecDeque<UnitId>,
    pub(super) stage: EnemyStage,
}

impl EnemyTurn {
    pub(super) fn new(queue: Vec<UnitId>) -> Self {
        Self { queue: queue.into(), stage: EnemyStage::Next }
    }
}

impl Game {
    pub(super) fn advance_enemy_turn(&mut self, dt: f32) {
        if self.banner.is_some() {
            return;
        }
        let Some(stage) = self.enemy_turn.as_ref().map(|turn| turn.stage.clone()) else {
            return;
        };
        match stage {
            EnemyStage::Next => self.next_enemy(),
            EnemyStage::PanLeadIn { unit, remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.set_enemy_stage(EnemyStage::PanLeadIn { unit, remaining });
                } else {
                    self.enemy_decide(unit);
                }
            }
            EnemyStage::Moving { unit } => {
                if !self.is_moving(unit) {
                    self.enemy_after_move(unit);
                }
            }
            EnemyStage::Fighting { unit } => {
                if self.battle.is_none() {
                    self.mark_acted(unit);
                    self.set_enemy_stage(EnemyStage::Next);
                }
            }
        }
    }

    fn set_enemy_stage(&mut self, stage: EnemyStage) {
        if let Some(turn) = self.enemy_turn.as_mut() {
            turn.stage = stage;
        }
    }

    fn next_enemy(&mut self) {
        if !self.units.any_alive(Team::Player) {
            debug!("no living player units, enemy phase ends");
            self.check_outcome();
            self.finish_enemy_phase();
            return;
        }
        let next = loop {
            let Some(turn) = self.enemy_turn.as_mut() else {
                return;
            };
            let Some(id) = turn.queue.pop_front() else {
                break None;
            };
            if self.can_act(id) {
                break Some(id);
            }
        };
        let Some(id) = next else {
            self.finish_enemy_phase();
            return;
        };
        self.focus_unit(id);
        let remaining = self.config.enemy_pan_secs;
        self.set_enemy_stage(EnemyStage::PanLeadIn { unit: id, remaining });
    }

    /// Nearest living player by Manhattan distance; ties go to roster order.
    fn nearest_player(&self, from: Pos) -> Option<&Unit> {
        self.units.living(Team::Player).min_by_key(|unit| manhattan(from, unit.pos))
    }

    fn enemy_decide(&mut self, id: UnitId) {
        let Some(enemy) = self.units.get(id).filter(|unit| unit.is_alive()) else {
            self.set_enemy_stage(EnemyStage::Next);
            return;
        };
        let (from, move_range, attack_range) = (enemy.pos, enemy.move_range, enemy.attack_range);
        let Some(target) = self.nearest_player(from).map(|unit| (unit.id, unit.pos)) else {
            self.finish_enemy_phase();
            return;
        };

        if chebyshev(from, target.1) <= attack_range {
            self.enemy_attack(id, target.0);
            return;
        }

        let path = approach_path(&self.view(), from, target.1, attack_range)
            .map(|path| trim_to_range(&path, move_range, target.1, attack_range))
            .filter(|path| !path.is_empty());
        match path {
            Some(path) => {
                self.set_intent(id, Intent::Move);
                debug!(steps = path.len(), ?from, "enemy approaches");
                self.start_move(id, path, true);
                self.set_enemy_stage(EnemyStage::Moving { unit: id });
            }
            None => {
                debug!(?from, "enemy has no approach, waiting");
                self.set_intent(id, Intent::Wait);
                self.mark_acted(id);
                self.set_enemy_stage(EnemyStage::Next);
            }
        }
    }

    fn enemy_after_move(&mut self, id: UnitId) {
        let Some(enemy) = self.units.get(id).filter(|unit| unit.is_alive()) else {
            self.set_enemy_stage(EnemyStage::Next);
            return;
        };
        let (pos, range) = (enemy.pos, enemy.attack_range);
        let target = self
            .units
            .living(Team::Player)
            .filter(|unit| chebyshev(pos, unit.pos) <= range)
            .min_by_key(|unit| chebyshev(pos, unit.pos))
            .map(|unit| unit.id);
        match target {
            Some(target) => self.enemy_attack(id, target),
            None => {
                self.mark_acted(id);
                self.set_enemy_stage(EnemyStage::Next);
            }
        }
    }

    fn enemy_attack(&mut self, id: UnitId, target: UnitId) {
        self.set_intent(id, Intent::Attack);
        let Some(engagement) = resolve_engagement(&self.units, id, Some(target)) else {
            self.set_enemy_stage(EnemyStage::Next);
            return;
        };
        let request: EncounterRequest = engagement.to_request();
        match self.start_battle(request) {
            Ok(()) => self.set_enemy_stage(EnemyStage::Fighting { unit: id }),
            Err(err) => {
                self.report_bridge_failure(&err);
                self.mark_acted(id);
                self.set_enemy_stage(EnemyStage::Next);
            }
        }
    }

    fn set_intent(&mut self, id: UnitId, intent: Intent) {
        if let Some(unit) = self.units.get_mut(id) {
            unit.intent = Some(intent);
            self.log.push(LogEvent::IntentChanged { unit: id, intent });
            self.needs_redraw = true;
        }
    }
}
