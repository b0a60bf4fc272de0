//! Multi-cell move sequencing on top of per-cell tweens.
//! This module exists so the rest of the controller can treat a move as one job.
//! It does not decide where units go or what happens after they arrive.

use std::collections::VecDeque;

use super::*;
use crate::animation::{MoveTween, facing_for_step};
use crate::session::MoveRecord;
use crate::unit::RenderPos;

#[derive(Clone, Debug, PartialEq)]
pub(super) struct MoveJob {
    pub(super) unit: UnitId,
    pub(super) origin: Pos,
    pub(super) remaining: VecDeque<Pos>,
    pub(super) follow_camera: bool,
}

impl Game {
    /// Queue a move along `path` (cells after the unit's current cell). The logical
    /// position jumps to each cell as its step starts, so occupancy never lags the tween.
    pub(super) fn start_move(&mut self, id: UnitId, path: Vec<Pos>, follow_camera: bool) -> bool {
        if path.is_empty() || self.moves.iter().any(|job| job.unit == id) {
            return false;
        }
        let Some(unit) = self.units.get(id) else {
            return false;
        };
        let job = MoveJob {
            unit: id,
            origin: unit.pos,
            remaining: path.into(),
            follow_camera,
        };
        debug!(unit = %unit.key, from = ?job.origin, steps = job.remaining.len(), "move queued");
        self.moves.push(job);
        self.begin_next_step(id)
    }

    pub(super) fn is_moving(&self, id: UnitId) -> bool {
        self.moves.iter().any(|job| job.unit == id)
    }

    fn begin_next_step(&mut self, id: UnitId) -> bool {
        let Some(job) = self.moves.iter_mut().find(|job| job.unit == id) else {
            return false;
        };
        let Some(next) = job.remaining.pop_front() else {
            return false;
        };
        let Some(unit) = self.units.get_mut(id) else {
            return false;
        };
        let from = unit.pos;
        unit.pos = next;
        unit.facing = facing_for_step(from, next, unit.facing);
        unit.pose = Pose::Walk;
        let profile = self.config.move_profile(unit.team);
        self.animator.start(id, MoveTween::new(from, next, profile))
    }

    /// Advance every tween, chain the next step of each job and finish jobs that ran out.
    pub(super) fn advance_moves(&mut self, dt: f32) {
        if self.animator.is_idle() {
            return;
        }
        let frames = self.animator.advance(dt);
        self.needs_redraw = true;
        let mut finished = Vec::new();
        for (id, render, done) in frames {
            if let Some(unit) = self.units.get_mut(id) {
                unit.render = render;
            }
            if done && !self.begin_next_step(id) {
                finished.push(id);
            }
        }

        let ease = self.config.camera_follow_ease;
        for job in self.moves.iter().filter(|job| job.follow_camera) {
            if let Some(unit) = self.units.get(job.unit) {
                self.camera.center_on(unit.render.x, unit.render.y, ease);
            }
        }

        for id in finished {
            if let Some(index) = self.moves.iter().position(|job| job.unit == id) {
                let job = self.moves.remove(index);
                self.finish_move(job);
            }
        }
    }

    fn finish_move(&mut self, job: MoveJob) {
        let Some(unit) = self.units.get_mut(job.unit) else {
            return;
        };
        unit.pose = Pose::Idle;
        unit.render = RenderPos::at(unit.pos);
        let to = unit.pos;
        let team = unit.team;
        let key = unit.key.clone();
        if !self.state.free_explore {
            unit.has_moved = true;
        }
        self.log.push(LogEvent::UnitMoved { unit: job.unit, from: job.origin, to });
        debug!(unit = %key, from = ?job.origin, ?to, "move finished");

        if team == Team::Player {
            self.outbox.push(SyncRequest::Move(MoveRecord {
                session_id: self.session_id.clone(),
                unit: key,
                from: job.origin,
                to,
                turn: self.state.turn,
            }));
            self.state.is_animating = false;
            self.state.selection = if self.state.free_explore {
                Selection::Unit { unit: job.unit, reachable: self.reachable_for(job.unit) }
            } else {
                Selection::ActionMenu { unit: job.unit }
            };
        }
        self.push_state_sync();
    }
}
