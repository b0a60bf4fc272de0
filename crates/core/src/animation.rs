//! Per-cell movement tweens with team-specific easing and bounce.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::types::{Facing, Pos, UnitId};
use crate::unit::RenderPos;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    OutCubic,
    InOutCubic,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveProfile {
    pub duration_ms: u32,
    pub easing: Easing,
    /// Peak hop height in cells.
    pub bounce: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveTween {
    pub from: Pos,
    pub to: Pos,
    pub profile: MoveProfile,
    elapsed: f32,
}

impl MoveTween {
    pub fn new(from: Pos, to: Pos, profile: MoveProfile) -> Self {
        Self { from, to, profile, elapsed: 0.0 }
    }

    pub fn progress(&self) -> f32 {
        let duration = self.profile.duration_ms as f32 / 1000.0;
        if duration <= 0.0 { 1.0 } else { (self.elapsed / duration).min(1.0) }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn sample(&self) -> RenderPos {
        let t = self.progress();
        let eased = self.profile.easing.apply(t);
        let x = self.from.x as f32 + (self.to.x - self.from.x) as f32 * eased;
        let y = self.from.y as f32 + (self.to.y - self.from.y) as f32 * eased;
        let lift = self.profile.bounce * (PI * t).sin();
        RenderPos { x, y, lift: lift.max(0.0) }
    }
}

/// Facing after a step; vertical-only steps keep the previous facing.
pub fn facing_for_step(from: Pos, to: Pos, current: Facing) -> Facing {
    match to.x.cmp(&from.x) {
        Ordering::Less => Facing::Left,
        Ordering::Greater => Facing::Right,
        Ordering::Equal => current,
    }
}

/// Active tweens, at most one per unit.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    tweens: BTreeMap<UnitId, MoveTween>,
}

impl Animator {
    /// Returns false when `unit` already has a tween in flight.
    pub fn start(&mut self, unit: UnitId, tween: MoveTween) -> bool {
        if self.tweens.contains_key(&unit) {
            return false;
        }
        self.tweens.insert(unit, tween);
        true
    }

    pub fn is_animating(&self, unit: UnitId) -> bool {
        self.tweens.contains_key(&unit)
    }

    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Advance every tween. Yields the current sample for each unit and whether it finished;
    /// finished tweens are dropped.
    pub fn advance(&mut self, dt: f32) -> Vec<(UnitId, RenderPos, bool)> {
        let mut frames = Vec::with_capacity(self.tweens.len());
        for (unit, tween) in &mut self.tweens {
            tween.advance(dt);
            frames.push((*unit, tween.sample(), tween.is_finished()));
        }
        self.tweens.retain(|_, tween| !tween.is_finished());
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn profile(duration_ms: u32) -> MoveProfile {
        MoveProfile { duration_ms, easing: Easing::OutCubic, bounce: 0.1 }
    }

    #[test]
    fn easing_curves_hit_endpoints() {
        for easing in [Easing::Linear, Easing::OutCubic, Easing::InOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
        assert!(Easing::OutCubic.apply(0.25) > 0.25, "out-cubic front-loads motion");
        assert!(Easing::InOutCubic.apply(0.25) < 0.25, "in-out-cubic starts slow");
    }

    #[test]
    fn tween_lands_on_target_without_lift() {
        let mut tween = MoveTween::new(Pos::new(1, 1), Pos::new(2, 1), profile(200));
        tween.advance(0.1);
        let mid = tween.sample();
        assert!(mid.x > 1.0 && mid.x < 2.0);
        assert!(mid.lift > 0.0);
        tween.advance(0.2);
        assert!(tween.is_finished());
        let end = tween.sample();
        assert!((end.x - 2.0).abs() < 1e-6);
        assert!(end.lift.abs() < 1e-4);
    }

    #[test]
    fn facing_follows_horizontal_sign_only() {
        assert_eq!(facing_for_step(Pos::new(3, 3), Pos::new(2, 3), Facing::Right), Facing::Left);
        assert_eq!(facing_for_step(Pos::new(3, 3), Pos::new(4, 3), Facing::Left), Facing::Right);
        assert_eq!(facing_for_step(Pos::new(3, 3), Pos::new(3, 4), Facing::Left), Facing::Left);
    }

    #[test]
    fn one_tween_per_unit() {
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());
        let mut animator = Animator::default();
        assert!(animator.start(a, MoveTween::new(Pos::new(1, 1), Pos::new(2, 1), profile(100))));
        assert!(!animator.start(a, MoveTween::new(Pos::new(2, 1), Pos::new(3, 1), profile(100))));
        assert!(animator.start(b, MoveTween::new(Pos::new(5, 5), Pos::new(5, 6), profile(100))));

        let frames = animator.advance(0.2);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|(_, _, done)| *done));
        assert!(animator.is_idle());
    }
}
