//! Cosmetic effect events. The engine queues them on state changes and never reads them back.

use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberKind {
    Damage,
    Heal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Slash { at: Pos },
    Impact { at: Pos },
    Heal { at: Pos },
    Death { at: Pos },
    FloatingNumber { at: Pos, value: i32, kind: NumberKind },
}

impl Effect {
    pub fn at(&self) -> Pos {
        match *self {
            Self::Slash { at }
            | Self::Impact { at }
            | Self::Heal { at }
            | Self::Death { at }
            | Self::FloatingNumber { at, .. } => at,
        }
    }

    /// Seconds the effect stays on screen.
    pub fn lifetime(&self) -> f32 {
        match self {
            Self::Slash { .. } => 0.25,
            Self::Impact { .. } => 0.35,
            Self::Heal { .. } => 0.6,
            Self::Death { .. } => 0.6,
            Self::FloatingNumber { .. } => 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveEffect {
    pub effect: Effect,
    pub age: f32,
}

impl ActiveEffect {
    pub fn new(effect: Effect) -> Self {
        Self { effect, age: 0.0 }
    }

    pub fn progress(&self) -> f32 {
        (self.age / self.effect.lifetime()).clamp(0.0, 1.0)
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.effect.lifetime()
    }
}
