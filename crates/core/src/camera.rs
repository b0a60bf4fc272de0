//! Pan/zoom camera with eased targets and screen shake.
//!
//! `x`/`y` are the screen-space offset of the map origin. A pending target eases the
//! offset toward a goal each tick; manual control and enemy follow use different ease
//! factors so auto camera motion reads softer than direct input.

use serde::{Deserialize, Serialize};

use crate::types::Pos;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
const SETTLE_EPSILON: f32 = 0.5;
const SHAKE_DECAY_PER_SEC: f32 = 6.0;

/// What gets written to local camera storage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CameraTarget {
    x: f32,
    y: f32,
    ease: f32,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    tile_px: f32,
    viewport: (f32, f32),
    target: Option<CameraTarget>,
    shake: f32,
    settled_since_manual: bool,
}

impl Camera {
    pub fn new(tile_px: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            tile_px,
            viewport: (800.0, 600.0),
            target: None,
            shake: 0.0,
            settled_since_manual: true,
        }
    }

    pub fn restore(&mut self, state: CameraState) {
        self.x = state.x;
        self.y = state.y;
        self.scale = state.scale.clamp(MIN_SCALE, MAX_SCALE);
        self.target = None;
    }

    pub fn state(&self) -> CameraState {
        CameraState { x: self.x, y: self.y, scale: self.scale }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    pub fn cell_px(&self) -> f32 {
        self.tile_px * self.scale
    }

    /// Screen position of the top-left corner of a fractional cell coordinate.
    pub fn world_to_screen(&self, cell_x: f32, cell_y: f32) -> (f32, f32) {
        let size = self.cell_px();
        (self.x + (cell_x - 1.0) * size, self.y + (cell_y - 1.0) * size)
    }

    pub fn screen_to_cell(&self, sx: f32, sy: f32) -> Pos {
        let size = self.cell_px();
        let cx = ((sx - self.x) / size).floor() as i32 + 1;
        let cy = ((sy - self.y) / size).floor() as i32 + 1;
        Pos::new(cx, cy)
    }

    /// Drag pan. Cancels any programmatic target.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        self.target = None;
        self.settled_since_manual = false;
    }

    /// Zoom keeping the screen point `(ax, ay)` fixed.
    pub fn zoom_at(&mut self, factor: f32, ax: f32, ay: f32) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;
        self.x = ax - (ax - self.x) * ratio;
        self.y = ay - (ay - self.y) * ratio;
        self.scale = new_scale;
        self.target = None;
        self.settled_since_manual = false;
    }

    /// Ease toward centering the given fractional cell in the viewport.
    pub fn center_on(&mut self, cell_x: f32, cell_y: f32, ease: f32) {
        let size = self.cell_px();
        let goal_x = self.viewport.0 / 2.0 - (cell_x - 0.5) * size;
        let goal_y = self.viewport.1 / 2.0 - (cell_y - 0.5) * size;
        self.target = Some(CameraTarget { x: goal_x, y: goal_y, ease: ease.clamp(0.01, 1.0) });
    }

    pub fn snap_to(&mut self, cell_x: f32, cell_y: f32) {
        self.center_on(cell_x, cell_y, 1.0);
        self.update(0.0);
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn add_shake(&mut self, amount: f32) {
        self.shake = self.shake.max(amount);
    }

    pub fn shake(&self) -> f32 {
        self.shake
    }

    /// One tick of easing and shake decay. Returns true when the camera reached its
    /// target this tick, which is the moment to persist it.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.shake > 0.0 {
            self.shake = (self.shake - SHAKE_DECAY_PER_SEC * dt).max(0.0);
        }
        let Some(target) = self.target else {
            if !self.settled_since_manual {
                self.settled_since_manual = true;
                return true;
            }
            return false;
        };
        self.x += (target.x - self.x) * target.ease;
        self.y += (target.y - self.y) * target.ease;
        if (target.x - self.x).abs() < SETTLE_EPSILON && (target.y - self.y).abs() < SETTLE_EPSILON
        {
            self.x = target.x;
            self.y = target.y;
            self.target = None;
            return true;
        }
        false
    }
}
