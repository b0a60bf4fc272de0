//! Per-frame translation from raw input to engine commands.
//!
//! This module exists so the window loop stays a thin shell: it captures input, hands it
//! here, then draws. It does not read the window or draw anything itself, which keeps it
//! testable without a display.

use macroquad::prelude::KeyCode;
use tactics_core::{Game, GameError, NoticeKind, Notification, Pos};
use tracing::debug;

const TOAST_SECS: f32 = 2.5;
const MAX_TOASTS: usize = 4;
const DRAG_THRESHOLD_PX: f32 = 4.0;
const ZOOM_STEP: f32 = 1.1;

/// Mouse state sampled once per frame by the window loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub cursor: (f32, f32),
    pub left_down: bool,
    pub wheel: f32,
}

/// What the pointer did this frame, after separating clicks from drags.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
    pub cursor: (f32, f32),
    pub click: bool,
    pub drag_delta: Option<(f32, f32)>,
    pub wheel: f32,
}

/// A press that moves further than a few pixels is a pan, not a click.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerTracker {
    pressed_at: Option<(f32, f32)>,
    last: (f32, f32),
    dragging: bool,
}

impl PointerTracker {
    pub fn update(&mut self, sample: PointerSample) -> PointerInput {
        let (x, y) = sample.cursor;
        let mut input =
            PointerInput { cursor: sample.cursor, wheel: sample.wheel, ..Default::default() };
        match (self.pressed_at, sample.left_down) {
            (None, true) => {
                self.pressed_at = Some(sample.cursor);
                self.dragging = false;
            }
            (Some((px, py)), true) => {
                let moved = (x - px).abs() > DRAG_THRESHOLD_PX || (y - py).abs() > DRAG_THRESHOLD_PX;
                if !self.dragging && moved {
                    self.dragging = true;
                    input.drag_delta = Some((x - px, y - py));
                } else if self.dragging {
                    input.drag_delta = Some((x - self.last.0, y - self.last.1));
                }
            }
            (Some(_), false) => {
                input.click = !self.dragging;
                self.pressed_at = None;
                self.dragging = false;
            }
            (None, false) => {}
        }
        self.last = sample.cursor;
        input
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    pub keys_pressed: Vec<KeyCode>,
    pub pointer: PointerInput,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub kind: NoticeKind,
    pub text: String,
    remaining_ms: u32,
}

impl Toast {
    fn new(notification: Notification) -> Self {
        Self {
            kind: notification.kind,
            text: notification.text,
            remaining_ms: (TOAST_SECS * 1000.0) as u32,
        }
    }

    pub fn remaining_secs(&self) -> f32 {
        self.remaining_ms as f32 / 1000.0
    }
}

#[derive(Default)]
pub struct AppState {
    pub toasts: Vec<Toast>,
    pub show_debug: bool,
    pub hovered: Option<Pos>,
}

impl AppState {
    pub fn new(show_debug: bool) -> Self {
        Self { show_debug, ..Self::default() }
    }

    /// Apply one frame of input, then collect the engine's notifications into toasts.
    pub fn tick(&mut self, game: &mut Game, input: &FrameInput, dt: f32) {
        self.handle_pointer(game, &input.pointer);
        for key in &input.keys_pressed {
            self.handle_key(game, *key);
        }
        self.collect_notifications(game);
        self.age_toasts(dt);
    }

    fn handle_pointer(&mut self, game: &mut Game, pointer: &PointerInput) {
        let (cx, cy) = pointer.cursor;
        let cell = game.camera().screen_to_cell(cx, cy);
        self.hovered = game.board().in_bounds(cell).then_some(cell);

        if let Some((dx, dy)) = pointer.drag_delta {
            game.camera_mut().pan_by(dx, dy);
        }
        if pointer.wheel != 0.0 {
            let factor = if pointer.wheel > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            game.camera_mut().zoom_at(factor, cx, cy);
        }
        if pointer.click {
            match self.hovered {
                Some(cell) => {
                    let result = game.click_cell(cell);
                    self.report(result);
                }
                None => game.deselect(),
            }
        }
    }

    fn handle_key(&mut self, game: &mut Game, key: KeyCode) {
        let result = match key {
            KeyCode::A => game.open_attack_preview(),
            KeyCode::W => game.wait_selected(),
            KeyCode::Enter | KeyCode::Space => game.confirm_engagement(),
            KeyCode::E => game.end_turn(),
            KeyCode::Escape => {
                if game.engagement().is_some() {
                    game.cancel_engagement()
                } else {
                    game.deselect();
                    Ok(())
                }
            }
            KeyCode::C => {
                if let Some(id) = game.state().selection.unit() {
                    game.focus_unit(id);
                }
                Ok(())
            }
            KeyCode::F3 => {
                self.show_debug = !self.show_debug;
                game.trigger_render();
                Ok(())
            }
            _ => Ok(()),
        };
        self.report(result);
    }

    /// Rejections the engine already announced, or that mean "nothing to do", stay quiet.
    fn report(&mut self, result: Result<(), GameError>) {
        let Err(err) = result else {
            return;
        };
        match err {
            GameError::Busy
            | GameError::Unreachable
            | GameError::NoSelection
            | GameError::OutOfRange
            | GameError::BattleUnavailable(_) => debug!(%err, "input rejected"),
            GameError::NotPlayerTurn => self.push(Notification::info("Enemy turn in progress")),
            GameError::Finished => self.push(Notification::info("The battle is over")),
            GameError::CannotAct => self.push(Notification::info("That unit already acted")),
            GameError::NoTargets => self.push(Notification::info("No enemies in range")),
            GameError::UnknownUnit => debug!(%err, "stale unit reference"),
        }
    }

    fn collect_notifications(&mut self, game: &mut Game) {
        for notification in game.drain_notifications() {
            if notification.kind != NoticeKind::Banner {
                self.push(notification);
            }
        }
    }

    fn push(&mut self, notification: Notification) {
        if self.toasts.last().is_some_and(|toast| toast.text == notification.text) {
            self.toasts.pop();
        }
        self.toasts.push(Toast::new(notification));
        if self.toasts.len() > MAX_TOASTS {
            self.toasts.remove(0);
        }
    }

    fn age_toasts(&mut self, dt: f32) {
        let elapsed = (dt.max(0.0) * 1000.0) as u32;
        for toast in &mut self.toasts {
            toast.remaining_ms = toast.remaining_ms.saturating_sub(elapsed);
        }
        self.toasts.retain(|toast| toast.remaining_ms > 0);
    }
}
