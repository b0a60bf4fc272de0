//! Keyboard and mouse collection for one rendered frame.

use app::app_loop::{FrameInput, PointerSample, PointerTracker};
use macroquad::prelude::{
    KeyCode, MouseButton, is_key_pressed, is_mouse_button_down, mouse_position, mouse_wheel,
};

const ACTION_KEYS: [KeyCode; 8] = [
    KeyCode::A,
    KeyCode::W,
    KeyCode::E,
    KeyCode::C,
    KeyCode::Enter,
    KeyCode::Space,
    KeyCode::Escape,
    KeyCode::F3,
];

pub fn capture_frame_input(tracker: &mut PointerTracker) -> FrameInput {
    let keys_pressed = ACTION_KEYS.into_iter().filter(|key| is_key_pressed(*key)).collect();

    let (_, wheel_y) = mouse_wheel();
    let pointer = tracker.update(PointerSample {
        cursor: mouse_position(),
        left_down: is_mouse_button_down(MouseButton::Left),
        wheel: wheel_y,
    });

    FrameInput { keys_pressed, pointer }
}
