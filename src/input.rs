use macroquad::prelude::*;

use crate::config::InputConfig;
use crate::engine::Directions;

/// Held directions for this frame. `None` when no binding is configured at
/// all, which the world treats as "no input device".
pub fn poll_directions(input: &InputConfig) -> Option<Directions> {
    let bound = [&input.up, &input.down, &input.left, &input.right];
    if bound.iter().all(|keys| keys.is_empty()) {
        return None;
    }

    let held = |keys: &[KeyCode]| keys.iter().any(|&k| is_key_down(k));
    Some(Directions {
        up: held(&input.up),
        down: held(&input.down),
        left: held(&input.left),
        right: held(&input.right),
    })
}

pub fn confirm_pressed() -> bool {
    is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Space)
}

/// Left click pressed this frame, in screen coordinates.
pub fn click() -> Option<Vec2> {
    if is_mouse_button_pressed(MouseButton::Left) {
        let (x, y) = mouse_position();
        Some(vec2(x, y))
    } else {
        None
    }
}
