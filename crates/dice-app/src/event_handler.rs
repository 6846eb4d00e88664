//! Translates winit input into canvas pointer events.

use dice_core::input::{PointerButton, PointerEvent};
use kurbo::Point;
use winit::event::{ElementState, MouseButton, TouchPhase};
use winit::keyboard::{Key, ModifiersState};

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// A mouse press or release at `position` (CSS pixels).
pub fn mouse_event(state: ElementState, button: MouseButton, position: Point) -> Option<PointerEvent> {
    let button = pointer_button(button)?;
    Some(match state {
        ElementState::Pressed => PointerEvent::Down { position, button },
        ElementState::Released => PointerEvent::Up { position, button },
    })
}

/// A touch contact at `position` (CSS pixels). Touches draw like the primary button.
pub fn touch_event(phase: TouchPhase, position: Point) -> PointerEvent {
    let button = PointerButton::Primary;
    match phase {
        TouchPhase::Started => PointerEvent::Down { position, button },
        TouchPhase::Moved => PointerEvent::Move { position },
        TouchPhase::Ended => PointerEvent::Up { position, button },
        TouchPhase::Cancelled => PointerEvent::Cancel,
    }
}

/// Ctrl+S, or Cmd+S on macOS.
pub fn is_save_shortcut(key: &Key, modifiers: ModifiersState) -> bool {
    let command = modifiers.control_key() || modifiers.super_key();
    command && matches!(key, Key::Character(c) if c.eq_ignore_ascii_case("s"))
}
