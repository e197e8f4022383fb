use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// Mouse and touch input folded into one pointer stream, positions in window coordinates.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Pressed(Vec2),
    Moved(Vec2),
    Released(Vec2),
}

#[derive(Default)]
pub(super) struct MouseTracking {
    last_position: Option<Vec2>,
}

pub(super) fn read_pointer_input(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut tracking: Local<MouseTracking>,
    mut pointer: MessageWriter<PointerInput>,
) {
    if let Ok(window) = window_query.single() {
        if let Some(position) = window.cursor_position() {
            if mouse_buttons.just_pressed(MouseButton::Left) {
                pointer.write(PointerInput::Pressed(position));
            } else if mouse_buttons.pressed(MouseButton::Left)
                && tracking.last_position != Some(position)
            {
                pointer.write(PointerInput::Moved(position));
            }
            if mouse_buttons.just_released(MouseButton::Left) {
                pointer.write(PointerInput::Released(position));
            }
            tracking.last_position = Some(position);
        } else if mouse_buttons.just_released(MouseButton::Left) {
            // Released outside the window; close the gesture where it was last seen.
            if let Some(position) = tracking.last_position {
                pointer.write(PointerInput::Released(position));
            }
        }
    }

    for touch in touches.iter_just_pressed() {
        pointer.write(PointerInput::Pressed(touch.position()));
    }
    for touch in touches.iter() {
        if !touches.just_pressed(touch.id()) && touch.delta() != Vec2::ZERO {
            pointer.write(PointerInput::Moved(touch.position()));
        }
    }
    for touch in touches.iter_just_released() {
        pointer.write(PointerInput::Released(touch.position()));
    }
}
