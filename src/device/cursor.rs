//! Gamepad-driven cursor emulation
//!
//! When enabled, every poll moves the host cursor by the selected stick's
//! filtered position times the sensitivity, and the mapped gamepad buttons
//! act as mouse buttons. Both go through the gamepad's
//! [`CursorControl`](crate::output::CursorControl); without one the emulation
//! does nothing.

use crate::mapping::{GamepadButton, MouseButton, Stick};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURSOR_SENSITIVITY: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorEmulation {
    pub enabled: bool,
    /// Stick that drives the cursor.
    pub stick: Stick,
    /// Pixels per poll at full deflection.
    pub sensitivity: f32,
    pub left_button: Option<GamepadButton>,
    pub right_button: Option<GamepadButton>,
    pub middle_button: Option<GamepadButton>,
}

impl Default for CursorEmulation {
    fn default() -> Self {
        Self {
            enabled: false,
            stick: Stick::Left,
            sensitivity: DEFAULT_CURSOR_SENSITIVITY,
            left_button: Some(GamepadButton::X),
            right_button: Some(GamepadButton::A),
            middle_button: None,
        }
    }
}

impl CursorEmulation {
    pub fn button_for(&self, mouse: MouseButton) -> Option<GamepadButton> {
        match mouse {
            MouseButton::Left => self.left_button,
            MouseButton::Right => self.right_button,
            MouseButton::Middle => self.middle_button,
        }
    }

    pub fn set_button(&mut self, mouse: MouseButton, button: Option<GamepadButton>) {
        match mouse {
            MouseButton::Left => self.left_button = button,
            MouseButton::Right => self.right_button = button,
            MouseButton::Middle => self.middle_button = button,
        }
    }

    /// Mouse button a gamepad button stands in for. Left wins over right
    /// and middle when one gamepad button is mapped twice.
    pub fn mouse_button_for(&self, button: GamepadButton) -> Option<MouseButton> {
        [MouseButton::Left, MouseButton::Right, MouseButton::Middle]
            .into_iter()
            .find(|mouse| self.button_for(*mouse) == Some(button))
    }

    /// Whole-pixel cursor step for a stick position, `None` when idle.
    pub(crate) fn step(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        if !self.enabled {
            return None;
        }

        let dx = (x * self.sensitivity) as i32;
        let dy = (y * self.sensitivity) as i32;
        (dx != 0 || dy != 0).then_some((dx, dy))
    }
}
