//! Host-side output collaborators
//!
//! Cursor positioning and synthetic key injection are platform services the
//! engine does not implement. Applications plug in their own
//! [`CursorControl`] and [`KeyInjector`]; the virtual implementations here
//! keep the state in memory.

use crate::mapping::{KeyCode, MouseButton};
use crate::sync::lock;
use std::sync::Mutex;
use tracing::debug;

/// Moves the host cursor and synthesizes mouse buttons.
pub trait CursorControl: Send + Sync {
    fn position(&self) -> (i32, i32);

    fn set_position(&self, x: i32, y: i32);

    fn move_by(&self, dx: i32, dy: i32) {
        let (x, y) = self.position();
        self.set_position(x.saturating_add(dx), y.saturating_add(dy));
    }

    fn press_button(&self, button: MouseButton);

    fn release_button(&self, button: MouseButton);
}

/// Synthesizes key presses on the host.
pub trait KeyInjector: Send + Sync {
    fn press(&self, key: KeyCode);

    fn release(&self, key: KeyCode);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Press(MouseButton),
    Release(MouseButton),
}

#[derive(Debug, Default)]
struct CursorState {
    position: (i32, i32),
    actions: Vec<ButtonAction>,
}

/// In-memory cursor that records every button action.
#[derive(Debug, Default)]
pub struct VirtualCursor {
    state: Mutex<CursorState>,
}

impl VirtualCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(x: i32, y: i32) -> Self {
        let cursor = Self::default();
        lock(&cursor.state).position = (x, y);
        cursor
    }

    pub fn actions(&self) -> Vec<ButtonAction> {
        lock(&self.state).actions.clone()
    }
}

impl CursorControl for VirtualCursor {
    fn position(&self) -> (i32, i32) {
        lock(&self.state).position
    }

    fn set_position(&self, x: i32, y: i32) {
        debug!("Virtual cursor -> ({}, {})", x, y);
        lock(&self.state).position = (x, y);
    }

    fn press_button(&self, button: MouseButton) {
        lock(&self.state).actions.push(ButtonAction::Press(button));
    }

    fn release_button(&self, button: MouseButton) {
        lock(&self.state).actions.push(ButtonAction::Release(button));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press(KeyCode),
    Release(KeyCode),
}

/// In-memory key injector that records every action.
#[derive(Debug, Default)]
pub struct VirtualKeyboard {
    actions: Mutex<Vec<KeyAction>>,
}

impl VirtualKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<KeyAction> {
        lock(&self.actions).clone()
    }
}

impl KeyInjector for VirtualKeyboard {
    fn press(&self, key: KeyCode) {
        lock(&self.actions).push(KeyAction::Press(key));
    }

    fn release(&self, key: KeyCode) {
        lock(&self.actions).push(KeyAction::Release(key));
    }
}
