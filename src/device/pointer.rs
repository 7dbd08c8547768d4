//! Mouse translation
//!
//! ```text
//! Axis::X / Axis::Y ──► drag (a button is held) | move
//! Axis::Z           ──► scroll
//! Named buttons     ──► click / release
//! ```
//!
//! Zero deltas are dropped.

use super::{device_lifecycle, DeviceCore, DeviceKind, Driver};
use crate::backend::{Axis, ControllerHandle, Identifier, RawEvent};
use crate::event::{ClickEvent, DeviceFault, DeviceId, EventSource, MotionEvent, ScrollEvent};
use crate::listener::{ListenerSet, PointerListener};
use crate::mapping::pointer::POINTER;
use crate::mapping::{ButtonState, MouseButton};
use crate::output::CursorControl;
use crate::sync::{lock, read, write};
use chrono::Local;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
enum Notification {
    Move { dx: f32, dy: f32 },
    Drag { dx: f32, dy: f32, button: MouseButton },
    Scroll(f32),
    Click(MouseButton),
    Release(MouseButton),
}

pub(crate) struct PointerShared {
    buttons: Mutex<ButtonState>,
    listeners: ListenerSet<dyn PointerListener>,
}

impl PointerShared {
    fn new() -> Self {
        Self {
            buttons: Mutex::new(ButtonState::for_table(&POINTER)),
            listeners: ListenerSet::new(),
        }
    }

    fn translate(&self, event: RawEvent) -> Option<Notification> {
        let mut buttons = lock(&self.buttons);

        match event.id {
            Identifier::Axis(Axis::X) | Identifier::Axis(Axis::Y) if event.value != 0.0 => {
                let (dx, dy) = match event.id {
                    Identifier::Axis(Axis::X) => (event.value, 0.0),
                    _ => (0.0, event.value),
                };
                let held = MouseButton::DRAG_PRIORITY
                    .into_iter()
                    .find(|button| buttons.is_down(*button));
                Some(match held {
                    Some(button) => Notification::Drag { dx, dy, button },
                    None => Notification::Move { dx, dy },
                })
            }
            Identifier::Axis(Axis::Z) if event.value != 0.0 => Some(Notification::Scroll(event.value)),
            Identifier::Axis(_) => None,
            id => {
                let Some(button) = POINTER.lookup(id) else {
                    trace!("Ignoring unmapped pointer control {:?}", id);
                    return None;
                };
                if event.value >= 1.0 && !buttons.set(button, true) {
                    debug!("Mouse {:?} down", button);
                    Some(Notification::Click(button))
                } else if event.value <= 0.0 && buttons.set(button, false) {
                    debug!("Mouse {:?} up", button);
                    Some(Notification::Release(button))
                } else {
                    None
                }
            }
        }
    }

    fn dispatch(&self, source: &EventSource, note: Notification) {
        let timestamp = Local::now();
        match note {
            Notification::Move { dx, dy } => {
                let event = MotionEvent {
                    source: source.clone(),
                    dx,
                    dy,
                    button: None,
                    timestamp,
                };
                self.listeners.for_each(|l| l.on_move(&event));
            }
            Notification::Drag { dx, dy, button } => {
                let event = MotionEvent {
                    source: source.clone(),
                    dx,
                    dy,
                    button: Some(button),
                    timestamp,
                };
                self.listeners.for_each(|l| l.on_drag(&event));
            }
            Notification::Scroll(delta) => {
                let event = ScrollEvent {
                    source: source.clone(),
                    delta,
                    timestamp,
                };
                self.listeners.for_each(|l| l.on_scroll(&event));
            }
            Notification::Click(button) => {
                let event = ClickEvent {
                    source: source.clone(),
                    button,
                    timestamp,
                };
                self.listeners.for_each(|l| l.on_click(&event));
            }
            Notification::Release(button) => {
                let event = ClickEvent {
                    source: source.clone(),
                    button,
                    timestamp,
                };
                self.listeners.for_each(|l| l.on_release(&event));
            }
        }
    }
}

impl Driver for PointerShared {
    fn on_event(&self, source: &EventSource, event: RawEvent) {
        if let Some(note) = self.translate(event) {
            self.dispatch(source, note);
        }
    }

    fn dispatch_removed(&self, source: &EventSource) {
        self.listeners.for_each(|l| l.on_remove(source));
    }

    fn dispatch_fault(&self, fault: &DeviceFault) {
        self.listeners.for_each(|l| l.on_fault(fault));
    }
}

/// Mouse or other relative pointing device.
#[derive(Clone)]
pub struct Pointer {
    core: Arc<DeviceCore>,
    shared: Arc<PointerShared>,
    cursor: Arc<RwLock<Option<Arc<dyn CursorControl>>>>,
}

device_lifecycle!(Pointer);

impl Pointer {
    pub(crate) fn new(id: DeviceId, handle: Arc<dyn ControllerHandle>) -> Self {
        Self {
            core: Arc::new(DeviceCore::new(id, DeviceKind::Pointer, handle)),
            shared: Arc::new(PointerShared::new()),
            cursor: Arc::new(RwLock::new(None)),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn PointerListener>) {
        self.shared.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn PointerListener>) -> bool {
        self.shared.listeners.remove(listener)
    }

    pub fn listener(&self, index: usize) -> Option<Arc<dyn PointerListener>> {
        self.shared.listeners.get(index)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        lock(&self.shared.buttons).is_down(button)
    }

    pub fn set_cursor_control(&self, control: Option<Arc<dyn CursorControl>>) {
        *write(&self.cursor) = control;
    }

    /// Presses and releases `button` on the host. Without a cursor control
    /// this does nothing.
    pub fn click(&self, button: MouseButton) {
        match read(&self.cursor).as_ref() {
            Some(cursor) => {
                cursor.press_button(button);
                cursor.release_button(button);
            }
            None => debug!("No cursor control on {}, click dropped", self.source()),
        }
    }

    pub fn set_cursor_position(&self, x: i32, y: i32) {
        match read(&self.cursor).as_ref() {
            Some(cursor) => cursor.set_position(x, y),
            None => debug!("No cursor control on {}, position dropped", self.source()),
        }
    }

    pub fn cursor_position(&self) -> Option<(i32, i32)> {
        read(&self.cursor).as_ref().map(|cursor| cursor.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NamedButton;

    fn feed(pointer: &PointerShared, id: Identifier, value: f32) -> Option<Notification> {
        pointer.translate(RawEvent::new(id, value))
    }

    #[test]
    fn motion_without_buttons_is_a_move() {
        let pointer = PointerShared::new();
        assert_eq!(
            feed(&pointer, Identifier::Axis(Axis::X), 3.0),
            Some(Notification::Move { dx: 3.0, dy: 0.0 })
        );
        assert_eq!(
            feed(&pointer, Identifier::Axis(Axis::Y), -2.0),
            Some(Notification::Move { dx: 0.0, dy: -2.0 })
        );
        assert_eq!(feed(&pointer, Identifier::Axis(Axis::X), 0.0), None);
    }

    #[test]
    fn drag_reports_highest_priority_button() {
        let pointer = PointerShared::new();
        feed(&pointer, Identifier::Named(NamedButton::Middle), 1.0);
        feed(&pointer, Identifier::Named(NamedButton::Right), 1.0);

        assert_eq!(
            feed(&pointer, Identifier::Axis(Axis::X), 1.0),
            Some(Notification::Drag {
                dx: 1.0,
                dy: 0.0,
                button: MouseButton::Right
            })
        );

        feed(&pointer, Identifier::Named(NamedButton::Left), 1.0);
        assert!(matches!(
            feed(&pointer, Identifier::Axis(Axis::Y), 1.0),
            Some(Notification::Drag { button: MouseButton::Left, .. })
        ));
    }

    #[test]
    fn buttons_click_and_release_once() {
        let pointer = PointerShared::new();
        let left = Identifier::Named(NamedButton::Left);

        assert_eq!(feed(&pointer, left, 1.0), Some(Notification::Click(MouseButton::Left)));
        assert_eq!(feed(&pointer, left, 1.0), None);
        assert_eq!(feed(&pointer, left, 0.0), Some(Notification::Release(MouseButton::Left)));
        assert_eq!(feed(&pointer, left, 0.0), None);
    }

    #[test]
    fn wheel_scrolls() {
        let pointer = PointerShared::new();
        assert_eq!(feed(&pointer, Identifier::Axis(Axis::Z), -1.0), Some(Notification::Scroll(-1.0)));
        assert_eq!(feed(&pointer, Identifier::Axis(Axis::RX), 1.0), None);
        assert_eq!(feed(&pointer, Identifier::Button(0), 1.0), None);
    }
}
