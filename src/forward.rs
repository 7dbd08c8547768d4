//! Listener that forwards events into a tokio channel
//!
//! Bridges the synchronous listener callbacks on the polling threads to
//! async consumers:
//!
//! ```text
//! polling thread ── on_* ──► EventForwarder ── UnboundedSender ──► async task
//! ```

use crate::event::{
    ButtonEvent, ClickEvent, DeviceFault, EventSource, KeyEvent, MotionEvent, PovEvent,
    ScrollEvent, StickEvent, TriggerEvent,
};
use crate::listener::{DeviceListener, GamepadListener, KeyboardListener, PointerListener};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Every normalized event, tagged by callback.
#[derive(Debug, Clone)]
pub enum InputEvent {
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    PovPress(PovEvent),
    PovRelease(PovEvent),
    StickPush(StickEvent),
    TriggerPush(TriggerEvent),
    Move(MotionEvent),
    Drag(MotionEvent),
    Scroll(ScrollEvent),
    Click(ClickEvent),
    Release(ClickEvent),
    KeyPress(KeyEvent),
    KeyRelease(KeyEvent),
    Removed(EventSource),
    Fault(DeviceFault),
}

impl InputEvent {
    pub fn source(&self) -> &EventSource {
        match self {
            InputEvent::ButtonPress(e) | InputEvent::ButtonRelease(e) => &e.source,
            InputEvent::PovPress(e) | InputEvent::PovRelease(e) => &e.source,
            InputEvent::StickPush(e) => &e.source,
            InputEvent::TriggerPush(e) => &e.source,
            InputEvent::Move(e) | InputEvent::Drag(e) => &e.source,
            InputEvent::Scroll(e) => &e.source,
            InputEvent::Click(e) | InputEvent::Release(e) => &e.source,
            InputEvent::KeyPress(e) | InputEvent::KeyRelease(e) => &e.source,
            InputEvent::Removed(source) => source,
            InputEvent::Fault(fault) => &fault.source,
        }
    }
}

/// Register one forwarder on any number of devices. Events from a device
/// keep their order; events of different devices interleave.
#[derive(Debug, Clone)]
pub struct EventForwarder {
    sender: mpsc::UnboundedSender<InputEvent>,
}

impl EventForwarder {
    pub fn new(sender: mpsc::UnboundedSender<InputEvent>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<InputEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self::new(sender)), receiver)
    }

    fn forward(&self, event: InputEvent) {
        if self.sender.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }
}

impl DeviceListener for EventForwarder {
    fn on_remove(&self, source: &EventSource) {
        self.forward(InputEvent::Removed(source.clone()));
    }

    fn on_fault(&self, fault: &DeviceFault) {
        self.forward(InputEvent::Fault(fault.clone()));
    }
}

impl GamepadListener for EventForwarder {
    fn on_button_press(&self, event: &ButtonEvent) {
        self.forward(InputEvent::ButtonPress(event.clone()));
    }

    fn on_button_release(&self, event: &ButtonEvent) {
        self.forward(InputEvent::ButtonRelease(event.clone()));
    }

    fn on_pov_press(&self, event: &PovEvent) {
        self.forward(InputEvent::PovPress(event.clone()));
    }

    fn on_pov_release(&self, event: &PovEvent) {
        self.forward(InputEvent::PovRelease(event.clone()));
    }

    fn on_analog_stick_push(&self, event: &StickEvent) {
        self.forward(InputEvent::StickPush(event.clone()));
    }

    fn on_trigger_push(&self, event: &TriggerEvent) {
        self.forward(InputEvent::TriggerPush(event.clone()));
    }
}

impl PointerListener for EventForwarder {
    fn on_move(&self, event: &MotionEvent) {
        self.forward(InputEvent::Move(event.clone()));
    }

    fn on_drag(&self, event: &MotionEvent) {
        self.forward(InputEvent::Drag(event.clone()));
    }

    fn on_scroll(&self, event: &ScrollEvent) {
        self.forward(InputEvent::Scroll(event.clone()));
    }

    fn on_click(&self, event: &ClickEvent) {
        self.forward(InputEvent::Click(event.clone()));
    }

    fn on_release(&self, event: &ClickEvent) {
        self.forward(InputEvent::Release(event.clone()));
    }
}

impl KeyboardListener for EventForwarder {
    fn on_key_press(&self, event: &KeyEvent) {
        self.forward(InputEvent::KeyPress(event.clone()));
    }

    fn on_key_release(&self, event: &KeyEvent) {
        self.forward(InputEvent::KeyRelease(event.clone()));
    }
}
