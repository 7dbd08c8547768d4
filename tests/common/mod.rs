#![allow(dead_code)]

use inputnorm::backend::memory::{MemoryBackend, MemoryController};
use inputnorm::backend::{Axis, ControllerInfo, ControllerKind, Identifier, NamedButton};
use inputnorm::event::{
    ButtonEvent, ClickEvent, DeviceFault, EventSource, KeyEvent, MotionEvent, PovEvent,
    ScrollEvent, StickEvent, TriggerEvent,
};
use inputnorm::{
    DeviceListener, DeviceRegistry, GamepadListener, InputEvent, InputSettings, KeyboardListener,
    PointerListener,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Polls `condition` until it holds or the timeout expires.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Waits until the controller was polled `polls` more times.
pub fn settle(controller: &MemoryController, polls: u64) {
    let target = controller.poll_count() + polls;
    assert!(wait_until(|| controller.poll_count() >= target), "controller stopped polling");
}

/// Records every callback as an [`InputEvent`].
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<InputEvent>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn count(&self, predicate: impl Fn(&InputEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn wait_for(&self, len: usize) -> Vec<InputEvent> {
        assert!(
            wait_until(|| self.len() >= len),
            "expected {} events, got {:?}",
            len,
            self.events()
        );
        self.events()
    }

    fn record(&self, event: InputEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DeviceListener for Recorder {
    fn on_remove(&self, source: &EventSource) {
        self.record(InputEvent::Removed(source.clone()));
    }

    fn on_fault(&self, fault: &DeviceFault) {
        self.record(InputEvent::Fault(fault.clone()));
    }
}

impl GamepadListener for Recorder {
    fn on_button_press(&self, event: &ButtonEvent) {
        self.record(InputEvent::ButtonPress(event.clone()));
    }

    fn on_button_release(&self, event: &ButtonEvent) {
        self.record(InputEvent::ButtonRelease(event.clone()));
    }

    fn on_pov_press(&self, event: &PovEvent) {
        self.record(InputEvent::PovPress(event.clone()));
    }

    fn on_pov_release(&self, event: &PovEvent) {
        self.record(InputEvent::PovRelease(event.clone()));
    }

    fn on_analog_stick_push(&self, event: &StickEvent) {
        self.record(InputEvent::StickPush(event.clone()));
    }

    fn on_trigger_push(&self, event: &TriggerEvent) {
        self.record(InputEvent::TriggerPush(event.clone()));
    }
}

impl PointerListener for Recorder {
    fn on_move(&self, event: &MotionEvent) {
        self.record(InputEvent::Move(event.clone()));
    }

    fn on_drag(&self, event: &MotionEvent) {
        self.record(InputEvent::Drag(event.clone()));
    }

    fn on_scroll(&self, event: &ScrollEvent) {
        self.record(InputEvent::Scroll(event.clone()));
    }

    fn on_click(&self, event: &ClickEvent) {
        self.record(InputEvent::Click(event.clone()));
    }

    fn on_release(&self, event: &ClickEvent) {
        self.record(InputEvent::Release(event.clone()));
    }
}

impl KeyboardListener for Recorder {
    fn on_key_press(&self, event: &KeyEvent) {
        self.record(InputEvent::KeyPress(event.clone()));
    }

    fn on_key_release(&self, event: &KeyEvent) {
        self.record(InputEvent::KeyRelease(event.clone()));
    }
}

pub fn fast_settings() -> Option<InputSettings> {
    Some(InputSettings {
        poll_interval_ms: 1,
        ..InputSettings::default()
    })
}

/// 13 buttons, two sticks on X/Y and Z/RZ and a hat.
pub fn direct_input_pad(name: &str) -> ControllerInfo {
    let mut components: Vec<Identifier> = [Axis::X, Axis::Y, Axis::Z, Axis::RZ, Axis::Pov]
        .into_iter()
        .map(Identifier::Axis)
        .collect();
    components.extend((0..13).map(Identifier::Button));
    ControllerInfo::new(name, ControllerKind::Gamepad, components)
}

/// Six axes, a hat and ten buttons.
pub fn xinput_pad(name: &str) -> ControllerInfo {
    let mut components: Vec<Identifier> =
        [Axis::X, Axis::Y, Axis::Z, Axis::RX, Axis::RY, Axis::RZ, Axis::Pov]
            .into_iter()
            .map(Identifier::Axis)
            .collect();
    components.extend((0..10).map(Identifier::Button));
    ControllerInfo::new(name, ControllerKind::Gamepad, components)
}

pub fn mouse(name: &str) -> ControllerInfo {
    ControllerInfo::new(
        name,
        ControllerKind::Pointer,
        vec![
            Identifier::Axis(Axis::X),
            Identifier::Axis(Axis::Y),
            Identifier::Axis(Axis::Z),
            Identifier::Named(NamedButton::Left),
            Identifier::Named(NamedButton::Middle),
            Identifier::Named(NamedButton::Right),
        ],
    )
}

pub fn keyboard(name: &str) -> ControllerInfo {
    ControllerInfo::new(name, ControllerKind::Keyboard, Vec::new())
}

/// Backend plus a created registry polling every millisecond.
pub fn registry_with(infos: Vec<ControllerInfo>) -> (Arc<MemoryBackend>, Vec<Arc<MemoryController>>, DeviceRegistry) {
    let backend = Arc::new(MemoryBackend::new());
    let controllers = infos.into_iter().map(|info| backend.add_controller(info)).collect();
    let registry = DeviceRegistry::new(backend.clone(), fast_settings());
    registry.create().unwrap();
    (backend, controllers, registry)
}
