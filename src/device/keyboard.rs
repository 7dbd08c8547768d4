//! Keyboard translation
//!
//! Raw key identifiers go through the static key table into a down-bitset.
//! Only transitions reach the listeners; auto-repeat duplicates are dropped.

use super::{device_lifecycle, DeviceCore, DeviceKind, Driver};
use crate::backend::{ControllerHandle, RawEvent};
use crate::event::{DeviceFault, DeviceId, EventSource, KeyEvent};
use crate::listener::{KeyboardListener, ListenerSet};
use crate::mapping::keyboard::KEYBOARD;
use crate::mapping::{ButtonState, KeyCode};
use crate::output::KeyInjector;
use crate::sync::{lock, read, write};
use chrono::Local;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace, warn};

pub(crate) struct KeyboardShared {
    keys: Mutex<ButtonState>,
    listeners: ListenerSet<dyn KeyboardListener>,
}

impl KeyboardShared {
    fn new() -> Self {
        Self {
            keys: Mutex::new(ButtonState::for_table(&KEYBOARD)),
            listeners: ListenerSet::new(),
        }
    }

    /// `Some((key, pressed))` on a transition.
    fn translate(&self, event: RawEvent) -> Option<(KeyCode, bool)> {
        let Some(key) = KEYBOARD.lookup(event.id) else {
            trace!("Ignoring unmapped key {:?}", event.id);
            return None;
        };

        let mut keys = lock(&self.keys);
        if event.value >= 1.0 && !keys.set(key, true) {
            Some((key, true))
        } else if event.value <= 0.0 && keys.set(key, false) {
            Some((key, false))
        } else {
            None
        }
    }
}

impl Driver for KeyboardShared {
    fn on_event(&self, source: &EventSource, event: RawEvent) {
        let Some((key, pressed)) = self.translate(event) else {
            return;
        };

        let event = KeyEvent {
            source: source.clone(),
            key,
            timestamp: Local::now(),
        };
        if pressed {
            self.listeners.for_each(|l| l.on_key_press(&event));
        } else {
            self.listeners.for_each(|l| l.on_key_release(&event));
        }
    }

    fn dispatch_removed(&self, source: &EventSource) {
        self.listeners.for_each(|l| l.on_remove(source));
    }

    fn dispatch_fault(&self, fault: &DeviceFault) {
        self.listeners.for_each(|l| l.on_fault(fault));
    }
}

#[derive(Clone)]
pub struct Keyboard {
    core: Arc<DeviceCore>,
    shared: Arc<KeyboardShared>,
    injector: Arc<RwLock<Option<Arc<dyn KeyInjector>>>>,
}

device_lifecycle!(Keyboard);

impl Keyboard {
    pub(crate) fn new(id: DeviceId, handle: Arc<dyn ControllerHandle>) -> Self {
        Self {
            core: Arc::new(DeviceCore::new(id, DeviceKind::Keyboard, handle)),
            shared: Arc::new(KeyboardShared::new()),
            injector: Arc::new(RwLock::new(None)),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn KeyboardListener>) {
        self.shared.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn KeyboardListener>) -> bool {
        self.shared.listeners.remove(listener)
    }

    pub fn listener(&self, index: usize) -> Option<Arc<dyn KeyboardListener>> {
        self.shared.listeners.get(index)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        lock(&self.shared.keys).is_down(key)
    }

    pub fn set_key_injector(&self, injector: Option<Arc<dyn KeyInjector>>) {
        *write(&self.injector) = injector;
    }

    /// Presses and releases `key` on the host.
    pub fn tap(&self, key: KeyCode) {
        match read(&self.injector).as_ref() {
            Some(injector) => {
                injector.press(key);
                injector.release(key);
            }
            None => debug!("No key injector on {}, tap dropped", self.source()),
        }
    }

    /// Types `text` key by key, holding Shift for upper-case letters.
    /// Characters without a key are skipped. Returns the number of
    /// characters typed.
    pub fn type_text(&self, text: &str) -> usize {
        let injector = read(&self.injector).clone();
        let Some(injector) = injector else {
            debug!("No key injector on {}, text dropped", self.source());
            return 0;
        };

        let mut typed = 0;
        for c in text.chars() {
            let Some((key, shift)) = KeyCode::from_char(c) else {
                warn!("No key for {:?}, skipping", c);
                continue;
            };

            if shift {
                injector.press(KeyCode::Shift);
            }
            injector.press(key);
            injector.release(key);
            if shift {
                injector.release(KeyCode::Shift);
            }
            typed += 1;
        }
        typed
    }
}
