//! Listener traits and the copy-on-write listener collection
//!
//! Listener callbacks run on the device's polling thread. All methods have
//! empty default bodies so implementors only override what they need.
//!
//! ```text
//! add/remove ──► write lock ──► replace Arc<[Arc<L>]>
//! dispatch   ──► read lock  ──► clone Arc ──► unlock ──► iterate snapshot
//! ```
//!
//! A listener added or removed during a dispatch takes effect with the next event.

use crate::event::{
    ButtonEvent, ClickEvent, DeviceFault, EventSource, KeyEvent, MotionEvent, PovEvent,
    ScrollEvent, StickEvent, TriggerEvent,
};
use crate::sync::{read, write};
use std::sync::{Arc, RwLock};

/// Callbacks shared by every device kind.
pub trait DeviceListener: Send + Sync {
    /// The device was unplugged. Called once.
    fn on_remove(&self, _source: &EventSource) {}

    /// The polling thread failed. Called once; the device stops listening.
    fn on_fault(&self, _fault: &DeviceFault) {}
}

pub trait GamepadListener: DeviceListener {
    fn on_button_press(&self, _event: &ButtonEvent) {}

    fn on_button_release(&self, _event: &ButtonEvent) {}

    fn on_pov_press(&self, _event: &PovEvent) {}

    fn on_pov_release(&self, _event: &PovEvent) {}

    fn on_analog_stick_push(&self, _event: &StickEvent) {}

    fn on_trigger_push(&self, _event: &TriggerEvent) {}
}

pub trait PointerListener: DeviceListener {
    fn on_move(&self, _event: &MotionEvent) {}

    /// Motion while a button is held.
    fn on_drag(&self, _event: &MotionEvent) {}

    fn on_scroll(&self, _event: &ScrollEvent) {}

    fn on_click(&self, _event: &ClickEvent) {}

    fn on_release(&self, _event: &ClickEvent) {}
}

pub trait KeyboardListener: DeviceListener {
    fn on_key_press(&self, _event: &KeyEvent) {}

    fn on_key_release(&self, _event: &KeyEvent) {}
}

/// Ordered listener collection. Insertion order is dispatch order and the
/// same listener may be registered more than once.
pub struct ListenerSet<L: ?Sized> {
    listeners: RwLock<Arc<[Arc<L>]>>,
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Arc::from(Vec::new())),
        }
    }
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<L>) {
        let mut current = write(&self.listeners);
        let mut next: Vec<Arc<L>> = current.iter().cloned().collect();
        next.push(listener);
        *current = next.into();
    }

    /// Removes the first registration of `listener` (compared by address).
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        let mut current = write(&self.listeners);
        let Some(position) = current
            .iter()
            .position(|candidate| std::ptr::addr_eq(Arc::as_ptr(candidate), Arc::as_ptr(listener)))
        else {
            return false;
        };

        let mut next: Vec<Arc<L>> = current.iter().cloned().collect();
        next.remove(position);
        *current = next.into();
        true
    }

    pub fn clear(&self) {
        *write(&self.listeners) = Arc::from(Vec::new());
    }

    pub fn get(&self, index: usize) -> Option<Arc<L>> {
        read(&self.listeners).get(index).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.listeners).is_empty()
    }

    /// Current listeners. The lock is released before this returns.
    pub fn snapshot(&self) -> Arc<[Arc<L>]> {
        Arc::clone(&read(&self.listeners))
    }

    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snapshot = self.snapshot();
        for listener in snapshot.iter() {
            f(listener.as_ref());
        }
    }
}
