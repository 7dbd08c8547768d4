//! Device registry
//!
//! Owns every device created from one backend and keeps the set in sync with
//! hot-plug notifications.
//!
//! ```text
//! create() ──► subscribe ──► enumerate ──► classify ──► Device per controller
//!                  │
//!                  └─► watcher thread ── Added(handle) ──► classify ──► insert
//!                                     └─ Removed(id)   ──► evict ──► stop ──► on_remove
//! ```
//!
//! A device whose polling thread sees the disconnect first evicts itself
//! through its eviction hook. Listeners get `on_remove` once either way.

pub mod classify;

pub use classify::{HeuristicClassifier, LayoutClassifier};

use crate::backend::{ControllerHandle, ControllerId, HotplugEvent, InputBackend};
use crate::config::InputSettings;
use crate::device::{Device, DeviceError, DeviceKind, EvictionHook, Gamepad, Keyboard, Pointer};
use crate::event::DeviceId;
use crate::listener::{GamepadListener, KeyboardListener, PointerListener};
use crate::sync::lock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to spawn hot-plug watcher: {0}")]
    WatcherSpawnError(#[source] std::io::Error),

    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),
}

#[derive(Default)]
struct RegistryState {
    created: bool,
    /// Creation order.
    devices: Vec<Device>,
    watcher: Option<JoinHandle<()>>,
}

struct RegistryInner {
    backend: Arc<dyn InputBackend>,
    classifier: Box<dyn LayoutClassifier>,
    settings: InputSettings,
    state: Mutex<RegistryState>,
    next_id: AtomicU64,
}

impl RegistryInner {
    /// Wraps `handle` in a device unless it is skipped or already known.
    fn attach(self: &Arc<Self>, state: &mut RegistryState, handle: Arc<dyn ControllerHandle>) -> Option<Device> {
        let controller = handle.id();
        if state.devices.iter().any(|d| d.controller_id() == controller) {
            debug!("{} is already registered", controller);
            return None;
        }

        let info = handle.info();
        let Some(kind) = self.classifier.device_kind(info) else {
            debug!("Skipping {} ({:?} {:?})", controller, info.name.trim(), info.kind);
            return None;
        };

        let id = DeviceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let device: Device = match kind {
            DeviceKind::Gamepad => {
                let layout = self.classifier.layout(info);
                let gamepad = Gamepad::new(id, handle, layout, self.settings.dead_zone);
                gamepad.set_cursor_sensitivity(self.settings.cursor_sensitivity);
                info!("Gamepad {} ({}) uses the {} layout", gamepad.name(), id, layout);
                gamepad.into()
            }
            DeviceKind::Pointer => Pointer::new(id, handle).into(),
            DeviceKind::Keyboard => Keyboard::new(id, handle).into(),
        };

        device.set_poll_interval(self.settings.poll_interval_ms);
        let weak = Arc::downgrade(self);
        let hook: EvictionHook = Arc::new(move |controller| {
            if let Some(inner) = weak.upgrade() {
                inner.evict(controller);
            }
        });
        device.set_eviction_hook(hook);

        info!("Registered {} {:?} ({})", device.kind(), device.name(), id);
        state.devices.push(device.clone());
        Some(device)
    }

    fn evict(&self, controller: ControllerId) -> Option<Device> {
        let mut state = lock(&self.state);
        let position = state.devices.iter().position(|d| d.controller_id() == controller)?;
        let device = state.devices.remove(position);
        info!("Evicted {} ({})", device.name(), device.id());
        Some(device)
    }

    fn auto_start(&self, devices: &[Device]) {
        if !self.settings.auto_listen {
            return;
        }
        for device in devices {
            if let Err(e) = device.start_listening() {
                error!("Failed to start {}: {}", device.name(), e);
            }
        }
    }

    fn on_hotplug(self: &Arc<Self>, event: HotplugEvent) {
        match event {
            HotplugEvent::Added(handle) => {
                let device = {
                    let mut state = lock(&self.state);
                    if !state.created {
                        debug!("Ignoring hot-plug add after destroy");
                        return;
                    }
                    self.attach(&mut state, handle)
                };
                if let Some(device) = device {
                    self.auto_start(&[device]);
                }
            }
            HotplugEvent::Removed(controller) => match self.evict(controller) {
                Some(device) => {
                    device.stop_listening();
                    device.disconnected();
                }
                None => debug!("Hot-plug removal of unknown {}", controller),
            },
        }
    }
}

fn watch(inner: Weak<RegistryInner>, mut receiver: mpsc::UnboundedReceiver<HotplugEvent>) {
    debug!("Hot-plug watcher started");
    while let Some(event) = receiver.blocking_recv() {
        debug!("Hot-plug event: {:?}", event);
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.on_hotplug(event);
    }
    debug!("Hot-plug watcher exiting");
}

/// Live devices of one backend
///
/// Several registries may coexist. Dropping a registry destroys it.
///
/// # Examples
///
/// ```rust
/// use inputnorm::backend::memory::MemoryBackend;
/// use inputnorm::backend::{ControllerInfo, ControllerKind};
/// use inputnorm::registry::DeviceRegistry;
/// use std::sync::Arc;
///
/// let backend = Arc::new(MemoryBackend::new());
/// backend.add_controller(ControllerInfo::new("Mouse", ControllerKind::Pointer, Vec::new()));
///
/// let registry = DeviceRegistry::new(backend, None);
/// registry.create().unwrap();
/// assert_eq!(registry.pointers().len(), 1);
/// ```
pub struct DeviceRegistry {
    inner: Arc<RegistryInner>,
}

impl DeviceRegistry {
    pub fn new(backend: Arc<dyn InputBackend>, settings: Option<InputSettings>) -> Self {
        Self::with_classifier(backend, settings, Box::new(HeuristicClassifier))
    }

    pub fn with_classifier(
        backend: Arc<dyn InputBackend>,
        settings: Option<InputSettings>,
        classifier: Box<dyn LayoutClassifier>,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                backend,
                classifier,
                settings: settings.unwrap_or_default(),
                state: Mutex::new(RegistryState::default()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn settings(&self) -> &InputSettings {
        &self.inner.settings
    }

    /// Enumerates the backend and starts watching for hot-plug changes.
    /// Calling it again while created does nothing. An unavailable backend
    /// leaves the registry empty.
    pub fn create(&self) -> Result<(), RegistryError> {
        let inner = &self.inner;
        let created = {
            let mut state = lock(&inner.state);
            if state.created {
                debug!("Registry already created");
                return Ok(());
            }
            state.created = true;

            let receiver = match inner.backend.subscribe() {
                Ok(receiver) => Some(receiver),
                Err(e) => {
                    warn!("No hot-plug notifications from {}: {}", inner.backend.name(), e);
                    None
                }
            };

            let mut created = Vec::new();
            match inner.backend.controllers() {
                Ok(handles) => {
                    for handle in handles {
                        created.extend(inner.attach(&mut state, handle));
                    }
                }
                Err(e) => warn!("Backend {} unavailable, no devices: {}", inner.backend.name(), e),
            }

            if let Some(receiver) = receiver {
                let weak = Arc::downgrade(inner);
                let watcher = thread::Builder::new()
                    .name("inputnorm-hotplug".to_string())
                    .spawn(move || watch(weak, receiver))
                    .map_err(|e| {
                        error!("Failed to spawn hot-plug watcher: {}", e);
                        RegistryError::WatcherSpawnError(e)
                    })?;
                state.watcher = Some(watcher);
            }

            created
        };

        info!(
            "Registry created with {} devices from {}",
            created.len(),
            inner.backend.name()
        );
        inner.auto_start(&created);
        Ok(())
    }

    /// Stops every device, joins the polling threads and the watcher and
    /// clears the registry. Calling it again does nothing.
    pub fn destroy(&self) {
        let inner = &self.inner;
        let (devices, watcher) = {
            let mut state = lock(&inner.state);
            if !state.created {
                return;
            }
            state.created = false;
            (std::mem::take(&mut state.devices), state.watcher.take())
        };

        inner.backend.unsubscribe();
        for device in &devices {
            device.stop_listening();
        }

        if let Some(watcher) = watcher {
            if watcher.thread().id() == thread::current().id() {
                debug!("Destroy requested from the hot-plug watcher");
            } else if watcher.join().is_err() {
                error!("Hot-plug watcher panicked");
            }
        }
        info!("Registry destroyed, {} devices released", devices.len());
    }

    pub fn is_created(&self) -> bool {
        lock(&self.inner.state).created
    }

    pub fn devices(&self) -> Vec<Device> {
        lock(&self.inner.state).devices.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn device(&self, id: DeviceId) -> Option<Device> {
        lock(&self.inner.state)
            .devices
            .iter()
            .find(|d| d.id() == id)
            .cloned()
    }

    pub fn device_for_controller(&self, controller: ControllerId) -> Option<Device> {
        lock(&self.inner.state)
            .devices
            .iter()
            .find(|d| d.controller_id() == controller)
            .cloned()
    }

    pub fn gamepads(&self) -> Vec<Gamepad> {
        self.devices().iter().filter_map(Device::as_gamepad).cloned().collect()
    }

    pub fn pointers(&self) -> Vec<Pointer> {
        self.devices().iter().filter_map(Device::as_pointer).cloned().collect()
    }

    pub fn keyboards(&self) -> Vec<Keyboard> {
        self.devices().iter().filter_map(Device::as_keyboard).cloned().collect()
    }

    /// Every device named `name`. Names are not unique.
    pub fn devices_by_name(&self, name: &str) -> Vec<Device> {
        self.devices().into_iter().filter(|d| d.name() == name).collect()
    }

    pub fn gamepads_by_name(&self, name: &str) -> Vec<Gamepad> {
        self.gamepads().into_iter().filter(|d| d.name() == name).collect()
    }

    pub fn pointers_by_name(&self, name: &str) -> Vec<Pointer> {
        self.pointers().into_iter().filter(|d| d.name() == name).collect()
    }

    pub fn keyboards_by_name(&self, name: &str) -> Vec<Keyboard> {
        self.keyboards().into_iter().filter(|d| d.name() == name).collect()
    }

    pub fn add_gamepad_listener(&self, listener: Arc<dyn GamepadListener>) {
        for gamepad in self.gamepads() {
            gamepad.add_listener(Arc::clone(&listener));
        }
    }

    /// Returns how many gamepads dropped the listener.
    pub fn remove_gamepad_listener(&self, listener: &Arc<dyn GamepadListener>) -> usize {
        self.gamepads().iter().filter(|g| g.remove_listener(listener)).count()
    }

    pub fn add_pointer_listener(&self, listener: Arc<dyn PointerListener>) {
        for pointer in self.pointers() {
            pointer.add_listener(Arc::clone(&listener));
        }
    }

    pub fn remove_pointer_listener(&self, listener: &Arc<dyn PointerListener>) -> usize {
        self.pointers().iter().filter(|p| p.remove_listener(listener)).count()
    }

    pub fn add_keyboard_listener(&self, listener: Arc<dyn KeyboardListener>) {
        for keyboard in self.keyboards() {
            keyboard.add_listener(Arc::clone(&listener));
        }
    }

    pub fn remove_keyboard_listener(&self, listener: &Arc<dyn KeyboardListener>) -> usize {
        self.keyboards().iter().filter(|k| k.remove_listener(listener)).count()
    }

    /// Starts every device. All devices are tried; the first failure is returned.
    pub fn start_listening(&self) -> Result<(), RegistryError> {
        let mut first_error = None;
        for device in self.devices() {
            if let Err(e) = device.start_listening() {
                error!("Failed to start {}: {}", device.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn stop_listening(&self) {
        for device in self.devices() {
            device.stop_listening();
        }
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("backend", &self.inner.backend.name())
            .field("devices", &self.len())
            .finish()
    }
}
