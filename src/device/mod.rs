//! Devices: one controller handle, one polling thread, one listener set
//!
//! ```text
//!            start_listening()                 stop_listening()
//! Stopped ─────────────────────► Listening ─────────────────────► Stopped
//!                                    │
//!                                    ├─ poll() == Disconnected ─► on_remove, evict, Stopped
//!                                    └─ poll() fails / panic ───► on_fault, Stopped
//! ```
//!
//! A device is a cheap clonable handle. Every clone shares the same core,
//! polling thread and listeners. The concrete kinds live in [`gamepad`],
//! [`pointer`] and [`keyboard`] and are collected in the [`Device`] enum.

pub mod cursor;
pub mod gamepad;
pub mod keyboard;
pub mod pointer;
mod worker;

pub use cursor::CursorEmulation;
pub use gamepad::Gamepad;
pub use keyboard::Keyboard;
pub use pointer::Pointer;

use crate::backend::{BackendError, ControllerHandle, ControllerId, RawEvent};
use crate::event::{DeviceFault, DeviceId, EventSource, FaultKind};
use crate::sync::lock;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use worker::{PollWorker, WorkerExit};

/// Default pause between two polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Pointer,
    Keyboard,
    Gamepad,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Pointer => f.write_str("pointer"),
            DeviceKind::Keyboard => f.write_str("keyboard"),
            DeviceKind::Gamepad => f.write_str("gamepad"),
        }
    }
}

/// Device errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to spawn polling thread: {0}")]
    ThreadSpawnError(#[source] std::io::Error),

    #[error("Failed to build polling runtime: {0}")]
    RuntimeError(#[source] std::io::Error),

    #[error("Device {0} was removed")]
    Removed(String),

    #[error("Backend error: {0}")]
    BackendError(#[from] BackendError),
}

/// Translation layer a device kind plugs into the polling loop.
pub(crate) trait Driver: Send + Sync + 'static {
    /// One raw sample, in queue order.
    fn on_event(&self, source: &EventSource, event: RawEvent);

    /// Runs once per poll after the queue is drained.
    fn on_tick(&self, _source: &EventSource) {}

    fn dispatch_removed(&self, source: &EventSource);

    fn dispatch_fault(&self, fault: &DeviceFault);
}

pub(crate) type EvictionHook = Arc<dyn Fn(ControllerId) + Send + Sync>;

struct WorkerThread {
    join: JoinHandle<()>,
    cancel: CancellationToken,
}

/// State shared by every device kind.
pub(crate) struct DeviceCore {
    source: EventSource,
    kind: DeviceKind,
    handle: Arc<dyn ControllerHandle>,
    poll_interval_ms: AtomicU64,
    listening: AtomicBool,
    removed: AtomicBool,
    faulted: AtomicBool,
    worker: Mutex<Option<WorkerThread>>,
    eviction: Mutex<Option<EvictionHook>>,
}

impl DeviceCore {
    pub(crate) fn new(id: DeviceId, kind: DeviceKind, handle: Arc<dyn ControllerHandle>) -> Self {
        let name: Arc<str> = Arc::from(handle.info().name.trim());
        Self {
            source: EventSource { id, name },
            kind,
            handle,
            poll_interval_ms: AtomicU64::new(DEFAULT_POLL_INTERVAL_MS),
            listening: AtomicBool::new(false),
            removed: AtomicBool::new(false),
            faulted: AtomicBool::new(false),
            worker: Mutex::new(None),
            eviction: Mutex::new(None),
        }
    }

    pub(crate) fn source(&self) -> &EventSource {
        &self.source
    }

    pub(crate) fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub(crate) fn handle(&self) -> &Arc<dyn ControllerHandle> {
        &self.handle
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.load(Ordering::Relaxed))
    }

    pub(crate) fn set_poll_interval(&self, ms: u64) {
        let ms = if ms == 0 {
            warn!("Poll interval of 0 ms on {} raised to 1 ms", self.source);
            1
        } else {
            ms
        };
        self.poll_interval_ms.store(ms, Ordering::Relaxed);
        debug!("Poll interval of {} set to {} ms", self.source, ms);
    }

    pub(crate) fn set_eviction_hook(&self, hook: EvictionHook) {
        *lock(&self.eviction) = Some(hook);
    }

    /// Spawns the polling thread unless one is already running.
    pub(crate) fn start(self: &Arc<Self>, driver: Arc<dyn Driver>) -> Result<(), DeviceError> {
        if self.is_removed() {
            warn!("Refusing to start {}, device was removed", self.source);
            return Err(DeviceError::Removed(self.source.name.to_string()));
        }

        // A thread that exited on its own (fault) is still parked in the slot.
        let finished = {
            let mut worker = lock(&self.worker);
            if worker.is_some() && self.is_listening() {
                debug!("{} is already listening", self.source);
                return Ok(());
            }
            worker.take()
        };
        if let Some(finished) = finished {
            Self::join_worker(&self.source, finished);
        }

        let mut worker = lock(&self.worker);
        if worker.is_some() {
            debug!("{} was started concurrently", self.source);
            return Ok(());
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(DeviceError::RuntimeError)?;

        let cancel = CancellationToken::new();
        let poll_worker = PollWorker::create(Arc::clone(self), Arc::clone(&driver), cancel.clone());
        let core = Arc::clone(self);

        self.faulted.store(false, Ordering::SeqCst);
        self.listening.store(true, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("inputnorm-{}", self.source.name))
            .spawn(move || {
                let exit = runtime.block_on(async move {
                    match poll_worker.initialize() {
                        Ok(polling) => polling.run().await,
                        Err(exit) => exit,
                    }
                });
                core.finish(driver.as_ref(), exit);
            });

        match spawned {
            Ok(join) => {
                info!("{} ({}) started listening", self.source, self.kind);
                *worker = Some(WorkerThread { join, cancel });
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn polling thread for {}: {}", self.source, e);
                self.listening.store(false, Ordering::SeqCst);
                Err(DeviceError::ThreadSpawnError(e))
            }
        }
    }

    /// Cancels the polling thread and waits for it to exit. From the polling
    /// thread itself this only cancels.
    pub(crate) fn stop(&self) {
        let worker = lock(&self.worker).take();
        self.listening.store(false, Ordering::SeqCst);

        match worker {
            Some(worker) => {
                worker.cancel.cancel();
                Self::join_worker(&self.source, worker);
                info!("{} stopped listening", self.source);
            }
            None => debug!("{} is not listening", self.source),
        }
    }

    fn join_worker(source: &EventSource, worker: WorkerThread) {
        worker.cancel.cancel();
        if worker.join.thread().id() == thread::current().id() {
            debug!("Stop of {} requested from its own polling thread", source);
            return;
        }
        if worker.join.join().is_err() {
            error!("Polling thread of {} panicked", source);
        }
    }

    fn finish(&self, driver: &dyn Driver, exit: WorkerExit) {
        self.listening.store(false, Ordering::SeqCst);
        match exit {
            WorkerExit::Cancelled => debug!("Polling thread of {} cancelled", self.source),
            WorkerExit::Disconnected => self.disconnected(driver),
            WorkerExit::Faulted(kind, message) => self.fault(driver, kind, message),
        }
    }

    /// Notifies listeners of the removal once and asks the registry to evict
    /// the device.
    pub(crate) fn disconnected(&self, driver: &dyn Driver) {
        if self.removed.swap(true, Ordering::SeqCst) {
            debug!("{} already reported as removed", self.source);
            return;
        }
        self.listening.store(false, Ordering::SeqCst);
        info!("{} disconnected", self.source);

        let source = &self.source;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| driver.dispatch_removed(source))) {
            error!("Listener panicked in on_remove of {}: {}", source, panic_message(&*payload));
        }

        let hook = lock(&self.eviction).clone();
        if let Some(hook) = hook {
            hook(self.handle.id());
        }
    }

    fn fault(&self, driver: &dyn Driver, kind: FaultKind, message: String) {
        if self.faulted.swap(true, Ordering::SeqCst) {
            return;
        }
        error!("{} faulted: {}", self.source, message);

        let fault = DeviceFault {
            source: self.source.clone(),
            kind,
            message,
            timestamp: Local::now(),
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| driver.dispatch_fault(&fault))) {
            error!("Listener panicked in on_fault of {}: {}", self.source, panic_message(&*payload));
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Lifecycle methods every device handle exposes.
macro_rules! device_lifecycle {
    ($handle:ident) => {
        impl $handle {
            pub fn id(&self) -> $crate::event::DeviceId {
                self.core.source().id
            }

            /// Trimmed backend name. Several devices may share it.
            pub fn name(&self) -> &str {
                &self.core.source().name
            }

            pub fn source(&self) -> &$crate::event::EventSource {
                self.core.source()
            }

            pub fn kind(&self) -> $crate::device::DeviceKind {
                self.core.kind()
            }

            pub fn controller_id(&self) -> $crate::backend::ControllerId {
                self.core.handle().id()
            }

            pub fn start_listening(&self) -> Result<(), $crate::device::DeviceError> {
                let driver: std::sync::Arc<dyn $crate::device::Driver> = self.shared.clone();
                self.core.start(driver)
            }

            pub fn stop_listening(&self) {
                self.core.stop()
            }

            pub fn is_listening(&self) -> bool {
                self.core.is_listening()
            }

            /// `false` once the controller has been unplugged.
            pub fn is_connected(&self) -> bool {
                !self.core.is_removed()
            }

            /// Pause between polls in milliseconds. Zero is raised to one.
            pub fn set_poll_interval(&self, ms: u64) {
                self.core.set_poll_interval(ms)
            }

            pub fn poll_interval(&self) -> std::time::Duration {
                self.core.poll_interval()
            }

            pub(crate) fn disconnected(&self) {
                self.core.disconnected(self.shared.as_ref())
            }

            pub(crate) fn set_eviction_hook(&self, hook: $crate::device::EvictionHook) {
                self.core.set_eviction_hook(hook)
            }
        }

        impl std::fmt::Debug for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("id", &self.id())
                    .field("name", &self.name())
                    .field("listening", &self.is_listening())
                    .finish()
            }
        }
    };
}

pub(crate) use device_lifecycle;

/// Any device the registry manages.
#[derive(Debug, Clone)]
pub enum Device {
    Pointer(Pointer),
    Keyboard(Keyboard),
    Gamepad(Gamepad),
}

macro_rules! each_device {
    ($value:expr, $device:ident => $body:expr) => {
        match $value {
            Device::Pointer($device) => $body,
            Device::Keyboard($device) => $body,
            Device::Gamepad($device) => $body,
        }
    };
}

impl Device {
    pub fn id(&self) -> DeviceId {
        each_device!(self, d => d.id())
    }

    pub fn name(&self) -> &str {
        each_device!(self, d => d.name())
    }

    pub fn kind(&self) -> DeviceKind {
        each_device!(self, d => d.kind())
    }

    pub fn controller_id(&self) -> ControllerId {
        each_device!(self, d => d.controller_id())
    }

    pub fn start_listening(&self) -> Result<(), DeviceError> {
        each_device!(self, d => d.start_listening())
    }

    pub fn stop_listening(&self) {
        each_device!(self, d => d.stop_listening())
    }

    pub fn is_listening(&self) -> bool {
        each_device!(self, d => d.is_listening())
    }

    pub fn is_connected(&self) -> bool {
        each_device!(self, d => d.is_connected())
    }

    pub fn set_poll_interval(&self, ms: u64) {
        each_device!(self, d => d.set_poll_interval(ms))
    }

    pub fn poll_interval(&self) -> Duration {
        each_device!(self, d => d.poll_interval())
    }

    pub fn as_gamepad(&self) -> Option<&Gamepad> {
        match self {
            Device::Gamepad(gamepad) => Some(gamepad),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Device::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    pub fn as_keyboard(&self) -> Option<&Keyboard> {
        match self {
            Device::Keyboard(keyboard) => Some(keyboard),
            _ => None,
        }
    }

    pub(crate) fn disconnected(&self) {
        each_device!(self, d => d.disconnected())
    }

    pub(crate) fn set_eviction_hook(&self, hook: EvictionHook) {
        each_device!(self, d => d.set_eviction_hook(hook))
    }
}

impl From<Gamepad> for Device {
    fn from(gamepad: Gamepad) -> Self {
        Device::Gamepad(gamepad)
    }
}

impl From<Pointer> for Device {
    fn from(pointer: Pointer) -> Self {
        Device::Pointer(pointer)
    }
}

impl From<Keyboard> for Device {
    fn from(keyboard: Keyboard) -> Self {
        Device::Keyboard(keyboard)
    }
}
