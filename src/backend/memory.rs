//! In-process backend with scripted controllers
//!
//! Controllers are attached and detached at runtime and fed raw samples by
//! the caller. Used by the integration tests and by simulations that need
//! deterministic input without hardware.
//!
//! ```text
//! test ── push() ──► MemoryController queue ──► device polling thread
//! test ── add_controller()/remove_controller() ──► hot-plug channel ──► registry
//! ```

use super::{
    BackendError, ControllerHandle, ControllerId, ControllerInfo, HotplugEvent, Identifier,
    InputBackend, PollStatus, RawEvent,
};
use crate::sync::lock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Scripted controller.
#[derive(Debug)]
pub struct MemoryController {
    id: ControllerId,
    info: ControllerInfo,
    queue: Mutex<VecDeque<RawEvent>>,
    connected: AtomicBool,
    poll_failure: Mutex<Option<String>>,
    polls: AtomicU64,
    rumblers: usize,
    last_rumble: Mutex<Option<f32>>,
}

impl MemoryController {
    fn new(id: ControllerId, info: ControllerInfo, rumblers: usize) -> Self {
        Self {
            id,
            info,
            queue: Mutex::new(VecDeque::new()),
            connected: AtomicBool::new(true),
            poll_failure: Mutex::new(None),
            polls: AtomicU64::new(0),
            rumblers,
            last_rumble: Mutex::new(None),
        }
    }

    /// Queues one raw sample.
    pub fn push(&self, id: Identifier, value: f32) {
        lock(&self.queue).push_back(RawEvent::new(id, value));
    }

    /// Queues several samples atomically, so a polling thread sees all or none of them.
    pub fn push_all(&self, events: impl IntoIterator<Item = (Identifier, f32)>) {
        let mut queue = lock(&self.queue);
        queue.extend(events.into_iter().map(|(id, value)| RawEvent::new(id, value)));
    }

    /// Makes the next `poll()` report a disconnect.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Makes the next `poll()` fail with `reason`.
    pub fn fail_next_poll(&self, reason: impl Into<String>) {
        *lock(&self.poll_failure) = Some(reason.into());
    }

    /// Number of times the controller has been polled.
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Intensity of the most recent rumble request.
    pub fn last_rumble(&self) -> Option<f32> {
        *lock(&self.last_rumble)
    }
}

impl ControllerHandle for MemoryController {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn info(&self) -> &ControllerInfo {
        &self.info
    }

    fn poll(&self) -> Result<PollStatus, BackendError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = lock(&self.poll_failure).take() {
            return Err(BackendError::PollError(self.id, reason));
        }

        if self.is_connected() {
            Ok(PollStatus::Connected)
        } else {
            Ok(PollStatus::Disconnected)
        }
    }

    fn next_event(&self) -> Option<RawEvent> {
        lock(&self.queue).pop_front()
    }

    fn rumbler_count(&self) -> usize {
        self.rumblers
    }

    fn rumble(&self, intensity: f32) -> Result<(), BackendError> {
        if self.rumblers == 0 {
            return Ok(());
        }
        *lock(&self.last_rumble) = Some(intensity);
        Ok(())
    }
}

#[derive(Default)]
struct BackendState {
    controllers: Vec<Arc<MemoryController>>,
    subscriber: Option<mpsc::UnboundedSender<HotplugEvent>>,
    unavailable: Option<String>,
}

/// Backend whose inventory is driven by the caller.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
    next_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose enumeration always fails.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let backend = Self::default();
        lock(&backend.state).unavailable = Some(reason.into());
        backend
    }

    pub fn add_controller(&self, info: ControllerInfo) -> Arc<MemoryController> {
        self.add_rumble_controller(info, 0)
    }

    /// Attaches a controller with `rumblers` force-feedback actuators and
    /// announces it to the current subscriber.
    pub fn add_rumble_controller(&self, info: ControllerInfo, rumblers: usize) -> Arc<MemoryController> {
        let id = ControllerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let controller = Arc::new(MemoryController::new(id, info, rumblers));
        info!("Attaching memory controller {} ({})", id, controller.info.name);

        let mut state = lock(&self.state);
        state.controllers.push(Arc::clone(&controller));
        if let Some(sender) = &state.subscriber {
            let handle: Arc<dyn ControllerHandle> = controller.clone();
            if sender.send(HotplugEvent::Added(handle)).is_err() {
                warn!("Hot-plug receiver dropped, {} not announced", id);
            }
        }

        controller
    }

    /// Detaches a controller. Its next poll reports a disconnect and the
    /// subscriber receives a removal notice.
    pub fn remove_controller(&self, id: ControllerId) -> bool {
        let mut state = lock(&self.state);
        let Some(position) = state.controllers.iter().position(|c| c.id == id) else {
            debug!("Remove ignored, {} is not attached", id);
            return false;
        };

        let controller = state.controllers.remove(position);
        controller.disconnect();
        info!("Detached memory controller {} ({})", id, controller.info.name);

        if let Some(sender) = &state.subscriber {
            if sender.send(HotplugEvent::Removed(id)).is_err() {
                warn!("Hot-plug receiver dropped, removal of {} not announced", id);
            }
        }
        true
    }

    pub fn controller_count(&self) -> usize {
        lock(&self.state).controllers.len()
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.state).subscriber.is_some()
    }
}

impl InputBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn controllers(&self) -> Result<Vec<Arc<dyn ControllerHandle>>, BackendError> {
        let state = lock(&self.state);
        if let Some(reason) = &state.unavailable {
            return Err(BackendError::Unavailable(reason.clone()));
        }

        Ok(state
            .controllers
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn ControllerHandle>)
            .collect())
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<HotplugEvent>, BackendError> {
        let mut state = lock(&self.state);
        if let Some(reason) = &state.unavailable {
            return Err(BackendError::SubscriptionError(reason.clone()));
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        if state.subscriber.replace(sender).is_some() {
            debug!("Replacing previous hot-plug subscriber");
        }
        Ok(receiver)
    }

    fn unsubscribe(&self) {
        if lock(&self.state).subscriber.take().is_some() {
            debug!("Hot-plug subscriber removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Axis, ControllerKind};

    fn pad() -> ControllerInfo {
        ControllerInfo::new(
            "Test Pad",
            ControllerKind::Gamepad,
            vec![Identifier::Axis(Axis::X), Identifier::Button(0)],
        )
    }

    #[test]
    fn queue_is_fifo() {
        let backend = MemoryBackend::new();
        let controller = backend.add_controller(pad());
        controller.push(Identifier::Button(0), 1.0);
        controller.push(Identifier::Axis(Axis::X), -0.5);

        assert_eq!(controller.next_event(), Some(RawEvent::new(Identifier::Button(0), 1.0)));
        assert_eq!(controller.next_event(), Some(RawEvent::new(Identifier::Axis(Axis::X), -0.5)));
        assert_eq!(controller.next_event(), None);
    }

    #[test]
    fn hotplug_events_reach_the_subscriber() {
        let backend = MemoryBackend::new();
        let mut receiver = backend.subscribe().expect("subscribe");

        let controller = backend.add_controller(pad());
        assert!(backend.remove_controller(controller.id()));
        assert!(!backend.remove_controller(controller.id()));

        match receiver.try_recv() {
            Ok(HotplugEvent::Added(handle)) => assert_eq!(handle.id(), controller.id()),
            other => panic!("expected Added, got {other:?}"),
        }
        match receiver.try_recv() {
            Ok(HotplugEvent::Removed(id)) => assert_eq!(id, controller.id()),
            other => panic!("expected Removed, got {other:?}"),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_closes_the_channel() {
        let backend = MemoryBackend::new();
        let mut receiver = backend.subscribe().expect("subscribe");
        backend.unsubscribe();
        assert!(receiver.blocking_recv().is_none());
    }

    #[test]
    fn removed_controller_polls_disconnected() {
        let backend = MemoryBackend::new();
        let controller = backend.add_controller(pad());
        assert_eq!(controller.poll().expect("poll"), PollStatus::Connected);

        backend.remove_controller(controller.id());
        assert_eq!(controller.poll().expect("poll"), PollStatus::Disconnected);
    }

    #[test]
    fn scripted_poll_failure_fires_once() {
        let backend = MemoryBackend::new();
        let controller = backend.add_controller(pad());
        controller.fail_next_poll("cable chewed");

        assert!(matches!(controller.poll(), Err(BackendError::PollError(_, _))));
        assert!(controller.poll().is_ok());
        assert_eq!(controller.poll_count(), 2);
    }

    #[test]
    fn unavailable_backend_refuses_enumeration() {
        let backend = MemoryBackend::unavailable("no driver");
        assert!(matches!(backend.controllers(), Err(BackendError::Unavailable(_))));
    }

    #[test]
    fn rumble_is_recorded_only_with_actuators() {
        let backend = MemoryBackend::new();
        let silent = backend.add_controller(pad());
        let buzzing = backend.add_rumble_controller(pad(), 2);

        silent.rumble(0.5).expect("rumble");
        buzzing.rumble(0.5).expect("rumble");

        assert_eq!(silent.last_rumble(), None);
        assert_eq!(buzzing.last_rumble(), Some(0.5));
        assert_eq!(buzzing.rumbler_count(), 2);
    }
}
