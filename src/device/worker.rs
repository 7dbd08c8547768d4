//! Polling worker with statum state machine
//!
//! ```text
//! Initializing ──► Polling ──► (exit: cancelled | disconnected | faulted)
//! ```
//!
//! One iteration of the polling loop:
//!
//! ```text
//! poll() ──► drain next_event() FIFO ──► on_event ──► on_tick ──► sleep | cancel
//! ```

use super::{panic_message, DeviceCore, Driver};
use crate::backend::PollStatus;
use crate::event::FaultKind;
use statum::{machine, state};
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a polling thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    Cancelled,
    Disconnected,
    Faulted(FaultKind, String),
}

#[state]
#[derive(Debug, Clone)]
pub enum WorkerState {
    Initializing,
    Polling,
}

#[machine]
pub struct PollWorker<S: WorkerState> {
    core: Arc<DeviceCore>,
    driver: Arc<dyn Driver>,
    cancel: CancellationToken,

    // Counters for the exit log
    polls: u64,
    events: u64,
}

impl PollWorker<Initializing> {
    pub fn create(core: Arc<DeviceCore>, driver: Arc<dyn Driver>, cancel: CancellationToken) -> Self {
        Self::new(
            core,
            driver,
            cancel,
            0, // polls
            0, // events
        )
    }

    pub fn initialize(self) -> Result<PollWorker<Polling>, WorkerExit> {
        if self.cancel.is_cancelled() {
            debug!("{} cancelled before the first poll", self.core.source());
            return Err(WorkerExit::Cancelled);
        }

        let info = self.core.handle().info();
        info!(
            "Polling {} every {:?} ({:?}, {} components)",
            self.core.source(),
            self.core.poll_interval(),
            info.kind,
            info.components.len()
        );
        Ok(self.transition())
    }
}

impl PollWorker<Polling> {
    /// Polls until cancelled, disconnected or faulted.
    pub async fn run(mut self) -> WorkerExit {
        let exit = loop {
            if let ControlFlow::Break(exit) = self.poll_once() {
                break exit;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break WorkerExit::Cancelled,
                _ = tokio::time::sleep(self.core.poll_interval()) => {}
            }
        };

        info!(
            "Polling thread of {} exiting ({:?}) after {} polls and {} events",
            self.core.source(),
            exit,
            self.polls,
            self.events
        );
        exit
    }

    fn poll_once(&mut self) -> ControlFlow<WorkerExit> {
        if self.cancel.is_cancelled() {
            return ControlFlow::Break(WorkerExit::Cancelled);
        }

        match self.core.handle().poll() {
            Ok(PollStatus::Connected) => {}
            Ok(PollStatus::Disconnected) => return ControlFlow::Break(WorkerExit::Disconnected),
            Err(e) => {
                warn!("Poll of {} failed: {}", self.core.source(), e);
                return ControlFlow::Break(WorkerExit::Faulted(FaultKind::Backend, e.to_string()));
            }
        }
        self.polls += 1;

        let core = Arc::clone(&self.core);
        let source = core.source();
        while let Some(event) = core.handle().next_event() {
            self.events += 1;
            let driver = &self.driver;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| driver.on_event(source, event))) {
                return ControlFlow::Break(WorkerExit::Faulted(
                    FaultKind::Panic,
                    panic_message(&*payload),
                ));
            }
            if self.cancel.is_cancelled() {
                return ControlFlow::Break(WorkerExit::Cancelled);
            }
        }

        let driver = &self.driver;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| driver.on_tick(source))) {
            return ControlFlow::Break(WorkerExit::Faulted(
                FaultKind::Panic,
                panic_message(&*payload),
            ));
        }

        ControlFlow::Continue(())
    }
}
