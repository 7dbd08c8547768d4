//! Normalized events delivered to listeners
//!
//! Every event carries the [`EventSource`] it came from and a local
//! timestamp taken on the polling thread when the raw sample was translated.

use crate::direction::Direction;
use crate::mapping::{GamepadButton, KeyCode, MouseButton, Stick, Trigger};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Registry-assigned device identifier, unique within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Identity of the device that produced an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    pub id: DeviceId,
    /// Trimmed display name. Not unique.
    pub name: Arc<str>,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct ButtonEvent {
    pub source: EventSource,
    pub button: GamepadButton,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct PovEvent {
    pub source: EventSource,
    pub direction: Direction,
    pub timestamp: DateTime<Local>,
}

/// Analog stick state after dead-zone filtering.
#[derive(Debug, Clone)]
pub struct StickEvent {
    pub source: EventSource,
    pub stick: Stick,
    /// `None` when the sample that caused the update was exactly zero.
    pub direction: Option<Direction>,
    /// Clamped magnitude in `0.0..=1.0`.
    pub intensity: f32,
    pub x: f32,
    pub y: f32,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub source: EventSource,
    pub trigger: Trigger,
    pub value: f32,
    pub timestamp: DateTime<Local>,
}

/// Relative pointer motion. `button` is set for drags.
#[derive(Debug, Clone)]
pub struct MotionEvent {
    pub source: EventSource,
    pub dx: f32,
    pub dy: f32,
    pub button: Option<MouseButton>,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct ScrollEvent {
    pub source: EventSource,
    pub delta: f32,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub source: EventSource,
    pub button: MouseButton,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub source: EventSource,
    pub key: KeyCode,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// The backend failed to refresh the controller.
    Backend,
    /// Event handling or a listener panicked.
    Panic,
}

/// Reported once when a device's polling thread dies abnormally. The device
/// stops listening afterwards.
#[derive(Debug, Clone)]
pub struct DeviceFault {
    pub source: EventSource,
    pub kind: FaultKind,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FaultKind::Backend => "backend",
            FaultKind::Panic => "panic",
        };
        write!(f, "{} fault on {}: {}", kind, self.source, self.message)
    }
}
