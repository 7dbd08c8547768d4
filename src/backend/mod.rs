//! Native input backend contract
//!
//! The engine never talks to an operating system API directly. Everything it
//! needs from the platform is expressed by two traits:
//!
//! - [`InputBackend`] - enumerates controllers and publishes hot-plug changes
//! - [`ControllerHandle`] - one physical controller: poll, drain raw samples, rumble
//!
//! Raw samples are `(Identifier, f32)` pairs. Buttons report `0.0`/`1.0`,
//! axes report `-1.0..=1.0` (pointer axes report relative deltas) and the POV
//! hat reports eighth turns as described in [`crate::direction`].
//!
//! # Implementations
//!
//! - [`memory::MemoryBackend`] - scripted, in-process controllers for tests and simulations
//! - `gilrs::GilrsBackend` - real gamepads through gilrs (cargo feature `gilrs`)

pub mod memory;

#[cfg(feature = "gilrs")]
pub mod gilrs;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Stable-for-session identifier the backend assigns to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(pub u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// Device class as declared by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    Pointer,
    Keyboard,
    Gamepad,
    /// Joysticks and flight sticks. Handled with the generic gamepad layout.
    Stick,
    /// Anything else (wheels, tablets, vendor HID). Never turned into a device.
    Other,
}

/// Continuous controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    RX,
    RY,
    RZ,
    Slider,
    /// Hat switch, reported as a single scalar.
    Pov,
}

/// Buttons a backend identifies by name rather than by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedButton {
    A,
    B,
    X,
    Y,
    LeftThumb,
    RightThumb,
    LeftThumb2,
    RightThumb2,
    Select,
    Start,
    LeftThumb3,
    RightThumb3,
    Mode,
    // Pointer buttons
    Left,
    Middle,
    Right,
    Side,
    Extra,
}

/// Keyboard keys as the backend names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawKey {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadComma,
    NumpadEnter,
    Return,
    Tab,
    Space,
    Left,
    Up,
    Right,
    Down,
    Insert,
    Delete,
    Back,
    PageUp,
    PageDown,
    End,
    Home,
    Escape,
    Pause,
    Capital,
    LShift,
    RShift,
    LControl,
    RControl,
    LAlt,
    RAlt,
    LWin,
    RWin,
    Multiply,
    Subtract,
    Divide,
    Add,
    NumLock,
    Scroll,
    Semicolon,
    Equals,
    Minus,
    Comma,
    Period,
    Slash,
    Backslash,
    Grave,
    LBracket,
    RBracket,
    Apostrophe,
    Apps,
    Power,
    Sleep,
    SysRq,
    Unknown,
}

/// Identifies one control on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Axis(Axis),
    /// Index-numbered button (`_0`, `_1`, ...).
    Button(u8),
    Named(NamedButton),
    Key(RawKey),
}

/// Static description of a controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerInfo {
    /// Backend-provided name, possibly padded with whitespace.
    pub name: String,
    pub kind: ControllerKind,
    /// Every control the controller exposes.
    pub components: Vec<Identifier>,
}

impl ControllerInfo {
    pub fn new(name: impl Into<String>, kind: ControllerKind, components: Vec<Identifier>) -> Self {
        Self {
            name: name.into(),
            kind,
            components,
        }
    }

    pub fn has(&self, id: Identifier) -> bool {
        self.components.contains(&id)
    }

    pub fn has_axis(&self, axis: Axis) -> bool {
        self.has(Identifier::Axis(axis))
    }
}

/// One discrete sample taken from a controller's event queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
    pub id: Identifier,
    pub value: f32,
}

impl RawEvent {
    pub fn new(id: Identifier, value: f32) -> Self {
        Self { id, value }
    }
}

/// Result of refreshing a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Connected,
    Disconnected,
}

/// Attach/detach notifications published by a backend.
#[derive(Clone)]
pub enum HotplugEvent {
    Added(Arc<dyn ControllerHandle>),
    Removed(ControllerId),
}

impl fmt::Debug for HotplugEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotplugEvent::Added(handle) => f
                .debug_tuple("Added")
                .field(&handle.id())
                .field(&handle.info().name)
                .finish(),
            HotplugEvent::Removed(id) => f.debug_tuple("Removed").field(id).finish(),
        }
    }
}

/// Backend failures
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to poll {0}: {1}")]
    PollError(ControllerId, String),

    #[error("Force feedback failed: {0}")]
    ForceFeedbackError(String),

    #[error("Hot-plug subscription failed: {0}")]
    SubscriptionError(String),
}

/// A physical controller as seen by the backend.
///
/// Handles are shared between the registry and one polling thread, so every
/// method takes `&self`.
pub trait ControllerHandle: Send + Sync {
    fn id(&self) -> ControllerId;

    fn info(&self) -> &ControllerInfo;

    /// Refreshes the controller. Reports `Disconnected` once the device is gone.
    fn poll(&self) -> Result<PollStatus, BackendError>;

    /// Pops the oldest queued sample.
    fn next_event(&self) -> Option<RawEvent>;

    /// Number of force-feedback actuators.
    fn rumbler_count(&self) -> usize {
        0
    }

    /// Drives every actuator with `intensity` in `0.0..=1.0`.
    fn rumble(&self, _intensity: f32) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Source of controllers and hot-plug notifications.
pub trait InputBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Controllers attached right now.
    fn controllers(&self) -> Result<Vec<Arc<dyn ControllerHandle>>, BackendError>;

    /// Starts publishing hot-plug notifications. A second subscription replaces the first.
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<HotplugEvent>, BackendError>;

    /// Stops publishing. Dropping the sender ends the receiver stream.
    fn unsubscribe(&self);
}
