//! inputnorm - normalized input from gamepads, mice and keyboards
//!
//! Raw controller samples from an [`InputBackend`](backend::InputBackend)
//! are turned into buttons, 8-way directions, dead-zone-filtered stick pushes
//! and click/drag/scroll events:
//!
//! ```text
//! InputBackend ──► DeviceRegistry ──► Device (one polling thread each)
//!                                       │
//!                    raw samples ──► mapping tables + direction math
//!                                       │
//!                                       └──► listeners (on the polling thread)
//! ```

pub mod backend;
pub mod config;
pub mod device;
pub mod direction;
pub mod event;
pub mod forward;
pub mod listener;
pub mod mapping;
pub mod output;
pub mod registry;
mod sync;

pub use config::{ConfigError, InputSettings};
pub use device::{CursorEmulation, Device, DeviceError, DeviceKind, Gamepad, Keyboard, Pointer};
pub use direction::Direction;
pub use event::{DeviceFault, DeviceId, EventSource, FaultKind};
pub use forward::{EventForwarder, InputEvent};
pub use listener::{DeviceListener, GamepadListener, KeyboardListener, PointerListener};
pub use mapping::{GamepadButton, GamepadLayout, KeyCode, MouseButton, Stick, Trigger};
pub use registry::{DeviceRegistry, RegistryError};
