//! Process-lifetime settings
//!
//! [`InputSettings`] seeds every device the registry creates. Missing keys
//! fall back to their defaults, so a partial TOML document is valid.

use crate::device::cursor::DEFAULT_CURSOR_SENSITIVITY;
use crate::device::gamepad::DEFAULT_DEAD_ZONE;
use crate::device::DEFAULT_POLL_INTERVAL_MS;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings applied to newly created devices
///
/// # Examples
///
/// ```rust
/// use inputnorm::config::InputSettings;
///
/// let settings = InputSettings::from_toml_str("dead_zone = 0.2\nauto_listen = true").unwrap();
/// assert_eq!(settings.dead_zone, 0.2);
/// assert_eq!(settings.poll_interval_ms, 10);
/// ```
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    /// Pause between two polls of one device in milliseconds
    ///
    /// Zero is raised to one when applied.
    pub poll_interval_ms: u64,

    /// Stick dead zone, `|v| < dead_zone` reads as centered
    ///
    /// Clamped to `0.0..=MAX_DEAD_ZONE` when applied.
    pub dead_zone: f32,

    /// Cursor pixels per poll at full stick deflection
    pub cursor_sensitivity: f32,

    /// Start polling every device as soon as it is created
    pub auto_listen: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dead_zone: DEFAULT_DEAD_ZONE,
            cursor_sensitivity: DEFAULT_CURSOR_SENSITIVITY,
            auto_listen: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

impl InputSettings {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(input)?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}
