//! Direction and intensity math
//!
//! Pure helpers shared by every gamepad layout:
//!
//! - [`apply_dead_zone`] - suppresses idle noise on a single axis
//! - [`intensity`] - clamped magnitude of a stick vector
//! - [`quantize_pov`] - hat/POV scalar to an 8-way [`Direction`]
//! - [`quantize_stick`] - stick vector to an 8-way [`Direction`] plus intensity
//!
//! # Conventions
//!
//! Stick axes use screen orientation: positive `x` points east, positive `y`
//! points south. Layouts whose hardware reports `y` growing upwards flip the
//! sign before calling into this module.
//!
//! POV samples are eighth turns starting at north-west and running clockwise:
//!
//! ```text
//!  0.125  0.25  0.375
//!   NW     N     NE
//!  1.0 W   .    E 0.5
//!   SW     S     SE
//!  0.875  0.75  0.625
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest dead zone a gamepad accepts. A dead zone of `1.0` would silence the sticks.
pub const MAX_DEAD_ZONE: f32 = 0.999_999_9;

/// Eight compass points reported by POV hats and analog sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The POV scalar a hat reports for this direction (inverse of [`quantize_pov`]).
    pub fn to_pov(self) -> f32 {
        match self {
            Direction::NorthWest => 0.125,
            Direction::North => 0.25,
            Direction::NorthEast => 0.375,
            Direction::East => 0.5,
            Direction::SouthEast => 0.625,
            Direction::South => 0.75,
            Direction::SouthWest => 0.875,
            Direction::West => 1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::SouthEast | Direction::SouthWest | Direction::NorthWest
        )
    }

    /// Builds a direction from four D-pad booleans. Opposing pairs cancel out.
    pub fn from_dpad(up: bool, right: bool, down: bool, left: bool) -> Option<Direction> {
        let vertical = i8::from(down) - i8::from(up);
        let horizontal = i8::from(right) - i8::from(left);

        match (horizontal, vertical) {
            (0, -1) => Some(Direction::North),
            (1, -1) => Some(Direction::NorthEast),
            (1, 0) => Some(Direction::East),
            (1, 1) => Some(Direction::SouthEast),
            (0, 1) => Some(Direction::South),
            (-1, 1) => Some(Direction::SouthWest),
            (-1, 0) => Some(Direction::West),
            (-1, -1) => Some(Direction::NorthWest),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        };
        f.write_str(label)
    }
}

/// Returns `0.0` when `|value| < threshold`, otherwise `value` unchanged.
pub fn apply_dead_zone(value: f32, threshold: f32) -> f32 {
    if value.abs() < threshold {
        0.0
    } else {
        value
    }
}

/// Magnitude of `(x, y)` clamped to `1.0`.
pub fn intensity(x: f32, y: f32) -> f32 {
    let magnitude = (f64::from(x).powi(2) + f64::from(y).powi(2)).sqrt();
    magnitude.min(1.0) as f32
}

/// Maps a raw POV sample to a direction. `0.0` (centered) and any value that is
/// not an exact eighth turn yield `None`.
pub fn quantize_pov(raw: f32) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|direction| direction.to_pov() == raw)
}

/// Quantizes a stick vector.
///
/// `raw` is the sample that triggered the update; when it is exactly `0.0`
/// the direction is `None` even if the other axis is deflected. Exact
/// boundary angles resolve to the cardinal points, everything in between to
/// the diagonal of that quadrant.
pub fn quantize_stick(raw: f32, x: f32, y: f32) -> (Option<Direction>, f32) {
    let intensity = intensity(x, y);

    if raw == 0.0 {
        return (None, intensity);
    }

    let mut angle = f64::from(y).atan2(f64::from(x)).to_degrees();
    // atan2 returns -180 for (-x, -0.0); both spellings mean west.
    if angle == -180.0 {
        angle = 180.0;
    }

    let direction = if angle == -90.0 {
        Direction::North
    } else if angle == 0.0 {
        Direction::East
    } else if angle == 90.0 {
        Direction::South
    } else if angle == 180.0 {
        Direction::West
    } else if angle < -90.0 {
        Direction::NorthWest
    } else if angle < 0.0 {
        Direction::NorthEast
    } else if angle > 90.0 {
        Direction::SouthWest
    } else {
        Direction::SouthEast
    };

    (Some(direction), intensity)
}
