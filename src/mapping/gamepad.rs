//! Gamepad layouts
//!
//! Three controller families are recognized. They differ in which raw
//! buttons exist, in what order they are numbered and in which axes carry the
//! second stick:
//!
//! | Layout        | Buttons                                 | Right stick | Triggers | Y axis |
//! |---------------|-----------------------------------------|-------------|----------|--------|
//! | `Generic`     | `_0`..`_9` + named aliases              | Z / RZ      | -        | down   |
//! | `DirectInput` | `_0`..`_12` + named aliases             | Z / RZ      | -        | down   |
//! | `XInput`      | `_0`..`_9` (`_0`..`_7` w/o navigation)  | RX / RY     | Z / RZ   | up     |

use super::{MappingTable, NormalizedCode};
use crate::backend::{Axis, Identifier, NamedButton};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized gamepad buttons. The discriminant is the button code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GamepadButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    L1 = 4,
    R1 = 5,
    L2 = 6,
    R2 = 7,
    Select = 8,
    Start = 9,
    L3 = 10,
    R3 = 11,
    Mode = 12,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 13] = [
        GamepadButton::A,
        GamepadButton::B,
        GamepadButton::X,
        GamepadButton::Y,
        GamepadButton::L1,
        GamepadButton::R1,
        GamepadButton::L2,
        GamepadButton::R2,
        GamepadButton::Select,
        GamepadButton::Start,
        GamepadButton::L3,
        GamepadButton::R3,
        GamepadButton::Mode,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<GamepadButton> {
        Self::ALL.get(usize::from(code)).copied()
    }
}

impl NormalizedCode for GamepadButton {
    fn index(self) -> usize {
        usize::from(self.code())
    }
}

impl fmt::Display for GamepadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stick {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    Left,
    Right,
}

impl Trigger {
    /// Digital button synthesized when the trigger is fully pressed or released.
    pub fn button(self) -> GamepadButton {
        match self {
            Trigger::Left => GamepadButton::L2,
            Trigger::Right => GamepadButton::R2,
        }
    }
}

/// Controller family, chosen once per device by the registry's classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadLayout {
    /// Reduced digital pad. Fallback for anything the classifier cannot place.
    Generic,
    /// 13-button layout with the second stick on Z/RZ.
    DirectInput,
    /// 10-button + 2-trigger layout. Without navigation buttons the
    /// Select/Start pair is missing and the thumb buttons move down to `_6`/`_7`.
    XInput { navigation: bool },
}

impl GamepadLayout {
    pub fn buttons(self) -> &'static MappingTable<GamepadButton> {
        match self {
            GamepadLayout::Generic => &GENERIC,
            GamepadLayout::DirectInput => &DIRECT_INPUT,
            GamepadLayout::XInput { navigation: true } => &XINPUT,
            GamepadLayout::XInput { navigation: false } => &XINPUT_NONAV,
        }
    }

    /// `(x, y)` axes carrying `stick`.
    pub fn stick_axes(self, stick: Stick) -> (Axis, Axis) {
        match (self, stick) {
            (_, Stick::Left) => (Axis::X, Axis::Y),
            (GamepadLayout::XInput { .. }, Stick::Right) => (Axis::RX, Axis::RY),
            (_, Stick::Right) => (Axis::Z, Axis::RZ),
        }
    }

    /// The stick and component (`false` = x, `true` = y) an axis feeds.
    pub fn stick_for_axis(self, axis: Axis) -> Option<(Stick, bool)> {
        [Stick::Left, Stick::Right].into_iter().find_map(|stick| {
            let (x, y) = self.stick_axes(stick);
            if axis == x {
                Some((stick, false))
            } else if axis == y {
                Some((stick, true))
            } else {
                None
            }
        })
    }

    pub fn trigger_for_axis(self, axis: Axis) -> Option<Trigger> {
        match (self, axis) {
            (GamepadLayout::XInput { .. }, Axis::Z) => Some(Trigger::Left),
            (GamepadLayout::XInput { .. }, Axis::RZ) => Some(Trigger::Right),
            _ => None,
        }
    }

    pub fn has_triggers(self) -> bool {
        matches!(self, GamepadLayout::XInput { .. })
    }

    /// Hardware reports positive y when the stick is pushed up.
    pub fn y_axis_up(self) -> bool {
        matches!(self, GamepadLayout::XInput { .. })
    }
}

impl fmt::Display for GamepadLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamepadLayout::Generic => f.write_str("generic"),
            GamepadLayout::DirectInput => f.write_str("directinput"),
            GamepadLayout::XInput { navigation: true } => f.write_str("xinput"),
            GamepadLayout::XInput { navigation: false } => f.write_str("xinput-nonav"),
        }
    }
}

macro_rules! buttons {
    ($($id:expr => $button:ident),* $(,)?) => {
        &[$(($id, GamepadButton::$button)),*]
    };
}

use crate::backend::Identifier::{Button as N, Named};

const GENERIC_ENTRIES: &[(Identifier, GamepadButton)] = buttons![
    N(0) => Y, Named(NamedButton::Y) => Y,
    N(1) => B, Named(NamedButton::B) => B,
    N(2) => A, Named(NamedButton::A) => A,
    N(3) => X, Named(NamedButton::X) => X,
    N(4) => L1, Named(NamedButton::LeftThumb) => L1,
    N(5) => R1, Named(NamedButton::RightThumb) => R1,
    N(6) => L2, Named(NamedButton::LeftThumb2) => L2,
    N(7) => R2, Named(NamedButton::RightThumb2) => R2,
    N(8) => Select, Named(NamedButton::Select) => Select,
    N(9) => Start, Named(NamedButton::Start) => Start,
];

const DIRECT_INPUT_ENTRIES: &[(Identifier, GamepadButton)] = buttons![
    N(0) => Y, Named(NamedButton::Y) => Y,
    N(1) => B, Named(NamedButton::B) => B,
    N(2) => A, Named(NamedButton::A) => A,
    N(3) => X, Named(NamedButton::X) => X,
    N(4) => L1, Named(NamedButton::LeftThumb) => L1,
    N(5) => R1, Named(NamedButton::RightThumb) => R1,
    N(6) => L2, Named(NamedButton::LeftThumb2) => L2,
    N(7) => R2, Named(NamedButton::RightThumb2) => R2,
    N(8) => Select, Named(NamedButton::Select) => Select,
    N(9) => Start, Named(NamedButton::Start) => Start,
    N(10) => L3, Named(NamedButton::LeftThumb3) => L3,
    N(11) => R3, Named(NamedButton::RightThumb3) => R3,
    N(12) => Mode, Named(NamedButton::Mode) => Mode,
];

const XINPUT_ENTRIES: &[(Identifier, GamepadButton)] = buttons![
    N(0) => A,
    N(1) => B,
    N(2) => X,
    N(3) => Y,
    N(4) => L1,
    N(5) => R1,
    N(6) => Select,
    N(7) => Start,
    N(8) => L3,
    N(9) => R3,
];

const XINPUT_NONAV_ENTRIES: &[(Identifier, GamepadButton)] = buttons![
    N(0) => A,
    N(1) => B,
    N(2) => X,
    N(3) => Y,
    N(4) => L1,
    N(5) => R1,
    N(6) => L3,
    N(7) => R3,
];

pub static GENERIC: MappingTable<GamepadButton> = MappingTable::new(GENERIC_ENTRIES);
pub static DIRECT_INPUT: MappingTable<GamepadButton> = MappingTable::new(DIRECT_INPUT_ENTRIES);
pub static XINPUT: MappingTable<GamepadButton> = MappingTable::new(XINPUT_ENTRIES);
pub static XINPUT_NONAV: MappingTable<GamepadButton> = MappingTable::new(XINPUT_NONAV_ENTRIES);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_and_named_buttons_agree_on_direct_input() {
        let table = GamepadLayout::DirectInput.buttons();
        assert_eq!(table.lookup(N(0)), Some(GamepadButton::Y));
        assert_eq!(table.lookup(Named(NamedButton::Y)), Some(GamepadButton::Y));
        assert_eq!(table.lookup(N(12)), Some(GamepadButton::Mode));
        assert_eq!(table.lookup(N(13)), None);
        assert_eq!(table.bitset_len(), 13);
    }

    #[test]
    fn generic_layout_only_knows_the_reduced_set() {
        let table = GamepadLayout::Generic.buttons();
        assert_eq!(table.lookup(N(9)), Some(GamepadButton::Start));
        assert_eq!(table.lookup(N(10)), None);
        assert_eq!(table.lookup(Named(NamedButton::Mode)), None);
        assert_eq!(table.bitset_len(), 10);
    }

    #[test]
    fn xinput_without_navigation_shifts_thumb_buttons() {
        let nav = GamepadLayout::XInput { navigation: true }.buttons();
        let nonav = GamepadLayout::XInput { navigation: false }.buttons();

        assert_eq!(nav.lookup(N(6)), Some(GamepadButton::Select));
        assert_eq!(nav.lookup(N(8)), Some(GamepadButton::L3));
        assert_eq!(nonav.lookup(N(6)), Some(GamepadButton::L3));
        assert_eq!(nonav.lookup(N(8)), None);
    }

    #[test]
    fn xinput_bitset_holds_synthetic_trigger_buttons() {
        let table = GamepadLayout::XInput { navigation: false }.buttons();
        assert!(table.bitset_len() > GamepadButton::R2.index());
    }

    #[test]
    fn axes_are_routed_per_layout() {
        let xinput = GamepadLayout::XInput { navigation: true };
        assert_eq!(xinput.stick_for_axis(Axis::RY), Some((Stick::Right, true)));
        assert_eq!(xinput.trigger_for_axis(Axis::Z), Some(Trigger::Left));
        assert_eq!(xinput.stick_for_axis(Axis::Z), None);

        let di = GamepadLayout::DirectInput;
        assert_eq!(di.stick_for_axis(Axis::Z), Some((Stick::Right, false)));
        assert_eq!(di.stick_for_axis(Axis::RZ), Some((Stick::Right, true)));
        assert_eq!(di.trigger_for_axis(Axis::Z), None);
        assert_eq!(di.stick_for_axis(Axis::Pov), None);
    }

    #[test]
    fn codes_round_trip() {
        for button in GamepadButton::ALL {
            assert_eq!(GamepadButton::from_code(button.code()), Some(button));
        }
        assert_eq!(GamepadButton::from_code(13), None);
    }
}
