//! Keyboard key table
//!
//! Key codes follow the virtual-key numbering used by most desktop toolkits:
//! letters and digits use their upper-case ASCII value, navigation and
//! function keys the classic VK constants. Left and right modifiers collapse
//! onto one code.

use super::{MappingTable, NormalizedCode};
use crate::backend::{Identifier, RawKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum KeyCode {
    Backspace = 8,
    Tab = 9,
    Enter = 10,
    Shift = 16,
    Control = 17,
    Alt = 18,
    Pause = 19,
    CapsLock = 20,
    Escape = 27,
    Space = 32,
    PageUp = 33,
    PageDown = 34,
    End = 35,
    Home = 36,
    ArrowLeft = 37,
    ArrowUp = 38,
    ArrowRight = 39,
    ArrowDown = 40,
    Insert = 45,
    Delete = 46,
    Digit0 = 48,
    Digit1 = 49,
    Digit2 = 50,
    Digit3 = 51,
    Digit4 = 52,
    Digit5 = 53,
    Digit6 = 54,
    Digit7 = 55,
    Digit8 = 56,
    Digit9 = 57,
    A = 65,
    B = 66,
    C = 67,
    D = 68,
    E = 69,
    F = 70,
    G = 71,
    H = 72,
    I = 73,
    J = 74,
    K = 75,
    L = 76,
    M = 77,
    N = 78,
    O = 79,
    P = 80,
    Q = 81,
    R = 82,
    S = 83,
    T = 84,
    U = 85,
    V = 86,
    W = 87,
    X = 88,
    Y = 89,
    Z = 90,
    WindowsLeft = 91,
    WindowsRight = 92,
    Apps = 93,
    Numpad0 = 96,
    Numpad1 = 97,
    Numpad2 = 98,
    Numpad3 = 99,
    Numpad4 = 100,
    Numpad5 = 101,
    Numpad6 = 102,
    Numpad7 = 103,
    Numpad8 = 104,
    Numpad9 = 105,
    NumpadMultiply = 106,
    NumpadAdd = 107,
    NumpadSubtract = 109,
    NumpadDecimal = 110,
    NumpadDivide = 111,
    F1 = 112,
    F2 = 113,
    F3 = 114,
    F4 = 115,
    F5 = 116,
    F6 = 117,
    F7 = 118,
    F8 = 119,
    F9 = 120,
    F10 = 121,
    F11 = 122,
    F12 = 123,
    NumLock = 144,
    ScrollLock = 145,
    Semicolon = 186,
    Equals = 187,
    Comma = 188,
    Minus = 189,
    Period = 190,
    Slash = 191,
    Grave = 192,
    BracketOpen = 219,
    Backslash = 220,
    BracketClose = 221,
    Apostrophe = 222,
}

impl KeyCode {
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Key that produces `c` on a US layout, and whether Shift must be held.
    pub fn from_char(c: char) -> Option<(KeyCode, bool)> {
        if c.is_ascii_uppercase() {
            return Self::from_char(c.to_ascii_lowercase()).map(|(key, _)| (key, true));
        }

        let key = match c {
            'a' => KeyCode::A,
            'b' => KeyCode::B,
            'c' => KeyCode::C,
            'd' => KeyCode::D,
            'e' => KeyCode::E,
            'f' => KeyCode::F,
            'g' => KeyCode::G,
            'h' => KeyCode::H,
            'i' => KeyCode::I,
            'j' => KeyCode::J,
            'k' => KeyCode::K,
            'l' => KeyCode::L,
            'm' => KeyCode::M,
            'n' => KeyCode::N,
            'o' => KeyCode::O,
            'p' => KeyCode::P,
            'q' => KeyCode::Q,
            'r' => KeyCode::R,
            's' => KeyCode::S,
            't' => KeyCode::T,
            'u' => KeyCode::U,
            'v' => KeyCode::V,
            'w' => KeyCode::W,
            'x' => KeyCode::X,
            'y' => KeyCode::Y,
            'z' => KeyCode::Z,
            '0' => KeyCode::Digit0,
            '1' => KeyCode::Digit1,
            '2' => KeyCode::Digit2,
            '3' => KeyCode::Digit3,
            '4' => KeyCode::Digit4,
            '5' => KeyCode::Digit5,
            '6' => KeyCode::Digit6,
            '7' => KeyCode::Digit7,
            '8' => KeyCode::Digit8,
            '9' => KeyCode::Digit9,
            ' ' => KeyCode::Space,
            '\n' => KeyCode::Enter,
            '\t' => KeyCode::Tab,
            ';' => KeyCode::Semicolon,
            '=' => KeyCode::Equals,
            ',' => KeyCode::Comma,
            '-' => KeyCode::Minus,
            '.' => KeyCode::Period,
            '/' => KeyCode::Slash,
            '\\' => KeyCode::Backslash,
            '`' => KeyCode::Grave,
            '[' => KeyCode::BracketOpen,
            ']' => KeyCode::BracketClose,
            '\'' => KeyCode::Apostrophe,
            _ => return None,
        };
        Some((key, false))
    }
}

impl NormalizedCode for KeyCode {
    fn index(self) -> usize {
        usize::from(self.code())
    }
}

macro_rules! keys {
    ($($raw:ident => $key:ident),* $(,)?) => {
        &[$((Identifier::Key(RawKey::$raw), KeyCode::$key)),*]
    };
}

const KEYBOARD_ENTRIES: &[(Identifier, KeyCode)] = keys![
    A => A, B => B, C => C, D => D, E => E, F => F, G => G,
    H => H, I => I, J => J, K => K, L => L, M => M, N => N,
    O => O, P => P, Q => Q, R => R, S => S, T => T, U => U,
    V => V, W => W, X => X, Y => Y, Z => Z,
    Num0 => Digit0, Num1 => Digit1, Num2 => Digit2, Num3 => Digit3, Num4 => Digit4,
    Num5 => Digit5, Num6 => Digit6, Num7 => Digit7, Num8 => Digit8, Num9 => Digit9,
    F1 => F1, F2 => F2, F3 => F3, F4 => F4, F5 => F5, F6 => F6,
    F7 => F7, F8 => F8, F9 => F9, F10 => F10, F11 => F11, F12 => F12,
    Numpad0 => Numpad0, Numpad1 => Numpad1, Numpad2 => Numpad2, Numpad3 => Numpad3,
    Numpad4 => Numpad4, Numpad5 => Numpad5, Numpad6 => Numpad6, Numpad7 => Numpad7,
    Numpad8 => Numpad8, Numpad9 => Numpad9,
    NumpadComma => NumpadDecimal,
    NumpadEnter => Enter,
    Return => Enter,
    Tab => Tab,
    Space => Space,
    Left => ArrowLeft,
    Up => ArrowUp,
    Right => ArrowRight,
    Down => ArrowDown,
    Insert => Insert,
    Delete => Delete,
    Back => Backspace,
    PageUp => PageUp,
    PageDown => PageDown,
    End => End,
    Home => Home,
    Escape => Escape,
    Pause => Pause,
    Capital => CapsLock,
    LShift => Shift,
    RShift => Shift,
    LControl => Control,
    RControl => Control,
    LAlt => Alt,
    RAlt => Alt,
    LWin => WindowsLeft,
    RWin => WindowsRight,
    Multiply => NumpadMultiply,
    Subtract => NumpadSubtract,
    Divide => NumpadDivide,
    Add => NumpadAdd,
    NumLock => NumLock,
    Scroll => ScrollLock,
    Semicolon => Semicolon,
    Equals => Equals,
    Minus => Minus,
    Comma => Comma,
    Period => Period,
    Slash => Slash,
    Backslash => Backslash,
    Grave => Grave,
    LBracket => BracketOpen,
    RBracket => BracketClose,
    Apostrophe => Apostrophe,
    Apps => Apps,
];

pub static KEYBOARD: MappingTable<KeyCode> = MappingTable::new(KEYBOARD_ENTRIES);
