use super::{MappingTable, NormalizedCode};
use crate::backend::{Identifier, NamedButton};
use serde::{Deserialize, Serialize};

/// Mouse buttons. The discriminant is the button code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0,
    Middle = 1,
    Right = 2,
}

impl MouseButton {
    /// Order in which a held button is reported with a drag.
    pub const DRAG_PRIORITY: [MouseButton; 3] =
        [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl NormalizedCode for MouseButton {
    fn index(self) -> usize {
        usize::from(self.code())
    }
}

const POINTER_ENTRIES: &[(Identifier, MouseButton)] = &[
    (Identifier::Named(NamedButton::Left), MouseButton::Left),
    (Identifier::Named(NamedButton::Middle), MouseButton::Middle),
    (Identifier::Named(NamedButton::Right), MouseButton::Right),
];

pub static POINTER: MappingTable<MouseButton> = MappingTable::new(POINTER_ENTRIES);
