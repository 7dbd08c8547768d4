//! Button and key mapping tables
//!
//! Static data that turns a backend [`Identifier`] into a normalized code.
//! Every device family has its own table:
//!
//! ```text
//!  Identifier ──► MappingTable<C> ──► C (GamepadButton | MouseButton | KeyCode)
//!                      │
//!                      └─ bitset_len() sizes the device's down-state
//! ```
//!
//! Identifiers missing from a table are ignored by the device that owns it.

pub mod gamepad;
pub mod keyboard;
pub mod pointer;

pub use gamepad::{GamepadButton, GamepadLayout, Stick, Trigger};
pub use keyboard::KeyCode;
pub use pointer::MouseButton;

use crate::backend::Identifier;

/// A normalized code that can index a down-state bitset.
pub trait NormalizedCode: Copy + PartialEq + Send + Sync + 'static {
    fn index(self) -> usize;
}

/// Immutable identifier → code table.
#[derive(Debug)]
pub struct MappingTable<C: 'static> {
    entries: &'static [(Identifier, C)],
}

impl<C: NormalizedCode> MappingTable<C> {
    pub const fn new(entries: &'static [(Identifier, C)]) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, id: Identifier) -> Option<C> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, code)| *code)
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.lookup(id).is_some()
    }

    pub fn entries(&self) -> &'static [(Identifier, C)] {
        self.entries
    }

    /// Largest code index plus one.
    pub fn bitset_len(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, code)| code.index() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Fixed-size down-state indexed by [`NormalizedCode::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    down: Vec<bool>,
}

impl ButtonState {
    pub fn new(len: usize) -> Self {
        Self {
            down: vec![false; len],
        }
    }

    /// Sized for every code `table` can produce.
    pub fn for_table<C: NormalizedCode>(table: &MappingTable<C>) -> Self {
        Self::new(table.bitset_len())
    }

    pub fn len(&self) -> usize {
        self.down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.down.is_empty()
    }

    pub fn is_down<C: NormalizedCode>(&self, code: C) -> bool {
        self.down.get(code.index()).copied().unwrap_or(false)
    }

    /// Stores `down` and returns the previous value. Codes outside the bitset are dropped.
    pub fn set<C: NormalizedCode>(&mut self, code: C, down: bool) -> bool {
        match self.down.get_mut(code.index()) {
            Some(slot) => std::mem::replace(slot, down),
            None => false,
        }
    }

    pub fn any_down(&self) -> bool {
        self.down.iter().any(|down| *down)
    }

    pub fn clear(&mut self) {
        self.down.iter_mut().for_each(|down| *down = false);
    }
}
