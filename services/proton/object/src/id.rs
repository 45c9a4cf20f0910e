//! Generation-checked object identities.

use std::fmt;

/// Identity of one object in an [`ObjectStore`](crate::ObjectStore).
///
/// The index selects a slot; the generation is bumped every time the slot is
/// reclaimed, so an id held past reclamation no longer matches the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the object was created
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
