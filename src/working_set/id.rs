//! Working set identifiers

use std::fmt;

use serde::Serialize;

/// Handle to a working set member.
///
/// Slots are reused. The generation distinguishes the current occupant of a
/// slot from earlier ones, so an id kept past a `free` is detectably stale.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WorkingSetId {
    index: u32,
    generation: u32,
}

impl WorkingSetId {
    /// Sentinel id that never resolves to a member
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the slot generation
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns true for the `INVALID` sentinel.
    ///
    /// Any other id may still be stale; only the working set can tell.
    pub fn is_invalid(&self) -> bool {
        *self == Self::INVALID
    }
}

impl fmt::Debug for WorkingSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "WorkingSetId(INVALID)")
        } else {
            write!(f, "WorkingSetId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for WorkingSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
