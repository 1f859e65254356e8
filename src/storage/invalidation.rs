//! Invalidation reasons

use std::fmt;

use serde::Serialize;

/// Why a record location is no longer valid.
///
/// Stages forward this untouched; only leaf stages and the working set
/// owner look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationType {
    /// The record was deleted
    Deletion,
    /// The record was updated in place
    Mutation,
    /// The record was relocated to a new location
    Move,
}

impl InvalidationType {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationType::Deletion => "DELETION",
            InvalidationType::Mutation => "MUTATION",
            InvalidationType::Move => "MOVE",
        }
    }

    /// Returns true if the record no longer exists at its old location
    pub fn removes_location(&self) -> bool {
        matches!(self, InvalidationType::Deletion | InvalidationType::Move)
    }
}

impl fmt::Display for InvalidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
