//! Record addressing

use std::fmt;

use serde::Serialize;

/// Address of a record in storage: data file number plus byte offset.
///
/// Ordering follows (file, offset), which is also scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordLocation {
    file: u32,
    offset: u64,
}

impl RecordLocation {
    /// Creates a new location
    pub fn new(file: u32, offset: u64) -> Self {
        Self { file, offset }
    }

    /// Returns the data file number
    pub fn file(&self) -> u32 {
        self.file
    }

    /// Returns the byte offset within the file
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:x}", self.file, self.offset)
    }
}
