//! Ordered record access used by scan stages

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;

use serde_json::{Map, Value};

use super::location::RecordLocation;

/// A stored document: field name to value
pub type Document = Map<String, Value>;

/// Trait for reading records in location order.
///
/// Implementations may be mutated by other parties between calls (while a
/// plan is yielded), so a location returned earlier may be gone later.
pub trait RecordStore {
    /// Returns the first location in scan order
    fn first_location(&self) -> Option<RecordLocation>;

    /// Returns the first location strictly after `location`.
    ///
    /// `location` itself does not need to exist any more.
    fn next_location(&self, location: RecordLocation) -> Option<RecordLocation>;

    /// Reads the record at `location`, None if it does not exist
    fn read(&self, location: RecordLocation) -> Option<Document>;
}

/// In-memory record store keyed by location
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RefCell<BTreeMap<RecordLocation, Document>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record at `location`
    pub fn insert(&self, location: RecordLocation, document: Document) {
        self.records.borrow_mut().insert(location, document);
    }

    /// Removes the record at `location`, returning it
    pub fn remove(&self, location: RecordLocation) -> Option<Document> {
        self.records.borrow_mut().remove(&location)
    }

    /// Moves a record to a new location, returning false if it did not exist
    pub fn relocate(&self, from: RecordLocation, to: RecordLocation) -> bool {
        let mut records = self.records.borrow_mut();
        match records.remove(&from) {
            Some(document) => {
                records.insert(to, document);
                true
            }
            None => false,
        }
    }

    /// Replaces a single field of the record at `location`
    pub fn update_field(&self, location: RecordLocation, field: &str, value: Value) -> bool {
        match self.records.borrow_mut().get_mut(&location) {
            Some(document) => {
                document.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Returns true if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn first_location(&self) -> Option<RecordLocation> {
        self.records.borrow().keys().next().copied()
    }

    fn next_location(&self, location: RecordLocation) -> Option<RecordLocation> {
        self.records
            .borrow()
            .range((Bound::Excluded(location), Bound::Unbounded))
            .next()
            .map(|(loc, _)| *loc)
    }

    fn read(&self, location: RecordLocation) -> Option<Document> {
        self.records.borrow().get(&location).cloned()
    }
}
