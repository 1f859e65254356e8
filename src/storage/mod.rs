//! Record storage seen from the execution layer
//!
//! The execution stages only need three things from storage:
//!
//! - A stable address for each record (`RecordLocation`)
//! - A reason a location stopped being valid (`InvalidationType`)
//! - Ordered iteration and point reads (`RecordStore`)
//!
//! The on-disk format lives elsewhere. `InMemoryRecordStore` is the
//! in-process implementation used by scans and tests.

mod invalidation;
mod location;
mod record_store;

pub use invalidation::InvalidationType;
pub use location::RecordLocation;
pub use record_store::{Document, InMemoryRecordStore, RecordStore};
