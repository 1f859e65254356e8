//! Working set: the table of in-flight documents shared by a plan tree
//!
//! Stages pass `WorkingSetId`s to each other instead of documents. The
//! working set owns the members; stages only look them up for the length of
//! one `work()` call.
//!
//! # Invariants
//!
//! - Ids are generation checked: a freed slot never resolves through an old id
//! - Members are inserted fully built, never partially initialised
//! - Only the owner of the working set frees members

mod common;
mod id;
mod member;
mod set;

pub use common::WorkingSetCommon;
pub use id::WorkingSetId;
pub use member::{MemberState, WorkingSetMember};
pub use set::{SharedWorkingSet, WorkingSet};
