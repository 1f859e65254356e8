//! The plan stage contract
//!
//! A plan is a tree of stages driven from the root by a single caller. Each
//! call to `work()` does a bounded amount of work and reports one
//! `StageState`. Yield and invalidation notifications travel from the caller
//! down to every node of the tree.

use std::fmt;

use crate::storage::{InvalidationType, RecordLocation};
use crate::working_set::WorkingSetId;

use super::stats::{PlanStageStats, StageType};

/// Outcome of one `work()` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// A result is ready in the working set
    Advanced(WorkingSetId),
    /// Work was done but nothing was produced; call again
    NeedTime,
    /// The member needs its document fetched before it can be used
    NeedFetch(WorkingSetId),
    /// The stage failed.
    ///
    /// The id, when present and valid, resolves to a status member that
    /// describes the failure.
    Failure(Option<WorkingSetId>),
    /// No more results for now
    IsEof,
}

impl StageState {
    /// Returns the state name
    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Advanced(_) => "ADVANCED",
            StageState::NeedTime => "NEED_TIME",
            StageState::NeedFetch(_) => "NEED_FETCH",
            StageState::Failure(_) => "FAILURE",
            StageState::IsEof => "IS_EOF",
        }
    }

    /// Returns the working set id carried by the state, if any
    pub fn id(&self) -> Option<WorkingSetId> {
        match self {
            StageState::Advanced(id) | StageState::NeedFetch(id) => Some(*id),
            StageState::Failure(id) => *id,
            StageState::NeedTime | StageState::IsEof => None,
        }
    }

    /// Returns true for `Advanced`
    pub fn is_advanced(&self) -> bool {
        matches!(self, StageState::Advanced(_))
    }

    /// Returns true for `Failure`
    pub fn is_failure(&self) -> bool {
        matches!(self, StageState::Failure(_))
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}({})", self.as_str(), id),
            None => write!(f, "{}", self.as_str()),
        }
    }
}

/// A node of a query plan.
///
/// Children are owned by their parent. The working set is shared by the
/// whole tree.
pub trait PlanStage: fmt::Debug {
    /// Performs one unit of work.
    ///
    /// Produces at most one `Advanced` result and never blocks. May be called
    /// again after `IsEof`: tailable sources can produce more later.
    fn work(&mut self) -> StageState;

    /// Returns true if this stage will not produce more results.
    ///
    /// May be false even though the next `work()` returns `IsEof`. Callers
    /// must not treat `IsEof` and `is_eof()` as the same signal.
    fn is_eof(&self) -> bool;

    /// Called before the storage lock is released. Must reach every child.
    fn prepare_to_yield(&mut self);

    /// Called after the storage lock is reacquired. Must reach every child.
    fn recover_from_yield(&mut self);

    /// Called when `location` stops being valid. Must reach every child.
    fn invalidate(&mut self, location: &RecordLocation, kind: InvalidationType);

    /// Returns this stage's counters and its children's subtrees
    fn stats(&mut self) -> PlanStageStats;

    /// Returns the stage type
    fn stage_type(&self) -> StageType;
}
