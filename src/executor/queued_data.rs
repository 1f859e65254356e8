//! Stage that replays pre-loaded results
//!
//! Used to feed a parent stage a scripted sequence of outcomes. Members
//! pushed here are allocated in the working set at push time.

use std::collections::VecDeque;

use crate::storage::{InvalidationType, RecordLocation};
use crate::working_set::{SharedWorkingSet, WorkingSetMember};

use super::stage::{PlanStage, StageState};
use super::stats::{CommonStats, PlanStageStats, StageType};

/// Returns queued outcomes in order, then `IsEof`
#[derive(Debug)]
pub struct QueuedDataStage {
    ws: SharedWorkingSet,
    results: VecDeque<StageState>,
    invalidations: Vec<(RecordLocation, InvalidationType)>,
    common: CommonStats,
}

impl QueuedDataStage {
    /// Creates an empty stage
    pub fn new(ws: SharedWorkingSet) -> Self {
        Self {
            ws,
            results: VecDeque::new(),
            invalidations: Vec::new(),
            common: CommonStats::default(),
        }
    }

    /// Queues an outcome to be returned verbatim
    pub fn push_state(&mut self, state: StageState) {
        self.results.push_back(state);
    }

    /// Allocates `member` and queues an `Advanced` outcome for it
    pub fn push_member(&mut self, member: WorkingSetMember) {
        let id = self.ws.borrow_mut().allocate_member(member);
        self.results.push_back(StageState::Advanced(id));
    }

    /// Returns the number of outcomes still queued
    pub fn remaining(&self) -> usize {
        self.results.len()
    }

    /// Returns every invalidation received, in order
    pub fn invalidations(&self) -> &[(RecordLocation, InvalidationType)] {
        &self.invalidations
    }
}

impl PlanStage for QueuedDataStage {
    fn work(&mut self) -> StageState {
        self.common.works += 1;

        let state = self.results.pop_front().unwrap_or(StageState::IsEof);
        match state {
            StageState::Advanced(_) => self.common.advanced += 1,
            StageState::NeedTime => self.common.need_time += 1,
            StageState::NeedFetch(_) => self.common.need_fetch += 1,
            StageState::Failure(_) | StageState::IsEof => {}
        }
        state
    }

    fn is_eof(&self) -> bool {
        self.results.is_empty()
    }

    fn prepare_to_yield(&mut self) {
        self.common.yields += 1;
    }

    fn recover_from_yield(&mut self) {
        self.common.unyields += 1;
    }

    fn invalidate(&mut self, location: &RecordLocation, kind: InvalidationType) {
        self.common.invalidates += 1;
        self.invalidations.push((*location, kind));
    }

    fn stats(&mut self) -> PlanStageStats {
        self.common.is_eof = self.is_eof();
        PlanStageStats::new(StageType::QueuedData, self.common.clone())
    }

    fn stage_type(&self) -> StageType {
        StageType::QueuedData
    }
}
