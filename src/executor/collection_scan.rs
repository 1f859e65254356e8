//! Collection scan: walks a record store in location order
//!
//! Each call reads at most one record. Across a yield the scan remembers the
//! location it will resume from; an invalidation of that location moves the
//! resume point past it.

use std::fmt;
use std::rc::Rc;

use crate::matcher::MatchExpression;
use crate::status::Status;
use crate::storage::{InvalidationType, RecordLocation, RecordStore};
use crate::working_set::{SharedWorkingSet, WorkingSetCommon, WorkingSetMember};

use super::stage::{PlanStage, StageState};
use super::stats::{CommonStats, PlanStageStats, SpecificStats, StageType};

/// Leaf stage producing one member per record
#[derive(Debug)]
pub struct CollectionScan<S: RecordStore> {
    store: Rc<S>,
    ws: SharedWorkingSet,
    filter: Option<MatchExpression>,
    tailable: bool,
    /// Last location read, None before the first record
    position: Option<RecordLocation>,
    /// Location saved by `prepare_to_yield`
    resume_at: Option<RecordLocation>,
    exhausted: bool,
    docs_tested: u64,
    common: CommonStats,
}

impl<S: RecordStore> CollectionScan<S> {
    /// Creates a scan over every record of `store`
    pub fn new(store: Rc<S>, ws: SharedWorkingSet) -> Self {
        Self {
            store,
            ws,
            filter: None,
            tailable: false,
            position: None,
            resume_at: None,
            exhausted: false,
            docs_tested: 0,
            common: CommonStats::default(),
        }
    }

    /// Only advances records matching `filter` (builder style)
    pub fn with_filter(mut self, filter: MatchExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Makes the scan follow records appended after it caught up.
    ///
    /// A tailable scan returns `IsEof` when it has nothing new but never
    /// reports `is_eof()`.
    pub fn tailable(mut self) -> Self {
        self.tailable = true;
        self
    }

    fn next_candidate(&self) -> Option<RecordLocation> {
        match self.position {
            None => self.store.first_location(),
            Some(location) => self.store.next_location(location),
        }
    }
}

impl<S: RecordStore + fmt::Debug> PlanStage for CollectionScan<S> {
    fn work(&mut self) -> StageState {
        self.common.works += 1;

        if self.exhausted {
            return StageState::IsEof;
        }

        let location = match self.resume_at.take().or_else(|| self.next_candidate()) {
            Some(location) => location,
            None => {
                // A tailable scan keeps its position and looks again next time
                if !self.tailable {
                    self.exhausted = true;
                }
                return StageState::IsEof;
            }
        };
        self.position = Some(location);

        let document = match self.store.read(location) {
            Some(document) => document,
            None => {
                let status = Status::internal_error(format!(
                    "record {} disappeared during a yield without an invalidation",
                    location
                ));
                let id =
                    WorkingSetCommon::allocate_status_member(&mut self.ws.borrow_mut(), status);
                return StageState::Failure(Some(id));
            }
        };

        self.docs_tested += 1;
        if let Some(filter) = &self.filter {
            if !filter.matches(&document) {
                self.common.need_time += 1;
                return StageState::NeedTime;
            }
        }

        let member = WorkingSetMember::with_location_and_document(location, document);
        let id = self.ws.borrow_mut().allocate_member(member);
        self.common.advanced += 1;
        StageState::Advanced(id)
    }

    fn is_eof(&self) -> bool {
        !self.tailable && self.exhausted
    }

    fn prepare_to_yield(&mut self) {
        self.common.yields += 1;
        if !self.exhausted && self.resume_at.is_none() {
            self.resume_at = self.next_candidate();
        }
    }

    fn recover_from_yield(&mut self) {
        self.common.unyields += 1;
    }

    fn invalidate(&mut self, location: &RecordLocation, kind: InvalidationType) {
        self.common.invalidates += 1;

        // Resume from whatever follows the removed record once work() runs,
        // after every pending change has been applied.
        if kind.removes_location() && self.resume_at == Some(*location) {
            self.resume_at = None;
            self.position = Some(*location);
        }
    }

    fn stats(&mut self) -> PlanStageStats {
        self.common.is_eof = self.is_eof();
        PlanStageStats::new(StageType::CollectionScan, self.common.clone()).with_specific(
            SpecificStats::CollectionScan {
                docs_tested: self.docs_tested,
                tailable: self.tailable,
                filter: self.filter.as_ref().map(MatchExpression::to_json),
            },
        )
    }

    fn stage_type(&self) -> StageType {
        StageType::CollectionScan
    }
}
