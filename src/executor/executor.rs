//! Plan executor: drives a stage tree to completion
//!
//! The executor owns the root stage and the working set. It is the only
//! party that frees members and the only party that logs.
//!
//! Yield protocol (strict order):
//! 1. `prepare_to_yield` reaches every stage
//! 2. queued invalidations are applied to the working set and the tree
//! 3. `recover_from_yield` reaches every stage

use tracing::{debug, warn};

use crate::status::Status;
use crate::storage::{Document, InvalidationType, RecordLocation};
use crate::working_set::{SharedWorkingSet, WorkingSetCommon, WorkingSetId};

use super::config::ExecutorConfig;
use super::errors::{ExecutorError, ExecutorResult};
use super::stage::{PlanStage, StageState};
use super::stats::PlanStageStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecState {
    Active,
    Exhausted,
    Dead,
}

/// Pulls documents out of a stage tree
#[derive(Debug)]
pub struct PlanExecutor {
    root: Box<dyn PlanStage>,
    ws: SharedWorkingSet,
    config: ExecutorConfig,
    state: ExecState,
    pending_invalidations: Vec<(RecordLocation, InvalidationType)>,
    works_since_yield: u64,
    yield_count: u64,
}

impl PlanExecutor {
    /// Creates an executor over `root`, which must share `ws`
    pub fn new(root: Box<dyn PlanStage>, ws: SharedWorkingSet, config: ExecutorConfig) -> Self {
        Self {
            root,
            ws,
            config,
            state: ExecState::Active,
            pending_invalidations: Vec::new(),
            works_since_yield: 0,
            yield_count: 0,
        }
    }

    /// Returns the next document, `Ok(None)` when the plan has nothing more.
    ///
    /// For a tailable plan `Ok(None)` only means nothing new is available yet.
    pub fn get_next(&mut self) -> ExecutorResult<Option<Document>> {
        match self.state {
            ExecState::Dead => return Err(ExecutorError::Dead),
            ExecState::Exhausted => return Ok(None),
            ExecState::Active => {}
        }

        loop {
            if self.config.yield_enabled
                && self.works_since_yield >= self.config.yield_period_works
            {
                self.yield_now();
            }

            self.works_since_yield += 1;
            match self.root.work() {
                StageState::Advanced(id) => return self.extract(id).map(Some),
                StageState::IsEof => {
                    if !self.config.tailable {
                        self.state = ExecState::Exhausted;
                    }
                    return Ok(None);
                }
                StageState::Failure(id) => return Err(self.fail(id)),
                StageState::NeedFetch(id) => {
                    debug!(id = %id, "stage requested a fetch");
                    self.yield_now();
                }
                StageState::NeedTime => {}
            }
        }
    }

    /// Drains the plan into a vector.
    ///
    /// On a tailable plan this stops at the first `IsEof`.
    pub fn collect_all(&mut self) -> ExecutorResult<Vec<Document>> {
        let mut documents = Vec::new();
        while let Some(document) = self.get_next()? {
            documents.push(document);
        }
        Ok(documents)
    }

    /// Yields now: prepare, apply queued invalidations, recover
    pub fn yield_now(&mut self) {
        self.root.prepare_to_yield();

        let invalidations = std::mem::take(&mut self.pending_invalidations);
        for (location, kind) in &invalidations {
            self.apply_invalidation(location, *kind);
        }

        self.root.recover_from_yield();

        self.yield_count += 1;
        self.works_since_yield = 0;
        debug!(
            yields = self.yield_count,
            invalidations = invalidations.len(),
            "plan yielded"
        );
    }

    /// Queues an invalidation for delivery during the next yield
    pub fn register_invalidation(&mut self, location: RecordLocation, kind: InvalidationType) {
        self.pending_invalidations.push((location, kind));
    }

    /// Delivers an invalidation immediately
    pub fn invalidate(&mut self, location: RecordLocation, kind: InvalidationType) {
        self.apply_invalidation(&location, kind);
    }

    /// Returns the statistics tree of the plan
    pub fn stats(&mut self) -> PlanStageStats {
        self.root.stats()
    }

    /// Renders the statistics tree as indented text
    pub fn explain(&mut self) -> String {
        self.root.stats().to_string()
    }

    /// Returns the number of yields performed so far
    pub fn yield_count(&self) -> u64 {
        self.yield_count
    }

    /// Returns whether the executor failed and can no longer be used
    pub fn is_dead(&self) -> bool {
        self.state == ExecState::Dead
    }

    /// Returns the configuration in use
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn apply_invalidation(&mut self, location: &RecordLocation, kind: InvalidationType) {
        let detached =
            WorkingSetCommon::fetch_and_invalidate_location(&mut self.ws.borrow_mut(), *location);
        debug!(
            location = %location,
            kind = kind.as_str(),
            detached,
            "invalidating plan"
        );
        self.root.invalidate(location, kind);
    }

    fn extract(&mut self, id: WorkingSetId) -> ExecutorResult<Document> {
        let member = self.ws.borrow_mut().take(id);
        match member.and_then(|mut member| member.take_document()) {
            Some(document) => Ok(document),
            None => Err(self.fail_with(Status::internal_error(format!(
                "advanced member {} has no document",
                id
            )))),
        }
    }

    fn fail(&mut self, id: Option<WorkingSetId>) -> ExecutorError {
        let status = id
            .and_then(|id| self.ws.borrow_mut().take(id))
            .and_then(|member| WorkingSetCommon::member_status(&member))
            .unwrap_or_else(|| Status::internal_error("plan failed without describing the error"));
        self.fail_with(status)
    }

    /// Logs the failure and kills the executor.
    ///
    /// A dead plan never reads its working set again, so every member still
    /// in it is freed, including one left behind by a failed transform.
    fn fail_with(&mut self, status: Status) -> ExecutorError {
        let abandoned = self.ws.borrow().len();
        warn!(
            code = status.code().as_str(),
            reason = status.reason(),
            abandoned,
            "plan execution failed"
        );
        self.ws.borrow_mut().clear();
        self.state = ExecState::Dead;
        ExecutorError::StageFailed { status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ProjectionStage, QueuedDataStage};
    use crate::projection::FnTransform;
    use crate::status::ErrorCode;
    use crate::working_set::{WorkingSet, WorkingSetMember};
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn loc(offset: u64) -> RecordLocation {
        RecordLocation::new(0, offset)
    }

    fn executor_over(queued: QueuedDataStage, ws: SharedWorkingSet) -> PlanExecutor {
        PlanExecutor::new(Box::new(queued), ws, ExecutorConfig::without_yielding())
    }

    #[test]
    fn test_returns_documents_and_frees_members() {
        let ws = WorkingSet::shared();
        let mut queued = QueuedDataStage::new(ws.clone());
        queued.push_member(WorkingSetMember::with_owned_document(doc(json!({"a": 1}))));
        queued.push_state(StageState::NeedTime);
        queued.push_member(WorkingSetMember::with_owned_document(doc(json!({"a": 2}))));

        let mut exec = executor_over(queued, ws.clone());
        let docs = exec.collect_all().unwrap();

        assert_eq!(docs, vec![doc(json!({"a": 1})), doc(json!({"a": 2}))]);
        assert!(ws.borrow().is_empty());
        assert_eq!(exec.get_next().unwrap(), None);
    }

    #[test]
    fn test_failure_kills_executor() {
        let ws = WorkingSet::shared();
        let mut queued = QueuedDataStage::new(ws.clone());
        let id = WorkingSetCommon::allocate_status_member(
            &mut ws.borrow_mut(),
            Status::bad_value("bad"),
        );
        queued.push_state(StageState::Failure(Some(id)));

        let mut exec = executor_over(queued, ws.clone());
        let err = exec.get_next().unwrap_err();
        assert_eq!(err.status().map(|s| s.code()), Some(ErrorCode::BadValue));
        assert!(exec.is_dead());
        assert!(ws.borrow().is_empty());
        assert!(matches!(exec.get_next(), Err(ExecutorError::Dead)));
    }

    #[test]
    fn test_failed_transform_member_freed_on_death() {
        let ws = WorkingSet::shared();
        let mut queued = QueuedDataStage::new(ws.clone());
        queued.push_member(WorkingSetMember::with_location_and_document(
            loc(3),
            doc(json!({"a": 1})),
        ));
        let transform = FnTransform::new("reject", |_: &mut WorkingSetMember| {
            Err(Status::bad_value("rejected"))
        });
        let root =
            ProjectionStage::with_transform(Box::new(transform), ws.clone(), Box::new(queued));

        let mut exec = PlanExecutor::new(Box::new(root), ws.clone(), ExecutorConfig::default());
        let err = exec.get_next().unwrap_err();

        assert_eq!(err.status().map(|s| s.reason()), Some("rejected"));
        assert!(ws.borrow().is_empty());
    }

    #[test]
    fn test_undescribed_failure_is_internal_error() {
        let ws = WorkingSet::shared();
        let mut queued = QueuedDataStage::new(ws.clone());
        queued.push_state(StageState::Failure(None));

        let mut exec = executor_over(queued, ws);
        let err = exec.get_next().unwrap_err();
        assert_eq!(err.status().map(|s| s.code()), Some(ErrorCode::InternalError));
    }

    #[test]
    fn test_need_fetch_forces_yield() {
        let ws = WorkingSet::shared();
        let mut queued = QueuedDataStage::new(ws.clone());
        queued.push_state(StageState::NeedFetch(WorkingSetId::INVALID));

        let mut exec = executor_over(queued, ws);
        assert_eq!(exec.get_next().unwrap(), None);
        assert_eq!(exec.yield_count(), 1);
        assert_eq!(exec.stats().common.yields, 1);
    }

    #[test]
    fn test_auto_yield_period() {
        let ws = WorkingSet::shared();
        let mut queued = QueuedDataStage::new(ws.clone());
        for _ in 0..5 {
            queued.push_state(StageState::NeedTime);
        }
        let config = ExecutorConfig {
            yield_period_works: 2,
            ..ExecutorConfig::default()
        };

        let mut exec = PlanExecutor::new(Box::new(queued), ws, config);
        assert_eq!(exec.get_next().unwrap(), None);
        // six works: yields before the third and fifth
        assert_eq!(exec.yield_count(), 2);

        let stats = exec.stats();
        assert_eq!(stats.common.yields, 2);
        assert_eq!(stats.common.unyields, 2);
    }

    #[test]
    fn test_registered_invalidations_wait_for_yield() {
        let ws = WorkingSet::shared();
        let queued = QueuedDataStage::new(ws.clone());
        let held = ws.borrow_mut().allocate_member(WorkingSetMember::with_location_and_document(
            loc(7),
            doc(json!({"x": 1})),
        ));

        let mut exec = executor_over(queued, ws.clone());
        exec.register_invalidation(loc(7), InvalidationType::Deletion);
        assert!(ws.borrow().get(held).unwrap().has_location());
        assert_eq!(exec.stats().common.invalidates, 0);

        exec.yield_now();
        let member_has_location = ws.borrow().get(held).unwrap().has_location();
        assert!(!member_has_location);
        assert_eq!(exec.stats().common.invalidates, 1);
    }

    #[test]
    fn test_invalidate_is_immediate() {
        let ws = WorkingSet::shared();
        let queued = QueuedDataStage::new(ws.clone());
        let held = ws
            .borrow_mut()
            .allocate_member(WorkingSetMember::with_location(loc(9)));

        let mut exec = executor_over(queued, ws.clone());
        exec.invalidate(loc(9), InvalidationType::Move);

        assert!(!ws.borrow().is_valid(held));
        assert_eq!(exec.stats().common.invalidates, 1);
    }

    #[test]
    fn test_tailable_eof_does_not_exhaust() {
        let ws = WorkingSet::shared();
        let queued = QueuedDataStage::new(ws.clone());
        let config = ExecutorConfig {
            tailable: true,
            ..ExecutorConfig::without_yielding()
        };

        let mut exec = PlanExecutor::new(Box::new(queued), ws, config);
        assert_eq!(exec.get_next().unwrap(), None);
        assert_eq!(exec.get_next().unwrap(), None);
        assert_eq!(exec.stats().common.works, 2);
    }

    #[test]
    fn test_explain_renders_root() {
        let ws = WorkingSet::shared();
        let queued = QueuedDataStage::new(ws.clone());
        let mut exec = executor_over(queued, ws);
        assert!(exec.explain().starts_with("QUEUED_DATA"));
    }
}
