//! Projection stage
//!
//! Applies a projection to every document its child advances and passes
//! every other outcome through. It never buffers or reorders, so it has no
//! notion of completion of its own.

use crate::matcher::MatchExpression;
use crate::projection::{DocumentTransform, ProjectionExec, ProjectionSpec};
use crate::status::Status;
use crate::storage::{InvalidationType, RecordLocation};
use crate::working_set::{SharedWorkingSet, WorkingSetCommon};

use super::stage::{PlanStage, StageState};
use super::stats::{CommonStats, PlanStageStats, SpecificStats, StageType};

/// Reason attached to failures a child reports without a status member
pub const CHILD_FAILURE_REASON: &str = "projection stage failed to read in results from child";

/// A stage with exactly one child that projects advanced documents
#[derive(Debug)]
pub struct ProjectionStage {
    transform: Box<dyn DocumentTransform>,
    projection: Option<serde_json::Value>,
    ws: SharedWorkingSet,
    child: Box<dyn PlanStage>,
    common: CommonStats,
}

impl ProjectionStage {
    /// Creates a projection stage.
    ///
    /// `full_expression` is the whole query; positional projections use it
    /// to find the matching array element.
    pub fn new(
        spec: ProjectionSpec,
        full_expression: Option<MatchExpression>,
        ws: SharedWorkingSet,
        child: Box<dyn PlanStage>,
    ) -> Self {
        let projection = Some(spec.source().clone());
        Self {
            transform: Box::new(ProjectionExec::new(spec, full_expression)),
            projection,
            ws,
            child,
            common: CommonStats::default(),
        }
    }

    /// Creates a projection stage around any transform
    pub fn with_transform(
        transform: Box<dyn DocumentTransform>,
        ws: SharedWorkingSet,
        child: Box<dyn PlanStage>,
    ) -> Self {
        Self {
            transform,
            projection: None,
            ws,
            child,
            common: CommonStats::default(),
        }
    }
}

impl PlanStage for ProjectionStage {
    fn work(&mut self) -> StageState {
        self.common.works += 1;

        // Our child might be tailable, so is_eof() is deliberately not
        // consulted here: an exhausted child may still produce more later.
        match self.child.work() {
            StageState::Advanced(id) => {
                let mut ws = self.ws.borrow_mut();
                let result = match ws.get_mut(id) {
                    Some(member) => self.transform.transform(member),
                    None => Err(Status::internal_error(format!(
                        "projection stage was advanced an unknown working set member {}",
                        id
                    ))),
                };

                match result {
                    Ok(()) => {
                        self.common.advanced += 1;
                        StageState::Advanced(id)
                    }
                    Err(status) => StageState::Failure(Some(
                        WorkingSetCommon::allocate_status_member(&mut ws, status),
                    )),
                }
            }
            StageState::Failure(id) => {
                let mut ws = self.ws.borrow_mut();
                match id.filter(|id| ws.is_valid(*id)) {
                    Some(id) => StageState::Failure(Some(id)),
                    None => StageState::Failure(Some(WorkingSetCommon::allocate_status_member(
                        &mut ws,
                        Status::internal_error(CHILD_FAILURE_REASON),
                    ))),
                }
            }
            StageState::NeedFetch(id) => {
                self.common.need_fetch += 1;
                StageState::NeedFetch(id)
            }
            other => other,
        }
    }

    fn is_eof(&self) -> bool {
        self.child.is_eof()
    }

    fn prepare_to_yield(&mut self) {
        self.common.yields += 1;
        self.child.prepare_to_yield();
    }

    fn recover_from_yield(&mut self) {
        self.common.unyields += 1;
        self.child.recover_from_yield();
    }

    fn invalidate(&mut self, location: &RecordLocation, kind: InvalidationType) {
        self.common.invalidates += 1;
        self.child.invalidate(location, kind);
    }

    fn stats(&mut self) -> PlanStageStats {
        self.common.is_eof = self.is_eof();
        let mut stats = PlanStageStats::new(StageType::Projection, self.common.clone());
        if let Some(projection) = &self.projection {
            stats = stats.with_specific(SpecificStats::Projection {
                projection: projection.clone(),
            });
        }
        stats.with_child(self.child.stats())
    }

    fn stage_type(&self) -> StageType {
        StageType::Projection
    }
}
