//! querystage - pull-based query execution stages for a document database
//!
//! A query plan is a tree of stages. The driving `PlanExecutor` repeatedly
//! asks the root for one unit of work; each stage maps its child's outcome to
//! its own. The `ProjectionStage` reshapes every document that flows through
//! it and forwards every other outcome.
//!
//! # Modules
//!
//! - `status`: failure descriptions carried through the plan
//! - `storage`: record locations, invalidations and record stores
//! - `working_set`: the shared table of in-flight documents
//! - `matcher`: match expressions over documents
//! - `projection`: projection parsing and evaluation
//! - `executor`: the stage contract, stages and the driver

pub mod executor;
pub mod matcher;
pub mod projection;
pub mod status;
pub mod storage;
pub mod working_set;
