//! Query execution stages
//!
//! A plan is a tree of `PlanStage`s driven by a single caller that asks the
//! root for one unit of work at a time. Documents travel upward as working
//! set ids; yield and invalidation signals travel downward to every stage.
//!
//! # Stage contract
//!
//! - `work()` advances at most one result per call
//! - `is_eof()` may be false when the next `work()` returns `IsEof`
//! - every yield is `prepare_to_yield`, any invalidations, `recover_from_yield`
//! - invalidations reach every stage and never fail
//! - failures are data: a status member in the working set, never a panic

mod collection_scan;
mod config;
mod errors;
mod executor;
mod projection;
mod queued_data;
mod stage;
mod stats;

pub use collection_scan::CollectionScan;
pub use config::ExecutorConfig;
pub use errors::{ExecutorError, ExecutorResult};
pub use executor::PlanExecutor;
pub use projection::{ProjectionStage, CHILD_FAILURE_REASON};
pub use queued_data::QueuedDataStage;
pub use stage::{PlanStage, StageState};
pub use stats::{CommonStats, PlanStageStats, SpecificStats, StageType};
