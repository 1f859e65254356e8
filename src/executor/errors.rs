//! Errors surfaced by the plan executor
//!
//! Error codes:
//! - EXEC_STAGE_FAILED: the root stage returned a failure
//! - EXEC_PLAN_DEAD: the executor was used after a failure
//! - EXEC_CONFIG_INVALID: configuration rejected by validation
//! - EXEC_CONFIG_IO: configuration file could not be read

use thiserror::Error;

use crate::status::Status;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Executor errors
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Plan stage failed: {status}")]
    StageFailed { status: Status },

    #[error("Plan executor is dead after an earlier failure")]
    Dead,

    #[error("Invalid executor configuration: {0}")]
    Config(String),

    #[error("Failed to read executor configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::StageFailed { .. } => "EXEC_STAGE_FAILED",
            ExecutorError::Dead => "EXEC_PLAN_DEAD",
            ExecutorError::Config(_) => "EXEC_CONFIG_INVALID",
            ExecutorError::Io(_) => "EXEC_CONFIG_IO",
        }
    }

    /// Returns the stage status for `StageFailed`
    pub fn status(&self) -> Option<&Status> {
        match self {
            ExecutorError::StageFailed { status } => Some(status),
            _ => None,
        }
    }
}
