//! Status values carried by failed stages
//!
//! A `Status` is data, not a panic: stages surface it through a status
//! member in the working set and the driving caller decides what to do.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Error categories understood by the execution layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    /// Invariant broken inside the engine
    InternalError,
    /// A user supplied value was rejected
    BadValue,
    /// A value had the wrong type for the requested operation
    TypeMismatch,
    /// A required key was not present
    NoSuchKey,
    /// An index or length was out of range
    InvalidLength,
}

impl ErrorCode {
    /// Returns the canonical name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InternalError => "InternalError",
            ErrorCode::BadValue => "BadValue",
            ErrorCode::TypeMismatch => "TypeMismatch",
            ErrorCode::NoSuchKey => "NoSuchKey",
            ErrorCode::InvalidLength => "InvalidLength",
        }
    }

    /// Returns the numeric value of the code
    pub fn value(&self) -> u32 {
        match self {
            ErrorCode::InternalError => 1,
            ErrorCode::BadValue => 2,
            ErrorCode::NoSuchKey => 4,
            ErrorCode::TypeMismatch => 14,
            ErrorCode::InvalidLength => 16,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure kind together with a human readable reason
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{code}: {reason}")]
pub struct Status {
    code: ErrorCode,
    reason: String,
}

impl Status {
    /// Create a status with the given code
    pub fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Create an `InternalError` status
    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, reason)
    }

    /// Create a `BadValue` status
    pub fn bad_value(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadValue, reason)
    }

    /// Returns the error code
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the reason
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Result type for operations that fail with a `Status`
pub type StatusResult<T> = Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_names() {
        assert_eq!(ErrorCode::InternalError.as_str(), "InternalError");
        assert_eq!(ErrorCode::BadValue.as_str(), "BadValue");
        assert_eq!(ErrorCode::TypeMismatch.to_string(), "TypeMismatch");
    }

    #[test]
    fn test_status_display() {
        let status = Status::bad_value("unknown projection operator");
        assert_eq!(status.to_string(), "BadValue: unknown projection operator");
        assert_eq!(status.code(), ErrorCode::BadValue);
        assert_eq!(status.reason(), "unknown projection operator");
    }

    #[test]
    fn test_status_serialize() {
        let status = Status::internal_error("boom");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["code"], "InternalError");
        assert_eq!(json["reason"], "boom");
    }
}
