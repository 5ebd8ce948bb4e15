//! Error types for huddle
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown entity)
//! - 3: Blocked by policy (insufficient permission, structural invariant)
//! - 4: Operation failed (lock contention, storage error)
//!
//! Handlers embedding the library map errors onto HTTP statuses through
//! [`Error::http_status`]: not-found is 404, forbidden is 403, invariant
//! violations are 400 (a request shape problem, not an authorization one),
//! and lock contention is 409 so the caller retries with a fresh snapshot.

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the huddle CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for huddle operations
#[derive(Error, Debug)]
pub enum Error {
    // Unknown entities (exit code 2, HTTP 404)
    #[error("Organization not found: {0}")]
    OrgNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Sprint not found: {0}")]
    SprintNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    // User errors (exit code 2, HTTP 400)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Policy blocks (exit code 3)
    #[error("Forbidden: {user} needs {required} on {resource}")]
    Forbidden {
        user: String,
        resource: String,
        required: String,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // Contention (exit code 4, HTTP 409): retry with a fresh snapshot
    #[error("Conflict: could not acquire lock on {0}")]
    Conflict(PathBuf),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::OrgNotFound(_)
            | Error::GroupNotFound(_)
            | Error::ProjectNotFound(_)
            | Error::BoardNotFound(_)
            | Error::ColumnNotFound(_)
            | Error::TaskNotFound(_)
            | Error::SprintNotFound(_)
            | Error::ResourceNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::Forbidden { .. } | Error::InvariantViolation(_) => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::Conflict(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Conventional HTTP status for handlers embedding the library.
    ///
    /// Not-found and forbidden are deliberately distinct: an absent resource
    /// must never leak as a 403, and a permission failure must never read as
    /// a 404.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::OrgNotFound(_)
            | Error::GroupNotFound(_)
            | Error::ProjectNotFound(_)
            | Error::BoardNotFound(_)
            | Error::ColumnNotFound(_)
            | Error::TaskNotFound(_)
            | Error::SprintNotFound(_)
            | Error::ResourceNotFound(_) => 404,

            Error::Forbidden { .. } => 403,

            Error::InvariantViolation(_) | Error::InvalidArgument(_) | Error::InvalidConfig(_) => {
                400
            }

            Error::Conflict(_) => 409,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => 500,
        }
    }

    /// Stable kind label used in the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::OrgNotFound(_)
            | Error::GroupNotFound(_)
            | Error::ProjectNotFound(_)
            | Error::BoardNotFound(_)
            | Error::ColumnNotFound(_)
            | Error::TaskNotFound(_)
            | Error::SprintNotFound(_)
            | Error::ResourceNotFound(_) => "not_found",
            Error::Forbidden { .. } => "forbidden",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::Conflict(_) => "conflict",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => "operation_failed",
        }
    }
}

/// Result type alias for huddle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub kind: &'static str,
    pub code: i32,
    pub http_status: u16,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            kind: err.kind(),
            code: err.exit_code(),
            http_status: err.http_status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_forbidden_stay_distinct() {
        let missing = Error::BoardNotFound("brd-x".to_string());
        let denied = Error::Forbidden {
            user: "mallory".to_string(),
            resource: "brd-x".to_string(),
            required: "write".to_string(),
        };
        assert_eq!(missing.http_status(), 404);
        assert_eq!(denied.http_status(), 403);
        assert_ne!(missing.kind(), denied.kind());
    }

    #[test]
    fn invariant_violation_is_a_request_problem() {
        let err = Error::InvariantViolation("cannot remove last owner".to_string());
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.exit_code(), exit_codes::POLICY_BLOCKED);
    }

    #[test]
    fn conflict_maps_to_retryable_status() {
        let err = Error::Conflict(PathBuf::from("boards/brd-1.json.lock"));
        assert_eq!(err.http_status(), 409);
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    }
}
