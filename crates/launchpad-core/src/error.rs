// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for launchpad-core.
//!
//! Provides a unified error type for the record store, with stable error
//! codes the CLI can print alongside the message.

use std::fmt;

/// Result type using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the record store and model validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    /// Project was not found in the database.
    ProjectNotFound {
        /// The project ID that was not found.
        project_id: i64,
    },

    /// A unique column already holds the value.
    Conflict {
        /// The conflicting column (`name` or `port`).
        field: &'static str,
        /// Database message.
        details: String,
    },

    /// A stored row could not be decoded into a project.
    InvalidRecord {
        /// The offending project ID.
        project_id: i64,
        /// What was wrong with it.
        reason: String,
    },

    /// Input validation failed.
    ValidationError {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// Database operation failed.
    DatabaseError {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl CoreError {
    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::InvalidRecord { .. } => "INVALID_RECORD",
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::DatabaseError { .. } => "DATABASE_ERROR",
        }
    }

    /// Whether this is a uniqueness violation on `field`.
    pub fn is_conflict_on(&self, column: &str) -> bool {
        matches!(self, Self::Conflict { field, .. } if *field == column)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectNotFound { project_id } => {
                write!(f, "Project not found: {}", project_id)
            }
            Self::Conflict { field, details } => {
                write!(f, "A project with this {} already exists: {}", field, details)
            }
            Self::InvalidRecord { project_id, reason } => {
                write!(f, "Project {} has an invalid record: {}", project_id, reason)
            }
            Self::ValidationError { field, message } => {
                write!(f, "Validation error on '{}': {}", field, message)
            }
            Self::DatabaseError { operation, details } => {
                write!(f, "Database error during '{}': {}", operation, details)
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// Identify which unique column a database error violated, if any.
///
/// SQLite reports `UNIQUE constraint failed: projects.port`, PostgreSQL names
/// the constraint (`projects_port_key`), so both the constraint name and the
/// message are inspected. The subdomain always equals the name, so a
/// subdomain clash is reported as a name clash.
fn unique_violation_column(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    let haystack = format!(
        "{} {}",
        db_err.constraint().unwrap_or_default(),
        db_err.message()
    );
    if haystack.contains(".port") || haystack.contains("_port_") {
        Some("port")
    } else {
        Some("name")
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(field) = unique_violation_column(&err) {
            return CoreError::Conflict {
                field,
                details: err.to_string(),
            };
        }
        CoreError::DatabaseError {
            operation: "query".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for CoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CoreError::DatabaseError {
            operation: "migrate".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_codes() {
        let test_cases = vec![
            (
                CoreError::ProjectNotFound { project_id: 1 },
                "PROJECT_NOT_FOUND",
            ),
            (
                CoreError::Conflict {
                    field: "name",
                    details: "dup".to_string(),
                },
                "CONFLICT",
            ),
            (
                CoreError::ValidationError {
                    field: "name".to_string(),
                    message: "bad".to_string(),
                },
                "VALIDATION_ERROR",
            ),
            (
                CoreError::DatabaseError {
                    operation: "insert".to_string(),
                    details: "disk full".to_string(),
                },
                "DATABASE_ERROR",
            ),
        ];

        for (error, expected_code) in test_cases {
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[test]
    fn test_project_not_found_message() {
        let err = CoreError::ProjectNotFound { project_id: 42 };
        assert_eq!(err.to_string(), "Project not found: 42");
    }

    #[test]
    fn test_is_conflict_on() {
        let err = CoreError::Conflict {
            field: "port",
            details: String::new(),
        };
        assert!(err.is_conflict_on("port"));
        assert!(!err.is_conflict_on("name"));
    }

    #[test]
    fn test_non_database_sqlx_error_maps_to_database_error() {
        let err: CoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
