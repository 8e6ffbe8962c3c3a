// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use prefstore_domain::{DomainError, PreferenceKey};
use thiserror::Error;

/// Errors that can occur during persistence operations.
///
/// Every error produced while touching preference rows carries the
/// operation name and the key or category it was working on, so callers
/// can log it without re-deriving context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// An insert collided with an existing row for the same key triple.
    #[error("Preference {key} already exists")]
    Conflict {
        /// The key that is already taken.
        key: PreferenceKey,
    },
    /// The configured driver has no upsert or delete strategy.
    #[error("Unsupported database backend: {driver}")]
    UnsupportedBackend {
        /// The driver name that was requested.
        driver: String,
    },
    /// Beginning, committing, or rolling back a transaction failed.
    #[error("Transaction failure during {operation}: {reason}")]
    TransactionFailure {
        /// One of `begin_transaction`, `commit_transaction`, `rollback_transaction`.
        operation: &'static str,
        /// The underlying error message.
        reason: String,
    },
    /// Any other error reported by the store.
    #[error("Failed to {operation} with {context}: {reason}")]
    StorageFailure {
        /// What was being attempted.
        operation: &'static str,
        /// The key, category, or user the operation targeted.
        context: String,
        /// The underlying error message.
        reason: String,
    },
    /// The record failed format validation.
    #[error("Invalid preference: {0}")]
    InvalidInput(#[from] DomainError),
    /// The requested preference does not exist.
    #[error("Preference {key} not found")]
    NotFound {
        /// The key that was looked up.
        key: PreferenceKey,
    },
    /// Database connection failed.
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    /// Foreign key enforcement is not enabled.
    #[error("Foreign key enforcement is not enabled")]
    ForeignKeyEnforcementNotEnabled,
    /// Initialization error.
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

impl PersistenceError {
    /// Wraps a store error with the operation and target it belongs to.
    pub(crate) fn storage(operation: &'static str, context: impl Into<String>, err: &DieselError) -> Self {
        Self::StorageFailure {
            operation,
            context: context.into(),
            reason: err.to_string(),
        }
    }

    /// Wraps a failure of the transaction machinery itself.
    pub(crate) fn transaction(operation: &'static str, err: &DieselError) -> Self {
        Self::TransactionFailure {
            operation,
            reason: err.to_string(),
        }
    }

    /// Returns whether this error is a key conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Returns whether a store error is a primary key or unique violation.
pub(crate) const fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}
