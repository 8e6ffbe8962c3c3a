// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors raised while validating a preference record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The user identifier is empty, too long, or not alphanumeric.
    #[error("Invalid user id '{user_id}': {reason}")]
    InvalidUserId {
        /// The rejected identifier.
        user_id: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The category is empty or exceeds the column width.
    #[error("Invalid category '{category}': must be between 1 and {max} characters")]
    InvalidCategory {
        /// The rejected category.
        category: String,
        /// The maximum permitted length.
        max: usize,
    },
    /// The name exceeds the column width.
    #[error("Invalid name '{name}': must be at most {max} characters")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// The maximum permitted length.
        max: usize,
    },
    /// The value exceeds the column width.
    #[error("Invalid value: {length} characters exceeds the maximum of {max}")]
    InvalidValue {
        /// The number of characters in the rejected value.
        length: usize,
        /// The maximum permitted number of characters.
        max: usize,
    },
    /// A theme preference does not hold a JSON object of strings.
    #[error("Invalid theme value: {0}")]
    InvalidTheme(String),
    /// A timestamp could not be expressed in epoch milliseconds.
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),
}
