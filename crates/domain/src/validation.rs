// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashMap;

use crate::error::DomainError;
use crate::types::{
    CATEGORY_MAX_LENGTH, CATEGORY_THEME, NAME_MAX_LENGTH, Preference, USER_ID_MAX_LENGTH,
    VALUE_MAX_LENGTH,
};

/// Validates the format of a preference record before it is persisted.
///
/// This checks column widths and, for theme preferences, that the value is
/// a JSON object of strings. It does NOT check whether the row already
/// exists; uniqueness is enforced by the store's primary key.
///
/// # Arguments
///
/// * `preference` - The preference to validate
///
/// # Errors
///
/// Returns an error if:
/// - The user id is empty, longer than 26 characters, or not alphanumeric
/// - The category is empty or longer than 32 characters
/// - The name is longer than 32 characters
/// - The value is longer than 2000 characters
/// - A theme value does not decode as a JSON object of strings
pub fn validate_preference(preference: &Preference) -> Result<(), DomainError> {
    validate_user_id(&preference.user_id)?;

    let category_len: usize = preference.category.chars().count();
    if category_len == 0 || category_len > CATEGORY_MAX_LENGTH {
        return Err(DomainError::InvalidCategory {
            category: preference.category.clone(),
            max: CATEGORY_MAX_LENGTH,
        });
    }

    if preference.name.chars().count() > NAME_MAX_LENGTH {
        return Err(DomainError::InvalidName {
            name: preference.name.clone(),
            max: NAME_MAX_LENGTH,
        });
    }

    let value_len: usize = preference.value.chars().count();
    if value_len > VALUE_MAX_LENGTH {
        return Err(DomainError::InvalidValue {
            length: value_len,
            max: VALUE_MAX_LENGTH,
        });
    }

    if preference.category == CATEGORY_THEME {
        serde_json::from_str::<HashMap<String, String>>(&preference.value)
            .map_err(|e| DomainError::InvalidTheme(e.to_string()))?;
    }

    Ok(())
}

/// Validates a user identifier.
///
/// # Errors
///
/// Returns an error if the identifier is empty, longer than 26 characters,
/// or contains anything other than ASCII letters and digits.
pub fn validate_user_id(user_id: &str) -> Result<(), DomainError> {
    if user_id.is_empty() {
        return Err(DomainError::InvalidUserId {
            user_id: user_id.to_string(),
            reason: "must not be empty",
        });
    }

    if user_id.len() > USER_ID_MAX_LENGTH {
        return Err(DomainError::InvalidUserId {
            user_id: user_id.to_string(),
            reason: "must be at most 26 characters",
        });
    }

    if !user_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::InvalidUserId {
            user_id: user_id.to_string(),
            reason: "must contain only letters and digits",
        });
    }

    Ok(())
}

impl Preference {
    /// Validates this record. See [`validate_preference`].
    ///
    /// # Errors
    ///
    /// Returns the first format violation found.
    pub fn is_valid(&self) -> Result<(), DomainError> {
        validate_preference(self)
    }
}
