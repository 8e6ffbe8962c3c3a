// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// Category holding one row per message a user has flagged.
///
/// The preference `name` is the flagged message identifier.
pub const CATEGORY_FLAGGED_POST: &str = "flagged_post";

/// Category holding advanced client settings, including feature toggles.
pub const CATEGORY_ADVANCED_SETTINGS: &str = "advanced_settings";

/// Category holding a JSON-encoded colour theme.
pub const CATEGORY_THEME: &str = "theme";

/// Name prefix of pre-release feature toggles stored under
/// [`CATEGORY_ADVANCED_SETTINGS`].
pub const FEATURE_TOGGLE_PREFIX: &str = "feature_enabled_";

/// Maximum length of a user identifier.
pub const USER_ID_MAX_LENGTH: usize = 26;
/// Maximum length of a category.
pub const CATEGORY_MAX_LENGTH: usize = 32;
/// Maximum length of a preference name.
pub const NAME_MAX_LENGTH: usize = 32;
/// Maximum number of characters in a preference value.
pub const VALUE_MAX_LENGTH: usize = 2000;

/// The identity of a preference row.
///
/// At most one row exists per `(user_id, category, name)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreferenceKey {
    /// The owning user.
    pub user_id: String,
    /// The preference category.
    pub category: String,
    /// The preference name within its category.
    pub name: String,
}

impl PreferenceKey {
    /// Creates a new key from its three parts.
    #[must_use]
    pub fn new(user_id: &str, category: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            category: category.to_string(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}, {}, {}>", self.user_id, self.category, self.name)
    }
}

/// A single per-user key/value preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    /// The owning user.
    pub user_id: String,
    /// The preference category.
    pub category: String,
    /// The preference name within its category.
    pub name: String,
    /// The stored value. Replaced wholesale on every save.
    pub value: String,
}

impl Preference {
    /// Creates a new preference record.
    #[must_use]
    pub fn new(user_id: &str, category: &str, name: &str, value: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Returns the identity of this preference.
    #[must_use]
    pub fn key(&self) -> PreferenceKey {
        PreferenceKey::new(&self.user_id, &self.category, &self.name)
    }
}

/// An ordered batch of preferences saved as a unit.
pub type Preferences = Vec<Preference>;
