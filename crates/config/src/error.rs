// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors raised while loading or replacing settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read settings from {path}: {reason}")]
    Io {
        /// The file that was being read.
        path: String,
        /// The underlying error message.
        reason: String,
    },
    /// The settings file is not valid JSON for [`crate::StoreSettings`].
    #[error("Failed to parse settings: {0}")]
    Parse(String),
    /// A field holds a value the store cannot run with.
    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// `reload` was called on a store that was not loaded from a file.
    #[error("Settings were not loaded from a file and cannot be reloaded")]
    NoSource,
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
