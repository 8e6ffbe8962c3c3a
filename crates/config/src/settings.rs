// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::Path;

use prefstore_domain::{CATEGORY_FLAGGED_POST, CATEGORY_MAX_LENGTH};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Rows removed per retention delete call unless configured otherwise.
pub const DEFAULT_BATCH_LIMIT: u64 = 1000;
/// Days a flagged message is kept by the legacy sweep.
pub const DEFAULT_FLAGGED_POST_CUTOFF_DAYS: u32 = 365;
/// Seconds between daemon sweep passes.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Everything the store and its sweeper need to run.
///
/// ```json
/// {
///   "database": { "driver_name": "sqlite", "data_source": "prefs.db" },
///   "retention": { "batch_limit": 500 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// Connection settings.
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Retention sweep settings.
    #[serde(default)]
    pub retention: RetentionSettings,
}

/// Which backend to open and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    /// `sqlite`, `sqlite3`, `mysql`, or `mariadb`.
    pub driver_name: String,
    /// File path or connection URL of the primary.
    pub data_source: String,
    /// File path or connection URL reads are routed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_source: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            driver_name: "sqlite".to_string(),
            data_source: ":memory:".to_string(),
            replica_source: None,
        }
    }
}

/// How the flagged-message sweeps run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionSettings {
    /// Preference category swept.
    pub category: String,
    /// Maximum rows removed by a single delete call.
    pub batch_limit: u64,
    /// Age in days after which the legacy sweep removes a flag.
    pub flagged_post_cutoff_days: u32,
    /// Seconds between daemon passes.
    pub sweep_interval_secs: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            category: CATEGORY_FLAGGED_POST.to_string(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            flagged_post_cutoff_days: DEFAULT_FLAGGED_POST_CUTOFF_DAYS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl StoreSettings {
    /// Parses and validates settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON or unknown fields, and `Invalid`
    /// for values that fail [`StoreSettings::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses, and validates a settings file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`StoreSettings::from_json`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Reading settings file");
        let text: String = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    /// Serializes the settings as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every field the store relies on.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.driver_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.driver_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.database.data_source.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.data_source",
                reason: "must not be empty".to_string(),
            });
        }
        if self
            .database
            .replica_source
            .as_ref()
            .is_some_and(|source| source.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "database.replica_source",
                reason: "must be omitted or non-empty".to_string(),
            });
        }

        let category_len: usize = self.retention.category.chars().count();
        if category_len == 0 || category_len > CATEGORY_MAX_LENGTH {
            return Err(ConfigError::Invalid {
                field: "retention.category",
                reason: format!("must be between 1 and {CATEGORY_MAX_LENGTH} characters"),
            });
        }
        if self.retention.batch_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "retention.batch_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.retention.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "retention.sweep_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
