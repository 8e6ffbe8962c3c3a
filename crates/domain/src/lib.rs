// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Preference records and the rules they must satisfy before storage.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod theme;
mod timestamp;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use theme::{FALLBACK_COLOR, is_hex_color, sanitize_theme};
pub use timestamp::{MILLIS_PER_DAY, cutoff_millis, epoch_millis, now_millis};
pub use types::{
    CATEGORY_ADVANCED_SETTINGS, CATEGORY_FLAGGED_POST, CATEGORY_MAX_LENGTH, CATEGORY_THEME,
    FEATURE_TOGGLE_PREFIX, NAME_MAX_LENGTH, Preference, PreferenceKey, Preferences,
    USER_ID_MAX_LENGTH, VALUE_MAX_LENGTH,
};
pub use validation::{validate_preference, validate_user_id};
