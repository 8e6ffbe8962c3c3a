// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Theme value normalization.
//!
//! Theme preferences store a JSON object mapping theme keys to colours.
//! Before a theme is written, every entry that should be a colour but is
//! not a valid `#rgb` or `#rrggbb` hex colour is blanked to white.

use std::collections::BTreeMap;

use crate::types::{CATEGORY_THEME, Preference};

/// Replacement for colour entries that fail validation.
pub const FALLBACK_COLOR: &str = "#ffffff";

/// Theme keys that hold something other than a colour.
const NON_COLOR_KEYS: [&str; 3] = ["image", "type", "codeTheme"];

/// Returns whether `value` is a `#rgb` or `#rrggbb` hex colour.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };

    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalizes a JSON theme value.
///
/// Returns `None` if the value does not decode as a JSON object of strings;
/// such values are left untouched so that validation can reject them.
#[must_use]
pub fn sanitize_theme(value: &str) -> Option<String> {
    let mut props: BTreeMap<String, String> = serde_json::from_str(value).ok()?;

    for (key, color) in &mut props {
        if NON_COLOR_KEYS.contains(&key.as_str()) {
            continue;
        }
        if !is_hex_color(color) {
            *color = FALLBACK_COLOR.to_string();
        }
    }

    serde_json::to_string(&props).ok()
}

impl Preference {
    /// Hook run on every record immediately before it is persisted.
    ///
    /// Theme values are normalized with [`sanitize_theme`]; all other
    /// categories are stored as given.
    pub fn pre_update(&mut self) {
        if self.category != CATEGORY_THEME {
            return;
        }

        if let Some(sanitized) = sanitize_theme(&self.value) {
            self.value = sanitized;
        }
    }
}
