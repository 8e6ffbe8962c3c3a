// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CATEGORY_FLAGGED_POST, Preference, PreferenceKey};

#[test]
fn test_preference_key_matches_fields() {
    let preference: Preference = Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true");
    let key: PreferenceKey = preference.key();

    assert_eq!(key.user_id, "u1");
    assert_eq!(key.category, CATEGORY_FLAGGED_POST);
    assert_eq!(key.name, "msg1");
}

#[test]
fn test_preference_key_display_lists_triple() {
    let key: PreferenceKey = PreferenceKey::new("u1", "display_settings", "use_military_time");
    assert_eq!(key.to_string(), "<u1, display_settings, use_military_time>");
}

#[test]
fn test_keys_with_same_triple_are_equal_regardless_of_value() {
    let first: Preference = Preference::new("u1", "c", "n", "one");
    let second: Preference = Preference::new("u1", "c", "n", "two");

    assert_ne!(first, second);
    assert_eq!(first.key(), second.key());
}

#[test]
fn test_preference_round_trips_through_json() {
    let preference: Preference = Preference::new("u1", "display_settings", "colorize_usernames", "true");
    let json: String = serde_json::to_string(&preference).unwrap();
    let decoded: Preference = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded, preference);
}
