// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    CATEGORY_FLAGGED_POST, CATEGORY_THEME, DomainError, Preference, validate_preference,
    validate_user_id,
};

#[test]
fn test_validate_preference_accepts_short_user_id() {
    let preference: Preference = Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true");
    assert!(validate_preference(&preference).is_ok());
}

#[test]
fn test_validate_preference_accepts_full_length_user_id() {
    let user_id: String = "a".repeat(26);
    let preference: Preference = Preference::new(&user_id, CATEGORY_FLAGGED_POST, "msg1", "true");
    assert!(validate_preference(&preference).is_ok());
}

#[test]
fn test_validate_user_id_rejects_empty() {
    assert!(matches!(
        validate_user_id(""),
        Err(DomainError::InvalidUserId { .. })
    ));
}

#[test]
fn test_validate_user_id_rejects_too_long() {
    let user_id: String = "a".repeat(27);
    assert!(matches!(
        validate_user_id(&user_id),
        Err(DomainError::InvalidUserId { .. })
    ));
}

#[test]
fn test_validate_user_id_rejects_punctuation() {
    assert!(matches!(
        validate_user_id("user-1"),
        Err(DomainError::InvalidUserId { .. })
    ));
}

#[test]
fn test_validate_preference_rejects_empty_category() {
    let preference: Preference = Preference::new("u1", "", "msg1", "true");
    assert!(matches!(
        validate_preference(&preference),
        Err(DomainError::InvalidCategory { max: 32, .. })
    ));
}

#[test]
fn test_validate_preference_rejects_long_category() {
    let category: String = "c".repeat(33);
    let preference: Preference = Preference::new("u1", &category, "msg1", "true");
    assert!(matches!(
        validate_preference(&preference),
        Err(DomainError::InvalidCategory { .. })
    ));
}

#[test]
fn test_validate_preference_accepts_empty_name() {
    let preference: Preference = Preference::new("u1", "display_settings", "", "true");
    assert!(validate_preference(&preference).is_ok());
}

#[test]
fn test_validate_preference_rejects_long_name() {
    let name: String = "n".repeat(33);
    let preference: Preference = Preference::new("u1", "display_settings", &name, "true");
    assert!(matches!(
        validate_preference(&preference),
        Err(DomainError::InvalidName { max: 32, .. })
    ));
}

#[test]
fn test_validate_preference_counts_value_in_characters() {
    // 2000 multi-byte characters is still within the limit
    let value: String = "é".repeat(2000);
    let preference: Preference = Preference::new("u1", "display_settings", "name", &value);
    assert!(validate_preference(&preference).is_ok());
}

#[test]
fn test_validate_preference_rejects_long_value() {
    let value: String = "v".repeat(2001);
    let preference: Preference = Preference::new("u1", "display_settings", "name", &value);
    assert!(matches!(
        validate_preference(&preference),
        Err(DomainError::InvalidValue {
            length: 2001,
            max: 2000
        })
    ));
}

#[test]
fn test_validate_preference_rejects_malformed_theme() {
    let preference: Preference = Preference::new("u1", CATEGORY_THEME, "", "not json");
    assert!(matches!(
        validate_preference(&preference),
        Err(DomainError::InvalidTheme(_))
    ));
}

#[test]
fn test_validate_preference_accepts_theme_object() {
    let preference: Preference = Preference::new(
        "u1",
        CATEGORY_THEME,
        "",
        r##"{"sidebarBg":"#145dbf","type":"Organization"}"##,
    );
    assert!(validate_preference(&preference).is_ok());
}

#[test]
fn test_malformed_value_outside_theme_is_accepted() {
    let preference: Preference = Preference::new("u1", "display_settings", "name", "not json");
    assert!(validate_preference(&preference).is_ok());
}

#[test]
fn test_is_valid_matches_validate_preference() {
    let valid: Preference = Preference::new("u1", "display_settings", "use_military_time", "true");
    assert!(valid.is_valid().is_ok());

    let invalid: Preference = Preference::new("", "display_settings", "use_military_time", "true");
    assert_eq!(valid.is_valid(), validate_preference(&valid));
    assert_eq!(invalid.is_valid(), validate_preference(&invalid));
}
