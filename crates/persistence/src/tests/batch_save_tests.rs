// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use diesel::SqliteConnection;
use prefstore_domain::{
    CATEGORY_FLAGGED_POST, CATEGORY_THEME, DomainError, Preference, PreferenceKey,
};

use super::{count_preference_rows, create_test_persistence, sqlite_conn};
use crate::mutations::upsert::insert_preference_sqlite;
use crate::{PersistenceError, UpsertStrategy, save_preferences_with};

/// Inserts without checking for an existing row.
struct InsertOnly;

impl UpsertStrategy<SqliteConnection> for InsertOnly {
    const NAME: &'static str = "insert-only";

    fn upsert(
        &self,
        conn: &mut SqliteConnection,
        preference: &Preference,
    ) -> Result<(), PersistenceError> {
        insert_preference_sqlite(conn, preference)
    }
}

/// Inserts, then panics on the second call.
#[derive(Default)]
struct PanicsOnSecond {
    calls: Cell<usize>,
}

impl UpsertStrategy<SqliteConnection> for PanicsOnSecond {
    const NAME: &'static str = "panics-on-second";

    fn upsert(
        &self,
        conn: &mut SqliteConnection,
        preference: &Preference,
    ) -> Result<(), PersistenceError> {
        self.calls.set(self.calls.get() + 1);
        assert!(self.calls.get() < 2, "upsert called twice");
        insert_preference_sqlite(conn, preference)
    }
}

#[test]
fn test_save_all_persists_every_record() {
    let mut persistence = create_test_persistence();

    let batch = vec![
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg2", "true"),
        Preference::new("u2", "display_settings", "use_military_time", "true"),
    ];
    persistence.save_all(&batch).expect("Failed to save batch");

    assert_eq!(count_preference_rows(&mut persistence), 3);
}

#[test]
fn test_save_all_empty_batch_is_ok() {
    let mut persistence = create_test_persistence();

    persistence.save_all(&[]).expect("Empty batch should succeed");

    assert_eq!(count_preference_rows(&mut persistence), 0);
}

#[test]
fn test_invalid_record_rolls_back_whole_batch() {
    let mut persistence = create_test_persistence();

    let batch = vec![
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg2", "true"),
        Preference::new("", CATEGORY_FLAGGED_POST, "msg3", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg4", "true"),
    ];

    let result = persistence.save_all(&batch);

    assert!(matches!(
        result,
        Err(PersistenceError::InvalidInput(DomainError::InvalidUserId { .. }))
    ));
    assert_eq!(
        count_preference_rows(&mut persistence),
        0,
        "No record from a failed batch may be committed"
    );
}

#[test]
fn test_failed_batch_leaves_existing_rows_untouched() {
    let mut persistence = create_test_persistence();
    persistence
        .save(&Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"))
        .expect("Failed to save");

    let batch = vec![
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "false"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg2", &"x".repeat(2001)),
    ];
    let result = persistence.save_all(&batch);

    assert!(matches!(
        result,
        Err(PersistenceError::InvalidInput(DomainError::InvalidValue { .. }))
    ));
    let stored = persistence
        .get("u1", CATEGORY_FLAGGED_POST, "msg1")
        .expect("Original row should survive");
    assert_eq!(stored.value, "true");
}

#[test]
fn test_store_usable_after_failed_batch() {
    let mut persistence = create_test_persistence();

    let bad = vec![Preference::new("u1", "", "msg1", "true")];
    assert!(persistence.save_all(&bad).is_err());

    persistence
        .save(&Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"))
        .expect("Store should accept writes after a rolled back batch");
    assert_eq!(count_preference_rows(&mut persistence), 1);
}

#[test]
fn test_later_record_in_batch_wins() {
    let mut persistence = create_test_persistence();

    let batch = vec![
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "false"),
    ];
    persistence.save_all(&batch).expect("Failed to save batch");

    assert_eq!(count_preference_rows(&mut persistence), 1);
    let stored = persistence
        .get("u1", CATEGORY_FLAGGED_POST, "msg1")
        .expect("Preference should exist");
    assert_eq!(stored.value, "false");
}

#[test]
fn test_theme_is_sanitized_before_storage() {
    let mut persistence = create_test_persistence();

    let theme = r##"{"sidebarBg":"red","centerChannelBg":"#abc","image":"bg.png","type":"custom"}"##;
    persistence
        .save(&Preference::new("u1", CATEGORY_THEME, "", theme))
        .expect("Failed to save theme");

    let stored = persistence
        .get("u1", CATEGORY_THEME, "")
        .expect("Theme should exist");
    let props: BTreeMap<String, String> =
        serde_json::from_str(&stored.value).expect("Stored theme should be a JSON object");

    assert_eq!(props["sidebarBg"], "#ffffff");
    assert_eq!(props["centerChannelBg"], "#abc");
    assert_eq!(props["image"], "bg.png");
    assert_eq!(props["type"], "custom");
}

#[test]
fn test_malformed_theme_is_rejected() {
    let mut persistence = create_test_persistence();

    let result = persistence.save(&Preference::new("u1", CATEGORY_THEME, "", "not json"));

    assert!(matches!(
        result,
        Err(PersistenceError::InvalidInput(DomainError::InvalidTheme(_)))
    ));
    assert_eq!(count_preference_rows(&mut persistence), 0);
}

#[test]
fn test_caller_records_are_not_mutated() {
    let mut persistence = create_test_persistence();

    let original = Preference::new("u1", CATEGORY_THEME, "", r#"{"sidebarBg":"red"}"#);
    let batch = vec![original.clone()];
    persistence.save_all(&batch).expect("Failed to save theme");

    assert_eq!(batch[0], original);
}

#[test]
fn test_conflict_mid_batch_rolls_back_whole_batch() {
    let mut persistence = create_test_persistence();

    let batch = vec![
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg2", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "false"),
    ];
    let result = save_preferences_with(sqlite_conn(&mut persistence), &InsertOnly, &batch);

    assert_eq!(
        result,
        Err(PersistenceError::Conflict {
            key: PreferenceKey::new("u1", CATEGORY_FLAGGED_POST, "msg1"),
        })
    );
    assert_eq!(count_preference_rows(&mut persistence), 0);

    persistence
        .save(&Preference::new("u1", CATEGORY_FLAGGED_POST, "msg3", "true"))
        .expect("Store should accept writes after a conflicting batch");
    assert_eq!(count_preference_rows(&mut persistence), 1);
}

#[test]
fn test_panic_mid_batch_rolls_back_whole_batch() {
    let mut persistence = create_test_persistence();

    let batch = vec![
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg1", "true"),
        Preference::new("u1", CATEGORY_FLAGGED_POST, "msg2", "true"),
    ];
    let strategy = PanicsOnSecond::default();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        save_preferences_with(sqlite_conn(&mut persistence), &strategy, &batch)
    }));

    assert!(outcome.is_err(), "The second upsert should panic");
    assert_eq!(strategy.calls.get(), 2);
    assert_eq!(count_preference_rows(&mut persistence), 0);

    persistence
        .save(&Preference::new("u1", CATEGORY_FLAGGED_POST, "msg3", "true"))
        .expect("Store should accept writes after a panicked batch");
    assert_eq!(count_preference_rows(&mut persistence), 1);
}
