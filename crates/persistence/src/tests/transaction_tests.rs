// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use prefstore_domain::{CATEGORY_FLAGGED_POST, Preference, PreferenceKey};

use super::{count_preference_rows, create_test_persistence, sqlite_conn};
use crate::mutations::upsert::insert_preference_sqlite;
use crate::{PersistenceError, TransactionGuard};

fn flag(name: &str) -> Preference {
    Preference::new("u1", CATEGORY_FLAGGED_POST, name, "true")
}

fn transaction_depth(conn: &mut SqliteConnection) -> u32 {
    <AnsiTransactionManager as TransactionManager<SqliteConnection>>::transaction_manager_status_mut(conn)
        .transaction_depth()
        .ok()
        .flatten()
        .map_or(0, std::num::NonZeroU32::get)
}

#[test]
fn test_commit_persists_writes() {
    let mut persistence = create_test_persistence();

    let mut tx = TransactionGuard::begin(sqlite_conn(&mut persistence))
        .expect("Failed to begin transaction");
    insert_preference_sqlite(tx.connection(), &flag("msg1")).expect("Failed to insert");
    tx.commit().expect("Failed to commit");

    assert_eq!(count_preference_rows(&mut persistence), 1);
}

#[test]
fn test_drop_without_commit_rolls_back() {
    let mut persistence = create_test_persistence();

    {
        let mut tx = TransactionGuard::begin(sqlite_conn(&mut persistence))
            .expect("Failed to begin transaction");
        insert_preference_sqlite(tx.connection(), &flag("msg1")).expect("Failed to insert");
    }

    assert_eq!(count_preference_rows(&mut persistence), 0);
    assert_eq!(transaction_depth(sqlite_conn(&mut persistence)), 0);
}

#[test]
fn test_explicit_rollback() {
    let mut persistence = create_test_persistence();

    let mut tx = TransactionGuard::begin(sqlite_conn(&mut persistence))
        .expect("Failed to begin transaction");
    insert_preference_sqlite(tx.connection(), &flag("msg1")).expect("Failed to insert");
    insert_preference_sqlite(tx.connection(), &flag("msg2")).expect("Failed to insert");
    tx.rollback().expect("Failed to roll back");

    assert_eq!(count_preference_rows(&mut persistence), 0);
}

#[test]
fn test_abort_returns_cause_after_rollback() {
    let mut persistence = create_test_persistence();

    let mut tx = TransactionGuard::begin(sqlite_conn(&mut persistence))
        .expect("Failed to begin transaction");
    insert_preference_sqlite(tx.connection(), &flag("msg1")).expect("Failed to insert");
    let cause = insert_preference_sqlite(tx.connection(), &flag("msg1"))
        .expect_err("Duplicate insert should conflict");

    let returned = tx.abort(cause);

    assert_eq!(
        returned,
        PersistenceError::Conflict {
            key: PreferenceKey::new("u1", CATEGORY_FLAGGED_POST, "msg1"),
        }
    );
    assert_eq!(count_preference_rows(&mut persistence), 0);
}

#[test]
fn test_nested_begin_uses_savepoint() {
    let mut persistence = create_test_persistence();

    let mut outer = TransactionGuard::begin(sqlite_conn(&mut persistence))
        .expect("Failed to begin transaction");
    insert_preference_sqlite(outer.connection(), &flag("msg1")).expect("Failed to insert");
    {
        let mut inner = TransactionGuard::begin(outer.connection())
            .expect("Failed to begin nested transaction");
        insert_preference_sqlite(inner.connection(), &flag("msg2")).expect("Failed to insert");
    }
    outer.commit().expect("Failed to commit");

    let stored = persistence.get_all("u1").expect("Query should succeed");
    let names: Vec<&str> = stored.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["msg1"], "Only the inner savepoint is rolled back");
}

#[test]
fn test_begin_write_commits_and_nests() {
    let mut persistence = create_test_persistence();

    let mut outer = TransactionGuard::begin_write(sqlite_conn(&mut persistence))
        .expect("Failed to begin write transaction");
    assert_eq!(transaction_depth(outer.connection()), 1);
    insert_preference_sqlite(outer.connection(), &flag("msg1")).expect("Failed to insert");
    {
        let mut inner = TransactionGuard::begin_write(outer.connection())
            .expect("Nested write transaction should use a savepoint");
        assert_eq!(transaction_depth(inner.connection()), 2);
        insert_preference_sqlite(inner.connection(), &flag("msg2")).expect("Failed to insert");
    }
    outer.commit().expect("Failed to commit");

    assert_eq!(count_preference_rows(&mut persistence), 1);
    assert_eq!(transaction_depth(sqlite_conn(&mut persistence)), 0);
}

#[test]
fn test_transaction_failure_message() {
    let err = PersistenceError::TransactionFailure {
        operation: "commit_transaction",
        reason: "disk I/O error".to_string(),
    };

    assert_eq!(
        err.to_string(),
        "Transaction failure during commit_transaction: disk I/O error"
    );
}
