// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Preference writes: the batch save coordinator and delete-by-key operations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use prefstore_domain::{
    CATEGORY_ADVANCED_SETTINGS, FEATURE_TOGGLE_PREFIX, Preference,
};
use tracing::{info, warn};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::preferences;
use crate::error::PersistenceError;
use crate::mutations::upsert::UpsertStrategy;
use crate::transaction::TransactionGuard;

/// Saves a batch of preferences with the backend's upsert strategy.
///
/// # Errors
///
/// See [`save_preferences_with`].
pub fn save_preferences<C: PersistenceBackend>(
    conn: &mut C,
    preferences: &[Preference],
) -> Result<(), PersistenceError> {
    let strategy: C::Upsert = C::Upsert::default();
    save_preferences_with(conn, &strategy, preferences)
}

/// Saves a batch of preferences in one transaction using `strategy`.
///
/// The transaction is opened with [`TransactionGuard::begin_write`], so
/// on `SQLite` no other writer can commit between a record's count and its
/// insert. Each record is copied, passed through [`Preference::pre_update`],
/// validated, then upserted, in input order. Later records observe the
/// effects of earlier ones. The first failure rolls back the whole batch
/// and is returned; nothing from the batch is committed.
///
/// # Arguments
///
/// * `conn` - The primary connection
/// * `strategy` - Insert-or-update implementation to apply per record
/// * `preferences` - The records to persist
///
/// # Errors
///
/// Returns:
/// - `InvalidInput` if a record fails validation
/// - `Conflict` or `StorageFailure` from the upsert
/// - `TransactionFailure` if begin, commit, or rollback fails
pub fn save_preferences_with<C, S>(
    conn: &mut C,
    strategy: &S,
    preferences: &[Preference],
) -> Result<(), PersistenceError>
where
    C: PersistenceBackend,
    S: UpsertStrategy<C>,
{
    let mut tx: TransactionGuard<'_, C> = TransactionGuard::begin_write(conn)?;

    for (index, original) in preferences.iter().enumerate() {
        let mut preference: Preference = original.clone();
        preference.pre_update();

        let outcome: Result<(), PersistenceError> = preference
            .is_valid()
            .map_err(PersistenceError::from)
            .and_then(|()| strategy.upsert(tx.connection(), &preference));

        if let Err(err) = outcome {
            warn!(
                index,
                key = %preference.key(),
                error = %err,
                "Aborting preference batch"
            );
            return Err(tx.abort(err));
        }
    }

    tx.commit()?;

    info!(
        count = preferences.len(),
        strategy = S::NAME,
        "Saved preference batch"
    );
    Ok(())
}

backend_fn! {
/// Deletes every preference belonging to a user.
///
/// # Errors
///
/// Returns `StorageFailure` if the delete fails.
pub fn delete_preferences_by_user(conn: &mut _, user_id: &str) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(preferences::table.filter(preferences::user_id.eq(user_id)))
        .execute(conn)
        .map_err(|e| PersistenceError::storage("delete preferences", format!("user {user_id}"), &e))?;

    info!(user_id, deleted, "Deleted preferences for user");
    Ok(deleted)
}
}

backend_fn! {
/// Deletes a single preference by its key triple.
///
/// # Errors
///
/// Returns `StorageFailure` if the delete fails.
pub fn delete_preference(
    conn: &mut _,
    user_id: &str,
    category: &str,
    name: &str,
) -> Result<usize, PersistenceError> {
    diesel::delete(
        preferences::table
            .filter(preferences::user_id.eq(user_id))
            .filter(preferences::category.eq(category))
            .filter(preferences::name.eq(name)),
    )
    .execute(conn)
    .map_err(|e| {
        PersistenceError::storage(
            "delete preference",
            format!("key <{user_id}, {category}, {name}>"),
            &e,
        )
    })
}
}

backend_fn! {
/// Deletes every preference a user holds in one category.
///
/// # Errors
///
/// Returns `StorageFailure` if the delete fails.
pub fn delete_preferences_by_category(
    conn: &mut _,
    user_id: &str,
    category: &str,
) -> Result<usize, PersistenceError> {
    diesel::delete(
        preferences::table
            .filter(preferences::user_id.eq(user_id))
            .filter(preferences::category.eq(category)),
    )
    .execute(conn)
    .map_err(|e| {
        PersistenceError::storage(
            "delete preferences",
            format!("user {user_id} and category {category}"),
            &e,
        )
    })
}
}

backend_fn! {
/// Deletes a named preference across all users.
///
/// # Errors
///
/// Returns `StorageFailure` if the delete fails.
pub fn delete_preferences_by_category_and_name(
    conn: &mut _,
    category: &str,
    name: &str,
) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(
        preferences::table
            .filter(preferences::category.eq(category))
            .filter(preferences::name.eq(name)),
    )
    .execute(conn)
    .map_err(|e| {
        PersistenceError::storage(
            "delete preferences",
            format!("category {category} and name {name}"),
            &e,
        )
    })?;

    info!(category, name, deleted, "Deleted preferences by category and name");
    Ok(deleted)
}
}

backend_fn! {
/// Deletes disabled feature toggles from the advanced settings category.
///
/// A row qualifies when its value is `"false"` and its name starts with
/// the feature toggle prefix.
///
/// # Errors
///
/// Returns `StorageFailure` if the delete fails.
pub fn delete_unused_features(conn: &mut _) -> Result<usize, PersistenceError> {
    let pattern: String = format!("{FEATURE_TOGGLE_PREFIX}%");

    let deleted: usize = diesel::delete(
        preferences::table
            .filter(preferences::category.eq(CATEGORY_ADVANCED_SETTINGS))
            .filter(preferences::value.eq("false"))
            .filter(preferences::name.like(&pattern)),
    )
    .execute(conn)
    .map_err(|e| {
        PersistenceError::storage(
            "delete unused features",
            format!("category {CATEGORY_ADVANCED_SETTINGS}"),
            &e,
        )
    })?;

    info!(deleted, "Deleted unused feature toggles");
    Ok(deleted)
}
}
