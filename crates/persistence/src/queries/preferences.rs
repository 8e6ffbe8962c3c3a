// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Preference lookups.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use prefstore_domain::{Preference, PreferenceKey};

use crate::data_models::PreferenceRow;
use crate::diesel_schema::preferences;
use crate::error::PersistenceError;

backend_fn! {
/// Retrieves a single preference by its key triple.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `key` - The key triple
///
/// # Returns
///
/// `None` if no row exists for the key.
///
/// # Errors
///
/// Returns `StorageFailure` if the query fails.
pub fn get_preference(conn: &mut _, key: &PreferenceKey) -> Result<Option<Preference>, PersistenceError> {
    preferences::table
        .filter(preferences::user_id.eq(&key.user_id))
        .filter(preferences::category.eq(&key.category))
        .filter(preferences::name.eq(&key.name))
        .select(PreferenceRow::as_select())
        .first::<PreferenceRow>(conn)
        .optional()
        .map(|row| row.map(Preference::from))
        .map_err(|e| PersistenceError::storage("find preference", format!("key {key}"), &e))
}
}

backend_fn! {
/// Lists a user's preferences in one category, ordered by name.
///
/// # Errors
///
/// Returns `StorageFailure` if the query fails.
pub fn get_category(conn: &mut _, user_id: &str, category: &str) -> Result<Vec<Preference>, PersistenceError> {
    let rows: Vec<PreferenceRow> = preferences::table
        .filter(preferences::user_id.eq(user_id))
        .filter(preferences::category.eq(category))
        .order(preferences::name.asc())
        .select(PreferenceRow::as_select())
        .load(conn)
        .map_err(|e| {
            PersistenceError::storage(
                "find preferences",
                format!("user {user_id} and category {category}"),
                &e,
            )
        })?;

    Ok(rows.into_iter().map(Preference::from).collect())
}
}

backend_fn! {
/// Lists every preference a user holds, ordered by category then name.
///
/// # Errors
///
/// Returns `StorageFailure` if the query fails.
pub fn get_all(conn: &mut _, user_id: &str) -> Result<Vec<Preference>, PersistenceError> {
    let rows: Vec<PreferenceRow> = preferences::table
        .filter(preferences::user_id.eq(user_id))
        .order((preferences::category.asc(), preferences::name.asc()))
        .select(PreferenceRow::as_select())
        .load(conn)
        .map_err(|e| PersistenceError::storage("find preferences", format!("user {user_id}"), &e))?;

    Ok(rows.into_iter().map(Preference::from).collect())
}
}
