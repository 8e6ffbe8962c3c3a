// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Insert-or-update strategies for preference rows.
//!
//! Two strategies exist with identical observable results:
//!
//! - [`NativeUpsert`] issues a single statement that inserts the row or
//!   replaces its value when the key triple already exists.
//! - [`EmulatedUpsert`] counts rows with the key triple, then updates the
//!   value when exactly one exists and inserts otherwise.
//!
//! Both run on whatever transaction the caller has open.

use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::upsert::excluded;
use diesel::{MysqlConnection, SqliteConnection};
use prefstore_domain::{Preference, PreferenceKey};
use tracing::debug;

use crate::data_models::NewPreference;
use crate::diesel_schema::preferences;
use crate::error::{PersistenceError, is_unique_violation};

/// Writes one preference so that afterwards exactly one row exists for its
/// key, holding its value.
pub trait UpsertStrategy<C> {
    /// Short name used in log output.
    const NAME: &'static str;

    /// Inserts or updates `preference` on `conn`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when an insert collides with an existing key, or
    /// `StorageFailure` for any other store error.
    fn upsert(&self, conn: &mut C, preference: &Preference) -> Result<(), PersistenceError>;
}

/// Single-statement insert-or-replace.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeUpsert;

/// Count, then update or insert.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmulatedUpsert;

fn key_context(key: &PreferenceKey) -> String {
    format!("key {key}")
}

fn classify_write_error(preference: &Preference, err: &diesel::result::Error) -> PersistenceError {
    if is_unique_violation(err) {
        PersistenceError::Conflict {
            key: preference.key(),
        }
    } else {
        PersistenceError::storage("save preference", key_context(&preference.key()), err)
    }
}

backend_fn! {
/// Counts rows matching the full key triple of `preference`.
///
/// # Errors
///
/// Returns `StorageFailure` if the query fails.
pub fn count_preferences_by_key(conn: &mut _, preference: &Preference) -> Result<i64, PersistenceError> {
    preferences::table
        .filter(preferences::user_id.eq(&preference.user_id))
        .filter(preferences::category.eq(&preference.category))
        .filter(preferences::name.eq(&preference.name))
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::storage("count preference", key_context(&preference.key()), &e))
}
}

backend_fn! {
/// Replaces the value of the row matching the key triple of `preference`.
///
/// # Errors
///
/// Returns `StorageFailure` if the update fails.
pub fn update_preference_value(conn: &mut _, preference: &Preference) -> Result<usize, PersistenceError> {
    diesel::update(
        preferences::table
            .filter(preferences::user_id.eq(&preference.user_id))
            .filter(preferences::category.eq(&preference.category))
            .filter(preferences::name.eq(&preference.name)),
    )
    .set(preferences::value.eq(&preference.value))
    .execute(conn)
    .map_err(|e| PersistenceError::storage("update preference", key_context(&preference.key()), &e))
}
}

backend_fn! {
/// Inserts `preference` as a new row.
///
/// # Errors
///
/// Returns `Conflict` if a row with the same key triple already exists, and
/// `StorageFailure` for any other store error.
pub fn insert_preference(conn: &mut _, preference: &Preference) -> Result<(), PersistenceError> {
    diesel::insert_into(preferences::table)
        .values(NewPreference::from(preference))
        .execute(conn)
        .map(|_| ())
        .map_err(|e| classify_write_error(preference, &e))
}
}

impl UpsertStrategy<SqliteConnection> for EmulatedUpsert {
    const NAME: &'static str = "emulated";

    fn upsert(
        &self,
        conn: &mut SqliteConnection,
        preference: &Preference,
    ) -> Result<(), PersistenceError> {
        if count_preferences_by_key_sqlite(conn, preference)? == 1 {
            debug!(key = %preference.key(), "Updating existing preference");
            update_preference_value_sqlite(conn, preference)?;
            Ok(())
        } else {
            debug!(key = %preference.key(), "Inserting new preference");
            insert_preference_sqlite(conn, preference)
        }
    }
}

impl UpsertStrategy<MysqlConnection> for EmulatedUpsert {
    const NAME: &'static str = "emulated";

    fn upsert(
        &self,
        conn: &mut MysqlConnection,
        preference: &Preference,
    ) -> Result<(), PersistenceError> {
        if count_preferences_by_key_mysql(conn, preference)? == 1 {
            debug!(key = %preference.key(), "Updating existing preference");
            update_preference_value_mysql(conn, preference)?;
            Ok(())
        } else {
            debug!(key = %preference.key(), "Inserting new preference");
            insert_preference_mysql(conn, preference)
        }
    }
}

impl UpsertStrategy<MysqlConnection> for NativeUpsert {
    const NAME: &'static str = "native";

    fn upsert(
        &self,
        conn: &mut MysqlConnection,
        preference: &Preference,
    ) -> Result<(), PersistenceError> {
        // NOTE: This is raw SQL (justified - Diesel's MySQL upsert DSL cannot
        // express ON DUPLICATE KEY UPDATE with a bound value)
        diesel::sql_query(
            "INSERT INTO preferences (user_id, category, name, value) VALUES (?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE value = ?",
        )
        .bind::<Text, _>(&preference.user_id)
        .bind::<Text, _>(&preference.category)
        .bind::<Text, _>(&preference.name)
        .bind::<Text, _>(&preference.value)
        .bind::<Text, _>(&preference.value)
        .execute(conn)
        .map(|_| ())
        .map_err(|e| classify_write_error(preference, &e))
    }
}

/// `SQLite` also accepts a conflict clause on the primary key. Production
/// `SQLite` deployments use [`EmulatedUpsert`]; this implementation exists
/// so both strategies can be checked against the same database.
impl UpsertStrategy<SqliteConnection> for NativeUpsert {
    const NAME: &'static str = "native";

    fn upsert(
        &self,
        conn: &mut SqliteConnection,
        preference: &Preference,
    ) -> Result<(), PersistenceError> {
        diesel::insert_into(preferences::table)
            .values(NewPreference::from(preference))
            .on_conflict((
                preferences::user_id,
                preferences::category,
                preferences::name,
            ))
            .do_update()
            .set(preferences::value.eq(excluded(preferences::value)))
            .execute(conn)
            .map(|_| ())
            .map_err(|e| classify_write_error(preference, &e))
    }
}
