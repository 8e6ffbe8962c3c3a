// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inspect phase of the retention sweep.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::{MysqlConnection, SqliteConnection};
use num_traits::ToPrimitive;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::data_models::CountRow;
use crate::error::PersistenceError;
use crate::mutations::retention::RetentionRule;

/// Wraps an eligibility query in a row count.
#[must_use]
pub fn count_statement(eligible_rows: &str) -> String {
    format!("SELECT COUNT(*) AS count FROM ({eligible_rows}) AS eligible")
}

backend_fn! {
/// Executes a rendered count statement.
///
/// # Errors
///
/// Returns the store error unchanged.
pub fn count_retention_rows(
    conn: &mut _,
    statement: &str,
    category: &str,
    time_bound: i64,
    limit: i64,
) -> Result<i64, diesel::result::Error> {
    diesel::sql_query(statement)
        .bind::<Text, _>(category)
        .bind::<BigInt, _>(time_bound)
        .bind::<BigInt, _>(limit)
        .get_result::<CountRow>(conn)
        .map(|row| row.count)
}
}

/// Counts the rows `rule` currently deems eligible in `category`.
///
/// Uses the same eligibility query as [`crate::mutations::delete_eligible`]
/// with no row limit.
///
/// # Errors
///
/// Returns `StorageFailure` carrying the operation and category.
pub fn count_eligible<C: PersistenceBackend>(
    conn: &mut C,
    rule: &RetentionRule,
    category: &str,
) -> Result<usize, PersistenceError> {
    let statement: String = count_statement(&rule.eligible_rows());

    let count: i64 = conn
        .count_retention_rows(&statement, category, rule.time_bound(), i64::MAX)
        .map_err(|e| {
            PersistenceError::storage("count eligible preferences", format!("category {category}"), &e)
        })?;

    debug!(dialect = %C::DIALECT, category, count, "Counted eligible preferences");
    Ok(count.to_usize().unwrap_or(0))
}
