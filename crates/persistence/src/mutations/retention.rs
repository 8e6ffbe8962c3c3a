// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Retention-driven batch deletion of preference rows.
//!
//! A preference row in a designated category names a post. Whether that row
//! may be removed is decided by a [`RetentionRule`], which renders the
//! eligibility query: a join from preferences through posts, channels and
//! teams to the granular retention policies. The rule renders the same query
//! for the inspect phase (counting) and the delete phase.
//!
//! The delete itself takes one of two physical forms, chosen per backend
//! through [`DeleteExecutor`]. Both consume the eligibility query verbatim
//! and remove at most `limit` rows per call.
//!
//! All statements take three positional parameters in this order:
//! category, time bound (cutoff or now, epoch millis), row limit.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::{MysqlConnection, SqliteConnection};
use num_traits::ToPrimitive;
use prefstore_domain::MILLIS_PER_DAY;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::error::PersistenceError;

/// The predicate deciding which preference rows a sweep may remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionRule {
    /// Rows whose post was created before `cutoff` and whose channel and
    /// team carry no granular retention policy at all.
    Unretained {
        /// Epoch milliseconds; posts created strictly earlier qualify.
        cutoff: i64,
    },
    /// Rows whose post is older than the applicable policy's duration
    /// (channel policy before team policy), or whose post no longer exists.
    PolicyExpired {
        /// Epoch milliseconds the post age is measured against.
        now: i64,
    },
}

impl RetentionRule {
    /// Value bound to the second statement parameter.
    #[must_use]
    pub const fn time_bound(&self) -> i64 {
        match self {
            Self::Unretained { cutoff } => *cutoff,
            Self::PolicyExpired { now } => *now,
        }
    }

    /// Operation name used in errors and logs.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Unretained { .. } => "delete unretained flags",
            Self::PolicyExpired { .. } => "delete unretained flags for policies",
        }
    }

    /// Renders the eligibility query.
    ///
    /// The query selects the full key triple of every eligible row, filtered
    /// to one category and capped by the limit parameter.
    #[must_use]
    pub fn eligible_rows(&self) -> String {
        // NOTE: This is raw SQL (justified - the join reaches tables this
        // crate only reads, and the fragment must be embedded verbatim in
        // two different DELETE forms)
        match self {
            Self::Unretained { .. } => "SELECT preferences.user_id, preferences.category, preferences.name \
                 FROM preferences \
                 LEFT JOIN posts ON preferences.name = posts.id \
                 LEFT JOIN channels ON posts.channel_id = channels.id \
                 LEFT JOIN teams ON channels.team_id = teams.id \
                 LEFT JOIN retention_policies_channels ON posts.channel_id = retention_policies_channels.channel_id \
                 LEFT JOIN retention_policies_teams ON channels.team_id = retention_policies_teams.team_id \
                 WHERE preferences.category = ? \
                 AND retention_policies_channels.channel_id IS NULL \
                 AND retention_policies_teams.team_id IS NULL \
                 AND posts.create_at < ? \
                 LIMIT ?"
                .to_string(),
            Self::PolicyExpired { .. } => format!(
                "SELECT preferences.user_id, preferences.category, preferences.name \
                 FROM preferences \
                 LEFT JOIN posts ON preferences.name = posts.id \
                 LEFT JOIN channels ON posts.channel_id = channels.id \
                 LEFT JOIN retention_policies_channels ON posts.channel_id = retention_policies_channels.channel_id \
                 LEFT JOIN retention_policies_teams ON channels.team_id = retention_policies_teams.team_id \
                 LEFT JOIN retention_policies ON \
                 retention_policies_channels.policy_id = retention_policies.id \
                 OR (retention_policies_channels.policy_id IS NULL \
                 AND retention_policies_teams.policy_id = retention_policies.id) \
                 WHERE preferences.category = ? \
                 AND (? - posts.create_at >= retention_policies.post_duration * {MILLIS_PER_DAY} \
                 OR posts.id IS NULL) \
                 LIMIT ?"
            ),
        }
    }
}

/// Physical form of a bounded delete over an eligibility query.
pub trait DeleteExecutor {
    /// Short name used in log output.
    const NAME: &'static str;

    /// Wraps `eligible_rows` in a `DELETE` that removes exactly the rows it
    /// selects.
    fn delete_statement(&self, eligible_rows: &str) -> String;
}

/// `DELETE ... WHERE (key) IN (eligible LIMIT ?)`.
///
/// Requires a store that accepts `LIMIT` inside an `IN` subquery.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubqueryLimitedDelete;

/// `DELETE ... INNER JOIN (eligible LIMIT ?) AS eligible ON key = key`.
///
/// For stores that reject `LIMIT` inside `IN` but accept it in a derived
/// table.
#[derive(Debug, Default, Clone, Copy)]
pub struct DerivedTableJoinDelete;

impl DeleteExecutor for SubqueryLimitedDelete {
    const NAME: &'static str = "subquery-limited";

    fn delete_statement(&self, eligible_rows: &str) -> String {
        format!("DELETE FROM preferences WHERE (user_id, category, name) IN ({eligible_rows})")
    }
}

impl DeleteExecutor for DerivedTableJoinDelete {
    const NAME: &'static str = "derived-table-join";

    fn delete_statement(&self, eligible_rows: &str) -> String {
        format!(
            "DELETE preferences FROM preferences \
             INNER JOIN ({eligible_rows}) AS eligible \
             ON preferences.user_id = eligible.user_id \
             AND preferences.category = eligible.category \
             AND preferences.name = eligible.name"
        )
    }
}

backend_fn! {
/// Executes a rendered retention statement, returning the rows affected.
///
/// # Errors
///
/// Returns the store error unchanged.
pub fn execute_retention_statement(
    conn: &mut _,
    statement: &str,
    category: &str,
    time_bound: i64,
    limit: i64,
) -> Result<usize, diesel::result::Error> {
    diesel::sql_query(statement)
        .bind::<Text, _>(category)
        .bind::<BigInt, _>(time_bound)
        .bind::<BigInt, _>(limit)
        .execute(conn)
}
}

/// Deletes at most `limit` rows that `rule` deems eligible.
///
/// The row count reported by the store is returned verbatim. A caller
/// sweeping a category calls this repeatedly until it returns zero.
///
/// # Arguments
///
/// * `conn` - The primary connection
/// * `rule` - The eligibility rule
/// * `category` - Preference category to sweep
/// * `limit` - Maximum number of rows to remove
///
/// # Errors
///
/// Returns `StorageFailure` carrying the operation and category.
pub fn delete_eligible<C: PersistenceBackend>(
    conn: &mut C,
    rule: &RetentionRule,
    category: &str,
    limit: u64,
) -> Result<usize, PersistenceError> {
    let executor: C::Delete = C::Delete::default();
    let statement: String = executor.delete_statement(&rule.eligible_rows());
    let bounded_limit: i64 = limit.to_i64().unwrap_or(i64::MAX);

    debug!(
        dialect = %C::DIALECT,
        executor = <C::Delete as DeleteExecutor>::NAME,
        category,
        limit,
        "Running retention delete"
    );

    let deleted: usize = conn
        .execute_retention_statement(&statement, category, rule.time_bound(), bounded_limit)
        .map_err(|e| PersistenceError::storage(rule.operation(), format!("category {category}"), &e))?;

    info!(category, deleted, limit, "{}", rule.operation());
    Ok(deleted)
}
