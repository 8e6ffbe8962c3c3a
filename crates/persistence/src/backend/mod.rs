// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates backend-specific initialization, migration,
//! and the choice of upsert and retention-delete strategy for each backend.
//!
//! ## Backend Support
//!
//! | Dialect  | Upsert                          | Retention delete                     |
//! |----------|---------------------------------|--------------------------------------|
//! | `sqlite` | [`EmulatedUpsert`] (count, then update or insert) | [`SubqueryLimitedDelete`] |
//! | `mysql`  | [`NativeUpsert`] (`ON DUPLICATE KEY UPDATE`)      | [`DerivedTableJoinDelete`] |
//!
//! The strategy pair is bound to the connection type through
//! [`PersistenceBackend`], so it is chosen once per backend and never
//! re-detected per call.

pub mod mysql;
pub mod sqlite;

use std::str::FromStr;

use diesel::connection::TransactionManager;
use diesel::{Connection, MysqlConnection, SqliteConnection};

use crate::error::PersistenceError;
use crate::mutations::retention::{
    DeleteExecutor, DerivedTableJoinDelete, SubqueryLimitedDelete,
    execute_retention_statement_mysql, execute_retention_statement_sqlite,
};
use crate::mutations::upsert::{EmulatedUpsert, NativeUpsert, UpsertStrategy};
use crate::queries::retention::{count_retention_rows_mysql, count_retention_rows_sqlite};

/// The relational backend in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `SQLite`. Lacks a row-replacing upsert in the statements this crate
    /// issues, but accepts `LIMIT` inside an `IN` subquery.
    Sqlite,
    /// MySQL/MariaDB. Has `ON DUPLICATE KEY UPDATE`, but rejects `LIMIT`
    /// inside an `IN` subquery.
    Mysql,
}

impl Dialect {
    /// Resolves a driver name to a dialect.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBackend` for any driver other than `sqlite`,
    /// `sqlite3`, `mysql`, or `mariadb`.
    pub fn from_driver_name(driver: &str) -> Result<Self, PersistenceError> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            _ => Err(PersistenceError::UnsupportedBackend {
                driver: driver.to_string(),
            }),
        }
    }

    /// Returns the canonical driver name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
        }
    }
}

impl FromStr for Dialect {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_driver_name(s)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for backend-specific operations.
///
/// This trait provides a unified interface for operations that cannot be
/// expressed in backend-agnostic Diesel DSL, and binds each connection type
/// to the upsert strategy and delete executor its dialect requires.
///
/// Orchestration code (the batch save coordinator and the retention
/// deleter) is generic over this trait and therefore has a single
/// implementation for both backends.
pub trait PersistenceBackend: Connection {
    /// The dialect this connection speaks.
    const DIALECT: Dialect;

    /// Insert-or-update strategy used by the batch save coordinator.
    type Upsert: UpsertStrategy<Self> + Default;

    /// Physical form of the bounded retention delete.
    type Delete: DeleteExecutor + Default;

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// This is a startup-time check to ensure referential integrity
    /// constraints are enforced by the database backend.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError>;

    /// Opens the transaction a batch save runs in.
    ///
    /// Defaults to the connection's ordinary begin. A backend whose plain
    /// begin defers the write lock overrides this so that a count taken
    /// inside the batch stays valid until commit.
    ///
    /// # Errors
    ///
    /// Returns the store error if the transaction cannot be opened.
    fn begin_write_transaction(&mut self) -> Result<(), diesel::result::Error> {
        <Self::TransactionManager as TransactionManager<Self>>::begin_transaction(self)
    }

    /// Executes a retention delete statement, returning the rows affected.
    ///
    /// The statement takes three positional parameters: category,
    /// time bound, and row limit.
    ///
    /// # Errors
    ///
    /// Returns the store error if the statement fails.
    fn execute_retention_statement(
        &mut self,
        statement: &str,
        category: &str,
        time_bound: i64,
        limit: i64,
    ) -> Result<usize, diesel::result::Error>;

    /// Executes a retention count statement with the same parameters as
    /// [`PersistenceBackend::execute_retention_statement`].
    ///
    /// # Errors
    ///
    /// Returns the store error if the statement fails.
    fn count_retention_rows(
        &mut self,
        statement: &str,
        category: &str,
        time_bound: i64,
        limit: i64,
    ) -> Result<i64, diesel::result::Error>;
}

impl PersistenceBackend for SqliteConnection {
    const DIALECT: Dialect = Dialect::Sqlite;
    type Upsert = EmulatedUpsert;
    type Delete = SubqueryLimitedDelete;

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(self)
    }

    fn begin_write_transaction(&mut self) -> Result<(), diesel::result::Error> {
        sqlite::begin_immediate_transaction(self)
    }

    fn execute_retention_statement(
        &mut self,
        statement: &str,
        category: &str,
        time_bound: i64,
        limit: i64,
    ) -> Result<usize, diesel::result::Error> {
        execute_retention_statement_sqlite(self, statement, category, time_bound, limit)
    }

    fn count_retention_rows(
        &mut self,
        statement: &str,
        category: &str,
        time_bound: i64,
        limit: i64,
    ) -> Result<i64, diesel::result::Error> {
        count_retention_rows_sqlite(self, statement, category, time_bound, limit)
    }
}

impl PersistenceBackend for MysqlConnection {
    const DIALECT: Dialect = Dialect::Mysql;
    type Upsert = NativeUpsert;
    type Delete = DerivedTableJoinDelete;

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        mysql::verify_foreign_key_enforcement(self)
    }

    fn execute_retention_statement(
        &mut self,
        statement: &str,
        category: &str,
        time_bound: i64,
        limit: i64,
    ) -> Result<usize, diesel::result::Error> {
        execute_retention_statement_mysql(self, statement, category, time_bound, limit)
    }

    fn count_retention_rows(
        &mut self,
        statement: &str,
        category: &str,
        time_bound: i64,
        limit: i64,
    ) -> Result<i64, diesel::result::Error> {
        count_retention_rows_mysql(self, statement, category, time_bound, limit)
    }
}
