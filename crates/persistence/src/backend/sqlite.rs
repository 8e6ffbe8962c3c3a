// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` connections.
//!
//! Opening a primary sets the connection PRAGMAs and runs the embedded
//! migrations. Replicas get the same lock wait but are switched to
//! `query_only`. Batch saves begin with `BEGIN IMMEDIATE` so the write lock
//! is held from the first count onward.

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::{Connection, QueryResult, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits on another connection's lock before
/// reporting `database is locked`.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(QueryableByName)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

// NOTE: PRAGMA is raw SQL (justified - Diesel has no PRAGMA DSL)
fn pragma(conn: &mut SqliteConnection, statement: &str) -> Result<(), PersistenceError> {
    debug!(statement, "Applying SQLite pragma");
    diesel::sql_query(statement)
        .execute(conn)
        .map(|_| ())
        .map_err(|e| PersistenceError::InitializationError(format!("{statement}: {e}")))
}

fn open(database_url: &str, pragmas: &[&str]) -> Result<SqliteConnection, PersistenceError> {
    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)?;
    pragma(&mut conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"))?;
    for statement in pragmas {
        pragma(&mut conn, statement)?;
    }
    Ok(conn)
}

/// Fails with `ForeignKeyEnforcementNotEnabled` unless `PRAGMA foreign_keys`
/// is on for this connection.
///
/// # Errors
///
/// Also returns `InitializationError` if the PRAGMA cannot be read.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys")
        .get_result(conn)
        .map_err(|e| PersistenceError::InitializationError(e.to_string()))?;

    if row.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    info!("SQLite foreign key enforcement is enabled");
    Ok(())
}

/// Applies any migration under `migrations/` not yet recorded.
///
/// # Errors
///
/// Returns the migration harness error.
pub fn run_migrations(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    info!(applied = applied.len(), "SQLite migrations complete");
    Ok(())
}

/// Opens the primary connection with foreign keys on and the schema
/// migrated.
///
/// # Errors
///
/// Returns `DatabaseConnectionFailed`, `InitializationError`, or
/// `MigrationFailed`.
pub fn initialize_database(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, "Opening SQLite primary");
    let mut conn: SqliteConnection = open(database_url, &["PRAGMA foreign_keys = ON"])?;
    run_migrations(&mut conn).map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    Ok(conn)
}

/// Opens a read-only connection for routed reads. The schema is owned by
/// the primary, so no migrations run here.
///
/// # Errors
///
/// Returns `DatabaseConnectionFailed` or `InitializationError`.
pub fn open_replica(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, "Opening SQLite read replica");
    open(database_url, &["PRAGMA query_only = ON"])
}

/// Switches a file database to write-ahead logging, so replica reads do not
/// wait on the primary's writes.
///
/// # Errors
///
/// Returns `InitializationError` if the PRAGMA fails.
pub fn enable_wal_mode(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    pragma(conn, "PRAGMA journal_mode = WAL")
}

/// Begins a transaction that holds the database write lock immediately.
///
/// A deferred `BEGIN` only takes the write lock on the first write, and
/// fails with `SQLITE_BUSY` if another connection committed in between.
/// Inside an open transaction this falls back to a savepoint.
///
/// # Errors
///
/// Returns the store error if the lock cannot be taken within
/// [`BUSY_TIMEOUT_MS`].
pub fn begin_immediate_transaction(conn: &mut SqliteConnection) -> QueryResult<()> {
    let depth = <AnsiTransactionManager as TransactionManager<SqliteConnection>>::transaction_manager_status_mut(conn)
        .transaction_depth()?;
    if depth.is_some() {
        return <AnsiTransactionManager as TransactionManager<SqliteConnection>>::begin_transaction(
            conn,
        );
    }
    AnsiTransactionManager::begin_transaction_sql(conn, "BEGIN IMMEDIATE")
}
