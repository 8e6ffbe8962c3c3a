// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! MySQL/MariaDB connections.
//!
//! Stores on this backend use [`crate::NativeUpsert`] and
//! [`crate::DerivedTableJoinDelete`]. Building the crate needs the `MySQL`
//! client libraries (`libmysqlclient-dev` or equivalent) and `pkg-config`;
//! there is no feature flag to leave the backend out.
//!
//! ## Tests
//!
//! The tests for this module live in `backend_validation_tests` and are
//! `#[ignore]`d. `cargo xtask test-mariadb` starts a `MariaDB` container,
//! exports `DATABASE_URL` and `PREFSTORE_TEST_BACKEND=mariadb`, runs the
//! ignored tests and removes the container.
//!
//! ## Migrations
//!
//! `migrations_mysql/` must describe the same schema as `migrations/`:
//! tables, columns, keys and indexes. `cargo xtask verify-migrations`
//! applies both and compares them.

use diesel::sql_types::Integer;
use diesel::{Connection, MysqlConnection, QueryableByName, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::error::PersistenceError;

/// The `MySQL` schema. Key columns are `VARCHAR`s sized to the validation
/// limits; tables are `InnoDB`, `utf8mb4` with the `utf8mb4_bin` collation
/// so keys compare case-sensitively as they do on `SQLite`.
pub const MYSQL_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations_mysql");

#[derive(QueryableByName)]
struct SessionVariable {
    #[diesel(sql_type = Integer)]
    value: i32,
}

/// Connects to `database_url` and applies pending migrations.
///
/// # Errors
///
/// Returns `DatabaseConnectionFailed` or `MigrationFailed`.
pub fn initialize_database(database_url: &str) -> Result<MysqlConnection, PersistenceError> {
    info!("Opening MySQL primary");
    let mut conn: MysqlConnection = MysqlConnection::establish(database_url)?;
    run_migrations(&mut conn).map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    Ok(conn)
}

/// Connects to a read replica. The replica receives its schema from the
/// primary through replication, so no migrations run here.
///
/// # Errors
///
/// Returns `DatabaseConnectionFailed`.
pub fn open_replica(database_url: &str) -> Result<MysqlConnection, PersistenceError> {
    info!("Opening MySQL read replica");
    Ok(MysqlConnection::establish(database_url)?)
}

/// Applies any migration under `migrations_mysql/` not yet recorded.
///
/// # Errors
///
/// Returns the migration harness error.
pub fn run_migrations(
    conn: &mut MysqlConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let applied = conn.run_pending_migrations(MYSQL_MIGRATIONS)?;
    info!(applied = applied.len(), "MySQL migrations complete");
    Ok(())
}

/// Fails with `ForeignKeyEnforcementNotEnabled` if the session has
/// `foreign_key_checks` switched off.
///
/// # Errors
///
/// Also returns `InitializationError` if the variable cannot be read.
pub fn verify_foreign_key_enforcement(conn: &mut MysqlConnection) -> Result<(), PersistenceError> {
    // NOTE: This is raw SQL (justified - Diesel has no system variable query DSL)
    let checks: SessionVariable = diesel::sql_query("SELECT @@foreign_key_checks AS value")
        .get_result(conn)
        .map_err(|e| {
            PersistenceError::InitializationError(format!("foreign_key_checks: {e}"))
        })?;

    if checks.value != 1 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    info!("MySQL foreign key checks are on");
    Ok(())
}
