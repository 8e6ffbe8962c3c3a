// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Workspace automation, run as `cargo xtask <command>`.
//!
//! `cargo xtask test` covers everything that runs on `SQLite` alone.
//! `test-mariadb` and `verify-migrations` each start a throwaway `MariaDB`
//! container with Docker and remove it when they finish, pass or fail. The
//! `MariaDB` tests are `#[ignore]`d, so a plain `cargo test` never needs a
//! database server.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod mariadb;
mod schema;

use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use diesel::{Connection, MysqlConnection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing_log::AsTrace;

use crate::mariadb::MariadbContainer;

const PERSISTENCE_PACKAGE: &str = "prefstore-persistence";

const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");
const MYSQL_MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../crates/persistence/migrations_mysql");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbosity.log_level_filter().as_trace())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[derive(Clone, Copy, Debug, Subcommand)]
enum Command {
    /// Formatting, clippy, docs, build, tests, `MariaDB` tests, migration parity
    Ci,

    /// Build every target
    #[command(visible_alias = "b")]
    Build,

    /// Run clippy with warnings denied
    #[command(visible_alias = "cl")]
    Clippy {
        /// Apply clippy's suggestions to the working tree
        #[arg(long)]
        fix: bool,
    },

    /// Format the workspace with nightly rustfmt
    #[command(visible_alias = "fmt")]
    Format {
        /// Report unformatted files instead of rewriting them
        #[arg(long)]
        check: bool,
    },

    /// Build docs for each workspace crate with docs.rs flags
    #[command(visible_alias = "d")]
    Docs,

    /// Run the `SQLite` test suite and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Run `MariaDB` backend validation tests
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Verify schema parity between `SQLite` and `MySQL` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    const CI_STEPS: [Self; 7] = [
        Self::Format { check: true },
        Self::Clippy { fix: false },
        Self::Docs,
        Self::Build,
        Self::Test,
        Self::TestMariadb,
        Self::VerifyMigrations,
    ];

    fn run(self) -> Result<()> {
        match self {
            Self::Ci => Self::CI_STEPS.into_iter().try_for_each(Self::run),
            Self::Build => cargo(&["build", "--all-targets", "--all-features"]),
            Self::Clippy { fix: false } => cargo(&[
                "clippy",
                "--all-targets",
                "--all-features",
                "--",
                "-D",
                "warnings",
            ]),
            Self::Clippy { fix: true } => cargo(&[
                "clippy",
                "--all-targets",
                "--all-features",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
            ]),
            Self::Format { check: false } => nightly(cmd!("cargo", "fmt", "--all")),
            Self::Format { check: true } => nightly(cmd!("cargo", "fmt", "--all", "--check")),
            Self::Docs => docs(),
            Self::Test => {
                cargo(&["test", "--all-targets", "--all-features"])?;
                cargo(&["test", "--doc", "--all-features"])
            }
            Self::TestMariadb => test_mariadb(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args.iter().copied()).run_with_trace()?;
    Ok(())
}

/// Runs `expression` under the nightly toolchain.
fn nightly(expression: duct::Expression) -> Result<()> {
    expression
        // set by cargo for the xtask process itself
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

fn docs() -> Result<()> {
    let metadata = MetadataCommand::new()
        .exec()
        .wrap_err("failed to read cargo metadata")?;

    metadata
        .workspace_default_packages()
        .iter()
        .try_for_each(|package| {
            let name: String = package.name.to_string();
            nightly(
                cmd!("cargo", "doc", "--no-deps", "--all-features", "--package", name)
                    .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings"),
            )
        })
}

/// Runs the ignored `backend_validation_tests` against a `MariaDB` 11
/// container on port 3307.
///
/// The tests share one database and empty it at the start of each test, so
/// they run with `--test-threads=1`. Needs Docker, a free port 3307, and the
/// `MySQL` client libraries to build.
fn test_mariadb() -> Result<()> {
    let container = MariadbContainer::start("prefstore-test-mariadb", "prefstore_test", "3307")?;

    cmd!(
        "cargo",
        "test",
        "--package",
        PERSISTENCE_PACKAGE,
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", container.database_url())
    .env("PREFSTORE_TEST_BACKEND", "mariadb")
    .run_with_trace()
    .wrap_err("MariaDB backend validation tests failed")?;

    tracing::info!("MariaDB backend validation passed");
    Ok(())
}

/// Applies `migrations/` to an in-memory `SQLite` database and
/// `migrations_mysql/` to a `MariaDB` container on port 3308, then compares
/// tables, columns, normalized types, nullability, keys and indexes.
fn verify_migrations() -> Result<()> {
    let container =
        MariadbContainer::start("prefstore-verify-migrations", "prefstore_verify", "3308")?;

    let mut sqlite = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to open an in-memory SQLite database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut sqlite)
        .wrap_err("Failed to turn on SQLite foreign keys")?;
    sqlite
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| eyre!("SQLite migrations failed: {e}"))?;

    let mut mysql = MysqlConnection::establish(&container.database_url())
        .wrap_err("Failed to connect to MariaDB")?;
    mysql
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| eyre!("MySQL migrations failed: {e}"))?;

    let sqlite_schema = schema::introspect_sqlite(&mut sqlite)?;
    let mysql_schema = schema::introspect_mysql(&mut mysql, container.db_name())?;
    schema::compare(&sqlite_schema, &mysql_schema)?;

    tracing::info!(
        tables = sqlite_schema.tables.len(),
        "SQLite and MySQL migrations describe the same schema"
    );
    Ok(())
}

/// Logs a `duct` expression before running it, and again if it fails.
trait ExpressionExt {
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {self:?}");
        let output = self.run();
        if output.is_err() {
            tracing::error!("command failed: {self:?}");
        }
        output
    }
}
