// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod commands;
mod daemon;
mod sweep;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use prefstore_config::{ConfigStore, StoreSettings};
use prefstore_persistence::Persistence;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// prefstore - per-user preference store and flagged-message retention sweeper
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON settings file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: DatabaseOverrides,

    #[command(subcommand)]
    command: Command,
}

/// Database settings given on the command line. They take precedence over
/// the settings file, including after the daemon reloads it.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
struct DatabaseOverrides {
    /// Database driver (`sqlite`, `sqlite3`, `mysql`, `mariadb`). Overrides the settings file.
    #[arg(long, global = true)]
    driver: Option<String>,

    /// Database file path or connection URL. Overrides the settings file.
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Read replica file path or connection URL. Overrides the settings file.
    #[arg(long, global = true)]
    replica: Option<String>,
}

impl DatabaseOverrides {
    fn apply(&self, mut settings: StoreSettings) -> StoreSettings {
        if let Some(driver) = &self.driver {
            settings.database.driver_name.clone_from(driver);
        }
        if let Some(database) = &self.database {
            settings.database.data_source.clone_from(database);
        }
        if let Some(replica) = &self.replica {
            settings.database.replica_source = Some(replica.clone());
        }
        settings
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Print one preference
    Get {
        user_id: String,
        category: String,
        name: String,
    },
    /// Print a user's preferences, optionally limited to one category
    List {
        user_id: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Save one preference
    Set {
        user_id: String,
        category: String,
        name: String,
        value: String,
    },
    /// Save a JSON array of preferences as one batch
    Import { file: PathBuf },
    /// Delete one preference
    Delete {
        user_id: String,
        category: String,
        name: String,
    },
    /// Delete every preference a user holds
    DeleteUser { user_id: String },
    /// Delete a user's preferences in one category
    DeleteCategory { user_id: String, category: String },
    /// Delete a named preference for every user
    DeleteName { category: String, name: String },
    /// Delete disabled feature toggles
    DeleteUnusedFeatures,
    /// Remove flags on old messages not covered by a retention policy
    SweepFlags {
        /// Age in days after which a flag is removed
        #[arg(long)]
        days: Option<u32>,
        /// Rows removed per batch
        #[arg(long)]
        limit: Option<u64>,
        /// Count eligible rows without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove flags on messages purged by channel or team retention policies
    SweepPolicies {
        /// Rows removed per batch
        #[arg(long)]
        limit: Option<u64>,
        /// Count eligible rows without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// Run both sweeps periodically until interrupted
    Daemon,
    /// Print the resolved settings
    ShowConfig,
}

/// Loads the settings file, if any, and applies command-line overrides.
fn resolve_settings(args: &Args) -> color_eyre::Result<ConfigStore> {
    let store: ConfigStore = match &args.config {
        Some(path) => ConfigStore::load(path)
            .wrap_err_with(|| format!("Failed to load settings from {}", path.display()))?,
        None => ConfigStore::new(StoreSettings::default())?,
    };

    let overridden: StoreSettings = args.overrides.apply((*store.get()).clone());
    store.set(overridden)?;
    Ok(store)
}

fn open_store(settings: &StoreSettings) -> color_eyre::Result<Persistence> {
    let database = &settings.database;
    let mut persistence: Persistence = Persistence::connect(
        &database.driver_name,
        &database.data_source,
        database.replica_source.as_deref(),
    )
    .wrap_err("Failed to open preference store")?;

    match persistence.delete_unused_features() {
        Ok(removed) => info!(removed, "Removed unused feature toggles"),
        Err(e) => warn!(error = %e, "Failed to remove unused feature toggles"),
    }

    Ok(persistence)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config: ConfigStore = resolve_settings(&args)?;
    let settings: Arc<StoreSettings> = config.get();

    if args.command == Command::ShowConfig {
        println!("{}", settings.to_json_pretty()?);
        return Ok(());
    }

    info!(
        driver = %settings.database.driver_name,
        replica = settings.database.replica_source.is_some(),
        "Starting prefstore"
    );
    let mut persistence: Persistence = open_store(&settings)?;

    if args.command == Command::Daemon {
        return daemon::run(
            Arc::new(config),
            Arc::new(Mutex::new(persistence)),
            args.overrides,
        )
        .await;
    }

    commands::run(args.command, &mut persistence, &settings.retention)
}
