// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Periodic sweeper.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use prefstore_config::{ConfigError, ConfigStore, StoreSettings};
use prefstore_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::DatabaseOverrides;
use crate::sweep::{PassReport, sweep_pass};

/// Sweeps on every tick until Ctrl-C.
///
/// The settings file is re-read before each pass, with `overrides` applied
/// on top. Retention changes apply to the next pass; database changes are
/// logged and need a restart.
pub async fn run(
    config: Arc<ConfigStore>,
    persistence: Arc<Mutex<Persistence>>,
    overrides: DatabaseOverrides,
) -> color_eyre::Result<()> {
    let listener = config.add_listener(log_settings_change);
    info!(
        interval_secs = config.get().retention.sweep_interval_secs,
        "Sweeper daemon started"
    );

    loop {
        run_pass(&config, &persistence).await?;

        let period: Duration = Duration::from_secs(config.get().retention.sweep_interval_secs);
        tokio::select! {
            () = tokio::time::sleep(period) => {}
            signal = tokio::signal::ctrl_c() => {
                signal.wrap_err("Failed to listen for Ctrl-C")?;
                info!("Received Ctrl-C, stopping sweeper");
                break;
            }
        }

        if config.source().is_some()
            && let Err(e) = reload_settings(&config, &overrides)
        {
            warn!(error = %e, "Failed to reload settings, keeping current");
        }
    }

    config.remove_listener(&listener);
    Ok(())
}

/// Re-reads the settings file and re-applies the command-line overrides.
pub fn reload_settings(
    config: &ConfigStore,
    overrides: &DatabaseOverrides,
) -> Result<bool, ConfigError> {
    config.reload_with(|settings| overrides.apply(settings))
}

async fn run_pass(
    config: &ConfigStore,
    persistence: &Arc<Mutex<Persistence>>,
) -> color_eyre::Result<()> {
    let settings: Arc<StoreSettings> = config.get();
    let persistence: Arc<Mutex<Persistence>> = Arc::clone(persistence);

    let result: color_eyre::Result<PassReport> = tokio::task::spawn_blocking(move || {
        let mut store = persistence.blocking_lock();
        sweep_pass(&mut store, &settings.retention, OffsetDateTime::now_utc())
    })
    .await
    .wrap_err("Sweep task panicked")?;

    match result {
        Ok(report) => info!(
            policy_deleted = report.policies.deleted,
            flag_deleted = report.flags.deleted,
            "Sweep pass complete"
        ),
        Err(e) => error!(error = %e, "Sweep pass failed, retrying next tick"),
    }
    Ok(())
}

fn log_settings_change(old: &StoreSettings, new: &StoreSettings) {
    if old.database != new.database {
        warn!("Database settings changed; restart the daemon to apply them");
    }
    if old.retention != new.retention {
        info!(
            category = %new.retention.category,
            batch_limit = new.retention.batch_limit,
            cutoff_days = new.retention.flagged_post_cutoff_days,
            interval_secs = new.retention.sweep_interval_secs,
            "Retention settings updated"
        );
    }
}
