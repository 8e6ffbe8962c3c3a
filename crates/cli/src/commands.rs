// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! One-shot subcommands. Results are printed to stdout as JSON.

use std::path::Path;

use color_eyre::eyre::{WrapErr, bail};
use prefstore_config::RetentionSettings;
use prefstore_domain::{Preference, Preferences, cutoff_millis, epoch_millis};
use prefstore_persistence::Persistence;
use serde_json::json;
use time::OffsetDateTime;
use tracing::info;

use crate::Command;
use crate::sweep::{sweep_flags, sweep_policies};

pub fn run(
    command: Command,
    persistence: &mut Persistence,
    retention: &RetentionSettings,
) -> color_eyre::Result<()> {
    match command {
        Command::Get {
            user_id,
            category,
            name,
        } => {
            let preference: Preference = persistence.get(&user_id, &category, &name)?;
            print_json(&serde_json::to_value(preference)?)
        }
        Command::List { user_id, category } => {
            let found: Vec<Preference> = match category {
                Some(category) => persistence.get_category(&user_id, &category)?,
                None => persistence.get_all(&user_id)?,
            };
            print_json(&serde_json::to_value(found)?)
        }
        Command::Set {
            user_id,
            category,
            name,
            value,
        } => {
            persistence.save(&Preference::new(&user_id, &category, &name, &value))?;
            print_json(&json!({ "saved": 1 }))
        }
        Command::Import { file } => {
            let batch: Preferences = read_batch(&file)?;
            persistence.save_all(&batch)?;
            info!(count = batch.len(), file = %file.display(), "Imported preferences");
            print_json(&json!({ "saved": batch.len() }))
        }
        Command::Delete {
            user_id,
            category,
            name,
        } => print_deleted(persistence.delete(&user_id, &category, &name)?),
        Command::DeleteUser { user_id } => print_deleted(persistence.delete_by_user(&user_id)?),
        Command::DeleteCategory { user_id, category } => {
            print_deleted(persistence.delete_by_category(&user_id, &category)?)
        }
        Command::DeleteName { category, name } => {
            print_deleted(persistence.delete_by_category_and_name(&category, &name)?)
        }
        Command::DeleteUnusedFeatures => print_deleted(persistence.delete_unused_features()?),
        Command::SweepFlags {
            days,
            limit,
            dry_run,
        } => {
            let retention: RetentionSettings = RetentionSettings {
                flagged_post_cutoff_days: days.unwrap_or(retention.flagged_post_cutoff_days),
                batch_limit: limit.unwrap_or(retention.batch_limit),
                ..retention.clone()
            };
            let now: OffsetDateTime = OffsetDateTime::now_utc();

            if dry_run {
                let cutoff: i64 = cutoff_millis(now, retention.flagged_post_cutoff_days)?;
                let eligible: usize =
                    persistence.count_unretained_flags(&retention.category, cutoff)?;
                return print_json(&json!({ "eligible": eligible }));
            }

            let report = sweep_flags(persistence, &retention, now)?;
            print_json(&report.to_json())
        }
        Command::SweepPolicies { limit, dry_run } => {
            let retention: RetentionSettings = RetentionSettings {
                batch_limit: limit.unwrap_or(retention.batch_limit),
                ..retention.clone()
            };
            let now: OffsetDateTime = OffsetDateTime::now_utc();

            if dry_run {
                let eligible: usize = persistence
                    .count_unretained_flags_for_policies(&retention.category, epoch_millis(now)?)?;
                return print_json(&json!({ "eligible": eligible }));
            }

            let report = sweep_policies(persistence, &retention, now)?;
            print_json(&report.to_json())
        }
        other @ (Command::Daemon | Command::ShowConfig) => {
            bail!("{other:?} is not a one-shot command")
        }
    }
}

fn read_batch(file: &Path) -> color_eyre::Result<Preferences> {
    let text: String = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&text)
        .wrap_err_with(|| format!("{} is not a JSON array of preferences", file.display()))
}

fn print_deleted(deleted: usize) -> color_eyre::Result<()> {
    print_json(&json!({ "deleted": deleted }))
}

fn print_json(value: &serde_json::Value) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
