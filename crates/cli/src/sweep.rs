// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Retention sweeps.
//!
//! Each delete call removes at most `batch_limit` rows. A sweep repeats the
//! call until one removes nothing, so no single statement holds locks over
//! an unbounded number of rows.

use prefstore_config::RetentionSettings;
use prefstore_domain::{cutoff_millis, epoch_millis};
use prefstore_persistence::{Persistence, PersistenceError};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Totals for one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Delete calls issued, including the final one that removed nothing.
    pub batches: usize,
    /// Rows removed across all calls.
    pub deleted: usize,
}

impl SweepReport {
    pub fn to_json(self) -> serde_json::Value {
        json!({ "batches": self.batches, "deleted": self.deleted })
    }
}

/// Totals for a daemon pass: the policy sweep, then the legacy sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub policies: SweepReport,
    pub flags: SweepReport,
}

/// Calls `delete_batch` until it reports zero rows removed.
///
/// # Errors
///
/// Stops at and returns the first error. Rows removed by earlier calls stay
/// removed.
pub fn sweep_until_done<F>(mut delete_batch: F) -> Result<SweepReport, PersistenceError>
where
    F: FnMut() -> Result<usize, PersistenceError>,
{
    let mut report: SweepReport = SweepReport::default();
    loop {
        let deleted: usize = delete_batch()?;
        report.batches += 1;
        report.deleted += deleted;
        if deleted == 0 {
            return Ok(report);
        }
        debug!(deleted, total = report.deleted, "Sweep batch complete");
    }
}

/// Removes flags on messages older than the configured cutoff that no
/// retention policy covers.
pub fn sweep_flags(
    persistence: &mut Persistence,
    retention: &RetentionSettings,
    now: OffsetDateTime,
) -> color_eyre::Result<SweepReport> {
    let cutoff: i64 = cutoff_millis(now, retention.flagged_post_cutoff_days)?;
    let report: SweepReport = sweep_until_done(|| {
        persistence.delete_unretained_flags(&retention.category, cutoff, retention.batch_limit)
    })?;
    info!(
        category = %retention.category,
        cutoff,
        deleted = report.deleted,
        batches = report.batches,
        "Unretained flag sweep finished"
    );
    Ok(report)
}

/// Removes flags on messages purged by a channel or team retention policy.
pub fn sweep_policies(
    persistence: &mut Persistence,
    retention: &RetentionSettings,
    now: OffsetDateTime,
) -> color_eyre::Result<SweepReport> {
    let now_millis: i64 = epoch_millis(now)?;
    let report: SweepReport = sweep_until_done(|| {
        persistence.delete_unretained_flags_for_policies(
            &retention.category,
            now_millis,
            retention.batch_limit,
        )
    })?;
    info!(
        category = %retention.category,
        deleted = report.deleted,
        batches = report.batches,
        "Policy flag sweep finished"
    );
    Ok(report)
}

/// Runs the policy sweep, then the legacy sweep.
pub fn sweep_pass(
    persistence: &mut Persistence,
    retention: &RetentionSettings,
    now: OffsetDateTime,
) -> color_eyre::Result<PassReport> {
    let policies: SweepReport = sweep_policies(persistence, retention, now)?;
    let flags: SweepReport = sweep_flags(persistence, retention, now)?;
    Ok(PassReport { policies, flags })
}
