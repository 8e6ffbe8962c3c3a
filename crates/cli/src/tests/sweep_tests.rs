// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use prefstore_config::RetentionSettings;
use prefstore_domain::{CATEGORY_FLAGGED_POST, Preference};
use prefstore_persistence::{Persistence, PersistenceError};
use time::OffsetDateTime;

use crate::sweep::{SweepReport, sweep_flags, sweep_pass, sweep_policies, sweep_until_done};

fn retention_with_limit(batch_limit: u64) -> RetentionSettings {
    RetentionSettings {
        batch_limit,
        ..RetentionSettings::default()
    }
}

/// Flags `count` messages that do not exist, which the policy rule removes.
fn store_with_orphan_flags(count: usize) -> Persistence {
    let mut persistence = Persistence::new_in_memory().expect("Failed to create store");
    let batch: Vec<Preference> = (0..count)
        .map(|i| Preference::new("u1", CATEGORY_FLAGGED_POST, &format!("gone{i}"), "true"))
        .collect();
    persistence.save_all(&batch).expect("Failed to seed flags");
    persistence
}

#[test]
fn test_sweep_until_done_stops_on_zero() {
    let mut remaining: Vec<usize> = vec![0, 1, 3, 3];

    let report = sweep_until_done(|| Ok(remaining.pop().unwrap_or(0))).expect("Sweep failed");

    assert_eq!(
        report,
        SweepReport {
            batches: 4,
            deleted: 7,
        }
    );
}

#[test]
fn test_sweep_until_done_propagates_error() {
    let mut calls = 0;

    let result = sweep_until_done(|| {
        calls += 1;
        if calls == 2 {
            Err(PersistenceError::StorageFailure {
                operation: "delete unretained flags",
                context: "category flagged_post".to_string(),
                reason: "database is locked".to_string(),
            })
        } else {
            Ok(5)
        }
    });

    assert!(matches!(result, Err(PersistenceError::StorageFailure { .. })));
    assert_eq!(calls, 2);
}

#[test]
fn test_policy_sweep_removes_orphans_in_batches() {
    let mut persistence = store_with_orphan_flags(5);

    let report = sweep_policies(
        &mut persistence,
        &retention_with_limit(2),
        OffsetDateTime::now_utc(),
    )
    .expect("Sweep failed");

    assert_eq!(
        report,
        SweepReport {
            batches: 4,
            deleted: 5,
        }
    );
    assert!(persistence.get_all("u1").expect("Query failed").is_empty());
}

#[test]
fn test_flag_sweep_spares_orphans() {
    let mut persistence = store_with_orphan_flags(3);

    let report = sweep_flags(
        &mut persistence,
        &retention_with_limit(2),
        OffsetDateTime::now_utc(),
    )
    .expect("Sweep failed");

    assert_eq!(report.deleted, 0);
    assert_eq!(report.batches, 1);
    assert_eq!(persistence.get_all("u1").expect("Query failed").len(), 3);
}

#[test]
fn test_sweep_only_touches_configured_category() {
    let mut persistence = store_with_orphan_flags(2);
    persistence
        .save(&Preference::new("u1", "display_settings", "gone0", "true"))
        .expect("Failed to save");

    let pass = sweep_pass(
        &mut persistence,
        &retention_with_limit(10),
        OffsetDateTime::now_utc(),
    )
    .expect("Pass failed");

    assert_eq!(pass.policies.deleted, 2);
    assert_eq!(pass.flags.deleted, 0);
    assert_eq!(persistence.get_all("u1").expect("Query failed").len(), 1);
}

#[test]
fn test_report_json_shape() {
    let json = SweepReport {
        batches: 3,
        deleted: 4,
    }
    .to_json();

    assert_eq!(json["batches"], 3);
    assert_eq!(json["deleted"], 4);
}
