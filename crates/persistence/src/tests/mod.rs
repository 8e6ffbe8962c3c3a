// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod batch_save_tests;
mod transaction_tests;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use diesel::SqliteConnection;
use diesel::prelude::*;
use prefstore_domain::{CATEGORY_FLAGGED_POST, MILLIS_PER_DAY, Preference};

use crate::diesel_schema::{
    channels, posts, preferences, retention_policies, retention_policies_channels,
    retention_policies_teams, teams,
};
use crate::{BackendConnection, Persistence};

/// Fixed "current time" for retention tests: 2023-11-14T22:13:20Z.
pub const NOW: i64 = 1_700_000_000_000;

/// Returns `NOW` minus the given number of days, in epoch millis.
pub const fn days_ago(days: i64) -> i64 {
    NOW - days * MILLIS_PER_DAY
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory store")
}

/// Borrows the primary `SQLite` connection of a test store.
pub fn sqlite_conn(persistence: &mut Persistence) -> &mut SqliteConnection {
    match &mut persistence.conn {
        BackendConnection::Sqlite(conn) => conn,
        BackendConnection::Mysql(_) => panic!("test store must be SQLite"),
    }
}

pub fn count_preference_rows(persistence: &mut Persistence) -> i64 {
    preferences::table
        .count()
        .get_result(sqlite_conn(persistence))
        .expect("Failed to count preferences")
}

pub fn insert_team(persistence: &mut Persistence, team_id: &str) {
    diesel::insert_into(teams::table)
        .values((teams::id.eq(team_id), teams::display_name.eq(team_id)))
        .execute(sqlite_conn(persistence))
        .expect("Failed to insert team");
}

pub fn insert_channel(persistence: &mut Persistence, channel_id: &str, team_id: &str) {
    diesel::insert_into(channels::table)
        .values((channels::id.eq(channel_id), channels::team_id.eq(team_id)))
        .execute(sqlite_conn(persistence))
        .expect("Failed to insert channel");
}

pub fn insert_post(persistence: &mut Persistence, post_id: &str, channel_id: &str, create_at: i64) {
    diesel::insert_into(posts::table)
        .values((
            posts::id.eq(post_id),
            posts::channel_id.eq(channel_id),
            posts::create_at.eq(create_at),
        ))
        .execute(sqlite_conn(persistence))
        .expect("Failed to insert post");
}

/// Inserts a retention policy. `None` means keep forever.
pub fn insert_policy(persistence: &mut Persistence, policy_id: &str, duration_days: Option<i64>) {
    diesel::insert_into(retention_policies::table)
        .values((
            retention_policies::id.eq(policy_id),
            retention_policies::display_name.eq(policy_id),
            retention_policies::post_duration.eq(duration_days),
        ))
        .execute(sqlite_conn(persistence))
        .expect("Failed to insert retention policy");
}

pub fn apply_policy_to_channel(persistence: &mut Persistence, policy_id: &str, channel_id: &str) {
    diesel::insert_into(retention_policies_channels::table)
        .values((
            retention_policies_channels::policy_id.eq(policy_id),
            retention_policies_channels::channel_id.eq(channel_id),
        ))
        .execute(sqlite_conn(persistence))
        .expect("Failed to link policy to channel");
}

pub fn apply_policy_to_team(persistence: &mut Persistence, policy_id: &str, team_id: &str) {
    diesel::insert_into(retention_policies_teams::table)
        .values((
            retention_policies_teams::policy_id.eq(policy_id),
            retention_policies_teams::team_id.eq(team_id),
        ))
        .execute(sqlite_conn(persistence))
        .expect("Failed to link policy to team");
}

/// Creates team `t1` with channel `c1`.
pub fn create_team_and_channel(persistence: &mut Persistence) {
    insert_team(persistence, "t1");
    insert_channel(persistence, "c1", "t1");
}

/// Saves a flagged-post preference for `user_id` naming `post_id`.
pub fn flag_post(persistence: &mut Persistence, user_id: &str, post_id: &str) {
    persistence
        .save(&Preference::new(user_id, CATEGORY_FLAGGED_POST, post_id, "true"))
        .expect("Failed to flag post");
}

static FILE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A database file in the temp directory, removed with its WAL files on drop.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        let id = FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "prefstore_test_{}_{id}.db",
            std::process::id()
        ));
        Self { path }
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().expect("Temp path should be UTF-8")
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(Path::new(&file));
        }
    }
}
