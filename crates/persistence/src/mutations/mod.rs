// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic mutation modules.
//!
//! This module contains all state-changing operations for the persistence layer.
//!
//! ## Module Organization
//!
//! - `upsert`: Insert-or-update strategies (`NativeUpsert`, `EmulatedUpsert`)
//! - `preferences`: Batch save coordinator and delete-by-key operations
//! - `retention`: Eligibility rules and bounded retention deletes
//!
//! ## Backend-Specific Code
//!
//! Orchestration (`save_preferences`, `delete_eligible`) is generic over
//! `PersistenceBackend`. Leaf statements are generated per backend with
//! `backend_fn!`.

pub mod preferences;
pub mod retention;
pub mod upsert;

pub use preferences::{
    delete_preference_mysql, delete_preference_sqlite, delete_preferences_by_category_and_name_mysql,
    delete_preferences_by_category_and_name_sqlite, delete_preferences_by_category_mysql,
    delete_preferences_by_category_sqlite, delete_preferences_by_user_mysql,
    delete_preferences_by_user_sqlite, delete_unused_features_mysql, delete_unused_features_sqlite,
    save_preferences, save_preferences_with,
};
pub use retention::delete_eligible;
