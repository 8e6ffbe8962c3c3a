// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `preferences`: Lookups by key, category, and user
//! - `retention`: Eligible-row counts for the retention sweep
//!
//! ## Backend-Specific Functions
//!
//! All query functions are generated in backend-specific monomorphic versions:
//! - Functions suffixed with `_sqlite` for `SQLite`
//! - Functions suffixed with `_mysql` for `MySQL`/`MariaDB`
//!
//! The `Persistence` adapter in `lib.rs` dispatches to the appropriate version
//! based on the connection reads are routed to.

pub mod preferences;
pub mod retention;

pub use preferences::{
    get_all_mysql, get_all_sqlite, get_category_mysql, get_category_sqlite, get_preference_mysql,
    get_preference_sqlite,
};
pub use retention::count_eligible;
