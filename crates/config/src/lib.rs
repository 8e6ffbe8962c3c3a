// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Runtime configuration for the preference store.
//!
//! Settings are read from a JSON file into [`StoreSettings`] and held by a
//! [`ConfigStore`], which validates every replacement and broadcasts
//! `(old, new)` pairs to listeners registered through its [`Emitter`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod emitter;
mod error;
mod settings;
mod store;

#[cfg(test)]
mod tests;

pub use emitter::{Emitter, Listener, ListenerId};
pub use error::ConfigError;
pub use settings::{
    DEFAULT_BATCH_LIMIT, DEFAULT_FLAGGED_POST_CUTOFF_DAYS, DEFAULT_SWEEP_INTERVAL_SECS,
    DatabaseSettings, RetentionSettings, StoreSettings,
};
pub use store::ConfigStore;
