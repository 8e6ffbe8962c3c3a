// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Duration, OffsetDateTime};

use crate::error::DomainError;

/// Milliseconds in one day, the unit retention policy durations are stored in.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Converts a timestamp to milliseconds since the Unix epoch.
///
/// Message creation times and retention cutoffs are all expressed in this
/// unit.
///
/// # Errors
///
/// Returns an error if the timestamp does not fit in an `i64` of milliseconds.
pub fn epoch_millis(at: OffsetDateTime) -> Result<i64, DomainError> {
    i64::try_from(at.unix_timestamp_nanos() / 1_000_000)
        .map_err(|_| DomainError::TimestampOutOfRange(at.to_string()))
}

/// Returns the current time in milliseconds since the Unix epoch.
///
/// # Errors
///
/// Returns an error if the system clock is outside the representable range.
pub fn now_millis() -> Result<i64, DomainError> {
    epoch_millis(OffsetDateTime::now_utc())
}

/// Computes the cutoff for the legacy flagged-message sweep: messages
/// created before the returned instant are old enough to unflag.
///
/// # Arguments
///
/// * `now` - The reference time
/// * `days` - How many days a flagged message is kept
///
/// # Errors
///
/// Returns an error if the result is outside the representable range.
pub fn cutoff_millis(now: OffsetDateTime, days: u32) -> Result<i64, DomainError> {
    let cutoff: OffsetDateTime = now
        .checked_sub(Duration::days(i64::from(days)))
        .ok_or_else(|| DomainError::TimestampOutOfRange(format!("{now} minus {days} days")))?;
    epoch_millis(cutoff)
}
