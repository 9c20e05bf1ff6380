//! Invoice code generation.
//!
//! Codes look like `INV-20261018-4821`: prefix, the current date in the
//! office timezone and the four low-order digits of the current millisecond timestamp. Two bookings
//! created within the same 10 second window can collide; the unique index on
//! `bookings.invoice_code` rejects the second one.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub const DEFAULT_INVOICE_PREFIX: &str = "INV";

const SUFFIX_MODULUS: i64 = 10_000;

/// Builds the invoice code for a booking created at `now`, dated in `tz`.
pub fn invoice_code(prefix: &str, now: DateTime<Utc>, tz: Tz) -> String {
    let suffix = now.timestamp_millis().rem_euclid(SUFFIX_MODULUS);
    format!("{prefix}-{}-{suffix:04}", now.with_timezone(&tz).format("%Y%m%d"))
}
