//! Terse constructors shared by the unit tests.

use chrono::FixedOffset;

use crate::CalendarDate;
use crate::normalize::DateNormalizer;

/// Panics on an impossible date, which is a bug in the test itself
pub fn ymd(year: i32, month: u32, day: u32) -> CalendarDate {
    CalendarDate::from_ymd(year, month, day).unwrap()
}

/// Normalizer pinned to UTC so instant inputs do not depend on the machine
pub fn utc_normalizer() -> DateNormalizer {
    DateNormalizer::with_offset(FixedOffset::east_opt(0).unwrap())
}
