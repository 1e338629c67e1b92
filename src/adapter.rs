//! Pluggable date arithmetic.
//!
//! Hosts that carry their own date library can implement [`DateAdapter`] and
//! hand it to the normalizer; everything else uses [`NativeAdapter`].

use crate::CalendarDate;
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write;

/// Date operations a host may override.
pub trait DateAdapter {
    /// Parses host text into a calendar day, `None` when it is not a date.
    fn parse(&self, text: &str) -> Option<CalendarDate>;

    /// Formats `date` with a strftime-style pattern.
    fn format(&self, date: CalendarDate, pattern: &str) -> String {
        // Invalid patterns produce an empty string instead of panicking inside chrono
        let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return String::new();
        }
        let mut out = String::new();
        match write!(out, "{}", date.naive().format_with_items(items.into_iter())) {
            Ok(()) => out,
            Err(_) => String::new(),
        }
    }

    fn add_months(&self, date: CalendarDate, months: i32) -> CalendarDate {
        date.add_months(months)
    }

    fn add_days(&self, date: CalendarDate, days: i64) -> CalendarDate {
        date.add_days(days)
    }

    fn is_same_day(&self, a: CalendarDate, b: CalendarDate) -> bool {
        a == b
    }
}

/// Default adapter: ISO `YYYY-MM-DD` and the US `MM/DD/YYYY` form.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAdapter;

impl DateAdapter for NativeAdapter {
    fn parse(&self, text: &str) -> Option<CalendarDate> {
        text.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ymd;

    /// Day-first adapter, the way a European host would parse input
    struct DayFirst;

    impl DateAdapter for DayFirst {
        fn parse(&self, text: &str) -> Option<CalendarDate> {
            let mut parts = text.split('.');
            let day = parts.next()?.parse().ok()?;
            let month = parts.next()?.parse().ok()?;
            let year = parts.next()?.parse().ok()?;
            CalendarDate::from_ymd(year, month, day).ok()
        }
    }

    #[test]
    fn test_native_parse() {
        assert_eq!(NativeAdapter.parse("2024-03-09"), Some(ymd(2024, 3, 9)));
        assert_eq!(NativeAdapter.parse("not a date"), None);
    }

    #[test]
    fn test_custom_parse() {
        assert_eq!(DayFirst.parse("09.03.2024"), Some(ymd(2024, 3, 9)));
        assert_eq!(DayFirst.parse("2024-03-09"), None);
    }

    #[test]
    fn test_format() {
        let date = ymd(2024, 3, 9);
        assert_eq!(NativeAdapter.format(date, "%d/%m/%Y"), "09/03/2024");
        assert_eq!(NativeAdapter.format(date, "%Q"), "");
    }

    #[test]
    fn test_default_arithmetic() {
        let date = ymd(2024, 1, 31);
        assert_eq!(NativeAdapter.add_months(date, 1), ymd(2024, 2, 29));
        assert_eq!(NativeAdapter.add_days(date, 1), ymd(2024, 2, 1));
        assert!(NativeAdapter.is_same_day(date, ymd(2024, 1, 31)));
    }
}
