use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::adapter::{DateAdapter, NativeAdapter};
use crate::consts::{MAX_YEAR, MIN_YEAR, MONTHS_PER_YEAR, YEARS_PER_DECADE};
use crate::date::{fold_months, normalize_month};
use crate::types::CalendarCount;
use crate::value::SelectionValue;
use crate::CalendarDate;

/// A displayed month, zero-based like grid months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year:   i32,
    pub month0: u32,
}

impl YearMonth {
    /// Folds an out-of-range month index into the neighbouring years
    pub fn new(year: i32, month0: i32) -> Self {
        let (year, month0) = normalize_month(year, month0);
        Self { year, month0 }
    }

    pub fn of(date: CalendarDate) -> Self {
        Self {
            year:   date.year(),
            month0: date.month0(),
        }
    }

    #[must_use]
    pub fn offset(self, months: i32) -> Self {
        let (year, month0) = fold_months(self.year, i64::from(self.month0) + i64::from(months));
        Self { year, month0 }
    }

    pub fn first_day(self) -> CalendarDate {
        CalendarDate::from_ymd_lenient(self.year, self.month0 as i32, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

/// Tracks which month (and by extension year and decade) is on screen.
///
/// Navigation always works from the first of the displayed month, so moving
/// by months can never skip a short month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewNavigator {
    current: YearMonth,
}

impl ViewNavigator {
    pub fn new(year: i32, month0: i32) -> Self {
        Self {
            current: YearMonth::new(year, month0),
        }
    }

    /// Navigator showing the month containing `date`
    pub fn showing(date: CalendarDate) -> Self {
        Self {
            current: YearMonth::of(date),
        }
    }

    pub const fn current(&self) -> YearMonth {
        self.current
    }

    pub const fn year(&self) -> i32 {
        self.current.year
    }

    pub const fn month0(&self) -> u32 {
        self.current.month0
    }

    pub fn change_month(&mut self, delta: i32) -> YearMonth {
        self.change_month_with(delta, &NativeAdapter)
    }

    /// Moves by `delta` months as counted by `adapter`
    pub fn change_month_with(&mut self, delta: i32, adapter: &dyn DateAdapter) -> YearMonth {
        let target = adapter.add_months(self.current.first_day(), delta);
        self.move_to(YearMonth::of(target))
    }

    pub fn change_year(&mut self, delta: i32) -> YearMonth {
        let year = self.current.year.saturating_add(delta).clamp(MIN_YEAR, MAX_YEAR);
        self.move_to(YearMonth {
            year,
            month0: self.current.month0,
        })
    }

    pub fn change_decade(&mut self, delta_decades: i32) -> YearMonth {
        self.change_year(delta_decades.saturating_mul(YEARS_PER_DECADE))
    }

    /// First year of the displayed decade, e.g. 2020 for 2024 and -10 for -3
    pub const fn decade_start(&self) -> i32 {
        self.current.year.div_euclid(YEARS_PER_DECADE) * YEARS_PER_DECADE
    }

    pub fn decade_years(&self) -> impl Iterator<Item = i32> {
        let start = self.decade_start();
        start..start + YEARS_PER_DECADE
    }

    pub fn go_to(&mut self, date: CalendarDate) -> YearMonth {
        self.move_to(YearMonth::of(date))
    }

    /// The `count` consecutive months shown side by side, starting at the
    /// displayed one.
    pub fn visible_months(&self, count: CalendarCount) -> Vec<YearMonth> {
        (0..i32::from(count.get())).map(|offset| self.current.offset(offset)).collect()
    }

    pub fn contains_month(&self, date: CalendarDate, count: CalendarCount) -> bool {
        let first = self.current;
        let last = first.offset(i32::from(count.get()) - 1);
        let month = YearMonth::of(date);
        first <= month && month <= last
    }

    /// Re-targets the view after the value changed from outside.
    ///
    /// Keeps the view if it already shows the value's start or end. Otherwise
    /// moves to the value's start, then `start_at`, then `min_date` when it
    /// lies after `today`, and finally `today`. Returns whether the view moved.
    pub fn recenter(
        &mut self,
        value: &SelectionValue,
        start_at: Option<CalendarDate>,
        min_date: Option<CalendarDate>,
        today: CalendarDate,
        count: CalendarCount,
    ) -> bool {
        let shown = [value.start(), value.end()]
            .into_iter()
            .flatten()
            .any(|date| self.contains_month(date, count));
        if shown {
            return false;
        }

        let target = value
            .start()
            .or(start_at)
            .or_else(|| min_date.filter(|min| *min > today))
            .unwrap_or(today);
        let before = self.current;
        self.go_to(target);
        self.current != before
    }

    fn move_to(&mut self, target: YearMonth) -> YearMonth {
        if target != self.current {
            debug!(from = %self.current, to = %target, "view moved");
            self.current = target;
        }
        self.current
    }
}

impl Default for ViewNavigator {
    fn default() -> Self {
        Self::new(1970, 0)
    }
}

impl From<YearMonth> for ViewNavigator {
    fn from(current: YearMonth) -> Self {
        Self { current }
    }
}

/// Months between two displayed months, for hosts animating a jump
pub const fn months_between(from: YearMonth, to: YearMonth) -> i32 {
    (to.year - from.year) * MONTHS_PER_YEAR + (to.month0 as i32 - from.month0 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ymd;
    use crate::value::DateRange;

    #[test]
    fn test_change_month_from_month_end() {
        let mut nav = ViewNavigator::showing(ymd(2024, 1, 31));
        assert_eq!(nav.change_month(1), YearMonth { year: 2024, month0: 1 });

        let mut nav = ViewNavigator::showing(ymd(2023, 1, 31));
        assert_eq!(nav.change_month(1), YearMonth { year: 2023, month0: 1 });
    }

    #[test]
    fn test_change_month_crosses_years() {
        let cases = [
            ((2024, 11), 1, (2025, 0)),
            ((2024, 0), -1, (2023, 11)),
            ((2024, 5), 25, (2026, 6)),
            ((2024, 5), -30, (2021, 11)),
        ];
        for ((year, month0), delta, (want_year, want_month0)) in cases {
            let mut nav = ViewNavigator::new(year, month0);
            let got = nav.change_month(delta);
            assert_eq!((got.year, got.month0), (want_year, want_month0), "{year}-{month0} {delta:+}");
        }
    }

    #[test]
    fn test_change_month_extreme_deltas_clamp() {
        let mut nav = ViewNavigator::new(2024, 11);
        assert_eq!(nav.change_month(i32::MAX).year, MAX_YEAR);

        let mut nav = ViewNavigator::new(2024, 0);
        assert_eq!(nav.change_month(i32::MIN).year, MIN_YEAR);

        let ym = YearMonth { year: 2024, month0: 11 };
        assert_eq!(ym.offset(i32::MAX).year, MAX_YEAR);
        assert_eq!(ym.offset(i32::MIN).year, MIN_YEAR);
    }

    #[test]
    fn test_change_month_through_adapter() {
        struct Quarters;

        impl DateAdapter for Quarters {
            fn parse(&self, text: &str) -> Option<CalendarDate> {
                text.parse().ok()
            }

            fn add_months(&self, date: CalendarDate, months: i32) -> CalendarDate {
                date.add_months(months.saturating_mul(3))
            }
        }

        let mut nav = ViewNavigator::new(2024, 10);
        assert_eq!(nav.change_month_with(1, &Quarters), YearMonth { year: 2025, month0: 1 });
        assert_eq!(nav.change_month_with(-2, &Quarters), YearMonth { year: 2024, month0: 7 });
    }

    #[test]
    fn test_change_year_and_decade() {
        let mut nav = ViewNavigator::new(2024, 1);
        assert_eq!(nav.change_year(-4).year, 2020);
        assert_eq!(nav.month0(), 1);
        assert_eq!(nav.change_decade(2).year, 2040);
        assert_eq!(nav.change_year(100_000).year, MAX_YEAR);
    }

    #[test]
    fn test_decade() {
        let nav = ViewNavigator::new(2024, 0);
        assert_eq!(nav.decade_start(), 2020);
        assert_eq!(nav.decade_years().collect::<Vec<_>>(), (2020..2030).collect::<Vec<_>>());
        assert_eq!(ViewNavigator::new(-3, 0).decade_start(), -10);
    }

    #[test]
    fn test_visible_months() {
        let nav = ViewNavigator::new(2024, 10);
        let months = nav.visible_months(CalendarCount::clamped(3));
        assert_eq!(
            months,
            vec![
                YearMonth { year: 2024, month0: 10 },
                YearMonth { year: 2024, month0: 11 },
                YearMonth { year: 2025, month0: 0 },
            ]
        );
        assert!(nav.contains_month(ymd(2025, 1, 20), CalendarCount::clamped(3)));
        assert!(!nav.contains_month(ymd(2025, 1, 20), CalendarCount::default()));
    }

    #[test]
    fn test_recenter_keeps_view_showing_value() {
        let mut nav = ViewNavigator::new(2024, 2);
        let value = SelectionValue::Range(DateRange::new(ymd(2024, 1, 20), ymd(2024, 3, 2)).unwrap());
        let moved = nav.recenter(&value, None, None, ymd(2030, 1, 1), CalendarCount::default());
        assert!(!moved);
        assert_eq!(nav.current(), YearMonth { year: 2024, month0: 2 });
    }

    #[test]
    fn test_recenter_fallbacks() {
        struct TestCase {
            value:       SelectionValue,
            start_at:    Option<CalendarDate>,
            min_date:    Option<CalendarDate>,
            expected:    YearMonth,
            description: &'static str,
        }

        let today = ymd(2024, 6, 15);
        let cases = [
            TestCase {
                value:       SelectionValue::Single(ymd(2022, 3, 1)),
                start_at:    Some(ymd(2023, 1, 1)),
                min_date:    None,
                expected:    YearMonth { year: 2022, month0: 2 },
                description: "value wins",
            },
            TestCase {
                value:       SelectionValue::None,
                start_at:    Some(ymd(2023, 1, 1)),
                min_date:    Some(ymd(2025, 1, 1)),
                expected:    YearMonth { year: 2023, month0: 0 },
                description: "start_at before min_date",
            },
            TestCase {
                value:       SelectionValue::None,
                start_at:    None,
                min_date:    Some(ymd(2025, 1, 1)),
                expected:    YearMonth { year: 2025, month0: 0 },
                description: "future min_date",
            },
            TestCase {
                value:       SelectionValue::None,
                start_at:    None,
                min_date:    Some(ymd(2020, 1, 1)),
                expected:    YearMonth { year: 2024, month0: 5 },
                description: "past min_date falls back to today",
            },
        ];

        for case in &cases {
            let mut nav = ViewNavigator::new(1999, 0);
            nav.recenter(&case.value, case.start_at, case.min_date, today, CalendarCount::default());
            assert_eq!(nav.current(), case.expected, "{}", case.description);
        }
    }

    #[test]
    fn test_months_between() {
        let from = YearMonth { year: 2024, month0: 10 };
        assert_eq!(months_between(from, YearMonth { year: 2025, month0: 1 }), 3);
        assert_eq!(months_between(from, YearMonth { year: 2024, month0: 4 }), -6);
    }

    #[test]
    fn test_display() {
        assert_eq!(YearMonth { year: 2024, month0: 0 }.to_string(), "2024-01");
    }
}
