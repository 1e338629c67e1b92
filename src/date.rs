use crate::consts::{DATE_SEPARATOR, MAX_YEAR, MIN_YEAR, MONTHS_PER_YEAR, MONTH_FIRST_SEPARATOR};
use crate::prelude::*;
use crate::types::days_in_month;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::str::FromStr;

/// A calendar day with no time-of-day and no time zone.
///
/// Grid cells, selections and constraints are all expressed in this type, so
/// "same day" is plain equality and ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Deref)]
#[display(fmt = "{}", _0)]
pub struct CalendarDate(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParseError {
    #[display(fmt = "Invalid date format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Invalid month: {} (must be 1-12)", "_0")]
    InvalidMonth(u32),
    #[display(fmt = "Invalid day {day} for month {year}-{month:02}")]
    InvalidDay { year: i32, month: u32, day: u32 },
    #[display(fmt = "Invalid first day of week: {} (must be 0-6)", "_0")]
    InvalidWeekday(u8),
    #[display(fmt = "Empty date string")]
    EmptyInput,
}

impl std::error::Error for ParseError {}

impl CalendarDate {
    /// Strict constructor from a 1-indexed month.
    ///
    /// # Errors
    /// Returns `ParseError::InvalidMonth` or `ParseError::InvalidDay` when the
    /// components do not name a real day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, ParseError> {
        if month == 0 || month > 12 {
            return Err(ParseError::InvalidMonth(month));
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(ParseError::InvalidDay { year, month, day });
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(ParseError::InvalidDay { year, month, day })
    }

    /// Builds a date the way a host `Date(year, monthIndex, day)` constructor
    /// would: `month0` is zero-based and out-of-range months or days roll
    /// into neighbouring months and years. Years are clamped to
    /// `MIN_YEAR..=MAX_YEAR` so the result is always representable.
    pub fn from_ymd_lenient(year: i32, month0: i32, day: i32) -> Self {
        let (year, month0) = normalize_month(year, month0);
        let first = first_of(year, month0);
        let offset = i64::from(day) - 1;
        Self(
            first
                .checked_add_signed(Duration::days(offset))
                .unwrap_or(if offset > 0 { NaiveDate::MAX } else { NaiveDate::MIN }),
        )
    }

    #[inline]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// 1-indexed month
    #[inline]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Zero-based month index
    #[inline]
    pub fn month0(self) -> u32 {
        self.0.month0()
    }

    #[inline]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    #[inline]
    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Shifts by `days`, saturating at the ends of the representable range.
    pub fn add_days(self, days: i64) -> Self {
        Self(
            Duration::try_days(days)
                .and_then(|delta| self.0.checked_add_signed(delta))
                .unwrap_or(if days > 0 { NaiveDate::MAX } else { NaiveDate::MIN }),
        )
    }

    /// Shifts by whole months, clamping the day to the target month's length
    /// (Jan 31 + 1 month is the last day of February).
    pub fn add_months(self, months: i32) -> Self {
        let (year, month0) = fold_months(self.year(), i64::from(self.month0()) + i64::from(months));
        let month = month0 + 1;
        let day = self.day().min(days_in_month(year, month));
        NaiveDate::from_ymd_opt(year, month, day).map_or(self, Self)
    }

    pub fn first_of_month(self) -> Self {
        Self(first_of(self.year(), self.month0()))
    }

    pub fn last_of_month(self) -> Self {
        let last = days_in_month(self.year(), self.month());
        NaiveDate::from_ymd_opt(self.year(), self.month(), last).map_or(self, Self)
    }

    /// Signed number of days from `self` to `other`
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Same year and month as `other`
    pub fn same_month(self, other: Self) -> bool {
        self.year() == other.year() && self.month() == other.month()
    }

    pub const fn naive(self) -> NaiveDate {
        self.0
    }
}

/// Folds an arbitrary zero-based month index into `(year, 0..12)`, with the
/// year clamped to the supported range.
pub(crate) fn normalize_month(year: i32, month0: i32) -> (i32, u32) {
    fold_months(year, i64::from(month0))
}

/// `normalize_month` over a wide month index, so callers can add deltas
/// without overflowing `i32`.
pub(crate) fn fold_months(year: i32, month0: i64) -> (i32, u32) {
    let months = i64::from(MONTHS_PER_YEAR);
    let total = (i64::from(year) * months).saturating_add(month0);
    let year = total.div_euclid(months).clamp(i64::from(MIN_YEAR), i64::from(MAX_YEAR));
    // both values are bounded: year by the clamp, month by rem_euclid(12)
    (year as i32, total.rem_euclid(months) as u32)
}

fn first_of(year: i32, month0: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(NaiveDate::MIN)
}

impl FromStr for CalendarDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        // Negative years carry a sign, as in "-0005-03-01"; a leading "+" is accepted too
        let (negative, unsigned) = match (trimmed.strip_prefix('-'), trimmed.strip_prefix('+')) {
            (Some(rest), _) => (true, rest),
            (None, Some(rest)) => (false, rest),
            (None, None) => (false, trimmed),
        };
        let signed = unsigned.len() != trimmed.len();

        let has_hyphen = unsigned.contains(DATE_SEPARATOR);
        let has_slash = unsigned.contains(MONTH_FIRST_SEPARATOR);

        if has_hyphen && has_slash {
            return Err(ParseError::InvalidFormat(format!(
                "Mixed delimiters ({DATE_SEPARATOR} and {MONTH_FIRST_SEPARATOR})"
            )));
        }

        if has_hyphen {
            // ISO format: YYYY-MM-DD
            let parts: Vec<&str> = unsigned.split(DATE_SEPARATOR).map(str::trim).collect();
            match parts.as_slice() {
                [year, month, day] => Self::from_parts(year, month, day, negative),
                _ => Err(ParseError::InvalidFormat(format!(
                    "Expected YYYY{DATE_SEPARATOR}MM{DATE_SEPARATOR}DD, found {} components",
                    parts.len()
                ))),
            }
        } else if has_slash && !signed {
            // Month-first format: MM/DD/YYYY, or YYYY/MM/DD when the first
            // component has four digits
            let parts: Vec<&str> = trimmed.split(MONTH_FIRST_SEPARATOR).map(str::trim).collect();
            match parts.as_slice() {
                [first, month, day] if first.len() == 4 => Self::from_parts(first, month, day, false),
                [month, day, year] => Self::from_parts(year, month, day, false),
                _ => Err(ParseError::InvalidFormat(format!(
                    "Expected MM{MONTH_FIRST_SEPARATOR}DD{MONTH_FIRST_SEPARATOR}YYYY, found {} components",
                    parts.len()
                ))),
            }
        } else {
            Err(ParseError::InvalidFormat(trimmed.to_owned()))
        }
    }
}

impl CalendarDate {
    fn parse_number<T: FromStr>(s: &str) -> Result<T, ParseError> {
        // components are unsigned; the year sign is handled by the caller
        if !s.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseError::InvalidFormat(s.to_owned()));
        }
        s.parse::<T>()
            .map_err(|_| ParseError::InvalidFormat(s.to_owned()))
    }

    fn from_parts(year: &str, month: &str, day: &str, negative: bool) -> Result<Self, ParseError> {
        let year = Self::parse_number::<i32>(year)?;
        let year = if negative { -year } else { year };
        let month = Self::parse_number::<u32>(month)?;
        let day = Self::parse_number::<u32>(day)?;
        Self::from_ymd(year, month, day)
    }
}

impl serde::Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for CalendarDate {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let year: i16 = quickcheck::Arbitrary::arbitrary(g);
        let month: u8 = quickcheck::Arbitrary::arbitrary(g);
        let day: u8 = quickcheck::Arbitrary::arbitrary(g);

        let year = i32::from(year).clamp(MIN_YEAR, MAX_YEAR);
        let month = u32::from(month % 12) + 1;
        let day = u32::from(day) % days_in_month(year, month) + 1;
        Self::from_ymd_lenient(year, month as i32 - 1, day as i32)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let (month, day) = (self.month(), self.day());
        Box::new(quickcheck::Arbitrary::shrink(&self.year()).filter_map(move |year| {
            let day = day.min(days_in_month(year, month));
            Self::from_ymd(year, month, day).ok()
        }))
    }
}
