use crate::ParseError;
use crate::consts::{
    CENTURY_CYCLE, DAYS_IN_MONTH, DAYS_PER_WEEK, FEBRUARY, FEBRUARY_DAYS_LEAP, GREGORIAN_CYCLE,
    LEAP_YEAR_CYCLE, MAX_CALENDAR_COUNT, MIN_CALENDAR_COUNT,
};
use crate::prelude::*;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// First column of a calendar grid, `0` = Sunday through `6` = Saturday.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct FirstDayOfWeek(u8);

impl FirstDayOfWeek {
    pub const SUNDAY: Self = Self(0);
    pub const MONDAY: Self = Self(1);

    /// Creates a new `FirstDayOfWeek`, validating that it's in `0..=6`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidWeekday` if the value is 7 or larger.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        if u32::from(value) >= DAYS_PER_WEEK {
            return Err(ParseError::InvalidWeekday(value));
        }
        Ok(Self(value))
    }

    /// Returns the weekday index as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Same day expressed as a chrono weekday
    pub const fn weekday(self) -> Weekday {
        match self.0 {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }

    /// Column (`0..7`) that `weekday` occupies when weeks start on `self`.
    pub fn column_of(self, weekday: Weekday) -> u32 {
        (weekday.num_days_from_sunday() + DAYS_PER_WEEK - u32::from(self.0)) % DAYS_PER_WEEK
    }
}

impl TryFrom<u8> for FirstDayOfWeek {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FirstDayOfWeek> for u8 {
    fn from(day: FirstDayOfWeek) -> Self {
        day.0
    }
}

impl From<Weekday> for FirstDayOfWeek {
    fn from(weekday: Weekday) -> Self {
        // num_days_from_sunday is always < 7
        Self(weekday.num_days_from_sunday() as u8)
    }
}

/// Number of months shown side by side, clamped to `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
#[serde(from = "u8", into = "u8")]
pub struct CalendarCount(u8);

impl CalendarCount {
    /// Clamps any requested count into the supported range.
    pub fn clamped(value: u8) -> Self {
        Self(value.clamp(MIN_CALENDAR_COUNT, MAX_CALENDAR_COUNT))
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for CalendarCount {
    fn default() -> Self {
        Self(MIN_CALENDAR_COUNT)
    }
}

impl From<u8> for CalendarCount {
    fn from(value: u8) -> Self {
        Self::clamped(value)
    }
}

impl From<CalendarCount> for u8 {
    fn from(count: CalendarCount) -> Self {
        count.0
    }
}

/// How clicks on grid cells accumulate into a selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    #[display(fmt = "single")]
    Single,
    #[display(fmt = "range")]
    Range,
    #[display(fmt = "multiple")]
    Multiple,
    #[display(fmt = "week")]
    Week,
    #[display(fmt = "month")]
    Month,
    #[display(fmt = "quarter")]
    Quarter,
    #[display(fmt = "year")]
    Year,
}

impl SelectionMode {
    /// Modes where one click selects a whole closed period
    pub const fn is_period(self) -> bool {
        matches!(self, Self::Week | Self::Month | Self::Quarter | Self::Year)
    }

    /// Modes whose committed value is a `SelectionValue::Range`
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Range) || self.is_period()
    }
}

impl FromStr for SelectionMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "range" => Ok(Self::Range),
            "multiple" => Ok(Self::Multiple),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(ParseError::InvalidFormat(format!("unknown selection mode: {s}"))),
        }
    }
}

// Helper functions

pub const fn is_leap_year(year: i32) -> bool {
    (year % LEAP_YEAR_CYCLE == 0 && year % CENTURY_CYCLE != 0) || (year % GREGORIAN_CYCLE == 0)
}

/// Days in a 1-indexed `month` of `year`
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    debug_assert!(month != 0 && month <= 12);

    if month == FEBRUARY && is_leap_year(year) {
        FEBRUARY_DAYS_LEAP
    } else {
        DAYS_IN_MONTH[month as usize]
    }
}
