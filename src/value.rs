use std::fmt;

use serde::Serialize;

use crate::{CalendarDate, prelude::*};

/// A selected interval of days, inclusive on both ends.
///
/// `end` is `None` while a range selection is still waiting for its second
/// click. When set it is never before `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: CalendarDate,
    end:   Option<CalendarDate>,
}

/// Error type for date range construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Start date is after end date.
    #[error("Invalid date range: start ({start}) is after end ({end})")]
    InvalidRange { start: CalendarDate, end: CalendarDate },
}

impl DateRange {
    /// Creates a closed range.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidRange` if start > end.
    pub fn new(start: CalendarDate, end: CalendarDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end: Some(end) })
    }

    /// Creates a range with only its start chosen
    pub const fn open(start: CalendarDate) -> Self {
        Self { start, end: None }
    }

    /// Closed range over two dates given in any order
    pub fn spanning(a: CalendarDate, b: CalendarDate) -> Self {
        Self {
            start: a.min(b),
            end:   Some(a.max(b)),
        }
    }

    pub const fn start(&self) -> CalendarDate {
        self.start
    }

    pub const fn end(&self) -> Option<CalendarDate> {
        self.end
    }

    pub const fn is_complete(&self) -> bool {
        self.end.is_some()
    }

    /// Checks whether `date` lies within the range. An open range only
    /// contains its start.
    pub fn contains(&self, date: CalendarDate) -> bool {
        match self.end {
            Some(end) => self.start <= date && date <= end,
            None => date == self.start,
        }
    }

    /// Number of days covered, or `None` while open
    pub fn len_days(&self) -> Option<i64> {
        self.end.map(|end| self.start.days_until(end) + 1)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}/{}", self.start, end),
            None => write!(f, "{}/..", self.start),
        }
    }
}

/// A set of days kept sorted ascending with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deref)]
#[serde(transparent)]
pub struct DateSet(Vec<CalendarDate>);

impl DateSet {
    pub fn contains(&self, date: CalendarDate) -> bool {
        self.0.binary_search(&date).is_ok()
    }

    /// Returns a copy with `date` removed if present, inserted in order otherwise.
    pub fn toggled(&self, date: CalendarDate) -> Self {
        let mut dates = self.0.clone();
        match dates.binary_search(&date) {
            Ok(idx) => {
                dates.remove(idx);
            },
            Err(idx) => dates.insert(idx, date),
        }
        Self(dates)
    }

    pub fn as_slice(&self) -> &[CalendarDate] {
        &self.0
    }

    pub fn first(&self) -> Option<CalendarDate> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<CalendarDate> {
        self.0.last().copied()
    }
}

impl FromIterator<CalendarDate> for DateSet {
    fn from_iter<I: IntoIterator<Item = CalendarDate>>(iter: I) -> Self {
        let mut dates: Vec<CalendarDate> = iter.into_iter().collect();
        dates.sort_unstable();
        dates.dedup();
        Self(dates)
    }
}

/// The committed selection of one calendar instance.
///
/// Serializes to the shape hosts bind to: `null`, a date string, a
/// `{start, end}` object, or an array of date strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SelectionValue {
    #[default]
    None,
    Single(CalendarDate),
    Range(DateRange),
    Multiple(DateSet),
}

impl SelectionValue {
    /// Builds a `Multiple` value, collapsing an empty set to `None`.
    pub fn multiple<I: IntoIterator<Item = CalendarDate>>(dates: I) -> Self {
        Self::from_set(dates.into_iter().collect())
    }

    pub(crate) fn from_set(set: DateSet) -> Self {
        if set.is_empty() { Self::None } else { Self::Multiple(set) }
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Earliest date in the selection
    pub fn start(&self) -> Option<CalendarDate> {
        match self {
            Self::None => None,
            Self::Single(date) => Some(*date),
            Self::Range(range) => Some(range.start()),
            Self::Multiple(set) => set.first(),
        }
    }

    /// Latest date in the selection
    pub fn end(&self) -> Option<CalendarDate> {
        match self {
            Self::None => None,
            Self::Single(date) => Some(*date),
            Self::Range(range) => range.end(),
            Self::Multiple(set) => set.last(),
        }
    }

    /// Whether `date` is part of the selection (range interiors included)
    pub fn contains(&self, date: CalendarDate) -> bool {
        match self {
            Self::None => false,
            Self::Single(selected) => *selected == date,
            Self::Range(range) => range.contains(date),
            Self::Multiple(set) => set.contains(date),
        }
    }

    pub fn as_range(&self) -> Option<&DateRange> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }
}
