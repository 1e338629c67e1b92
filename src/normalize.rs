//! Conversion of heterogeneous host input into calendar days and selection values.
//!
//! Nothing in here fails loudly: input that does not describe a day becomes
//! `None` (or `SelectionValue::None`), so callers always get a well-typed
//! optional back.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde_json::Value;

use crate::adapter::{DateAdapter, NativeAdapter};
use crate::consts::TIME_SEPARATOR;
use crate::types::SelectionMode;
use crate::value::{DateRange, SelectionValue};
use crate::CalendarDate;

/// Host objects that know how to turn themselves into a calendar day.
pub trait DateLike {
    fn to_date(&self) -> Option<CalendarDate>;
}

/// One date-like input as it arrives from a host binding.
#[derive(Clone)]
pub enum DateInput {
    Date(CalendarDate),
    /// Local wall-clock timestamp; the time of day is dropped
    DateTime(NaiveDateTime),
    /// Instant with an explicit offset; viewed in the normalizer's offset
    Zoned(DateTime<FixedOffset>),
    Text(String),
    /// Milliseconds since the Unix epoch. `NaN` and infinities never normalize.
    Epoch(f64),
    Adapter(Rc<dyn DateLike>),
}

impl fmt::Debug for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => f.debug_tuple("Date").field(date).finish(),
            Self::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Self::Zoned(dt) => f.debug_tuple("Zoned").field(dt).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Epoch(ms) => f.debug_tuple("Epoch").field(ms).finish(),
            Self::Adapter(_) => f.write_str("Adapter(..)"),
        }
    }
}

impl From<CalendarDate> for DateInput {
    fn from(date: CalendarDate) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::Zoned(dt)
    }
}

impl DateInput {
    /// Reads a JSON scalar: strings are date text, numbers are epoch milliseconds.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(n) => n.as_f64().map(Self::Epoch),
            _ => None,
        }
    }
}

/// An unvalidated binding value before it is matched against a selection mode.
#[derive(Debug, Clone, Default)]
pub enum RawValue {
    #[default]
    Null,
    Date(DateInput),
    Range {
        start: Option<DateInput>,
        end:   Option<DateInput>,
    },
    List(Vec<DateInput>),
    /// A shape no mode accepts (booleans, objects without `start`)
    Unsupported,
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(_) | Value::Number(_) => {
                DateInput::from_json(value).map_or(Self::Unsupported, Self::Date)
            },
            Value::Array(items) => Self::List(items.iter().filter_map(DateInput::from_json).collect()),
            Value::Object(map) if map.contains_key("start") => Self::Range {
                start: map.get("start").and_then(DateInput::from_json),
                end:   map.get("end").and_then(DateInput::from_json),
            },
            Value::Object(_) | Value::Bool(_) => Self::Unsupported,
        }
    }
}

impl From<&SelectionValue> for RawValue {
    fn from(value: &SelectionValue) -> Self {
        match value {
            SelectionValue::None => Self::Null,
            SelectionValue::Single(date) => Self::Date(DateInput::Date(*date)),
            SelectionValue::Range(range) => Self::Range {
                start: Some(DateInput::Date(range.start())),
                end:   range.end().map(DateInput::Date),
            },
            SelectionValue::Multiple(set) => Self::List(set.iter().copied().map(DateInput::Date).collect()),
        }
    }
}

/// Turns date-like input into `CalendarDate`s.
///
/// Inputs that carry an instant (epoch numbers, offset timestamps) are read
/// in the normalizer's fixed offset, which defaults to the host's local
/// offset at construction time.
#[derive(Clone)]
pub struct DateNormalizer {
    offset:  FixedOffset,
    adapter: Rc<dyn DateAdapter>,
}

impl fmt::Debug for DateNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateNormalizer").field("offset", &self.offset).finish_non_exhaustive()
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer {
    /// Normalizer in the host's current local offset
    pub fn new() -> Self {
        Self::with_offset(Local::now().offset().fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset,
            adapter: Rc::new(NativeAdapter),
        }
    }

    /// Replaces the text parser with a host adapter. An engine built on
    /// this normalizer also does its date arithmetic through it.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Rc<dyn DateAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn adapter(&self) -> &dyn DateAdapter {
        self.adapter.as_ref()
    }

    pub fn shared_adapter(&self) -> Rc<dyn DateAdapter> {
        Rc::clone(&self.adapter)
    }

    /// Normalizes one input to a calendar day, `None` when it is not a date.
    pub fn normalize(&self, input: &DateInput) -> Option<CalendarDate> {
        match input {
            DateInput::Date(date) => Some(*date),
            DateInput::DateTime(dt) => Some(dt.date().into()),
            DateInput::Zoned(dt) => Some(dt.with_timezone(&self.offset).date_naive().into()),
            DateInput::Text(text) => self.parse_text(text),
            DateInput::Epoch(ms) => self.epoch_to_date(*ms),
            DateInput::Adapter(source) => source.to_date(),
        }
    }

    fn parse_text(&self, text: &str) -> Option<CalendarDate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(date) = self.adapter.parse(trimmed) {
            return Some(date);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&self.offset).date_naive().into());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
            return Some(dt.with_timezone(&self.offset).date_naive().into());
        }
        if trimmed.contains(TIME_SEPARATOR) || trimmed.contains(' ') {
            for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
                    return Some(dt.date().into());
                }
            }
        }
        parse_written_date(trimmed)
    }

    fn epoch_to_date(&self, ms: f64) -> Option<CalendarDate> {
        if !ms.is_finite() {
            return None;
        }
        // Truncate toward zero the way host Date objects drop sub-millisecond precision
        #[allow(clippy::cast_possible_truncation)]
        let millis = ms.trunc() as i64;
        let utc = Utc.timestamp_millis_opt(millis).single()?;
        Some(utc.with_timezone(&self.offset).date_naive().into())
    }

    /// Maps a binding value onto the `SelectionValue` shape `mode` expects.
    ///
    /// `Single` takes a bare date; `Range` and the period modes take a
    /// `{start, end}` shape; `Multiple` takes a list. Anything else,
    /// including an unparseable `start`, yields `SelectionValue::None`.
    pub fn normalize_value(&self, raw: &RawValue, mode: SelectionMode) -> SelectionValue {
        match (mode, raw) {
            (SelectionMode::Single, RawValue::Date(input)) => {
                self.normalize(input).map_or(SelectionValue::None, SelectionValue::Single)
            },
            (mode, RawValue::Range { start, end }) if mode.is_ranged() => {
                let Some(start) = start.as_ref().and_then(|s| self.normalize(s)) else {
                    return SelectionValue::None;
                };
                let range = match end.as_ref().and_then(|e| self.normalize(e)) {
                    Some(end) => DateRange::spanning(start, end),
                    None => DateRange::open(start),
                };
                SelectionValue::Range(range)
            },
            (SelectionMode::Multiple, RawValue::List(items)) => {
                SelectionValue::multiple(items.iter().filter_map(|item| self.normalize(item)))
            },
            _ => SelectionValue::None,
        }
    }

    /// Convenience for hosts binding JSON values directly.
    pub fn normalize_json(&self, value: &Value, mode: SelectionMode) -> SelectionValue {
        self.normalize_value(&RawValue::from(value), mode)
    }
}

/// Month-name forms a host `Date` prints or accepts. `%b` and `%B` both take
/// short and long names, as do `%a` and `%A`.
const WRITTEN_DATE_PATTERNS: [&str; 6] = ["%B %d, %Y", "%B %d %Y", "%A, %B %d, %Y", "%a %b %d %Y", "%d %B %Y", "%d %B, %Y"];

/// Parses "January 15, 2024", "15 Jan 2024", "Mon Jan 15 2024" and the like.
///
/// Anything after the year must be separated by whitespace and is ignored,
/// so the time and zone of a `toString()` rendering do not matter.
fn parse_written_date(text: &str) -> Option<CalendarDate> {
    if !text.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }
    WRITTEN_DATE_PATTERNS.iter().find_map(|pattern| {
        let (date, rest) = NaiveDate::parse_and_remainder(text, pattern).ok()?;
        (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| date.into())
    })
}
