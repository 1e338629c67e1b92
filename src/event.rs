use serde::Serialize;

use crate::navigator::YearMonth;
use crate::value::{DateRange, DateSet, SelectionValue};
use crate::CalendarDate;

/// Discrete notification for the host, serialized as `{type, payload}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Notification {
    DateSelected(CalendarDate),
    RangeSelected(DateRange),
    DatesSelected(DateSet),
    CalendarGenerated(YearMonth),
    MonthChanged {
        from:  YearMonth,
        to:    YearMonth,
        delta: i32,
    },
    Clear,
}

impl Notification {
    /// The notification announcing a committed value
    pub fn for_value(value: &SelectionValue) -> Self {
        match value {
            SelectionValue::None => Self::Clear,
            SelectionValue::Single(date) => Self::DateSelected(*date),
            SelectionValue::Range(range) => Self::RangeSelected(*range),
            SelectionValue::Multiple(set) => Self::DatesSelected(set.clone()),
        }
    }
}
