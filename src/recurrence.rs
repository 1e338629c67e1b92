//! Recurring date patterns for multiple-selection mode.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{DateAdapter, NativeAdapter};
use crate::consts::{DAYS_PER_WEEK, MAX_RECURRENCE_MISSES, MAX_RECURRING_OCCURRENCES, MAX_YEAR, MONTHS_PER_YEAR};
use crate::types::FirstDayOfWeek;
use crate::CalendarDate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    /// Monday through Friday
    Weekdays,
    /// Saturday and Sunday
    Weekends,
}

/// Describes a repeating set of days anchored at the clicked date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringPattern {
    pub frequency:    Frequency,
    /// Step between occurrences in units of the frequency; 0 behaves as 1
    pub interval:     u32,
    /// Last day an occurrence may fall on (inclusive)
    pub until:        Option<CalendarDate>,
    /// Maximum number of occurrences, capped at `MAX_RECURRING_OCCURRENCES`
    pub count:        Option<usize>,
    /// Only keep occurrences on these weekdays (`0` = Sunday)
    pub days_of_week: Vec<FirstDayOfWeek>,
    /// Only keep occurrences on this day of the month. For monthly patterns
    /// this replaces the anchor's day.
    pub day_of_month: Option<u32>,
}

impl Default for RecurringPattern {
    fn default() -> Self {
        Self {
            frequency:    Frequency::Weekly,
            interval:     1,
            until:        None,
            count:        None,
            days_of_week: Vec::new(),
            day_of_month: None,
        }
    }
}

impl RecurringPattern {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn until(mut self, until: CalendarDate) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub const fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn on_days(mut self, days: &[Weekday]) -> Self {
        self.days_of_week = days.iter().copied().map(FirstDayOfWeek::from).collect();
        self
    }

    #[must_use]
    pub const fn on_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    /// Expands the pattern starting at `anchor` into a sorted, duplicate-free
    /// list of days. Never yields a day before `anchor`.
    pub fn materialize(&self, anchor: CalendarDate) -> Vec<CalendarDate> {
        self.materialize_with(anchor, &NativeAdapter)
    }

    /// Like `materialize`, stepping days and months through `adapter`.
    ///
    /// Expansion stops at `count`, at `until`, past `MAX_YEAR`, or after
    /// `MAX_RECURRENCE_MISSES` candidates in a row fail the filters.
    pub fn materialize_with(&self, anchor: CalendarDate, adapter: &dyn DateAdapter) -> Vec<CalendarDate> {
        let limit = self.count.unwrap_or(MAX_RECURRING_OCCURRENCES).min(MAX_RECURRING_OCCURRENCES);
        let interval = self.interval.max(1);
        let mut out = Vec::new();
        let mut qualifying: u32 = 0;
        let mut misses: u32 = 0;
        let mut step: i64 = 0;

        while out.len() < limit && misses < MAX_RECURRENCE_MISSES {
            let candidate = self.candidate(anchor, step, interval, adapter);
            step += 1;
            let date = match candidate {
                Candidate::Exhausted => break,
                Candidate::Skip => {
                    misses += 1;
                    continue;
                },
                Candidate::Day(date) => date,
            };
            if self.until.is_some_and(|until| date > until) {
                break;
            }
            if date < anchor || !self.passes_filters(date) {
                misses += 1;
                continue;
            }
            if matches!(self.frequency, Frequency::Weekdays | Frequency::Weekends) {
                // Every `interval`-th qualifying day
                let keep = qualifying % interval == 0;
                qualifying = qualifying.wrapping_add(1);
                if !keep {
                    misses += 1;
                    continue;
                }
            }
            misses = 0;
            out.push(date);
        }

        if misses >= MAX_RECURRENCE_MISSES {
            debug!(frequency = ?self.frequency, found = out.len(), "recurring pattern ran dry");
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// The `step`-th candidate, in chronological order.
    fn candidate(&self, anchor: CalendarDate, step: i64, interval: u32, adapter: &dyn DateAdapter) -> Candidate {
        let interval = i64::from(interval);
        let week = i64::from(DAYS_PER_WEEK);
        match self.frequency {
            Frequency::Daily => Candidate::days_from(anchor, step.saturating_mul(interval), adapter),
            Frequency::Weekly if self.days_of_week.is_empty() => {
                Candidate::days_from(anchor, step.saturating_mul(week).saturating_mul(interval), adapter)
            },
            Frequency::Weekly => {
                // Every day of each active week; inactive weeks are never visited
                let active_week = step / week;
                let offset = active_week.saturating_mul(interval).saturating_mul(week).saturating_add(step % week);
                Candidate::days_from(anchor, offset, adapter)
            },
            Frequency::Monthly => {
                let months = step.saturating_mul(interval);
                // Months from the anchor's month through December of MAX_YEAR
                let remaining = (i64::from(MAX_YEAR) - i64::from(anchor.year())) * i64::from(MONTHS_PER_YEAR)
                    + i64::from(MONTHS_PER_YEAR)
                    - i64::from(anchor.month0());
                let Ok(months) = i32::try_from(months) else {
                    return Candidate::Exhausted;
                };
                if i64::from(months) >= remaining {
                    return Candidate::Exhausted;
                }
                let target = adapter.add_months(anchor.first_of_month(), months);
                let day = self.day_of_month.unwrap_or_else(|| anchor.day());
                CalendarDate::from_ymd(target.year(), target.month(), day).map_or(Candidate::Skip, Candidate::Day)
            },
            Frequency::Yearly => {
                let year = i64::from(anchor.year()).saturating_add(step.saturating_mul(interval));
                match i32::try_from(year) {
                    Ok(year) if year <= MAX_YEAR => CalendarDate::from_ymd(year, anchor.month(), anchor.day())
                        .map_or(Candidate::Skip, Candidate::Day),
                    _ => Candidate::Exhausted,
                }
            },
            Frequency::Weekdays | Frequency::Weekends => {
                let wants_weekend = self.frequency == Frequency::Weekends;
                match Candidate::days_from(anchor, step, adapter) {
                    Candidate::Day(day) if is_weekend(day.weekday()) != wants_weekend => Candidate::Skip,
                    other => other,
                }
            },
        }
    }

    fn passes_filters(&self, date: CalendarDate) -> bool {
        let weekday_ok = self.days_of_week.is_empty()
            || self.days_of_week.contains(&FirstDayOfWeek::from(date.weekday()));
        let day_ok = self.frequency == Frequency::Monthly || self.day_of_month.is_none_or(|day| date.day() == day);
        weekday_ok && day_ok
    }
}

enum Candidate {
    Day(CalendarDate),
    /// No day at this step, e.g. the 31st of a 30-day month
    Skip,
    /// Past the supported range; nothing later can match
    Exhausted,
}

impl Candidate {
    fn days_from(anchor: CalendarDate, days: i64, adapter: &dyn DateAdapter) -> Self {
        let date = adapter.add_days(anchor, days);
        if date.year() > MAX_YEAR { Self::Exhausted } else { Self::Day(date) }
    }
}

const fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}
