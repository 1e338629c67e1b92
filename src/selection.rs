//! Mode-specific selection transitions.
//!
//! Every transition produces a fresh `SelectionValue`; the previous value is
//! never edited in place. Host hooks receive the committed value by
//! reference, so nothing they can observe is ever half-updated.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{DateAdapter, NativeAdapter};
use crate::consts::{DAYS_PER_WEEK, MONTHS_PER_QUARTER, MONTHS_PER_YEAR};
use crate::recurrence::RecurringPattern;
use crate::types::{FirstDayOfWeek, SelectionMode};
use crate::value::{DateRange, DateSet, SelectionValue};
use crate::CalendarDate;

/// Host callbacks consulted around a click. All methods default to allowing
/// everything.
pub trait SelectionHooks {
    /// Returning `false` vetoes the click; nothing changes and no other hook runs.
    fn before_date_select(&self, _date: CalendarDate, _current: &SelectionValue) -> bool {
        true
    }

    /// Runs after a transition was committed, with the new value.
    fn after_date_select(&self, _date: CalendarDate, _value: &SelectionValue) {}

    /// Returning `false` refuses to complete a range; the click restarts it instead.
    fn validate_range(&self, _start: CalendarDate, _end: CalendarDate) -> bool {
        true
    }
}

/// Hooks that allow everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl SelectionHooks for NoHooks {}

/// What a click did to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Committed(SelectionValue),
    /// `before_date_select` refused the click
    Vetoed,
    /// The click is a no-op in the current state
    Unchanged,
}

impl SelectOutcome {
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Range-mode view of the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeState {
    Empty,
    HasStart(CalendarDate),
    Complete(DateRange),
}

impl From<&SelectionValue> for RangeState {
    fn from(value: &SelectionValue) -> Self {
        match value {
            SelectionValue::Range(range) => match range.end() {
                Some(_) => Self::Complete(*range),
                None => Self::HasStart(range.start()),
            },
            _ => Self::Empty,
        }
    }
}

/// Flags that decide whether committing a value closes the popup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseFlags {
    pub auto_apply_close: bool,
    pub show_time:        bool,
    pub time_only:        bool,
    pub inline:           bool,
}

/// Whether the popup should close after committing `value`.
///
/// Only a non-empty single value or a complete range closes, and only when
/// auto-close is enabled for a popup that carries no time component.
pub fn should_auto_close(mode: SelectionMode, value: &SelectionValue, flags: CloseFlags) -> bool {
    if !flags.auto_apply_close || flags.inline || flags.show_time || flags.time_only {
        return false;
    }
    match (mode, value) {
        (SelectionMode::Single, SelectionValue::Single(_)) => true,
        (SelectionMode::Range, SelectionValue::Range(range)) => range.is_complete(),
        _ => false,
    }
}

/// The closed week, month, quarter or year containing `date`.
///
/// Weeks start on `first_day`. Period ends are found by stepping through
/// `adapter`. Returns `None` for modes that do not select whole periods.
pub fn period_containing(
    mode: SelectionMode,
    date: CalendarDate,
    first_day: FirstDayOfWeek,
    adapter: &dyn DateAdapter,
) -> Option<DateRange> {
    let (start, months) = match mode {
        SelectionMode::Week => {
            let start = adapter.add_days(date, -i64::from(first_day.column_of(date.weekday())));
            let end = adapter.add_days(start, i64::from(DAYS_PER_WEEK) - 1);
            return Some(DateRange::spanning(start, end));
        },
        SelectionMode::Month => (date.first_of_month(), 1),
        SelectionMode::Quarter => {
            let first_month = (date.month0() / MONTHS_PER_QUARTER * MONTHS_PER_QUARTER) as i32;
            (CalendarDate::from_ymd_lenient(date.year(), first_month, 1), MONTHS_PER_QUARTER as i32)
        },
        SelectionMode::Year => (CalendarDate::from_ymd_lenient(date.year(), 0, 1), MONTHS_PER_YEAR),
        SelectionMode::Single | SelectionMode::Range | SelectionMode::Multiple => return None,
    };
    // Last day of the period's final month
    let end = adapter.add_months(start, months - 1).last_of_month();
    Some(DateRange::spanning(start, end))
}

/// Selection state for one calendar instance.
///
/// Day equality and period arithmetic go through the machine's
/// [`DateAdapter`], `NativeAdapter` unless the host supplies one.
#[derive(Clone)]
pub struct SelectionMachine {
    mode:           SelectionMode,
    value:          SelectionValue,
    hovered:        Option<CalendarDate>,
    first_day:      FirstDayOfWeek,
    recurring:      Option<RecurringPattern>,
    max_selections: Option<usize>,
    adapter:        Rc<dyn DateAdapter>,
}

impl fmt::Debug for SelectionMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionMachine")
            .field("mode", &self.mode)
            .field("value", &self.value)
            .field("hovered", &self.hovered)
            .field("first_day", &self.first_day)
            .field("recurring", &self.recurring)
            .field("max_selections", &self.max_selections)
            .finish_non_exhaustive()
    }
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new(SelectionMode::default())
    }
}

impl SelectionMachine {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            value: SelectionValue::None,
            hovered: None,
            first_day: FirstDayOfWeek::default(),
            recurring: None,
            max_selections: None,
            adapter: Rc::new(NativeAdapter),
        }
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: Rc<dyn DateAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    #[must_use]
    pub const fn with_first_day(mut self, first_day: FirstDayOfWeek) -> Self {
        self.first_day = first_day;
        self
    }

    /// Replaces toggling in multiple mode with materializing `pattern`.
    #[must_use]
    pub fn with_recurring(mut self, pattern: Option<RecurringPattern>) -> Self {
        self.recurring = pattern;
        self
    }

    /// Caps the number of days multiple mode may hold
    #[must_use]
    pub const fn with_max_selections(mut self, max: Option<usize>) -> Self {
        self.max_selections = max;
        self
    }

    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub const fn value(&self) -> &SelectionValue {
        &self.value
    }

    pub const fn hovered(&self) -> Option<CalendarDate> {
        self.hovered
    }

    pub const fn first_day(&self) -> FirstDayOfWeek {
        self.first_day
    }

    pub fn range_state(&self) -> RangeState {
        RangeState::from(&self.value)
    }

    /// Switching modes drops the current selection, since its shape belongs
    /// to the old mode.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if mode != self.mode {
            self.mode = mode;
            self.value = SelectionValue::None;
            self.hovered = None;
        }
    }

    pub const fn set_first_day(&mut self, first_day: FirstDayOfWeek) {
        self.first_day = first_day;
    }

    /// Replaces the value from an external binding. No hooks run.
    pub fn set_value(&mut self, value: SelectionValue) {
        self.value = value;
        self.hovered = None;
    }

    pub fn clear(&mut self) {
        self.set_value(SelectionValue::None);
    }

    /// Routes a click through the current mode's transition.
    pub fn select(&mut self, date: CalendarDate, hooks: &dyn SelectionHooks) -> SelectOutcome {
        self.select_filtered(date, hooks, &|_| true)
    }

    /// Like `select`, dropping recurring occurrences `selectable` rejects.
    pub fn select_filtered(
        &mut self,
        date: CalendarDate,
        hooks: &dyn SelectionHooks,
        selectable: &dyn Fn(CalendarDate) -> bool,
    ) -> SelectOutcome {
        if !hooks.before_date_select(date, &self.value) {
            debug!(%date, mode = %self.mode, "selection vetoed");
            return SelectOutcome::Vetoed;
        }
        let Some(next) = self.next_value(date, hooks, selectable) else {
            return SelectOutcome::Unchanged;
        };

        self.value = next;
        if !matches!(self.range_state(), RangeState::HasStart(_)) {
            self.hovered = None;
        }
        debug!(%date, mode = %self.mode, "selection committed");
        hooks.after_date_select(date, &self.value);
        SelectOutcome::Committed(self.value.clone())
    }

    /// The value a click on `date` leads to, or `None` for a no-op.
    fn next_value(
        &self,
        date: CalendarDate,
        hooks: &dyn SelectionHooks,
        selectable: &dyn Fn(CalendarDate) -> bool,
    ) -> Option<SelectionValue> {
        match self.mode {
            SelectionMode::Single => Some(SelectionValue::Single(date)),
            SelectionMode::Range => self.next_range(date, hooks),
            SelectionMode::Multiple => match &self.recurring {
                Some(pattern) => {
                    let occurrences = pattern
                        .materialize_with(date, self.adapter.as_ref())
                        .into_iter()
                        .filter(|d| selectable(*d));
                    let limit = self.max_selections.unwrap_or(usize::MAX);
                    Some(SelectionValue::multiple(occurrences.take(limit)))
                },
                None => self.next_toggle(date),
            },
            mode => period_containing(mode, date, self.first_day, self.adapter.as_ref()).map(SelectionValue::Range),
        }
    }

    fn next_range(&self, date: CalendarDate, hooks: &dyn SelectionHooks) -> Option<SelectionValue> {
        let range = match self.range_state() {
            RangeState::Empty | RangeState::Complete(_) => DateRange::open(date),
            RangeState::HasStart(start) if self.adapter.is_same_day(date, start) => return None,
            RangeState::HasStart(start) if date < start => DateRange::open(date),
            RangeState::HasStart(start) => {
                if hooks.validate_range(start, date) {
                    DateRange::spanning(start, date)
                } else {
                    debug!(%start, end = %date, "range completion refused; restarting");
                    DateRange::open(date)
                }
            },
        };
        Some(SelectionValue::Range(range))
    }

    fn next_toggle(&self, date: CalendarDate) -> Option<SelectionValue> {
        let current = match &self.value {
            SelectionValue::Multiple(set) => set.clone(),
            _ => DateSet::default(),
        };
        // A click on a day the adapter considers already selected removes that day
        if let Some(existing) = current.iter().copied().find(|day| self.adapter.is_same_day(*day, date)) {
            return Some(SelectionValue::from_set(current.toggled(existing)));
        }
        if self.max_selections.is_some_and(|max| current.len() >= max) {
            debug!(%date, "multiple selection is full");
            return None;
        }
        Some(SelectionValue::from_set(current.toggled(date)))
    }

    /// Records the hovered day. Only kept while a range has its start and
    /// no end; returns whether the stored hover changed.
    pub fn hover(&mut self, date: Option<CalendarDate>) -> bool {
        let next = match (self.mode, self.range_state()) {
            (SelectionMode::Range, RangeState::HasStart(_)) => date,
            _ => None,
        };
        let changed = next != self.hovered;
        self.hovered = next;
        changed
    }

    /// Bounds of the hover preview, ordered
    pub fn hover_preview(&self) -> Option<(CalendarDate, CalendarDate)> {
        let RangeState::HasStart(start) = self.range_state() else {
            return None;
        };
        let hovered = self.hovered?;
        Some((start.min(hovered), start.max(hovered)))
    }

    /// Whether `date` lies strictly inside the hover preview
    pub fn is_in_hover_preview(&self, date: CalendarDate) -> bool {
        self.hover_preview().is_some_and(|(low, high)| low < date && date < high)
    }

    pub fn is_selected(&self, date: CalendarDate) -> bool {
        match &self.value {
            SelectionValue::Range(_) => self.is_range_start(date) || self.is_range_end(date),
            value => value.contains(date),
        }
    }

    pub fn is_range_start(&self, date: CalendarDate) -> bool {
        self.value.as_range().is_some_and(|range| range.start() == date)
    }

    pub fn is_range_end(&self, date: CalendarDate) -> bool {
        self.value.as_range().is_some_and(|range| range.end() == Some(date))
    }

    /// Whether `date` lies strictly between the bounds of a complete range
    pub fn is_in_range(&self, date: CalendarDate) -> bool {
        self.value
            .as_range()
            .and_then(|range| range.end().map(|end| (range.start(), end)))
            .is_some_and(|(start, end)| start < date && date < end)
    }
}
