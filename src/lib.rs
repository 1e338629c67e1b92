//! Date-selection engine for calendar widgets.
//!
//! The crate covers the calendar logic behind a date picker and nothing of
//! its rendering: fixed 42-cell month grids behind a small LRU cache, a
//! selection state machine for single, range, multiple and whole-period
//! modes, a constraint engine deciding which days are selectable, and
//! normalization of loosely typed host input into [`CalendarDate`]s.
//!
//! [`CalendarEngine`] wires the pieces together for one picker instance.
//! Every component can also be used on its own.
//!
//! ```
//! use datepick_core::{CalendarDate, CalendarEngine, EngineOptions, SelectionMode};
//!
//! let options = EngineOptions { mode: SelectionMode::Range, ..EngineOptions::default() };
//! let mut engine = CalendarEngine::new(&options).unwrap();
//! let start: CalendarDate = "2024-01-10".parse().unwrap();
//! let end: CalendarDate = "2024-01-20".parse().unwrap();
//! engine.select(start).unwrap();
//! engine.select(end).unwrap();
//! assert_eq!(engine.value().start(), Some(start));
//! assert_eq!(engine.value().end(), Some(end));
//! ```

mod adapter;
mod cache;
mod consts;
mod date;
mod engine;
mod error;
mod event;
mod grid;
mod navigator;
mod normalize;
mod prelude;
mod recurrence;
mod selection;
mod types;
mod validate;
mod value;

#[cfg(test)]
mod test_utils;

pub use adapter::{DateAdapter, NativeAdapter};
pub use cache::{CacheStats, CalendarCache, GridKey, Lookup};
pub use consts::*;
pub use date::{CalendarDate, ParseError};
pub use engine::{CalendarEngine, EngineOptions, PickerRegistry, TodayFn};
pub use error::{ConstraintError, EngineError};
pub use event::Notification;
pub use grid::{CellMonth, MonthGrid};
pub use navigator::{ViewNavigator, YearMonth, months_between};
pub use normalize::{DateInput, DateLike, DateNormalizer, RawValue};
pub use recurrence::{Frequency, RecurringPattern};
pub use selection::{
    CloseFlags, NoHooks, RangeState, SelectOutcome, SelectionHooks, SelectionMachine, period_containing,
    should_auto_close,
};
pub use types::{CalendarCount, FirstDayOfWeek, SelectionMode, days_in_month, is_leap_year};
pub use validate::{
    ConstraintConfig, DisabledPredicate, HolidayProvider, ValidationConstraints, ValidationEngine, Violation,
};
pub use value::{DateRange, DateSet, RangeError, SelectionValue};
