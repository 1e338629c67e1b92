//! One calendar instance: the components wired together the way a picker
//! widget drives them.
//!
//! Nothing here is shared between instances. Every engine owns its own
//! cache, navigator, constraints and selection.

use std::fmt;
use std::rc::Rc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CalendarCache, GridKey};
use crate::consts::DEFAULT_LOCALE;
use crate::error::{ConstraintError, EngineError};
use crate::event::Notification;
use crate::grid::MonthGrid;
use crate::navigator::{ViewNavigator, YearMonth, months_between};
use crate::normalize::{DateInput, DateNormalizer, RawValue};
use crate::recurrence::RecurringPattern;
use crate::selection::{CloseFlags, NoHooks, SelectOutcome, SelectionHooks, SelectionMachine, should_auto_close};
use crate::types::{CalendarCount, FirstDayOfWeek, SelectionMode};
use crate::validate::{ConstraintConfig, DisabledPredicate, HolidayProvider, ValidationConstraints, ValidationEngine, Violation};
use crate::value::SelectionValue;
use crate::CalendarDate;

/// Source of "today" for recentering.
pub type TodayFn = Rc<dyn Fn() -> CalendarDate>;

/// Serializable engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub mode:              SelectionMode,
    /// `0` = Sunday through `6` = Saturday
    pub first_day_of_week: u8,
    pub calendar_count:    CalendarCount,
    pub locale:            String,
    #[serde(flatten)]
    pub close:             CloseFlags,
    /// Month to open on when there is no value, as `YYYY-MM-DD`
    pub start_at:          Option<String>,
    pub max_selections:    Option<usize>,
    pub recurring:         Option<RecurringPattern>,
    pub constraints:       ConstraintConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mode:              SelectionMode::default(),
            first_day_of_week: FirstDayOfWeek::SUNDAY.get(),
            calendar_count:    CalendarCount::default(),
            locale:            DEFAULT_LOCALE.to_owned(),
            close:             CloseFlags::default(),
            start_at:          None,
            max_selections:    None,
            recurring:         None,
            constraints:       ConstraintConfig::default(),
        }
    }
}

/// Date-selection engine for a single picker instance.
pub struct CalendarEngine {
    normalizer:    DateNormalizer,
    validation:    ValidationEngine,
    cache:         CalendarCache,
    navigator:     ViewNavigator,
    selection:     SelectionMachine,
    hooks:         Rc<dyn SelectionHooks>,
    today:         TodayFn,
    first_day:     FirstDayOfWeek,
    locale:        String,
    count:         CalendarCount,
    close:         CloseFlags,
    start_at:      Option<CalendarDate>,
    resolved:      Option<ConstraintError>,
    notifications: Vec<Notification>,
}

impl fmt::Debug for CalendarEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarEngine")
            .field("view", &self.navigator.current())
            .field("mode", &self.selection.mode())
            .field("value", self.selection.value())
            .field("first_day", &self.first_day)
            .field("locale", &self.locale)
            .field("generation", &self.validation.generation())
            .finish_non_exhaustive()
    }
}

impl CalendarEngine {
    /// Builds an engine from configuration, reading dates in the host's
    /// local offset.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidFirstDayOfWeek` for a week start outside
    /// `0..=6` and `EngineError::Parse` when `start_at` is not a date.
    pub fn new(options: &EngineOptions) -> Result<Self, EngineError> {
        Self::with_normalizer(options, DateNormalizer::new())
    }

    /// Like `new`, with an explicit normalizer.
    ///
    /// Conflicting min/max bounds in the configuration are resolved with
    /// `ValidationConstraints::resolve_conflicts`; the original conflict
    /// stays available through `resolved_conflict`.
    ///
    /// # Errors
    /// See [`CalendarEngine::new`].
    pub fn with_normalizer(options: &EngineOptions, normalizer: DateNormalizer) -> Result<Self, EngineError> {
        let first_day = FirstDayOfWeek::new(options.first_day_of_week)
            .map_err(|_| EngineError::InvalidFirstDayOfWeek(options.first_day_of_week))?;
        let start_at = options.start_at.as_deref().map(str::parse::<CalendarDate>).transpose()?;

        let constraints = ValidationConstraints::from_config(&options.constraints, &normalizer);
        let resolved = constraints.conflict();
        let validation = ValidationEngine::new(constraints.resolve_conflicts());

        let selection = SelectionMachine::new(options.mode)
            .with_adapter(normalizer.shared_adapter())
            .with_first_day(first_day)
            .with_recurring(options.recurring.clone())
            .with_max_selections(options.max_selections);

        let mut cache = CalendarCache::new();
        cache.apply_layout(&options.locale, first_day);

        let today: TodayFn = Rc::new(|| CalendarDate::from(Local::now().date_naive()));
        let mut engine = Self {
            normalizer,
            validation,
            cache,
            navigator: ViewNavigator::default(),
            selection,
            hooks: Rc::new(NoHooks),
            today,
            first_day,
            locale: options.locale.clone(),
            count: options.calendar_count,
            close: options.close,
            start_at,
            resolved,
            notifications: Vec::new(),
        };
        engine.recenter();
        Ok(engine)
    }

    /// Parses options from JSON and builds the engine.
    ///
    /// # Errors
    /// Fails with `EngineError::Parse` when the JSON does not describe
    /// options, otherwise as [`CalendarEngine::with_normalizer`].
    pub fn from_json(options: &Value, normalizer: DateNormalizer) -> Result<Self, EngineError> {
        let options = EngineOptions::deserialize(options)
            .map_err(|err| EngineError::Parse(crate::ParseError::InvalidFormat(err.to_string())))?;
        Self::with_normalizer(&options, normalizer)
    }

    /// Replaces the clock used for "today" and recenters on it.
    #[must_use]
    pub fn with_today(mut self, today: TodayFn) -> Self {
        self.today = today;
        self.recenter();
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Rc<dyn SelectionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Adds a host predicate; returning `true` disables the date.
    #[must_use]
    pub fn with_predicate(mut self, predicate: DisabledPredicate) -> Self {
        let constraints = self.validation.constraints().clone().disabled_when(predicate);
        self.validation.set_constraints(constraints);
        self
    }

    #[must_use]
    pub fn with_holidays(mut self, provider: Rc<dyn HolidayProvider>, disable: bool) -> Self {
        let constraints = self.validation.constraints().clone().with_holidays(provider, disable);
        self.validation.set_constraints(constraints);
        self
    }

    pub const fn value(&self) -> &SelectionValue {
        self.selection.value()
    }

    pub const fn selection(&self) -> &SelectionMachine {
        &self.selection
    }

    pub const fn navigator(&self) -> &ViewNavigator {
        &self.navigator
    }

    pub const fn validation(&self) -> &ValidationEngine {
        &self.validation
    }

    pub const fn normalizer(&self) -> &DateNormalizer {
        &self.normalizer
    }

    pub const fn first_day(&self) -> FirstDayOfWeek {
        self.first_day
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub const fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The min/max conflict that was repaired while building the engine
    pub const fn resolved_conflict(&self) -> Option<ConstraintError> {
        self.resolved
    }

    /// Routes a click on `date`, gated by the constraints.
    ///
    /// # Errors
    /// Returns the first failing constraint when `date` is not selectable;
    /// the selection is left untouched.
    pub fn select(&mut self, date: CalendarDate) -> Result<SelectOutcome, Violation> {
        if let Err(violation) = self.validation.check(date) {
            debug!(%date, %violation, "click on unselectable date ignored");
            return Err(violation);
        }
        let validation = &self.validation;
        let outcome = self
            .selection
            .select_filtered(date, self.hooks.as_ref(), &|day| validation.is_valid(day));
        if let SelectOutcome::Committed(value) = &outcome {
            self.notifications.push(Notification::for_value(value));
        }
        Ok(outcome)
    }

    /// Like `select`, for input that has not been normalized yet.
    ///
    /// # Errors
    /// `Violation::Unparseable` when the input is not a date, otherwise as
    /// [`CalendarEngine::select`].
    pub fn select_input(&mut self, input: &DateInput) -> Result<SelectOutcome, Violation> {
        let date = self.normalizer.normalize(input).ok_or(Violation::Unparseable)?;
        self.select(date)
    }

    pub fn hover(&mut self, date: Option<CalendarDate>) -> bool {
        self.selection.hover(date)
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        self.notifications.push(Notification::Clear);
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.selection.set_mode(mode);
    }

    /// Applies a value pushed from an external binding and recenters the
    /// view on it. Values of the wrong shape for the mode become `None`.
    pub fn set_value(&mut self, raw: &RawValue) -> &SelectionValue {
        let value = self.normalizer.normalize_value(raw, self.selection.mode());
        self.selection.set_value(value);
        let before = self.navigator.current();
        self.recenter();
        self.announce_move(before, self.navigator.current());
        self.selection.value()
    }

    pub fn set_value_json(&mut self, value: &Value) -> &SelectionValue {
        self.set_value(&RawValue::from(value))
    }

    pub fn change_month(&mut self, delta: i32) -> YearMonth {
        let before = self.navigator.current();
        let after = self.navigator.change_month_with(delta, self.normalizer.adapter());
        self.announce_move(before, after)
    }

    pub fn change_year(&mut self, delta: i32) -> YearMonth {
        let before = self.navigator.current();
        let after = self.navigator.change_year(delta);
        self.announce_move(before, after)
    }

    pub fn change_decade(&mut self, delta_decades: i32) -> YearMonth {
        let before = self.navigator.current();
        let after = self.navigator.change_decade(delta_decades);
        self.announce_move(before, after)
    }

    pub fn go_to(&mut self, date: CalendarDate) -> YearMonth {
        let before = self.navigator.current();
        let after = self.navigator.go_to(date);
        self.announce_move(before, after)
    }

    fn announce_move(&mut self, from: YearMonth, to: YearMonth) -> YearMonth {
        if from != to {
            self.notifications.push(Notification::MonthChanged {
                from,
                to,
                delta: months_between(from, to),
            });
        }
        to
    }

    fn recenter(&mut self) {
        let today = (self.today)();
        self.navigator.recenter(
            self.selection.value(),
            self.start_at,
            self.validation.constraints().min_date(),
            today,
            self.count,
        );
    }

    /// # Errors
    /// `EngineError::InvalidFirstDayOfWeek` when `day` is 7 or larger.
    pub fn set_first_day_of_week(&mut self, day: u8) -> Result<(), EngineError> {
        let first_day = FirstDayOfWeek::new(day).map_err(|_| EngineError::InvalidFirstDayOfWeek(day))?;
        self.first_day = first_day;
        self.selection.set_first_day(first_day);
        self.cache.apply_layout(&self.locale, first_day);
        Ok(())
    }

    pub fn set_locale(&mut self, locale: &str) {
        self.locale = locale.to_owned();
        self.cache.apply_layout(locale, self.first_day);
    }

    pub fn set_calendar_count(&mut self, count: u8) {
        self.count = CalendarCount::clamped(count);
    }

    /// Replaces the constraints.
    ///
    /// # Errors
    /// `EngineError::Constraint` when the bounds conflict; the previous
    /// constraints stay in force.
    pub fn set_constraints(&mut self, constraints: ValidationConstraints) -> Result<(), EngineError> {
        if let Some(conflict) = constraints.conflict() {
            warn!(%conflict, "rejecting conflicting constraints");
            return Err(conflict.into());
        }
        self.validation.set_constraints(constraints);
        Ok(())
    }

    /// Replaces the constraints, repairing a min/max conflict. Returns the
    /// conflict that was repaired, if any.
    pub fn set_constraints_resolved(&mut self, constraints: ValidationConstraints) -> Option<ConstraintError> {
        let conflict = constraints.conflict();
        self.validation.set_constraints(constraints.resolve_conflicts());
        conflict
    }

    /// Grids for every visible month, preloading the months on either side.
    pub fn visible_grids(&mut self) -> Vec<Rc<MonthGrid>> {
        let months = self.navigator.visible_months(self.count);
        let mut grids = Vec::with_capacity(months.len());
        for month in &months {
            let lookup = self.cache.lookup(GridKey::new(month.year, month.month0 as i32, self.first_day));
            if lookup.generated {
                self.notifications.push(Notification::CalendarGenerated(*month));
            }
            grids.push(lookup.grid);
        }
        if let (Some(first), Some(last)) = (months.first(), months.last()) {
            self.cache.get(first.year, first.month0 as i32 - 1, self.first_day);
            self.cache.get(last.year, last.month0 as i32 + 1, self.first_day);
        }
        grids
    }

    pub fn is_disabled(&self, date: Option<CalendarDate>) -> bool {
        self.validation.is_disabled(date)
    }

    pub fn is_holiday(&self, date: CalendarDate) -> bool {
        self.validation.is_holiday(date)
    }

    pub fn holiday_label(&self, date: CalendarDate) -> Option<String> {
        self.validation.holiday_label(date)
    }

    /// Formats `date` through the engine's date adapter
    pub fn format(&self, date: CalendarDate, pattern: &str) -> String {
        self.normalizer.adapter().format(date, pattern)
    }

    /// Whether the popup should close for the current value
    pub fn should_close(&self) -> bool {
        should_auto_close(self.selection.mode(), self.selection.value(), self.close)
    }

    /// Takes every notification raised since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

/// Open picker instances, owned by the host.
///
/// Only one picker is open at a time: opening one reports the others so the
/// host can close them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRegistry<K> {
    open: Vec<K>,
}

impl<K> Default for PickerRegistry<K> {
    fn default() -> Self {
        Self { open: Vec::new() }
    }
}

impl<K: PartialEq + Clone> PickerRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` open and returns the ids that were open before it.
    pub fn open(&mut self, id: K) -> Vec<K> {
        let others: Vec<K> = self.open.drain(..).filter(|open| *open != id).collect();
        self.open.push(id);
        others
    }

    /// Returns whether `id` was open
    pub fn close(&mut self, id: &K) -> bool {
        let before = self.open.len();
        self.open.retain(|open| open != id);
        self.open.len() != before
    }

    pub fn is_open(&self, id: &K) -> bool {
        self.open.contains(id)
    }

    pub fn open_ids(&self) -> &[K] {
        &self.open
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::test_utils::{utc_normalizer, ymd};

    fn engine(options: &EngineOptions) -> CalendarEngine {
        CalendarEngine::with_normalizer(options, utc_normalizer())
            .unwrap()
            .with_today(Rc::new(|| ymd(2024, 6, 15)))
    }

    fn range_options() -> EngineOptions {
        EngineOptions {
            mode: SelectionMode::Range,
            ..EngineOptions::default()
        }
    }

    #[test]
    fn test_opens_on_today() {
        let engine = engine(&EngineOptions::default());
        assert_eq!(engine.navigator().current(), YearMonth { year: 2024, month0: 5 });
    }

    #[test]
    fn test_select_gated_by_constraints() {
        let options = EngineOptions {
            constraints: ConstraintConfig {
                min_date: Some("2024-06-10".to_owned()),
                ..ConstraintConfig::default()
            },
            ..range_options()
        };
        let mut engine = engine(&options);

        let refused = engine.select(ymd(2024, 6, 9));
        assert_eq!(refused, Err(Violation::BeforeMin { min: ymd(2024, 6, 10) }));
        assert!(engine.value().is_none());
        assert!(engine.drain_notifications().is_empty());

        engine.select(ymd(2024, 6, 12)).unwrap();
        engine.select(ymd(2024, 6, 14)).unwrap();
        assert!(matches!(
            engine.drain_notifications().as_slice(),
            [Notification::RangeSelected(_), Notification::RangeSelected(_)]
        ));
    }

    #[test]
    fn test_select_input() {
        let mut engine = engine(&EngineOptions::default());
        assert_eq!(engine.select_input(&"garbage".into()), Err(Violation::Unparseable));
        assert!(engine.select_input(&"06/20/2024".into()).unwrap().is_committed());
        assert_eq!(engine.value(), &SelectionValue::Single(ymd(2024, 6, 20)));
    }

    #[test]
    fn test_recurring_skips_disabled_days() {
        let options = EngineOptions {
            mode: SelectionMode::Multiple,
            recurring: Some(RecurringPattern::new(crate::recurrence::Frequency::Daily).count(4)),
            constraints: ConstraintConfig {
                disabled_dates: vec!["2024-06-02".to_owned()],
                ..ConstraintConfig::default()
            },
            ..EngineOptions::default()
        };
        let mut engine = engine(&options);
        engine.select(ymd(2024, 6, 1)).unwrap();
        assert_eq!(engine.value(), &SelectionValue::multiple([ymd(2024, 6, 1), ymd(2024, 6, 3), ymd(2024, 6, 4)]));
    }

    #[test]
    fn test_hooks_receive_value() {
        struct Counter(Cell<u32>);

        impl SelectionHooks for Counter {
            fn after_date_select(&self, _date: CalendarDate, value: &SelectionValue) {
                assert!(!value.is_none());
                self.0.set(self.0.get() + 1);
            }
        }

        let counter = Rc::new(Counter(Cell::new(0)));
        let mut engine = engine(&EngineOptions::default()).with_hooks(counter.clone());
        engine.select(ymd(2024, 6, 3)).unwrap();
        engine.select(ymd(2024, 6, 4)).unwrap();
        assert_eq!(counter.0.get(), 2);
    }

    #[test]
    fn test_navigation_notifications() {
        let mut engine = engine(&EngineOptions::default());
        engine.change_month(1);
        engine.change_month(0);
        engine.change_year(-1);
        let notes = engine.drain_notifications();
        assert_eq!(
            notes,
            vec![
                Notification::MonthChanged {
                    from:  YearMonth { year: 2024, month0: 5 },
                    to:    YearMonth { year: 2024, month0: 6 },
                    delta: 1,
                },
                Notification::MonthChanged {
                    from:  YearMonth { year: 2024, month0: 6 },
                    to:    YearMonth { year: 2023, month0: 6 },
                    delta: -12,
                },
            ]
        );
    }

    #[test]
    fn test_visible_grids_and_preload() {
        let options = EngineOptions {
            calendar_count: CalendarCount::clamped(2),
            ..EngineOptions::default()
        };
        let mut engine = engine(&options);
        let grids = engine.visible_grids();
        assert_eq!(grids.len(), 2);
        assert_eq!((grids[0].year(), grids[0].month0()), (2024, 5));
        assert_eq!((grids[1].year(), grids[1].month0()), (2024, 6));
        // two visible plus May and August
        assert_eq!(engine.cache_stats().misses, 4);
        assert_eq!(engine.drain_notifications().len(), 2);

        engine.visible_grids();
        assert!(engine.drain_notifications().is_empty());
    }

    #[test]
    fn test_week_start_change_invalidates_grids() {
        let mut engine = engine(&EngineOptions::default());
        let sunday = engine.visible_grids();
        engine.set_first_day_of_week(1).unwrap();
        let monday = engine.visible_grids();
        assert_ne!(sunday[0].first(), monday[0].first());
        assert_eq!(engine.cache_stats().invalidations, 1);

        assert_eq!(engine.set_first_day_of_week(7), Err(EngineError::InvalidFirstDayOfWeek(7)));
        assert_eq!(engine.first_day(), FirstDayOfWeek::MONDAY);
    }

    #[test]
    fn test_locale_change_invalidates_grids() {
        let mut engine = engine(&EngineOptions::default());
        engine.visible_grids();
        engine.set_locale(DEFAULT_LOCALE);
        assert_eq!(engine.cache_stats().invalidations, 0);
        engine.set_locale("fr-FR");
        assert_eq!(engine.cache_stats().invalidations, 1);
        assert_eq!(engine.locale(), "fr-FR");
    }

    #[test]
    fn test_set_value_recenters() {
        let mut engine = engine(&range_options());
        let value = engine.set_value_json(&json!({"start": "2022-03-04", "end": "2022-03-09"})).clone();
        assert_eq!(value.end(), Some(ymd(2022, 3, 9)));
        assert_eq!(engine.navigator().current(), YearMonth { year: 2022, month0: 2 });

        // Shape mismatch for the mode clears the value
        assert!(engine.set_value_json(&json!("2022-03-04")).is_none());
    }

    #[test]
    fn test_set_value_announces_move() {
        let mut engine = engine(&range_options());
        engine.drain_notifications();
        engine.set_value_json(&json!({"start": "2022-03-04", "end": "2022-03-09"}));
        assert_eq!(
            engine.drain_notifications(),
            vec![Notification::MonthChanged {
                from:  YearMonth { year: 2024, month0: 5 },
                to:    YearMonth { year: 2022, month0: 2 },
                delta: -27,
            }]
        );

        // Already showing the value: nothing moves, nothing is announced
        engine.set_value_json(&json!({"start": "2022-03-10", "end": null}));
        assert!(engine.drain_notifications().is_empty());
    }

    #[test]
    fn test_host_adapter_drives_engine() {
        use crate::adapter::DateAdapter;

        /// Months step in quarters, days compare by month
        struct Coarse;

        impl DateAdapter for Coarse {
            fn parse(&self, text: &str) -> Option<CalendarDate> {
                text.parse().ok()
            }

            fn format(&self, date: CalendarDate, _pattern: &str) -> String {
                format!("Q{} {}", date.month0() / 3 + 1, date.year())
            }

            fn add_months(&self, date: CalendarDate, months: i32) -> CalendarDate {
                date.add_months(months.saturating_mul(3))
            }

            fn is_same_day(&self, a: CalendarDate, b: CalendarDate) -> bool {
                a.same_month(b)
            }
        }

        let options = EngineOptions {
            mode: SelectionMode::Multiple,
            ..EngineOptions::default()
        };
        let normalizer = utc_normalizer().with_adapter(Rc::new(Coarse));
        let mut engine = CalendarEngine::with_normalizer(&options, normalizer)
            .unwrap()
            .with_today(Rc::new(|| ymd(2024, 6, 15)));

        assert_eq!(engine.change_month(1), YearMonth { year: 2024, month0: 8 });
        assert_eq!(engine.format(ymd(2024, 8, 1), "%Y-%m-%d"), "Q3 2024");

        engine.select(ymd(2024, 6, 3)).unwrap();
        engine.select(ymd(2024, 6, 20)).unwrap();
        assert!(engine.value().is_none());
    }

    #[test]
    fn test_should_close() {
        let options = EngineOptions {
            close: CloseFlags {
                auto_apply_close: true,
                ..CloseFlags::default()
            },
            ..range_options()
        };
        let mut engine = engine(&options);
        engine.select(ymd(2024, 6, 3)).unwrap();
        assert!(!engine.should_close());
        engine.select(ymd(2024, 6, 5)).unwrap();
        assert!(engine.should_close());
    }

    #[test]
    fn test_options_from_json() {
        let engine = CalendarEngine::from_json(
            &json!({
                "mode": "week",
                "first_day_of_week": 1,
                "calendar_count": 30,
                "auto_apply_close": true,
                "start_at": "2030-02-01",
                "constraints": {"min_date": "2025-06-20", "max_date": "2025-06-10"}
            }),
            utc_normalizer(),
        )
        .unwrap();
        assert_eq!(engine.selection().mode(), SelectionMode::Week);
        assert_eq!(engine.first_day(), FirstDayOfWeek::MONDAY);
        assert_eq!(
            engine.resolved_conflict(),
            Some(ConstraintError::MinAfterMax {
                min: ymd(2025, 6, 20),
                max: ymd(2025, 6, 10)
            })
        );
        assert_eq!(engine.validation().constraints().max_date(), Some(ymd(2025, 6, 21)));
        assert_eq!(engine.navigator().current(), YearMonth { year: 2030, month0: 1 });
    }

    #[test]
    fn test_invalid_options() {
        let options = EngineOptions {
            first_day_of_week: 9,
            ..EngineOptions::default()
        };
        assert!(matches!(
            CalendarEngine::with_normalizer(&options, utc_normalizer()),
            Err(EngineError::InvalidFirstDayOfWeek(9))
        ));

        let options = EngineOptions {
            start_at: Some("soon".to_owned()),
            ..EngineOptions::default()
        };
        assert!(matches!(
            CalendarEngine::with_normalizer(&options, utc_normalizer()),
            Err(EngineError::Parse(_))
        ));

        assert!(matches!(
            CalendarEngine::from_json(&json!({"mode": "fortnight"}), utc_normalizer()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_set_constraints_rejects_conflict() {
        let mut engine = engine(&EngineOptions::default());
        let conflicting = ValidationConstraints::new()
            .with_min(Some(ymd(2025, 6, 20)))
            .with_max(Some(ymd(2025, 6, 10)));

        assert!(matches!(engine.set_constraints(conflicting.clone()), Err(EngineError::Constraint(_))));
        assert_eq!(engine.validation().generation(), 0);

        assert!(engine.set_constraints_resolved(conflicting).is_some());
        assert!(engine.is_disabled(Some(ymd(2025, 6, 19))));
        assert!(!engine.is_disabled(Some(ymd(2025, 6, 21))));
    }

    #[test]
    fn test_holidays_and_predicate() {
        struct Christmas;

        impl HolidayProvider for Christmas {
            fn is_holiday(&self, date: CalendarDate) -> bool {
                date.month() == 12 && date.day() == 25
            }
        }

        let engine = engine(&EngineOptions::default())
            .with_holidays(Rc::new(Christmas), false)
            .with_predicate(Rc::new(|d: CalendarDate| d.day() == 13));
        assert!(engine.is_holiday(ymd(2024, 12, 25)));
        assert!(!engine.is_disabled(Some(ymd(2024, 12, 25))));
        assert_eq!(engine.holiday_label(ymd(2024, 12, 25)), None);
        assert!(engine.is_disabled(Some(ymd(2024, 12, 13))));
    }

    #[test]
    fn test_clear() {
        let mut engine = engine(&EngineOptions::default());
        engine.select(ymd(2024, 6, 3)).unwrap();
        engine.clear();
        assert!(engine.value().is_none());
        assert_eq!(engine.drain_notifications().last(), Some(&Notification::Clear));
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = engine(&EngineOptions::default());
        let b = engine(&EngineOptions::default());
        a.select(ymd(2024, 6, 3)).unwrap();
        a.change_month(3);
        assert!(b.value().is_none());
        assert_eq!(b.navigator().current(), YearMonth { year: 2024, month0: 5 });
    }

    #[test]
    fn test_registry_single_open() {
        let mut registry = PickerRegistry::new();
        assert!(registry.open("from").is_empty());
        assert_eq!(registry.open("to"), vec!["from"]);
        assert_eq!(registry.open_ids(), &["to"]);
        assert!(registry.open("to").is_empty());
        assert!(registry.close(&"to"));
        assert!(!registry.close(&"to"));
        assert!(!registry.is_open(&"from"));
    }
}
