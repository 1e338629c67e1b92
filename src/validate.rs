use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::consts::MAX_VALIDITY_MEMO;
use crate::error::ConstraintError;
use crate::normalize::{DateInput, DateNormalizer};
use crate::value::DateRange;
use crate::{CalendarDate, prelude::*};

/// Holiday lookup supplied by the host.
pub trait HolidayProvider {
    fn is_holiday(&self, date: CalendarDate) -> bool;

    /// Display label for a holiday, if the provider has one
    fn holiday_label(&self, _date: CalendarDate) -> Option<String> {
        None
    }
}

/// Host predicate; returning `true` disables the date.
pub type DisabledPredicate = Rc<dyn Fn(CalendarDate) -> bool>;

/// The first constraint a date failed, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum Violation {
    #[display(fmt = "input is not a date")]
    Unparseable,
    #[display(fmt = "before minimum date {min}")]
    BeforeMin { min: CalendarDate },
    #[display(fmt = "after maximum date {max}")]
    AfterMax { max: CalendarDate },
    #[display(fmt = "date is disabled")]
    DisabledDate,
    #[display(fmt = "inside disabled range {range}")]
    DisabledRange { range: DateRange },
    #[display(fmt = "rejected by custom rule")]
    CustomPredicate,
    #[display(fmt = "date is a holiday")]
    Holiday,
}

/// Serializable part of the constraints, as read from host configuration.
///
/// Dates are kept as text so entries that fail to parse can be reported
/// instead of failing the whole configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    pub min_date:         Option<String>,
    pub max_date:         Option<String>,
    pub disabled_dates:   Vec<String>,
    pub disabled_ranges:  Vec<(String, String)>,
    pub disable_holidays: bool,
}

/// Immutable snapshot of every rule that can make a date unselectable.
#[derive(Clone, Default)]
pub struct ValidationConstraints {
    min_date:          Option<CalendarDate>,
    max_date:          Option<CalendarDate>,
    disabled_dates:    BTreeSet<CalendarDate>,
    rejected_disabled: Vec<String>,
    disabled_ranges:   Vec<DateRange>,
    predicate:         Option<DisabledPredicate>,
    holidays:          Option<Rc<dyn HolidayProvider>>,
    disable_holidays:  bool,
}

impl fmt::Debug for ValidationConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationConstraints")
            .field("min_date", &self.min_date)
            .field("max_date", &self.max_date)
            .field("disabled_dates", &self.disabled_dates)
            .field("rejected_disabled", &self.rejected_disabled)
            .field("disabled_ranges", &self.disabled_ranges)
            .field("predicate", &self.predicate.is_some())
            .field("holidays", &self.holidays.is_some())
            .field("disable_holidays", &self.disable_holidays)
            .finish()
    }
}

impl ValidationConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds constraints from configuration, normalizing every date through
    /// `normalizer`. Unparseable bounds are dropped; unparseable disabled
    /// entries never match and are listed in `rejected_disabled_dates`.
    pub fn from_config(config: &ConstraintConfig, normalizer: &DateNormalizer) -> Self {
        let parse = |text: &str| normalizer.normalize(&DateInput::from(text));
        let mut constraints = Self::new();

        for (name, bound) in [("min_date", &config.min_date), ("max_date", &config.max_date)] {
            if let Some(text) = bound
                && parse(text).is_none()
            {
                warn!(bound = name, value = %text, "ignoring unparseable date bound");
            }
        }
        constraints.min_date = config.min_date.as_deref().and_then(parse);
        constraints.max_date = config.max_date.as_deref().and_then(parse);

        for text in &config.disabled_dates {
            constraints = constraints.disable_text(text, normalizer);
        }
        for (start, end) in &config.disabled_ranges {
            match (parse(start), parse(end)) {
                (Some(a), Some(b)) => constraints.disabled_ranges.push(DateRange::spanning(a, b)),
                _ => warn!(start = %start, end = %end, "ignoring unparseable disabled range"),
            }
        }
        constraints.disable_holidays = config.disable_holidays;
        constraints
    }

    #[must_use]
    pub const fn with_min(mut self, min: Option<CalendarDate>) -> Self {
        self.min_date = min;
        self
    }

    #[must_use]
    pub const fn with_max(mut self, max: Option<CalendarDate>) -> Self {
        self.max_date = max;
        self
    }

    #[must_use]
    pub fn disable(mut self, date: CalendarDate) -> Self {
        self.disabled_dates.insert(date);
        self
    }

    /// Disables a date given as host text. Text that does not parse is
    /// remembered for diagnostics and never matches any date.
    #[must_use]
    pub fn disable_text(mut self, text: &str, normalizer: &DateNormalizer) -> Self {
        match normalizer.normalize(&DateInput::from(text)) {
            Some(date) => {
                self.disabled_dates.insert(date);
            },
            None => {
                warn!(value = %text, "disabled date entry does not parse; it will never match");
                self.rejected_disabled.push(text.to_owned());
            },
        }
        self
    }

    /// Disables every day between `a` and `b` inclusive, in either order
    #[must_use]
    pub fn disable_range(mut self, a: CalendarDate, b: CalendarDate) -> Self {
        self.disabled_ranges.push(DateRange::spanning(a, b));
        self
    }

    #[must_use]
    pub fn disabled_when(mut self, predicate: DisabledPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Attaches a holiday provider. Holidays are only unselectable when
    /// `disable` is set; lookups work either way.
    #[must_use]
    pub fn with_holidays(mut self, provider: Rc<dyn HolidayProvider>, disable: bool) -> Self {
        self.holidays = Some(provider);
        self.disable_holidays = disable;
        self
    }

    pub const fn min_date(&self) -> Option<CalendarDate> {
        self.min_date
    }

    pub const fn max_date(&self) -> Option<CalendarDate> {
        self.max_date
    }

    pub fn rejected_disabled_dates(&self) -> &[String] {
        &self.rejected_disabled
    }

    /// Reports bounds that would leave no selectable day.
    pub fn conflict(&self) -> Option<ConstraintError> {
        match (self.min_date, self.max_date) {
            (Some(min), Some(max)) if min > max => Some(ConstraintError::MinAfterMax { min, max }),
            _ => None,
        }
    }

    /// Applies the default recovery for `conflict`: `max_date` is widened to
    /// the day after `min_date`.
    #[must_use]
    pub fn resolve_conflicts(mut self) -> Self {
        if let Some(ConstraintError::MinAfterMax { min, max }) = self.conflict() {
            let widened = min.add_days(1);
            warn!(%min, %max, %widened, "min date is after max date; widening max date");
            self.max_date = Some(widened);
        }
        self
    }

    fn evaluate(&self, date: CalendarDate) -> Result<(), Violation> {
        if let Some(min) = self.min_date
            && date < min
        {
            return Err(Violation::BeforeMin { min });
        }
        if let Some(max) = self.max_date
            && date > max
        {
            return Err(Violation::AfterMax { max });
        }
        if self.disabled_dates.contains(&date) {
            return Err(Violation::DisabledDate);
        }
        if let Some(range) = self.disabled_ranges.iter().find(|range| range.contains(date)) {
            return Err(Violation::DisabledRange { range: *range });
        }
        if let Some(predicate) = &self.predicate
            && predicate(date)
        {
            return Err(Violation::CustomPredicate);
        }
        if self.disable_holidays
            && let Some(holidays) = &self.holidays
            && holidays.is_holiday(date)
        {
            return Err(Violation::Holiday);
        }
        Ok(())
    }
}

/// Evaluates dates against the current constraint snapshot.
///
/// Results are memoized per date. The memo belongs to one constraint
/// `generation`; replacing the constraints bumps the generation and drops it.
/// It is also dropped whenever it reaches `MAX_VALIDITY_MEMO` dates.
#[derive(Debug, Default)]
pub struct ValidationEngine {
    constraints: ValidationConstraints,
    generation:  u64,
    memo:        RefCell<HashMap<CalendarDate, Result<(), Violation>>>,
}

impl ValidationEngine {
    pub fn new(constraints: ValidationConstraints) -> Self {
        Self {
            constraints,
            generation: 0,
            memo: RefCell::default(),
        }
    }

    pub const fn constraints(&self) -> &ValidationConstraints {
        &self.constraints
    }

    /// Bumped on every `set_constraints`
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_constraints(&mut self, constraints: ValidationConstraints) {
        self.constraints = constraints;
        self.generation += 1;
        self.memo.get_mut().clear();
        debug!(generation = self.generation, "constraints replaced");
    }

    /// Checks `date` against every constraint, reporting the first failure.
    pub fn check(&self, date: CalendarDate) -> Result<(), Violation> {
        if let Some(cached) = self.memo.borrow().get(&date) {
            return *cached;
        }
        // Host callbacks may read this engine, so no borrow is held while they run
        let result = self.constraints.evaluate(date);
        let mut memo = self.memo.borrow_mut();
        if memo.len() >= MAX_VALIDITY_MEMO {
            trace!(size = memo.len(), "validity memo full; starting over");
            memo.clear();
        }
        memo.insert(date, result);
        result
    }

    /// Dates currently memoized
    pub fn memo_len(&self) -> usize {
        self.memo.borrow().len()
    }

    /// Like `check`, for input that has not been normalized yet.
    pub fn check_input(&self, input: &DateInput, normalizer: &DateNormalizer) -> Result<(), Violation> {
        normalizer.normalize(input).map_or(Err(Violation::Unparseable), |date| self.check(date))
    }

    pub fn is_valid(&self, date: CalendarDate) -> bool {
        self.check(date).is_ok()
    }

    /// `None` (no date) is always disabled
    pub fn is_disabled(&self, date: Option<CalendarDate>) -> bool {
        date.is_none_or(|date| !self.is_valid(date))
    }

    pub fn is_holiday(&self, date: CalendarDate) -> bool {
        self.constraints.holidays.as_ref().is_some_and(|h| h.is_holiday(date))
    }

    pub fn holiday_label(&self, date: CalendarDate) -> Option<String> {
        let holidays = self.constraints.holidays.as_ref()?;
        if holidays.is_holiday(date) { holidays.holiday_label(date) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{utc_normalizer, ymd};
    use chrono::Weekday;

    struct NewYear;

    impl HolidayProvider for NewYear {
        fn is_holiday(&self, date: CalendarDate) -> bool {
            date.month() == 1 && date.day() == 1
        }

        fn holiday_label(&self, _date: CalendarDate) -> Option<String> {
            Some("New Year's Day".to_owned())
        }
    }

    #[test]
    fn test_bounds() {
        let engine = ValidationEngine::new(
            ValidationConstraints::new()
                .with_min(Some(ymd(2024, 1, 10)))
                .with_max(Some(ymd(2024, 1, 20))),
        );
        assert_eq!(engine.check(ymd(2024, 1, 9)), Err(Violation::BeforeMin { min: ymd(2024, 1, 10) }));
        assert!(engine.is_valid(ymd(2024, 1, 10)));
        assert!(engine.is_valid(ymd(2024, 1, 20)));
        assert_eq!(engine.check(ymd(2024, 1, 21)), Err(Violation::AfterMax { max: ymd(2024, 1, 20) }));
    }

    #[test]
    fn test_disabled_dates_and_ranges() {
        let engine = ValidationEngine::new(
            ValidationConstraints::new()
                .disable(ymd(2024, 3, 1))
                .disable_range(ymd(2024, 3, 20), ymd(2024, 3, 10)),
        );
        assert_eq!(engine.check(ymd(2024, 3, 1)), Err(Violation::DisabledDate));
        assert!(engine.is_valid(ymd(2024, 3, 9)));
        assert!(engine.is_disabled(Some(ymd(2024, 3, 10))));
        assert!(engine.is_disabled(Some(ymd(2024, 3, 20))));
        assert!(engine.is_valid(ymd(2024, 3, 21)));
    }

    #[test]
    fn test_unparseable_disabled_entry_never_matches() {
        let normalizer = utc_normalizer();
        let constraints = ValidationConstraints::new()
            .disable_text("not-a-date", &normalizer)
            .disable_text("2024-03-05", &normalizer);
        assert_eq!(constraints.rejected_disabled_dates(), &["not-a-date".to_owned()]);

        let engine = ValidationEngine::new(constraints);
        assert!(engine.is_disabled(Some(ymd(2024, 3, 5))));
        assert!(engine.is_valid(ymd(2024, 3, 6)));
    }

    #[test]
    fn test_custom_predicate() {
        let weekends: DisabledPredicate = Rc::new(|d: CalendarDate| matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
        let engine = ValidationEngine::new(ValidationConstraints::new().disabled_when(weekends));
        // 2024-06-01 is a Saturday
        assert_eq!(engine.check(ymd(2024, 6, 1)), Err(Violation::CustomPredicate));
        assert!(engine.is_valid(ymd(2024, 6, 3)));
    }

    #[test]
    fn test_holidays_flag_without_disabling() {
        let engine = ValidationEngine::new(ValidationConstraints::new().with_holidays(Rc::new(NewYear), false));
        assert!(engine.is_holiday(ymd(2025, 1, 1)));
        assert_eq!(engine.holiday_label(ymd(2025, 1, 1)).as_deref(), Some("New Year's Day"));
        assert_eq!(engine.holiday_label(ymd(2025, 1, 2)), None);
        assert!(engine.is_valid(ymd(2025, 1, 1)));
    }

    #[test]
    fn test_holidays_disabled() {
        let engine = ValidationEngine::new(ValidationConstraints::new().with_holidays(Rc::new(NewYear), true));
        assert_eq!(engine.check(ymd(2025, 1, 1)), Err(Violation::Holiday));
    }

    #[test]
    fn test_none_is_disabled() {
        let engine = ValidationEngine::default();
        assert!(engine.is_disabled(None));
        assert!(!engine.is_disabled(Some(ymd(2024, 1, 1))));
    }

    #[test]
    fn test_check_input_unparseable() {
        let engine = ValidationEngine::default();
        let normalizer = utc_normalizer();
        assert_eq!(engine.check_input(&"31/31/2024".into(), &normalizer), Err(Violation::Unparseable));
        assert_eq!(engine.check_input(&"2024-01-31".into(), &normalizer), Ok(()));
    }

    #[test]
    fn test_memo_stays_bounded() {
        let engine = ValidationEngine::new(ValidationConstraints::new());
        let start = ymd(2000, 1, 1);
        // Years of browsing, one check per rendered cell
        for offset in 0..10_000 {
            assert!(engine.is_valid(start.add_days(offset)));
            assert!(engine.memo_len() <= MAX_VALIDITY_MEMO);
        }
        assert!(engine.memo_len() > 0);
    }

    #[test]
    fn test_adding_disabled_date_invalidates() {
        let base = ValidationConstraints::new().with_min(Some(ymd(2024, 1, 1)));
        let date = ymd(2024, 2, 2);
        let mut engine = ValidationEngine::new(base.clone());
        assert!(engine.is_valid(date));

        engine.set_constraints(base.disable(date));
        assert_eq!(engine.generation(), 1);
        assert!(!engine.is_valid(date));
    }

    #[test]
    fn test_relaxing_never_invalidates() {
        let strict = ValidationConstraints::new()
            .with_min(Some(ymd(2024, 1, 5)))
            .with_max(Some(ymd(2024, 1, 25)))
            .disable(ymd(2024, 1, 12))
            .disable_range(ymd(2024, 1, 15), ymd(2024, 1, 17));
        let relaxed = ValidationConstraints::new().with_min(Some(ymd(2024, 1, 1))).disable(ymd(2024, 1, 12));

        let strict = ValidationEngine::new(strict);
        let relaxed = ValidationEngine::new(relaxed);
        let mut day = ymd(2024, 1, 1);
        while day.month() == 1 {
            if strict.is_valid(day) {
                assert!(relaxed.is_valid(day), "{day} became invalid after relaxing");
            }
            day = day.add_days(1);
        }
    }

    #[test]
    fn test_conflict_reported_and_resolved() {
        let constraints = ValidationConstraints::new()
            .with_min(Some(ymd(2025, 6, 20)))
            .with_max(Some(ymd(2025, 6, 10)));
        assert_eq!(
            constraints.conflict(),
            Some(ConstraintError::MinAfterMax {
                min: ymd(2025, 6, 20),
                max: ymd(2025, 6, 10)
            })
        );

        let resolved = constraints.resolve_conflicts();
        assert_eq!(resolved.max_date(), Some(ymd(2025, 6, 21)));
        assert_eq!(resolved.conflict(), None);
    }

    #[test]
    fn test_from_config() {
        let config: ConstraintConfig = serde_json::from_str(
            r#"{
                "min_date": "2024-01-01",
                "max_date": "garbage",
                "disabled_dates": ["2024-01-05", "nope"],
                "disabled_ranges": [["2024-01-10", "2024-01-12"]]
            }"#,
        )
        .unwrap();
        let constraints = ValidationConstraints::from_config(&config, &utc_normalizer());
        assert_eq!(constraints.min_date(), Some(ymd(2024, 1, 1)));
        assert_eq!(constraints.max_date(), None);
        assert_eq!(constraints.rejected_disabled_dates().len(), 1);

        let engine = ValidationEngine::new(constraints);
        assert!(engine.is_disabled(Some(ymd(2024, 1, 5))));
        assert!(engine.is_disabled(Some(ymd(2024, 1, 11))));
        assert!(engine.is_valid(ymd(2024, 1, 13)));
    }

    #[test]
    fn test_reentrant_predicate() {
        use std::cell::OnceCell;

        // Predicate reads back into the engine that owns it
        let slot: Rc<OnceCell<Rc<ValidationEngine>>> = Rc::new(OnceCell::new());
        let inner = Rc::clone(&slot);
        let predicate: DisabledPredicate = Rc::new(move |d: CalendarDate| {
            let engine = inner.get().map(Rc::clone);
            engine.is_some_and(|e| d.day() == 2 && !e.is_disabled(Some(d.add_days(-1))))
        });
        let engine = Rc::new(ValidationEngine::new(ValidationConstraints::new().disabled_when(predicate)));
        assert!(slot.set(Rc::clone(&engine)).is_ok());

        assert!(engine.is_disabled(Some(ymd(2024, 4, 2))));
        assert!(engine.is_valid(ymd(2024, 4, 3)));
    }

    #[test]
    fn test_violation_serializes_with_tag() {
        let json = serde_json::to_string(&Violation::BeforeMin { min: ymd(2024, 1, 1) }).unwrap();
        assert_eq!(json, r#"{"constraint":"before_min","min":"2024-01-01"}"#);
    }
}
