//! Error types for the engine.
//!
//! Malformed input and vetoed selections are not errors: they surface as
//! `None` or an unchanged state. These types cover configuration the host
//! has to react to.

use crate::CalendarDate;
use crate::date::ParseError;

/// A constraint combination that leaves no selectable day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    #[error("minimum date {min} is after maximum date {max}")]
    MinAfterMax { min: CalendarDate, max: CalendarDate },
}

/// Error type for engine construction and reconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid first day of week: {0} (must be 0-6)")]
    InvalidFirstDayOfWeek(u8),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ymd;

    #[test]
    fn test_constraint_error_message() {
        let err = ConstraintError::MinAfterMax {
            min: ymd(2025, 6, 20),
            max: ymd(2025, 6, 10),
        };
        assert_eq!(err.to_string(), "minimum date 2025-06-20 is after maximum date 2025-06-10");
    }

    #[test]
    fn test_engine_error_from() {
        let err: EngineError = ParseError::EmptyInput.into();
        assert_eq!(err.to_string(), "Empty date string");

        let err: EngineError = ConstraintError::MinAfterMax {
            min: ymd(2025, 6, 20),
            max: ymd(2025, 6, 10),
        }
        .into();
        assert!(matches!(err, EngineError::Constraint(_)));
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_impl<T: std::error::Error + Send + Sync>() {}
        assert_impl::<ConstraintError>();
        assert_impl::<EngineError>();
    }
}
