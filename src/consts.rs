/// Number of cells in a month grid (6 weeks x 7 days)
pub const GRID_CELLS: usize = 42;
/// Days in a week
pub const DAYS_PER_WEEK: u32 = 7;
/// Rows in a month grid
pub const WEEKS_PER_GRID: usize = 6;

/// Month grids kept by a `CalendarCache` before the least recently used one is evicted
pub const CACHE_CAPACITY: usize = 24;

/// Months in a year
pub const MONTHS_PER_YEAR: i32 = 12;
/// Months in a quarter
pub const MONTHS_PER_QUARTER: u32 = 3;
/// Years in a decade view
pub const YEARS_PER_DECADE: i32 = 10;

/// Earliest supported year (inclusive)
pub const MIN_YEAR: i32 = -9999;
/// Latest supported year (inclusive)
pub const MAX_YEAR: i32 = 9999;

/// Month number for February (1-indexed)
pub const FEBRUARY: u32 = 2;
/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: u32 = 29;

/// Maximum days in each month (index 0 is unused, months are 1-indexed)
/// February shows 28 days (non-leap year default)
pub const DAYS_IN_MONTH: [u32; 13] = [
    0,  // index 0 unused (months are 1-indexed)
    31, // January
    28, // February (non-leap, adjusted by is_leap_year check)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

/// Leap year occurs every 4 years
pub(crate) const LEAP_YEAR_CYCLE: i32 = 4;
/// Century years are not leap years unless...
pub(crate) const CENTURY_CYCLE: i32 = 100;
/// ...they are divisible by 400 (Gregorian calendar correction)
pub(crate) const GREGORIAN_CYCLE: i32 = 400;

/// Date component separator (ISO 8601 format)
pub const DATE_SEPARATOR: char = '-';
/// Month-first format separator (US locale format)
pub const MONTH_FIRST_SEPARATOR: char = '/';
/// Separator between date and time in ISO 8601 timestamps
pub const TIME_SEPARATOR: char = 'T';

/// Smallest and largest number of side-by-side calendars a host may show
pub const MIN_CALENDAR_COUNT: u8 = 1;
pub const MAX_CALENDAR_COUNT: u8 = 12;

/// Upper bound on dates materialized from a recurring pattern
pub const MAX_RECURRING_OCCURRENCES: usize = 366;
/// Consecutive candidates without an occurrence after which a recurring
/// pattern counts as exhausted
pub const MAX_RECURRENCE_MISSES: u32 = 4_000;

/// Dates remembered by a `ValidationEngine` before its memo is dropped
pub const MAX_VALIDITY_MEMO: usize = 1_024;

/// Locale assumed until the host sets one
pub const DEFAULT_LOCALE: &str = "en-US";
