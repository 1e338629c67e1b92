use serde::Serialize;

use crate::consts::{DAYS_PER_WEEK, GRID_CELLS, WEEKS_PER_GRID};
use crate::types::FirstDayOfWeek;
use crate::CalendarDate;

/// Which month a grid cell belongs to, relative to the grid's target month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellMonth {
    Previous,
    Current,
    Next,
}

/// Six weeks of consecutive days laid out for one target month.
///
/// Always exactly `GRID_CELLS` days, strictly ascending with no gaps. The
/// first cell falls on the configured first day of the week, and the first
/// row always shows at least one day of the previous month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MonthGrid {
    year:      i32,
    month0:    u32,
    first_day: FirstDayOfWeek,
    #[serde(serialize_with = "serialize_cells")]
    cells:     [CalendarDate; GRID_CELLS],
}

fn serialize_cells<S>(cells: &[CalendarDate; GRID_CELLS], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(cells.iter())
}

impl MonthGrid {
    /// Builds the grid for `month0` (zero-based) of `year`.
    ///
    /// Out-of-range months roll over into neighbouring years before anything
    /// else happens, so every input produces a well-formed grid.
    pub fn generate(year: i32, month0: i32, first_day: FirstDayOfWeek) -> Self {
        let first = CalendarDate::from_ymd_lenient(year, month0, 1);
        // A month that opens on the first column gets a full week of padding
        let leading = match first_day.column_of(first.weekday()) {
            0 => DAYS_PER_WEEK,
            column => column,
        };
        let start = first.add_days(-i64::from(leading));

        let mut cells = [start; GRID_CELLS];
        for (offset, cell) in (0_i64..).zip(cells.iter_mut()) {
            *cell = start.add_days(offset);
        }

        Self {
            year: first.year(),
            month0: first.month0(),
            first_day,
            cells,
        }
    }

    /// Target year after month rollover
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Target month, zero-based
    pub const fn month0(&self) -> u32 {
        self.month0
    }

    pub const fn first_day(&self) -> FirstDayOfWeek {
        self.first_day
    }

    pub const fn cells(&self) -> &[CalendarDate; GRID_CELLS] {
        &self.cells
    }

    pub fn first(&self) -> CalendarDate {
        self.cells[0]
    }

    pub fn last(&self) -> CalendarDate {
        self.cells[GRID_CELLS - 1]
    }

    /// The grid as rows of one week each
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDate]> {
        self.cells.chunks(DAYS_PER_WEEK as usize).take(WEEKS_PER_GRID)
    }

    pub fn cell_month(&self, date: CalendarDate) -> CellMonth {
        match (date.year(), date.month0()).cmp(&(self.year, self.month0)) {
            std::cmp::Ordering::Less => CellMonth::Previous,
            std::cmp::Ordering::Equal => CellMonth::Current,
            std::cmp::Ordering::Greater => CellMonth::Next,
        }
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.first() <= date && date <= self.last()
    }
}
