use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::consts::CACHE_CAPACITY;
use crate::date::normalize_month;
use crate::grid::MonthGrid;
use crate::types::FirstDayOfWeek;

/// Cache key. Grid shape depends on the week start, so it is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub year:      i32,
    pub month0:    u32,
    pub first_day: FirstDayOfWeek,
}

impl GridKey {
    /// Key for a possibly out-of-range month index, folded the same way
    /// `MonthGrid::generate` folds it.
    pub fn new(year: i32, month0: i32, first_day: FirstDayOfWeek) -> Self {
        let (year, month0) = normalize_month(year, month0);
        Self {
            year,
            month0,
            first_day,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    grid:        Rc<MonthGrid>,
    last_access: u64,
}

/// Hit/miss counters, for diagnostics only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits:          u64,
    pub misses:        u64,
    pub evictions:     u64,
    pub invalidations: u64,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct Lookup {
    pub grid:      Rc<MonthGrid>,
    /// The grid was generated by this call rather than found
    pub generated: bool,
}

/// LRU cache of month grids owned by a single calendar instance.
///
/// Holds at most `CACHE_CAPACITY` grids. Every access stamps the entry with
/// a monotonically increasing counter; inserting into a full cache drops the
/// entry with the smallest stamp. The linear scan is fine at this size.
#[derive(Debug)]
pub struct CalendarCache {
    entries:   HashMap<GridKey, CacheEntry>,
    clock:     u64,
    capacity:  usize,
    locale:    Option<String>,
    first_day: Option<FirstDayOfWeek>,
    stats:     CacheStats,
}

impl Default for CalendarCache {
    fn default() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }
}

impl CalendarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity is raised to at least one entry
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            clock: 0,
            capacity: capacity.max(1),
            locale: None,
            first_day: None,
            stats: CacheStats::default(),
        }
    }

    /// Returns the grid for `(year, month0, first_day)`, generating it on a miss.
    pub fn get(&mut self, year: i32, month0: i32, first_day: FirstDayOfWeek) -> Rc<MonthGrid> {
        self.lookup(GridKey::new(year, month0, first_day)).grid
    }

    /// Like `get`, also reporting whether the grid had to be generated.
    pub fn lookup(&mut self, key: GridKey) -> Lookup {
        self.clock += 1;
        let stamp = self.clock;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_access = stamp;
            self.stats.hits += 1;
            trace!(year = key.year, month0 = key.month0, "grid cache hit");
            return Lookup {
                grid:      Rc::clone(&entry.grid),
                generated: false,
            };
        }

        // Key was folded already, so generation sees an in-range month
        let grid = Rc::new(MonthGrid::generate(key.year, key.month0 as i32, key.first_day));
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                grid:        Rc::clone(&grid),
                last_access: stamp,
            },
        );
        self.stats.misses += 1;
        debug!(year = key.year, month0 = key.month0, size = self.entries.len(), "grid cache miss");
        Lookup { grid, generated: true }
    }

    /// Materializes the months before and after the given one.
    pub fn preload_adjacent(&mut self, year: i32, month0: i32, first_day: FirstDayOfWeek) {
        for delta in [-1, 1] {
            self.get(year, month0 + delta, first_day);
        }
    }

    /// Drops every cached grid.
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            debug!(dropped = self.entries.len(), "grid cache invalidated");
        }
        self.entries.clear();
        self.stats.invalidations += 1;
    }

    /// Records the locale and week start the grids are rendered for,
    /// invalidating everything if either changed. Returns whether it did.
    pub fn apply_layout(&mut self, locale: &str, first_day: FirstDayOfWeek) -> bool {
        let changed = self.locale.as_deref() != Some(locale) || self.first_day != Some(first_day);
        if changed {
            let had_layout = self.locale.is_some();
            self.locale = Some(locale.to_owned());
            self.first_day = Some(first_day);
            if had_layout {
                self.invalidate_all();
            }
        }
        changed
    }

    pub fn contains(&self, key: &GridKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
            debug!(year = key.year, month0 = key.month0, "grid cache evicted least recently used");
        }
    }
}
