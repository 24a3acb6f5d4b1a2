//! Slot grid model.
//!
//! # Responsibility
//! - Discretize one calendar day into uniform, immutable time slots.
//! - Map half-open time ranges onto contiguous slot index ranges.
//!
//! # Invariants
//! - Slot granularity divides the day evenly; slots cover the whole day
//!   without gaps, starting at 00:00.
//! - A slot belongs to a range `[start, end)` iff its start time falls in it.

use chrono::{NaiveTime, Timelike};
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Default slot granularity in minutes.
pub const DEFAULT_SLOT_MINUTES: u32 = 15;

/// One immutable point of the day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    /// Zero-based position inside the grid.
    pub index: usize,
    /// Time of day at which this slot starts.
    pub start: NaiveTime,
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.start.format("%H:%M"))
    }
}

/// Fixed partition of a day into slots of `minutes` length.
///
/// Construct through [`SlotGrid::new`] or `CatalogConfig::grid`, both of
/// which reject granularities that do not divide the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotGrid {
    minutes: u32,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_SLOT_MINUTES,
        }
    }
}

impl SlotGrid {
    /// Returns a grid with the given granularity, or `None` when the
    /// granularity is zero or does not divide 24h evenly.
    pub fn new(minutes: u32) -> Option<Self> {
        if is_valid_slot_minutes(minutes) {
            Some(Self { minutes })
        } else {
            None
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Number of slots in one day.
    pub fn len(&self) -> usize {
        (MINUTES_PER_DAY / self.minutes) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the slot at `index`, or `None` past the closing boundary.
    pub fn slot(&self, index: usize) -> Option<Slot> {
        if index >= self.len() {
            return None;
        }
        let offset = index as u32 * self.minutes * 60;
        let start = NaiveTime::from_num_seconds_from_midnight_opt(offset, 0)?;
        Some(Slot { index, start })
    }

    /// Iterates every slot of the day in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.len()).filter_map(move |index| self.slot(index))
    }

    /// Index of the slot containing `time`.
    pub fn index_of(&self, time: NaiveTime) -> usize {
        (time.num_seconds_from_midnight() / (self.minutes * 60)) as usize
    }

    /// Computes the slot indices whose start falls in `[start, end)`.
    ///
    /// The returned range is empty when `start >= end` or when no slot
    /// boundary lies inside the interval.
    pub fn index_range(&self, start: NaiveTime, end: NaiveTime) -> Range<usize> {
        if start >= end {
            return 0..0;
        }
        let slot_seconds = self.minutes * 60;
        let first = ceil_seconds(start).div_ceil(slot_seconds) as usize;
        let last = ceil_seconds(end).div_ceil(slot_seconds) as usize;
        let last = last.min(self.len());
        if first >= last {
            return 0..0;
        }
        first..last
    }
}

/// Returns whether `minutes` is a usable slot granularity.
pub fn is_valid_slot_minutes(minutes: u32) -> bool {
    minutes > 0 && minutes <= MINUTES_PER_DAY && MINUTES_PER_DAY % minutes == 0
}

// Sub-second parts round up so that 09:00:00.5 still counts as after 09:00.
fn ceil_seconds(time: NaiveTime) -> u32 {
    let whole = time.num_seconds_from_midnight();
    if time.nanosecond() > 0 {
        whole + 1
    } else {
        whole
    }
}
