//! Per-day slot occupancy.
//!
//! # Responsibility
//! - Own the slot -> occupant mapping of exactly one calendar day.
//! - Be the sole authority on booking conflicts for that day.
//!
//! # Invariants
//! - Every slot of the grid is present at all times, either free or occupied.
//! - An event id occupies either nothing or one contiguous, non-empty run
//!   of slots matching its `[start, end)` interval.
//! - `reserve` is atomic: it claims every slot of the range or none.
//! - `update` is release-then-reserve without rollback (fail-open).

use crate::model::event::EventId;
use crate::model::slot::{Slot, SlotGrid};
use chrono::{NaiveDate, NaiveTime};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// First contested slot of a rejected reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConflict {
    pub date: NaiveDate,
    pub slot: Slot,
    /// Event currently holding `slot`.
    pub occupant: EventId,
}

impl Display for SlotConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "slot {} on {} is already occupied by event {}",
            self.slot, self.date, self.occupant
        )
    }
}

/// Errors from slot-level operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    Conflict(SlotConflict),
    /// No slot on this day is held by the given event.
    EventNotFound(EventId),
    /// The interval contains no slot start.
    EmptyRange { start: NaiveTime, end: NaiveTime },
    /// The event already holds slots on this day; use `update` instead.
    AlreadyReserved(EventId),
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(conflict) => write!(f, "{conflict}"),
            Self::EventNotFound(id) => write!(f, "no slot is held by event {id}"),
            Self::EmptyRange { start, end } => {
                write!(f, "range {start}-{end} does not cover any slot")
            }
            Self::AlreadyReserved(id) => write!(f, "event {id} already holds a reservation"),
        }
    }
}

impl Error for SlotError {}

impl From<SlotConflict> for SlotError {
    fn from(value: SlotConflict) -> Self {
        Self::Conflict(value)
    }
}

pub type SlotResult<T> = Result<T, SlotError>;

/// Slot grid of one day together with the current occupants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDay {
    date: NaiveDate,
    grid: SlotGrid,
    occupants: Vec<Option<EventId>>,
}

impl SlotDay {
    /// Builds the full grid for `date` with every slot free.
    pub fn new(date: NaiveDate, grid: SlotGrid) -> Self {
        Self {
            date,
            grid,
            occupants: vec![None; grid.len()],
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn grid(&self) -> SlotGrid {
        self.grid
    }

    /// Occupant of the slot at `index`; `None` when free or out of grid.
    pub fn occupant(&self, index: usize) -> Option<EventId> {
        self.occupants.get(index).copied().flatten()
    }

    /// Occupant of the slot containing `time`.
    pub fn occupant_at(&self, time: NaiveTime) -> Option<EventId> {
        self.occupant(self.grid.index_of(time))
    }

    /// Iterates `(slot, occupant)` pairs in grid order.
    pub fn occupancy(&self) -> impl Iterator<Item = (Slot, Option<EventId>)> + '_ {
        self.grid.slots().zip(self.occupants.iter().copied())
    }

    /// Day-wide scan for slots held by `event_id`.
    pub fn slots_held_by(&self, event_id: EventId) -> Vec<Slot> {
        self.occupancy()
            .filter(|(_, occupant)| *occupant == Some(event_id))
            .map(|(slot, _)| slot)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupants.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns whether every slot of `[start, end)` is free.
    ///
    /// An empty range is reported as not free.
    pub fn is_free(&self, start: NaiveTime, end: NaiveTime) -> bool {
        let range = self.grid.index_range(start, end);
        !range.is_empty() && self.occupants[range].iter().all(Option::is_none)
    }

    /// Claims every slot of `[start, end)` for `event_id`.
    ///
    /// # Errors
    /// - `EmptyRange` when no slot start falls in the interval.
    /// - `AlreadyReserved` when `event_id` already holds slots here.
    /// - `Conflict` when any slot is held by another event; nothing changes.
    pub fn reserve(
        &mut self,
        event_id: EventId,
        start: NaiveTime,
        end: NaiveTime,
    ) -> SlotResult<()> {
        let range = self.slot_range(start, end)?;
        if self.occupants.contains(&Some(event_id)) {
            return Err(SlotError::AlreadyReserved(event_id));
        }
        self.claim(event_id, range)
    }

    /// Frees every slot held by `event_id`.
    ///
    /// Returns the number of released slots. Releasing an id that holds
    /// nothing is an error, since it means caller bookkeeping has drifted.
    pub fn release(&mut self, event_id: EventId) -> SlotResult<usize> {
        let released = self.clear(event_id);
        if released == 0 {
            return Err(SlotError::EventNotFound(event_id));
        }
        debug!(
            "event=slots_release module=schedule status=ok date={} event_id={} slots={}",
            self.date, event_id, released
        );
        Ok(released)
    }

    /// Moves `event_id` to `[start, end)` as release-then-reserve.
    ///
    /// The new range is validated before anything is cleared. On `Conflict`
    /// the old slots stay released: the event ends up holding nothing.
    pub fn update(
        &mut self,
        event_id: EventId,
        start: NaiveTime,
        end: NaiveTime,
    ) -> SlotResult<()> {
        let range = self.slot_range(start, end)?;
        self.clear(event_id);
        self.claim(event_id, range)
    }

    fn slot_range(&self, start: NaiveTime, end: NaiveTime) -> SlotResult<Range<usize>> {
        let range = self.grid.index_range(start, end);
        if range.is_empty() {
            return Err(SlotError::EmptyRange { start, end });
        }
        Ok(range)
    }

    fn claim(&mut self, event_id: EventId, range: Range<usize>) -> SlotResult<()> {
        if let Some(conflict) = self.first_conflict(event_id, range.clone()) {
            debug!(
                "event=slots_reserve module=schedule status=conflict date={} event_id={} slot={} occupant={}",
                self.date, event_id, conflict.slot, conflict.occupant
            );
            return Err(conflict.into());
        }
        let count = range.len();
        for occupant in &mut self.occupants[range] {
            *occupant = Some(event_id);
        }
        debug!(
            "event=slots_reserve module=schedule status=ok date={} event_id={} slots={}",
            self.date, event_id, count
        );
        Ok(())
    }

    fn first_conflict(&self, event_id: EventId, range: Range<usize>) -> Option<SlotConflict> {
        range.into_iter().find_map(|index| match self.occupants[index] {
            Some(occupant) if occupant != event_id => Some(SlotConflict {
                date: self.date,
                slot: self.grid.slot(index)?,
                occupant,
            }),
            _ => None,
        })
    }

    fn clear(&mut self, event_id: EventId) -> usize {
        let mut cleared = 0;
        for occupant in &mut self.occupants {
            if *occupant == Some(event_id) {
                *occupant = None;
                cleared += 1;
            }
        }
        cleared
    }
}
