//! Event catalog use-case service.
//!
//! # Responsibility
//! - Own event records and their reminder lists.
//! - Keep each event's slot reservation in sync with its declared range by
//!   delegating every occupancy decision to the day's `SlotDay`.
//!
//! # Invariants
//! - A `Scheduled` event holds exactly the slots of `[start_at, end_at)` on
//!   `date`; an `Unreserved` event holds none.
//! - No slot is held by an id the catalog does not know.
//! - Failed operations leave event metadata untouched, except the documented
//!   fail-open time update which is reported as `ReservationLost`.
//!
//! # Concurrency
//! - Each day (slots plus its events) sits behind its own mutex, so days
//!   proceed in parallel.
//! - Lock order: `days` map, then day mutexes in ascending date order, then
//!   the id index. Nothing waits on the `days` map while holding a day mutex.
//! - A pruned day is marked `retired` before it leaves the map; callers that
//!   locked a stale handle see the flag and fetch the day again.

use crate::config::{CatalogConfig, ConfigError};
use crate::model::event::{
    validate_range, Event, EventId, EventState, EventValidationError, Reminder, ReminderKind,
};
use crate::model::slot::{Slot, SlotGrid};
use crate::schedule::slot_day::{SlotConflict, SlotDay, SlotError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{info, warn};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// Errors from catalog operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Title is blank after trim.
    EmptyTitle,
    /// `start >= end`, or the range covers no slot start.
    InvalidRange { start: NaiveTime, end: NaiveTime },
    /// Caller-supplied id is the nil uuid.
    NilEventId,
    /// Caller-supplied id is already live in the catalog.
    DuplicateEventId(EventId),
    EventNotFound(EventId),
    ReminderNotFound { event_id: EventId, index: usize },
    /// The requested range overlaps another event; nothing changed.
    SlotConflict(SlotConflict),
    /// A time update hit a conflict after the old slots were released.
    ///
    /// The event keeps its old metadata but now holds no slots
    /// (`EventState::Unreserved`).
    ReservationLost {
        event_id: EventId,
        conflict: SlotConflict,
    },
    /// Slot-level failure with no catalog-level meaning.
    Slot(SlotError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "event title must not be blank"),
            Self::InvalidRange { start, end } => {
                write!(f, "invalid event range {start}-{end}")
            }
            Self::NilEventId => write!(f, "event id must not be nil"),
            Self::DuplicateEventId(id) => write!(f, "event already exists: {id}"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::ReminderNotFound { event_id, index } => {
                write!(f, "reminder {index} not found on event {event_id}")
            }
            Self::SlotConflict(conflict) => write!(f, "{conflict}"),
            Self::ReservationLost { event_id, conflict } => write!(
                f,
                "event {event_id} lost its slots: old range released, new range rejected ({conflict})"
            ),
            Self::Slot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Slot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventValidationError> for CatalogError {
    fn from(value: EventValidationError) -> Self {
        match value {
            EventValidationError::NilId => Self::NilEventId,
            EventValidationError::EmptyTitle => Self::EmptyTitle,
            EventValidationError::InvalidRange { start, end } => Self::InvalidRange { start, end },
        }
    }
}

impl From<SlotError> for CatalogError {
    fn from(value: SlotError) -> Self {
        match value {
            SlotError::Conflict(conflict) => Self::SlotConflict(conflict),
            SlotError::EventNotFound(id) => Self::EventNotFound(id),
            SlotError::EmptyRange { start, end } => Self::InvalidRange { start, end },
            other => Self::Slot(other),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Slots and events of one date, guarded together.
#[derive(Debug)]
struct DayBook {
    slots: SlotDay,
    events: Vec<Event>,
    /// Set once the day is removed from the map; never cleared.
    retired: bool,
}

impl DayBook {
    fn position(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }
}

type DayHandle = Arc<Mutex<DayBook>>;

/// Thread-safe catalog of single-day events.
pub struct EventCatalog {
    grid: SlotGrid,
    days: RwLock<BTreeMap<NaiveDate, DayHandle>>,
    index: RwLock<HashMap<EventId, NaiveDate>>,
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::with_grid(SlotGrid::default())
    }
}

impl EventCatalog {
    /// Creates an empty catalog with 15-minute slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty catalog from validated configuration.
    pub fn with_config(config: &CatalogConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_grid(config.grid()?))
    }

    pub fn with_grid(grid: SlotGrid) -> Self {
        Self {
            grid,
            days: RwLock::new(BTreeMap::new()),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn grid(&self) -> SlotGrid {
        self.grid
    }

    /// Number of live events.
    pub fn len(&self) -> usize {
        read(&self.index).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dates that currently hold at least one event, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let days = read(&self.days);
        let mut dates = Vec::with_capacity(days.len());
        for (date, day) in days.iter() {
            if !lock(day).events.is_empty() {
                dates.push(*date);
            }
        }
        dates
    }

    /// Creates and books a new event, returning its generated id.
    ///
    /// # Errors
    /// - `EmptyTitle` / `InvalidRange` on field validation failure.
    /// - `SlotConflict` when the range overlaps another event; the event is
    ///   not added.
    pub fn create_event(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
        start_at: NaiveTime,
        end_at: NaiveTime,
    ) -> CatalogResult<EventId> {
        let event = Event::new(title, description, date, start_at, end_at)?;
        self.insert(event)
    }

    /// Same as [`EventCatalog::create_event`] with a caller-owned id.
    pub fn create_event_with_id(
        &self,
        id: EventId,
        title: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
        start_at: NaiveTime,
        end_at: NaiveTime,
    ) -> CatalogResult<EventId> {
        let event = Event::with_id(id, title, description, date, start_at, end_at)?;
        self.insert(event)
    }

    /// Deletes an event and releases its slots. Returns the removed record.
    pub fn delete_event(&self, id: EventId) -> CatalogResult<Event> {
        let (date, event) = self.with_event(id, |date, book, position| {
            if book.events[position].is_reserved() {
                book.slots.release(id)?;
            }
            Ok((date, book.events.remove(position)))
        })?;
        write(&self.index).remove(&id);
        self.prune_day(date);
        info!(
            "event=event_delete module=catalog status=ok event_id={} date={}",
            id, date
        );
        Ok(event)
    }

    /// Moves an event to `[start_at, end_at)` on its current date.
    ///
    /// # Errors
    /// - `InvalidRange` before anything changes.
    /// - `ReservationLost` when the new range conflicts: the old slots are
    ///   already released and the stored times stay as they were.
    pub fn update_event_time(
        &self,
        id: EventId,
        start_at: NaiveTime,
        end_at: NaiveTime,
    ) -> CatalogResult<()> {
        self.check_range(start_at, end_at)?;
        let date = self.with_event(id, |date, book, position| {
            update_in_book(book, position, start_at, end_at).map(|()| date)
        })?;
        info!(
            "event=event_update module=catalog status=ok event_id={} date={} start={} end={}",
            id, date, start_at, end_at
        );
        Ok(())
    }

    /// Moves an event to another date and time range.
    ///
    /// Same-date calls behave like [`EventCatalog::update_event_time`].
    /// Cross-date moves release the old day's slots before booking the new
    /// day, with the same fail-open outcome on conflict.
    pub fn reschedule_event(
        &self,
        id: EventId,
        date: NaiveDate,
        start_at: NaiveTime,
        end_at: NaiveTime,
    ) -> CatalogResult<()> {
        self.check_range(start_at, end_at)?;
        loop {
            let (current, source) = self.locate(id)?;
            if current == date {
                let (retired, outcome) = {
                    let mut book = lock(&source);
                    let position = book.position(id);
                    let retired = book.retired;
                    let outcome = position
                        .map(|position| update_in_book(&mut book, position, start_at, end_at));
                    (retired, outcome)
                };
                drop(source);
                match outcome {
                    Some(result) => return self.finish_reschedule(id, date, result),
                    None if retired => continue,
                    None => {
                        self.ensure_still_indexed(id, current)?;
                        continue;
                    }
                }
            }

            let target = self.day_or_insert(date);
            let (retired, moved) = {
                let (mut from, mut to) = lock_pair((current, &*source), (date, &*target));
                if from.retired || to.retired {
                    (true, None)
                } else {
                    match from.position(id) {
                        Some(position) => {
                            let result =
                                move_between(&mut from, &mut to, position, start_at, end_at);
                            if result.is_ok() {
                                write(&self.index).insert(id, date);
                            }
                            (false, Some(result))
                        }
                        None => (false, None),
                    }
                }
            };
            drop(source);
            drop(target);
            self.prune_day(current);
            self.prune_day(date);
            match moved {
                Some(result) => return self.finish_reschedule(id, date, result),
                None if retired => continue,
                None => self.ensure_still_indexed(id, current)?,
            }
        }
    }

    /// Appends a reminder and returns its index in the event's list.
    pub fn add_reminder(
        &self,
        id: EventId,
        at: NaiveDateTime,
        kind: ReminderKind,
    ) -> CatalogResult<usize> {
        self.with_event(id, |_, book, position| {
            Ok(book.events[position].add_reminder(at, kind))
        })
    }

    /// Removes the reminder at `index` and returns it.
    pub fn remove_reminder(&self, id: EventId, index: usize) -> CatalogResult<Reminder> {
        self.with_event(id, |_, book, position| {
            book.events[position]
                .remove_reminder(index)
                .ok_or(CatalogError::ReminderNotFound { event_id: id, index })
        })
    }

    /// Returns a snapshot of one event.
    pub fn get_event(&self, id: EventId) -> Option<Event> {
        self.with_event(id, |_, book, position| Ok(book.events[position].clone()))
            .ok()
    }

    /// Returns a snapshot of the events booked on `date`.
    ///
    /// Events are listed in the order they were added to that date; the
    /// returned vector can be iterated any number of times.
    pub fn list_events(&self, date: NaiveDate) -> Vec<Event> {
        let Some(day) = self.day(date) else {
            return Vec::new();
        };
        let events = lock(&day).events.clone();
        events
    }

    /// Returns the event occupying the slot containing `time` on `date`.
    pub fn occupant_at(&self, date: NaiveDate, time: NaiveTime) -> Option<EventId> {
        let day = self.day(date)?;
        let occupant = lock(&day).slots.occupant_at(time);
        occupant
    }

    /// Day-wide scan of the slots currently held by an event.
    ///
    /// An `Unreserved` event yields an empty list.
    pub fn reserved_slots(&self, id: EventId) -> CatalogResult<Vec<Slot>> {
        self.with_event(id, |_, book, _| Ok(book.slots.slots_held_by(id)))
    }

    fn insert(&self, event: Event) -> CatalogResult<EventId> {
        let id = event.id;
        let date = event.date;
        self.check_range(event.start_at, event.end_at)?;

        match write(&self.index).entry(id) {
            Entry::Occupied(_) => return Err(CatalogError::DuplicateEventId(id)),
            Entry::Vacant(slot) => {
                slot.insert(date);
            }
        }

        let result = loop {
            let day = self.day_or_insert(date);
            let mut book = lock(&day);
            if book.retired {
                continue;
            }
            let reserved = book.slots.reserve(id, event.start_at, event.end_at);
            if reserved.is_ok() {
                book.events.push(event);
            }
            break reserved;
        };

        match result {
            Ok(()) => {
                info!(
                    "event=event_create module=catalog status=ok event_id={} date={}",
                    id, date
                );
                Ok(id)
            }
            Err(err) => {
                write(&self.index).remove(&id);
                self.prune_day(date);
                info!(
                    "event=event_create module=catalog status=error event_id={} date={} reason={}",
                    id, date, err
                );
                Err(err.into())
            }
        }
    }

    /// Runs `op` with the day that holds `id` locked.
    ///
    /// Retries when the event moved to another day between the index lookup
    /// and acquiring the day lock.
    fn with_event<T>(
        &self,
        id: EventId,
        op: impl FnOnce(NaiveDate, &mut DayBook, usize) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        loop {
            let (date, day) = self.locate(id)?;
            let mut book = lock(&day);
            if book.retired {
                continue;
            }
            if let Some(position) = book.position(id) {
                return op(date, &mut *book, position);
            }
            drop(book);
            self.ensure_still_indexed(id, date)?;
        }
    }

    /// Resolves the date and day handle currently holding `id`.
    fn locate(&self, id: EventId) -> CatalogResult<(NaiveDate, DayHandle)> {
        loop {
            let date = read(&self.index)
                .get(&id)
                .copied()
                .ok_or(CatalogError::EventNotFound(id))?;
            if let Some(day) = self.day(date) {
                return Ok((date, day));
            }
            // The old day may have been pruned right after a move.
            self.ensure_still_indexed(id, date)?;
        }
    }

    /// Fails with `EventNotFound` unless `id` has moved away from `seen`.
    fn ensure_still_indexed(&self, id: EventId, seen: NaiveDate) -> CatalogResult<()> {
        match read(&self.index).get(&id) {
            Some(date) if *date != seen => Ok(()),
            _ => Err(CatalogError::EventNotFound(id)),
        }
    }

    fn day(&self, date: NaiveDate) -> Option<DayHandle> {
        read(&self.days).get(&date).cloned()
    }

    fn day_or_insert(&self, date: NaiveDate) -> DayHandle {
        if let Some(day) = self.day(date) {
            return day;
        }
        let grid = self.grid;
        write(&self.days)
            .entry(date)
            .or_insert_with(|| {
                Arc::new(Mutex::new(DayBook {
                    slots: SlotDay::new(date, grid),
                    events: Vec::new(),
                    retired: false,
                }))
            })
            .clone()
    }

    /// Retires and drops the day for `date` once it holds no events.
    ///
    /// A day without events holds no slots either, since `insert` reserves
    /// and pushes under one lock.
    fn prune_day(&self, date: NaiveDate) {
        let mut days = write(&self.days);
        let Some(day) = days.get(&date).cloned() else {
            return;
        };
        let mut book = lock(&day);
        if !book.events.is_empty() {
            return;
        }
        book.retired = true;
        drop(book);
        days.remove(&date);
    }

    fn check_range(&self, start: NaiveTime, end: NaiveTime) -> CatalogResult<()> {
        validate_range(start, end)?;
        if self.grid.index_range(start, end).is_empty() {
            return Err(CatalogError::InvalidRange { start, end });
        }
        Ok(())
    }

    fn finish_reschedule(
        &self,
        id: EventId,
        date: NaiveDate,
        result: CatalogResult<()>,
    ) -> CatalogResult<()> {
        match &result {
            Ok(()) => info!(
                "event=event_reschedule module=catalog status=ok event_id={} date={}",
                id, date
            ),
            Err(err) => info!(
                "event=event_reschedule module=catalog status=error event_id={} date={} reason={}",
                id, date, err
            ),
        }
        result
    }
}

/// Same-day time update of the event at `position`.
fn update_in_book(
    book: &mut DayBook,
    position: usize,
    start_at: NaiveTime,
    end_at: NaiveTime,
) -> CatalogResult<()> {
    let id = book.events[position].id;
    match book.slots.update(id, start_at, end_at) {
        Ok(()) => {
            let event = &mut book.events[position];
            event.start_at = start_at;
            event.end_at = end_at;
            event.state = EventState::Scheduled;
            Ok(())
        }
        Err(SlotError::Conflict(conflict)) => Err(mark_unreserved(book, position, conflict)),
        Err(err) => Err(err.into()),
    }
}

/// Cross-day move of the event at `position` in `from`.
fn move_between(
    from: &mut DayBook,
    to: &mut DayBook,
    position: usize,
    start_at: NaiveTime,
    end_at: NaiveTime,
) -> CatalogResult<()> {
    let id = from.events[position].id;
    if from.events[position].is_reserved() {
        from.slots.release(id)?;
    }
    match to.slots.reserve(id, start_at, end_at) {
        Ok(()) => {
            let mut event = from.events.remove(position);
            event.date = to.slots.date();
            event.start_at = start_at;
            event.end_at = end_at;
            event.state = EventState::Scheduled;
            to.events.push(event);
            Ok(())
        }
        Err(SlotError::Conflict(conflict)) => Err(mark_unreserved(from, position, conflict)),
        Err(err) => {
            // Only reachable if `to` already lists the id, which the index forbids.
            from.events[position].state = EventState::Unreserved;
            Err(err.into())
        }
    }
}

fn mark_unreserved(book: &mut DayBook, position: usize, conflict: SlotConflict) -> CatalogError {
    let event = &mut book.events[position];
    event.state = EventState::Unreserved;
    warn!(
        "event=reservation_lost module=catalog status=error event_id={} date={} occupant={}",
        event.id, event.date, conflict.occupant
    );
    CatalogError::ReservationLost {
        event_id: event.id,
        conflict,
    }
}

fn lock_pair<'a>(
    first: (NaiveDate, &'a Mutex<DayBook>),
    second: (NaiveDate, &'a Mutex<DayBook>),
) -> (MutexGuard<'a, DayBook>, MutexGuard<'a, DayBook>) {
    if first.0 < second.0 {
        let a = lock(first.1);
        let b = lock(second.1);
        (a, b)
    } else {
        let b = lock(second.1);
        let a = lock(first.1);
        (a, b)
    }
}

// Every mutation restores the invariants before its first fallible step, so
// a poisoned lock still guards consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
