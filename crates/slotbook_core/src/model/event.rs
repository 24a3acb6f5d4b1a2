//! Event and reminder domain model.
//!
//! # Responsibility
//! - Define the canonical event record owned by the catalog.
//! - Provide field-level validation and reminder list operations.
//!
//! # Invariants
//! - `id` is stable and never reused for another event.
//! - `title` is non-blank and `start_at < end_at`.
//! - Reminders have no identity beyond their position in `reminders`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every scheduled event.
pub type EventId = Uuid;

/// Delivery channel of a reminder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    #[default]
    Email,
    System,
}

impl ReminderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::System => "system",
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in time at which the owner wants to be notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub at: NaiveDateTime,
    #[serde(default)]
    pub kind: ReminderKind,
}

impl Reminder {
    pub fn new(at: NaiveDateTime, kind: ReminderKind) -> Self {
        Self { at, kind }
    }
}

impl Display for Reminder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "reminder at {} via {}", self.at, self.kind)
    }
}

/// Slot ownership state of a live event.
///
/// `Unreserved` is reachable only through a failed time update: the old
/// slots were released and the new range could not be booked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    #[default]
    Scheduled,
    Unreserved,
}

/// Validation failures for event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    NilId,
    EmptyTitle,
    InvalidRange { start: NaiveTime, end: NaiveTime },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "event id must not be nil"),
            Self::EmptyTitle => write!(f, "event title must not be blank"),
            Self::InvalidRange { start, end } => {
                write!(f, "event start ({start}) must be before end ({end})")
            }
        }
    }
}

impl Error for EventValidationError {}

/// Canonical event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_at: NaiveTime,
    pub end_at: NaiveTime,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub state: EventState,
}

impl Event {
    /// Creates an event with a freshly generated id and no reminders.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
        start_at: NaiveTime,
        end_at: NaiveTime,
    ) -> Result<Self, EventValidationError> {
        Self::with_id(Uuid::new_v4(), title, description, date, start_at, end_at)
    }

    /// Creates an event with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: EventId,
        title: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
        start_at: NaiveTime,
        end_at: NaiveTime,
    ) -> Result<Self, EventValidationError> {
        let event = Self {
            id,
            title: title.into(),
            description: description.into(),
            date,
            start_at,
            end_at,
            reminders: Vec::new(),
            state: EventState::Scheduled,
        };
        event.validate()?;
        Ok(event)
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.id.is_nil() {
            return Err(EventValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        validate_range(self.start_at, self.end_at)
    }

    /// Appends a reminder and returns its index.
    pub fn add_reminder(&mut self, at: NaiveDateTime, kind: ReminderKind) -> usize {
        self.reminders.push(Reminder::new(at, kind));
        self.reminders.len() - 1
    }

    /// Removes the reminder at `index`, or returns `None` when out of bounds.
    pub fn remove_reminder(&mut self, index: usize) -> Option<Reminder> {
        if index < self.reminders.len() {
            Some(self.reminders.remove(index))
        } else {
            None
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.state == EventState::Scheduled
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}-{} {}",
            self.id,
            self.date,
            self.start_at.format("%H:%M"),
            self.end_at.format("%H:%M"),
            self.title
        )
    }
}

/// Rejects empty or reversed time windows.
pub fn validate_range(start: NaiveTime, end: NaiveTime) -> Result<(), EventValidationError> {
    if start >= end {
        return Err(EventValidationError::InvalidRange { start, end });
    }
    Ok(())
}
