//! Domain model for slot-based day scheduling.
//!
//! # Responsibility
//! - Define the slot grid and the event/reminder records.
//! - Keep field validation next to the data it guards.
//!
//! # Invariants
//! - Every event is identified by a stable `EventId`.
//! - Slot grids are immutable once built.

pub mod event;
pub mod slot;
