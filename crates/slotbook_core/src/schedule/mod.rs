//! Slot occupancy engine.
//!
//! # Responsibility
//! - Enforce the one-event-per-slot rule within a single day.
//! - Stay unaware of event metadata; only ids and time ranges cross in.

pub mod slot_day;
