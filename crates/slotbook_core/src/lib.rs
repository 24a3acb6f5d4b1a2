//! Slot-based single-day event scheduling engine.
//! This crate is the single source of truth for booking invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{
    Event, EventId, EventState, EventValidationError, Reminder, ReminderKind,
};
pub use model::slot::{Slot, SlotGrid, DEFAULT_SLOT_MINUTES, MINUTES_PER_DAY};
pub use schedule::slot_day::{SlotConflict, SlotDay, SlotError, SlotResult};
pub use service::event_catalog::{CatalogError, CatalogResult, EventCatalog};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
