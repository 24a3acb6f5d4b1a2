//! Core use-case services.
//!
//! # Responsibility
//! - Expose the event lifecycle API consumed by presentation layers.
//! - Keep callers decoupled from per-day slot bookkeeping.

pub mod event_catalog;
