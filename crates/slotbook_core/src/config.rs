//! Engine configuration.
//!
//! # Responsibility
//! - Hold process-wide scheduling constants supplied by the embedding layer.
//! - Reject granularities that cannot partition a day evenly.

use crate::model::slot::{is_valid_slot_minutes, SlotGrid, DEFAULT_SLOT_MINUTES};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidSlotMinutes(u32),
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSlotMinutes(value) => write!(
                f,
                "slot_minutes must be between 1 and 1440 and divide 1440 evenly, got {value}"
            ),
            Self::Parse(message) => write!(f, "invalid catalog config: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Length of one slot in minutes.
    pub slot_minutes: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
        }
    }
}

impl CatalogConfig {
    /// Parses a JSON config document and validates it.
    ///
    /// Missing fields fall back to [`CatalogConfig::default`].
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_slot_minutes(self.slot_minutes) {
            return Err(ConfigError::InvalidSlotMinutes(self.slot_minutes));
        }
        Ok(())
    }

    /// Returns the slot grid described by this config.
    pub fn grid(&self) -> Result<SlotGrid, ConfigError> {
        SlotGrid::new(self.slot_minutes).ok_or(ConfigError::InvalidSlotMinutes(self.slot_minutes))
    }
}
