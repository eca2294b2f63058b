//! Race settings
//!
//! Tuning that can be changed without recompiling: RNG seed, fall probability,
//! stall budget and the logical tick length.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::RaceError;

/// Race tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceSettings {
    /// Seed for the race RNG
    pub seed: u64,
    /// Per-tick fall probability before confidence scaling
    pub base_fall_probability: f64,
    /// Tick budget per unit of track length before the race is declared stalled
    pub stall_ticks_per_unit: u64,
    /// Milliseconds represented by one logical tick (reporting and pacing)
    pub tick_interval_ms: u64,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            base_fall_probability: BASE_FALL_PROBABILITY,
            stall_ticks_per_unit: DEFAULT_STALL_TICKS_PER_UNIT,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl RaceSettings {
    /// Default settings with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, RaceError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| RaceError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Ok(json) = std::fs::read_to_string(path) {
            match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring settings in {}: {}", path.display(), e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), RaceError> {
        if !(0.0..=1.0).contains(&self.base_fall_probability) {
            return Err(RaceError::InvalidSettings(format!(
                "base_fall_probability must be between 0 and 1, got {}",
                self.base_fall_probability
            )));
        }
        if self.stall_ticks_per_unit == 0 {
            return Err(RaceError::InvalidSettings(
                "stall_ticks_per_unit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Tick budget for a track of the given length
    pub fn tick_budget(&self, length: u32) -> u64 {
        u64::from(length).saturating_mul(self.stall_ticks_per_unit)
    }

    /// Convert a logical tick count to reported milliseconds
    pub fn ticks_to_ms(&self, ticks: u64) -> u64 {
        ticks.saturating_mul(self.tick_interval_ms)
    }
}
