//! Derby Sim - A tick-based horse race simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (modifiers, competitors, tracks, tick loop)
//! - `outcome`: Post-race confidence adaptation and statistics rows
//! - `stats`: Aggregation of statistics rows into per-competitor summaries
//! - `settle`: Boundary for the betting collaborator
//! - `persistence`: Storage collaborator contract and implementations
//! - `settings`: Race tuning loaded from JSON

pub mod error;
pub mod outcome;
pub mod persistence;
pub mod settings;
pub mod settle;
pub mod sim;
pub mod stats;

pub use error::{RaceError, StoreError};
pub use outcome::{RaceResult, StatsRow};
pub use settings::RaceSettings;
pub use sim::{Competitor, Item, ItemKind, Race, Track, TrackCondition, TrackShape};

/// Engine tuning constants
pub mod consts {
    /// Base per-tick fall probability, scaled by confidence squared
    pub const BASE_FALL_PROBABILITY: f64 = 0.01;

    /// Default logical tick length in milliseconds
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
    /// Default tick budget per unit of track length before a race stalls
    pub const DEFAULT_STALL_TICKS_PER_UNIT: u64 = 100;

    /// Confidence delta for the winner
    pub const WINNER_DELTA: f64 = 0.07;
    /// Confidence delta for second and third place
    pub const PLACED_DELTA: f64 = 0.02;
    /// Confidence delta for every other finisher
    pub const FINISHER_DELTA: f64 = 0.01;
    /// Confidence delta for a fallen competitor, regardless of rank
    pub const FALLEN_DELTA: f64 = -0.03;
    /// Confidence delta for a competitor that neither finished nor fell
    pub const STALLED_DELTA: f64 = 0.0;

    /// Shape multiplier at a figure-eight crossing point
    pub const FIGURE_EIGHT_CROSSING_SPEED: f64 = 0.7;

    /// Finish time recorded for competitors that did not finish
    pub const NO_FINISH_TIME: i64 = -1;
}

/// Clamp a value to the unit interval [0.0, 1.0]
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Turn any computed chance into something the sampler can accept.
///
/// NaN maps to 0.0 and infinities saturate, so a degenerate modifier product
/// can never reach `random_bool` out of range.
#[inline]
pub fn clamp_probability(chance: f64) -> f64 {
    clamp_unit(chance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(-0.5), 0.0);
        assert_eq!(clamp_probability(1.7), 1.0);
        assert_eq!(clamp_probability(f64::INFINITY), 1.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
        assert!((clamp_probability(0.42) - 0.42).abs() < 1e-12);
    }
}
