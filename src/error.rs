//! Error types for race setup, execution and persistence.

use thiserror::Error;

/// Errors raised while configuring or running a race.
#[derive(Debug, Error)]
pub enum RaceError {
    #[error("Cannot start race: lane {lane} has no competitor assigned")]
    EmptyLane { lane: usize },

    #[error("Lane {lane} does not exist (track has lanes 1..={lane_count})")]
    InvalidLane { lane: usize, lane_count: usize },

    #[error("Track length must be positive")]
    ZeroLength,

    #[error("Track must have at least one lane")]
    NoLanes,

    #[error("Figure-eight track needs a length of at least 2, got {length}")]
    FigureEightTooShort { length: u32 },

    #[error("Race cancelled at tick {tick}")]
    Cancelled { tick: u64 },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl RaceError {
    /// True for errors caused by how the race or track was set up.
    ///
    /// These are reported at the call that caused them and never leave
    /// partial state behind.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, RaceError::Cancelled { .. })
    }
}

/// Errors from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
