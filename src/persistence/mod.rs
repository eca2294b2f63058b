//! Storage collaborator
//!
//! The engine hands finished results to a `RaceStore`; it never reads one
//! back mid-race. Failures surface as `StoreError` and never undo a result.
//!
//! - `MemoryStore`: in-process, for tests and embedding
//! - `JsonFileStore`: one JSON document per collection in a directory

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::outcome::{RaceResult, StatsRow};
use crate::sim::{Competitor, Race, Track};

/// Where race outcomes go once a race has finished
pub trait RaceStore {
    /// Append one statistics row per competitor
    fn append_stats(&mut self, rows: &[StatsRow]) -> Result<(), StoreError>;

    /// Insert or replace a track, keyed by name
    fn save_track(&mut self, track: &Track) -> Result<(), StoreError>;

    /// Insert or replace competitors, keyed by name
    fn save_competitors(&mut self, competitors: &[Competitor]) -> Result<(), StoreError>;

    /// Every statistics row stored so far, oldest first
    fn stats_rows(&self) -> Result<Vec<StatsRow>, StoreError>;

    /// Look up a stored track by name
    fn track(&self, name: &str) -> Result<Option<Track>, StoreError>;
}

/// Write a finished race to `store`: stats rows, the track (and its record),
/// then the competitors with their adapted confidence.
pub fn persist_outcome<S, R>(store: &mut S, result: &RaceResult, race: &Race<R>) -> Result<(), StoreError>
where
    S: RaceStore + ?Sized,
{
    let competitors: Vec<Competitor> = race.competitors().map(|(_, c)| c.clone()).collect();

    let outcome = store
        .append_stats(&result.stats)
        .and_then(|_| store.save_track(race.track()))
        .and_then(|_| store.save_competitors(&competitors));

    match &outcome {
        Ok(()) => log::info!(
            "Persisted race {} ({} rows, {} competitors)",
            result.race_id,
            result.stats.len(),
            competitors.len()
        ),
        Err(e) => log::warn!("Failed to persist race {}: {}", result.race_id, e),
    }
    outcome
}
