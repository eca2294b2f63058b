//! In-memory store

use std::collections::BTreeMap;

use super::RaceStore;
use crate::error::StoreError;
use crate::outcome::StatsRow;
use crate::sim::{Competitor, Track};

/// Store that keeps everything in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    stats: Vec<StatsRow>,
    tracks: BTreeMap<String, Track>,
    competitors: BTreeMap<String, Competitor>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored competitors, ordered by name
    pub fn competitors(&self) -> Vec<&Competitor> {
        self.competitors.values().collect()
    }

    pub fn competitor(&self, name: &str) -> Option<&Competitor> {
        self.competitors.get(name)
    }
}

impl RaceStore for MemoryStore {
    fn append_stats(&mut self, rows: &[StatsRow]) -> Result<(), StoreError> {
        self.stats.extend_from_slice(rows);
        Ok(())
    }

    fn save_track(&mut self, track: &Track) -> Result<(), StoreError> {
        self.tracks.insert(track.name().to_string(), track.clone());
        Ok(())
    }

    fn save_competitors(&mut self, competitors: &[Competitor]) -> Result<(), StoreError> {
        for competitor in competitors {
            self.competitors
                .insert(competitor.name().to_string(), competitor.clone());
        }
        Ok(())
    }

    fn stats_rows(&self) -> Result<Vec<StatsRow>, StoreError> {
        Ok(self.stats.clone())
    }

    fn track(&self, name: &str) -> Result<Option<Track>, StoreError> {
        Ok(self.tracks.get(name).cloned())
    }
}
