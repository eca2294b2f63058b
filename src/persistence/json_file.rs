//! JSON documents on disk
//!
//! Layout inside the store directory:
//! - `races.json`: every statistics row, oldest first
//! - `tracks.json`: tracks keyed by name
//! - `competitors.json`: competitors keyed by name
//!
//! Each write goes to a `.tmp` sibling first and is renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RaceStore;
use crate::error::StoreError;
use crate::outcome::StatsRow;
use crate::sim::{Competitor, Track};

const RACES_FILE: &str = "races.json";
const TRACKS_FILE: &str = "tracks.json";
const COMPETITORS_FILE: &str = "competitors.json";

/// Store backed by JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::debug!("Opened race store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored competitors keyed by name
    pub fn competitors(&self) -> Result<BTreeMap<String, Competitor>, StoreError> {
        self.read(COMPETITORS_FILE)
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, StoreError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl RaceStore for JsonFileStore {
    fn append_stats(&mut self, rows: &[StatsRow]) -> Result<(), StoreError> {
        let mut stored: Vec<StatsRow> = self.read(RACES_FILE)?;
        stored.extend_from_slice(rows);
        self.write(RACES_FILE, &stored)
    }

    fn save_track(&mut self, track: &Track) -> Result<(), StoreError> {
        let mut tracks: BTreeMap<String, Track> = self.read(TRACKS_FILE)?;
        tracks.insert(track.name().to_string(), track.clone());
        self.write(TRACKS_FILE, &tracks)
    }

    fn save_competitors(&mut self, competitors: &[Competitor]) -> Result<(), StoreError> {
        let mut stored = self.competitors()?;
        for competitor in competitors {
            stored.insert(competitor.name().to_string(), competitor.clone());
        }
        self.write(COMPETITORS_FILE, &stored)
    }

    fn stats_rows(&self) -> Result<Vec<StatsRow>, StoreError> {
        self.read(RACES_FILE)
    }

    fn track(&self, name: &str) -> Result<Option<Track>, StoreError> {
        let mut tracks: BTreeMap<String, Track> = self.read(TRACKS_FILE)?;
        Ok(tracks.remove(name))
    }
}
