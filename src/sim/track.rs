//! Track configuration and best-time record

use serde::{Deserialize, Serialize};

use super::modifier;
use crate::error::RaceError;

/// Track layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackShape {
    Oval,
    FigureEight,
}

/// Surface condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackCondition {
    Muddy,
    Dry,
    Icy,
}

impl TrackShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackShape::Oval => "OVAL",
            TrackShape::FigureEight => "FIGURE_EIGHT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().replace(['-', ' '], "_").as_str() {
            "OVAL" => Some(TrackShape::Oval),
            "FIGURE_EIGHT" | "FIGURE8" => Some(TrackShape::FigureEight),
            _ => None,
        }
    }
}

impl TrackCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackCondition::Muddy => "MUDDY",
            TrackCondition::Dry => "DRY",
            TrackCondition::Icy => "ICY",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MUDDY" => Some(TrackCondition::Muddy),
            "DRY" => Some(TrackCondition::Dry),
            "ICY" => Some(TrackCondition::Icy),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fastest winning time seen on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Winning time in milliseconds
    pub best_time_ms: u64,
    /// Name of the competitor who set it
    pub holder: String,
}

/// Static race configuration plus its best-time record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    name: String,
    lane_count: usize,
    length: u32,
    shape: TrackShape,
    condition: TrackCondition,
    #[serde(default)]
    record: Option<TrackRecord>,
}

impl Track {
    /// Create a track, rejecting layouts the engine cannot race on
    pub fn new(
        name: impl Into<String>,
        lane_count: usize,
        length: u32,
        shape: TrackShape,
        condition: TrackCondition,
    ) -> Result<Self, RaceError> {
        if lane_count == 0 {
            return Err(RaceError::NoLanes);
        }
        if length == 0 {
            return Err(RaceError::ZeroLength);
        }
        // The crossing point is at every multiple of length / 2
        if shape == TrackShape::FigureEight && length < 2 {
            return Err(RaceError::FigureEightTooShort { length });
        }

        Ok(Self {
            name: name.into(),
            lane_count,
            length,
            shape,
            condition,
            record: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn shape(&self) -> TrackShape {
        self.shape
    }

    pub fn condition(&self) -> TrackCondition {
        self.condition
    }

    /// Change the surface condition (weather) between races
    pub fn set_condition(&mut self, condition: TrackCondition) {
        self.condition = condition;
    }

    pub fn record(&self) -> Option<&TrackRecord> {
        self.record.as_ref()
    }

    /// Restore a record loaded from storage
    pub fn with_record(mut self, record: Option<TrackRecord>) -> Self {
        self.record = record;
        self
    }

    pub fn speed_modifier(&self) -> f64 {
        modifier::speed_modifier(self.condition)
    }

    pub fn fall_risk_modifier(&self) -> f64 {
        modifier::fall_risk_modifier(self.condition)
    }

    pub fn shape_speed_adjustment(&self, distance_travelled: u32) -> f64 {
        modifier::shape_speed_adjustment(self.shape, self.length, distance_travelled)
    }

    /// Offer a winning time as a new record.
    ///
    /// Only a strictly faster time replaces the current holder.
    /// Returns true when the record changed.
    pub fn consider_record(&mut self, time_ms: u64, holder: &str) -> bool {
        let improves = self
            .record
            .as_ref()
            .map(|r| time_ms < r.best_time_ms)
            .unwrap_or(true);

        if improves {
            log::info!(
                "New record on {}: {} in {}ms",
                self.name,
                holder,
                time_ms
            );
            self.record = Some(TrackRecord {
                best_time_ms: time_ms,
                holder: holder.to_string(),
            });
        }
        improves
    }
}
