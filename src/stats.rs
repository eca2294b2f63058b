//! Per-competitor summaries built from stored statistics rows

use serde::{Deserialize, Serialize};

use crate::consts::NO_FINISH_TIME;
use crate::outcome::StatsRow;

/// Career summary for one competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSummary {
    pub name: String,
    pub total_races: usize,
    pub wins: usize,
    /// Percentage of races won
    pub win_rate: f64,
    pub avg_confidence: f64,
    /// Units per second over finished races
    pub avg_speed: f64,
    pub best_speed: f64,
    pub worst_speed: f64,
}

impl CompetitorSummary {
    /// Summarise every row for `name`; None if it has never raced
    pub fn from_rows<'a>(name: &str, rows: impl IntoIterator<Item = &'a StatsRow>) -> Option<Self> {
        let mut total_races = 0;
        let mut wins = 0;
        let mut confidence_sum = 0.0;
        let mut speeds = Vec::new();

        for row in rows.into_iter().filter(|r| r.name == name) {
            total_races += 1;
            confidence_sum += row.confidence;

            if row.finish_time_ms == NO_FINISH_TIME {
                continue;
            }
            if row.position == 1 {
                wins += 1;
            }
            if row.finish_time_ms > 0 {
                speeds.push(f64::from(row.distance_travelled) / (row.finish_time_ms as f64 / 1000.0));
            }
        }

        if total_races == 0 {
            return None;
        }

        let avg_speed = if speeds.is_empty() {
            0.0
        } else {
            speeds.iter().sum::<f64>() / speeds.len() as f64
        };

        Some(Self {
            name: name.to_string(),
            total_races,
            wins,
            win_rate: wins as f64 / total_races as f64 * 100.0,
            avg_confidence: confidence_sum / total_races as f64,
            avg_speed,
            best_speed: speeds.iter().copied().fold(0.0, f64::max),
            worst_speed: speeds.iter().copied().reduce(f64::min).unwrap_or(0.0),
        })
    }
}
