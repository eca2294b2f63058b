//! Outcome reporting
//!
//! Runs once after a race completes: ranks every lane, applies the confidence
//! adaptation rule, projects one statistics row per competitor and offers the
//! winning time to the track record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::RaceSettings;
use crate::sim::{FinishEntry, LaneStatus, RaceState, Termination, Track, TrackCondition, TrackRecord};

/// One competitor's final place in the full ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placing {
    /// 1-based position across finishers and non-finishers
    pub position: usize,
    pub lane: usize,
    pub name: String,
    pub symbol: char,
    pub distance_travelled: u32,
    pub status: LaneStatus,
}

/// Confidence before and after adaptation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceChange {
    pub name: String,
    pub before: f64,
    pub delta: f64,
    pub after: f64,
}

/// Statistics record handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    pub race_id: String,
    pub name: String,
    pub symbol: char,
    /// Confidence going into the race, before adaptation
    pub confidence: f64,
    pub distance_travelled: u32,
    pub position: usize,
    /// Finish time in milliseconds, `NO_FINISH_TIME` for non-finishers
    pub finish_time_ms: i64,
    pub track_name: String,
    pub track_condition: TrackCondition,
}

/// Immutable result of a completed race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_id: String,
    pub termination: Termination,
    /// Ticks run before the loop ended
    pub ticks: u64,
    pub finish_order: Vec<FinishEntry>,
    pub placings: Vec<Placing>,
    /// Lanes whose competitor fell
    pub fallen: Vec<usize>,
    /// Lanes whose competitor neither finished nor fell
    pub stalled: Vec<usize>,
    /// Lane -> confidence change applied after the race
    pub confidence_deltas: BTreeMap<usize, ConfidenceChange>,
    pub stats: Vec<StatsRow>,
    /// Set when this race's winner improved the track record
    pub new_record: Option<TrackRecord>,
}

impl RaceResult {
    pub fn winner(&self) -> Option<&FinishEntry> {
        self.finish_order.first()
    }

    /// Identity check against the winner (name and symbol)
    pub fn is_winner(&self, name: &str, symbol: char) -> bool {
        self.winner()
            .map(|w| w.name == name && w.symbol == symbol)
            .unwrap_or(false)
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self.termination, Termination::Stalled { .. })
    }

    /// Lanes whose competitor did not fall
    pub fn unfallen(&self) -> Vec<usize> {
        self.placings
            .iter()
            .filter(|p| !p.status.is_fallen())
            .map(|p| p.lane)
            .collect()
    }
}

/// Rank every occupied lane: finishers in finish order, then everyone else
/// by distance covered (furthest first, ties by lane)
pub fn rank<R>(state: &RaceState<R>) -> Vec<Placing> {
    let mut placings: Vec<Placing> = state
        .finish_order
        .iter()
        .filter_map(|entry| {
            let competitor = state.lanes.get(entry.lane - 1)?.as_ref()?;
            Some(Placing {
                position: 0,
                lane: entry.lane,
                name: entry.name.clone(),
                symbol: entry.symbol,
                distance_travelled: competitor.distance_travelled(),
                status: state.lane_status[entry.lane - 1],
            })
        })
        .collect();

    let mut rest: Vec<Placing> = state
        .lanes
        .iter()
        .zip(&state.lane_status)
        .enumerate()
        .filter(|(_, (_, status))| !status.is_finished())
        .filter_map(|(i, (slot, status))| {
            slot.as_ref().map(|c| Placing {
                position: 0,
                lane: i + 1,
                name: c.name().to_string(),
                symbol: c.symbol(),
                distance_travelled: c.distance_travelled(),
                status: *status,
            })
        })
        .collect();
    rest.sort_by(|a, b| {
        b.distance_travelled
            .cmp(&a.distance_travelled)
            .then(a.lane.cmp(&b.lane))
    });

    placings.extend(rest);
    for (i, placing) in placings.iter_mut().enumerate() {
        placing.position = i + 1;
    }
    placings
}

/// Confidence delta for a ranked competitor.
///
/// A fall overrides the positional delta; a stalled competitor is unchanged.
pub fn confidence_delta(position: usize, status: LaneStatus) -> f64 {
    match status {
        LaneStatus::Fallen { .. } => FALLEN_DELTA,
        LaneStatus::Stalled | LaneStatus::Active => STALLED_DELTA,
        LaneStatus::Finished { .. } => match position {
            1 => WINNER_DELTA,
            2..=3 => PLACED_DELTA,
            _ => FINISHER_DELTA,
        },
    }
}

/// Produce the race result and apply its side effects: adapted confidence on
/// every competitor and, if beaten, the track record.
pub fn report<R>(
    race_id: &str,
    track: &mut Track,
    state: &mut RaceState<R>,
    termination: Termination,
    settings: &RaceSettings,
) -> RaceResult {
    let placings = rank(state);
    let mut confidence_deltas = BTreeMap::new();
    let mut stats = Vec::with_capacity(placings.len());

    for placing in &placings {
        let Some(competitor) = state.lanes[placing.lane - 1].as_mut() else {
            continue;
        };

        let before = competitor.confidence();
        let delta = confidence_delta(placing.position, placing.status);
        competitor.set_confidence(before + delta);

        let finish_time_ms = match placing.status {
            LaneStatus::Finished { tick, .. } => {
                // Saturate rather than wrap into the sentinel
                i64::try_from(settings.ticks_to_ms(tick)).unwrap_or(i64::MAX)
            }
            _ => NO_FINISH_TIME,
        };

        stats.push(StatsRow {
            race_id: race_id.to_string(),
            name: placing.name.clone(),
            symbol: placing.symbol,
            confidence: before,
            distance_travelled: placing.distance_travelled,
            position: placing.position,
            finish_time_ms,
            track_name: track.name().to_string(),
            track_condition: track.condition(),
        });

        confidence_deltas.insert(
            placing.lane,
            ConfidenceChange {
                name: placing.name.clone(),
                before,
                delta,
                after: competitor.confidence(),
            },
        );
    }

    let new_record = state.finish_order.first().and_then(|winner| {
        let time_ms = settings.ticks_to_ms(winner.tick);
        if track.consider_record(time_ms, &winner.name) {
            track.record().cloned()
        } else {
            None
        }
    });

    let lanes_where = |pred: fn(&LaneStatus) -> bool| -> Vec<usize> {
        placings
            .iter()
            .filter(|p| pred(&p.status))
            .map(|p| p.lane)
            .collect()
    };
    let fallen = lanes_where(LaneStatus::is_fallen);
    let stalled = lanes_where(|s: &LaneStatus| matches!(s, LaneStatus::Stalled));

    RaceResult {
        race_id: race_id.to_string(),
        termination,
        ticks: state.tick,
        finish_order: state.finish_order.clone(),
        placings,
        fallen,
        stalled,
        confidence_deltas,
        stats,
        new_record,
    }
}
