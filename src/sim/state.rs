//! Race state and core simulation types
//!
//! Everything a single run mutates lives in `RaceState`: lane occupants,
//! per-lane status, finish order, tick counter and the RNG.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::competitor::Competitor;

/// Lifecycle of a race instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    /// Lanes may be assigned; nothing has run yet (or state was reset)
    Unstarted,
    /// Tick loop in progress, or frozen here by cancellation
    Running,
    /// Every lane is finished, fallen or stalled
    Complete,
}

/// Where a single lane stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneStatus {
    /// Still racing
    Active,
    /// Reached the track length; `position` is 1-based finish order
    Finished { position: usize, tick: u64 },
    /// Fell on the given tick
    Fallen { tick: u64 },
    /// Neither finished nor fell before the race was declared stalled
    Stalled,
}

impl LaneStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LaneStatus::Active)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LaneStatus::Finished { .. })
    }

    pub fn is_fallen(&self) -> bool {
        matches!(self, LaneStatus::Fallen { .. })
    }
}

/// How the tick loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every competitor finished or fell
    Settled,
    /// The tick budget ran out, or no remaining competitor could ever change
    Stalled { tick: u64 },
}

/// A competitor crossing the line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishEntry {
    /// 1-based lane number
    pub lane: usize,
    pub name: String,
    pub symbol: char,
    /// Tick on which the line was crossed
    pub tick: u64,
}

/// Read-only view of one lane, published every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSnapshot {
    /// 1-based lane number, the competitor's identity within the race
    pub lane: usize,
    pub symbol: char,
    pub distance_travelled: u32,
    pub fallen: bool,
    pub finished: bool,
}

/// Read-only view of the whole race at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub tick: u64,
    pub status: RaceStatus,
    pub length: u32,
    pub lanes: Vec<LaneSnapshot>,
}

/// Mutable state for one run of a race
#[derive(Debug, Clone)]
pub struct RaceState<R = Pcg32> {
    /// Lane occupants, index 0 is lane 1
    pub lanes: Vec<Option<Competitor>>,
    /// Per-lane progress, parallel to `lanes`
    pub lane_status: Vec<LaneStatus>,
    /// Competitors in the order they first reached the track length
    pub finish_order: Vec<FinishEntry>,
    /// Simulation tick counter
    pub tick: u64,
    /// Injected random source
    pub rng: R,
}

impl RaceState<Pcg32> {
    /// Empty state with a seeded RNG
    pub fn seeded(lane_count: usize, seed: u64) -> Self {
        Self::with_rng(lane_count, Pcg32::seed_from_u64(seed))
    }
}

impl<R> RaceState<R> {
    /// Empty state using the given random source
    pub fn with_rng(lane_count: usize, rng: R) -> Self {
        Self {
            lanes: vec![None; lane_count],
            lane_status: vec![LaneStatus::Active; lane_count],
            finish_order: Vec::new(),
            tick: 0,
            rng,
        }
    }

    /// Lowest lane number without a competitor
    pub fn first_empty_lane(&self) -> Option<usize> {
        self.lanes.iter().position(Option::is_none).map(|i| i + 1)
    }

    /// Clear per-run state and send every competitor back to the start.
    ///
    /// The RNG is not reseeded, so consecutive runs draw fresh numbers.
    pub fn reset(&mut self) {
        self.finish_order.clear();
        self.tick = 0;
        for status in &mut self.lane_status {
            *status = LaneStatus::Active;
        }
        for competitor in self.lanes.iter_mut().flatten() {
            competitor.go_back_to_start();
        }
    }

    /// Number of lanes still racing
    pub fn active_count(&self) -> usize {
        self.lane_status.iter().filter(|s| s.is_active()).count()
    }

    /// Capture the current positions for observers
    pub fn snapshot(&self, status: RaceStatus, length: u32) -> RaceSnapshot {
        let lanes = self
            .lanes
            .iter()
            .zip(&self.lane_status)
            .enumerate()
            .filter_map(|(i, (slot, lane_status))| {
                slot.as_ref().map(|c| LaneSnapshot {
                    lane: i + 1,
                    symbol: c.symbol(),
                    distance_travelled: c.distance_travelled(),
                    fallen: c.has_fallen(),
                    finished: lane_status.is_finished(),
                })
            })
            .collect();

        RaceSnapshot {
            tick: self.tick,
            status,
            length,
            lanes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horse(symbol: char) -> Competitor {
        Competitor::new(symbol, format!("Horse {symbol}"), 0.5, "Arabian", "Bay")
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = RaceState::seeded(3, 1);
        assert_eq!(state.lanes.len(), 3);
        assert_eq!(state.first_empty_lane(), Some(1));
        assert_eq!(state.active_count(), 3);
        assert!(state.finish_order.is_empty());
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut state = RaceState::seeded(2, 1);
        state.lanes[0] = Some(horse('A'));
        state.lanes[1] = Some(horse('B'));

        if let Some(c) = state.lanes[0].as_mut() {
            c.move_forward();
            c.fall();
        }
        state.lane_status[0] = LaneStatus::Fallen { tick: 4 };
        state.tick = 4;

        state.reset();
        assert_eq!(state.tick, 0);
        assert!(state.lane_status.iter().all(LaneStatus::is_active));
        let first = state.lanes[0].as_ref().unwrap();
        assert_eq!(first.distance_travelled(), 0);
        assert!(!first.has_fallen());
    }

    #[test]
    fn test_snapshot_skips_empty_lanes() {
        let mut state = RaceState::seeded(3, 1);
        state.lanes[1] = Some(horse('B'));
        let snap = state.snapshot(RaceStatus::Unstarted, 30);
        assert_eq!(snap.lanes.len(), 1);
        assert_eq!(snap.lanes[0].lane, 2);
        assert_eq!(snap.lanes[0].symbol, 'B');
        assert_eq!(state.first_empty_lane(), Some(1));
    }
}
