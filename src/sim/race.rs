//! Race - lane assembly and the run lifecycle
//!
//! `Unstarted -> Running -> Complete`. Starting again from any state resets
//! the per-run state first; a cancelled run stays `Running` with the
//! cancelled flag set until the next reset.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::competitor::Competitor;
use super::observer::{CancelToken, NoopObserver, RaceObserver};
use super::state::{FinishEntry, LaneStatus, RaceSnapshot, RaceState, RaceStatus, Termination};
use super::tick;
use super::track::Track;
use crate::error::RaceError;
use crate::outcome::{self, RaceResult};
use crate::settings::RaceSettings;

/// One track, a fixed set of lanes, and the engine that races them
#[derive(Debug)]
pub struct Race<R = Pcg32> {
    track: Track,
    settings: RaceSettings,
    state: RaceState<R>,
    status: RaceStatus,
    cancelled: bool,
    /// Completed or attempted runs, used in the race id
    runs: u64,
    /// Lane -> confidence delta from the last completed run
    confidence_deltas: BTreeMap<usize, f64>,
}

impl Race<Pcg32> {
    /// Race with an RNG seeded from `settings.seed`
    pub fn new(track: Track, settings: RaceSettings) -> Result<Self, RaceError> {
        let rng = Pcg32::seed_from_u64(settings.seed);
        Self::with_rng(track, settings, rng)
    }
}

impl<R: Rng> Race<R> {
    /// Race with an injected random source
    pub fn with_rng(track: Track, settings: RaceSettings, rng: R) -> Result<Self, RaceError> {
        settings.validate()?;
        let state = RaceState::with_rng(track.lane_count(), rng);
        Ok(Self {
            track,
            settings,
            state,
            status: RaceStatus::Unstarted,
            cancelled: false,
            runs: 0,
            confidence_deltas: BTreeMap::new(),
        })
    }

    fn check_lane(&self, lane: usize) -> Result<usize, RaceError> {
        if lane == 0 || lane > self.track.lane_count() {
            return Err(RaceError::InvalidLane {
                lane,
                lane_count: self.track.lane_count(),
            });
        }
        Ok(lane - 1)
    }

    /// Put a competitor in a lane (1-based), returning whoever was there.
    ///
    /// Assigning after a run resets the race to `Unstarted`.
    pub fn assign(&mut self, mut competitor: Competitor, lane: usize) -> Result<Option<Competitor>, RaceError> {
        let index = self.check_lane(lane)?;
        if self.status != RaceStatus::Unstarted {
            self.reset();
        }
        competitor.go_back_to_start();
        Ok(self.state.lanes[index].replace(competitor))
    }

    /// Take a competitor out of a lane
    pub fn remove(&mut self, lane: usize) -> Result<Option<Competitor>, RaceError> {
        let index = self.check_lane(lane)?;
        if self.status != RaceStatus::Unstarted {
            self.reset();
        }
        Ok(self.state.lanes[index].take())
    }

    /// Run the race to completion with no observer
    pub fn start(&mut self) -> Result<RaceResult, RaceError> {
        self.start_observed(&mut NoopObserver, &CancelToken::new())
    }

    /// Run the race, publishing a snapshot to `observer` after every tick and
    /// checking `cancel` before each one
    pub fn start_observed<O>(&mut self, observer: &mut O, cancel: &CancelToken) -> Result<RaceResult, RaceError>
    where
        O: RaceObserver + ?Sized,
    {
        if let Some(lane) = self.state.first_empty_lane() {
            log::warn!("Cannot start race on {}: lane {} is empty", self.track.name(), lane);
            return Err(RaceError::EmptyLane { lane });
        }

        self.reset();
        self.runs += 1;
        self.status = RaceStatus::Running;
        let race_id = self.race_id();
        let length = self.track.length();
        let budget = self.settings.tick_budget(length);

        log::info!(
            "Race {} started: {} lanes, length {}, {:?} / {}",
            race_id,
            self.track.lane_count(),
            length,
            self.track.shape(),
            self.track.condition()
        );

        let termination = loop {
            if cancel.is_cancelled() {
                self.cancelled = true;
                log::warn!("Race {} cancelled at tick {}", race_id, self.state.tick);
                return Err(RaceError::Cancelled {
                    tick: self.state.tick,
                });
            }

            if self.state.active_count() == 0 {
                break Termination::Settled;
            }

            if self.state.tick >= budget || tick::is_frozen(&self.state, &self.track, &self.settings) {
                self.mark_stalled();
                log::warn!("Race {} stalled at tick {}", race_id, self.state.tick);
                break Termination::Stalled {
                    tick: self.state.tick,
                };
            }

            tick::tick(&mut self.state, &self.track, &self.settings);
            if observer.wants_snapshots() {
                observer.on_tick(&self.state.snapshot(RaceStatus::Running, length));
            }
        };

        self.status = RaceStatus::Complete;
        if observer.wants_snapshots() {
            observer.on_tick(&self.snapshot());
        }

        let result = outcome::report(
            &race_id,
            &mut self.track,
            &mut self.state,
            termination,
            &self.settings,
        );
        self.confidence_deltas = result
            .confidence_deltas
            .iter()
            .map(|(lane, change)| (*lane, change.delta))
            .collect();

        match result.winner() {
            Some(winner) => log::info!(
                "Race {} complete after {} ticks, winner: {} ({})",
                race_id,
                result.ticks,
                winner.name,
                winner.symbol
            ),
            None => log::info!("Race {} complete after {} ticks with no winner", race_id, result.ticks),
        }

        Ok(result)
    }

    fn mark_stalled(&mut self) {
        for status in &mut self.state.lane_status {
            if status.is_active() {
                *status = LaneStatus::Stalled;
            }
        }
    }

    /// Back to `Unstarted` with every competitor at the start line
    pub fn reset(&mut self) {
        self.state.reset();
        self.status = RaceStatus::Unstarted;
        self.cancelled = false;
        self.confidence_deltas.clear();
    }
}

impl<R> Race<R> {
    /// Current positions for observers; callable in any state
    pub fn snapshot(&self) -> RaceSnapshot {
        self.state.snapshot(self.status, self.track.length())
    }

    /// Identifier used in statistics rows for the current or last run
    pub fn race_id(&self) -> String {
        format!("{}-{:x}-{}", self.track.name(), self.settings.seed, self.runs)
    }

    /// Identifier the next call to `start` will use, for bets placed beforehand
    pub fn next_race_id(&self) -> String {
        format!("{}-{:x}-{}", self.track.name(), self.settings.seed, self.runs + 1)
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Track access between runs, e.g. to change the condition
    pub fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    pub fn settings(&self) -> &RaceSettings {
        &self.settings
    }

    pub fn competitor(&self, lane: usize) -> Option<&Competitor> {
        lane.checked_sub(1)
            .and_then(|i| self.state.lanes.get(i))
            .and_then(Option::as_ref)
    }

    /// Occupied lanes as `(lane, competitor)`
    pub fn competitors(&self) -> impl Iterator<Item = (usize, &Competitor)> {
        self.state
            .lanes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (i + 1, c)))
    }

    pub fn finish_order(&self) -> &[FinishEntry] {
        &self.state.finish_order
    }

    pub fn lane_status(&self, lane: usize) -> Option<LaneStatus> {
        lane.checked_sub(1)
            .and_then(|i| self.state.lane_status.get(i))
            .copied()
    }

    pub fn fallen_lanes(&self) -> Vec<usize> {
        self.competitors()
            .filter(|(_, c)| c.has_fallen())
            .map(|(lane, _)| lane)
            .collect()
    }

    pub fn unfallen_lanes(&self) -> Vec<usize> {
        self.competitors()
            .filter(|(_, c)| !c.has_fallen())
            .map(|(lane, _)| lane)
            .collect()
    }

    /// Lane -> confidence delta applied by the last completed run
    pub fn confidence_deltas(&self) -> &BTreeMap<usize, f64> {
        &self.confidence_deltas
    }

    /// Hand back the track and lane occupants
    pub fn into_parts(self) -> (Track, Vec<Option<Competitor>>) {
        (self.track, self.state.lanes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::track::{TrackCondition, TrackShape};

    fn track(lanes: usize, length: u32, condition: TrackCondition) -> Track {
        Track::new("Newmarket", lanes, length, TrackShape::Oval, condition).unwrap()
    }

    fn horse(symbol: char, confidence: f64) -> Competitor {
        Competitor::new(symbol, format!("Horse {symbol}"), confidence, "Thoroughbred", "Bay")
    }

    fn full_race(confidences: &[f64], condition: TrackCondition, seed: u64) -> Race {
        let mut race = Race::new(
            track(confidences.len(), 30, condition),
            RaceSettings::with_seed(seed),
        )
        .unwrap();
        for (i, &c) in confidences.iter().enumerate() {
            race.assign(horse(char::from(b'A' + i as u8), c), i + 1).unwrap();
        }
        race
    }

    #[test]
    fn test_assign_rejects_invalid_lane() {
        let mut race = Race::new(track(3, 30, TrackCondition::Dry), RaceSettings::default()).unwrap();
        assert!(matches!(
            race.assign(horse('A', 0.5), 0),
            Err(RaceError::InvalidLane { lane: 0, lane_count: 3 })
        ));
        assert!(matches!(
            race.assign(horse('A', 0.5), 4),
            Err(RaceError::InvalidLane { lane: 4, .. })
        ));
        assert!(race.competitors().next().is_none());
    }

    #[test]
    fn test_assign_replaces_occupant() {
        let mut race = Race::new(track(2, 30, TrackCondition::Dry), RaceSettings::default()).unwrap();
        assert!(race.assign(horse('A', 0.5), 1).unwrap().is_none());
        let previous = race.assign(horse('B', 0.5), 1).unwrap();
        assert_eq!(previous.unwrap().symbol(), 'A');
        assert_eq!(race.competitor(1).unwrap().symbol(), 'B');
    }

    #[test]
    fn test_start_refuses_empty_lane() {
        let mut race = Race::new(track(3, 30, TrackCondition::Dry), RaceSettings::default()).unwrap();
        race.assign(horse('A', 0.5), 1).unwrap();
        race.assign(horse('C', 0.5), 3).unwrap();

        let err = race.start().unwrap_err();
        assert!(matches!(err, RaceError::EmptyLane { lane: 2 }));
        assert!(err.is_configuration());
        assert_eq!(race.status(), RaceStatus::Unstarted);
        assert_eq!(race.competitor(1).unwrap().confidence(), 0.5);
    }

    #[test]
    fn test_remove_validates_lane_and_empties_it() {
        let mut race = full_race(&[0.5, 0.5, 0.5], TrackCondition::Dry, 3);
        assert!(matches!(
            race.remove(0),
            Err(RaceError::InvalidLane { lane: 0, lane_count: 3 })
        ));
        assert!(matches!(
            race.remove(4),
            Err(RaceError::InvalidLane { lane: 4, .. })
        ));

        let removed = race.remove(2).unwrap();
        assert_eq!(removed.unwrap().symbol(), 'B');
        assert!(race.competitor(2).is_none());
        assert!(race.remove(2).unwrap().is_none());

        let err = race.start().unwrap_err();
        assert!(matches!(err, RaceError::EmptyLane { lane: 2 }));
        assert_eq!(race.status(), RaceStatus::Unstarted);
    }

    #[test]
    fn test_remove_after_run_resets() {
        let mut race = full_race(&[0.9, 0.9], TrackCondition::Dry, 4);
        race.start().unwrap();
        assert_eq!(race.status(), RaceStatus::Complete);

        race.remove(1).unwrap();
        assert_eq!(race.status(), RaceStatus::Unstarted);
        assert!(race.finish_order().is_empty());
        assert_eq!(race.competitor(2).unwrap().distance_travelled(), 0);
    }

    #[test]
    fn test_with_rng_accepts_other_generators() {
        use rand::rngs::StdRng;

        let build = |seed: u64| {
            let mut race = Race::with_rng(
                track(2, 30, TrackCondition::Muddy),
                RaceSettings::default(),
                StdRng::seed_from_u64(seed),
            )
            .unwrap();
            race.assign(horse('A', 0.8), 1).unwrap();
            race.assign(horse('B', 0.6), 2).unwrap();
            race
        };

        let mut a = build(21);
        let mut b = build(21);
        let ra = a.start().unwrap();
        let rb = b.start().unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.placings.len(), 2);
        assert_eq!(a.status(), RaceStatus::Complete);
    }

    #[test]
    fn test_with_rng_rejects_bad_settings() {
        use rand::rngs::StdRng;

        let settings = RaceSettings {
            stall_ticks_per_unit: 0,
            ..RaceSettings::default()
        };
        let err = Race::with_rng(track(2, 30, TrackCondition::Dry), settings, StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, RaceError::InvalidSettings(_)));
    }

    #[test]
    fn test_race_runs_to_completion() {
        let mut race = full_race(&[0.9, 0.8, 0.7], TrackCondition::Dry, 7);
        let result = race.start().unwrap();

        assert_eq!(race.status(), RaceStatus::Complete);
        assert_eq!(result.placings.len(), 3);
        assert_eq!(result.stats.len(), 3);
        assert_eq!(race.confidence_deltas().len(), 3);
        for (lane, status) in (1..=3).map(|l| (l, race.lane_status(l).unwrap())) {
            assert!(!status.is_active(), "lane {lane} still active");
        }
        for entry in &result.finish_order {
            assert!(!race.competitor(entry.lane).unwrap().has_fallen());
            assert!(race.competitor(entry.lane).unwrap().distance_travelled() >= 30);
        }
    }

    #[test]
    fn test_stall_scenario() {
        let mut race = full_race(&[0.0, 0.0, 0.0], TrackCondition::Dry, 1);
        let result = race.start().unwrap();

        assert!(result.is_stalled());
        assert_eq!(result.stalled, vec![1, 2, 3]);
        assert!(result.finish_order.is_empty());
        assert!(result.ticks <= race.settings().tick_budget(30));
        for row in &result.stats {
            assert_eq!(row.finish_time_ms, NO_FINISH_TIME);
        }
        // Stalled competitors keep their confidence
        assert_eq!(race.competitor(1).unwrap().confidence(), 0.0);
    }

    #[test]
    fn test_tick_budget_stalls_slow_race() {
        let settings = RaceSettings {
            seed: 3,
            stall_ticks_per_unit: 1,
            base_fall_probability: 0.0,
            ..RaceSettings::default()
        };
        let mut race = Race::new(track(1, 30, TrackCondition::Dry), settings).unwrap();
        race.assign(horse('A', 0.05), 1).unwrap();

        let result = race.start().unwrap();
        assert_eq!(result.termination, Termination::Stalled { tick: 30 });
        assert_eq!(race.lane_status(1), Some(LaneStatus::Stalled));
    }

    #[test]
    fn test_cancellation_freezes_running() {
        let mut race = full_race(&[0.5, 0.5], TrackCondition::Dry, 11);
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let mut observer = |s: &RaceSnapshot| {
            if s.tick == 3 {
                trigger.cancel();
            }
        };

        let err = race.start_observed(&mut observer, &cancel).unwrap_err();
        assert!(matches!(err, RaceError::Cancelled { tick: 3 }));
        assert_eq!(race.status(), RaceStatus::Running);
        assert!(race.is_cancelled());
        // No adaptation for a cancelled run
        assert!(race.confidence_deltas().is_empty());
        assert_eq!(race.competitor(1).unwrap().confidence(), 0.5);

        race.reset();
        assert_eq!(race.status(), RaceStatus::Unstarted);
        assert!(!race.is_cancelled());
    }

    #[test]
    fn test_restart_resets_state() {
        let mut race = full_race(&[0.6, 0.6, 0.6], TrackCondition::Icy, 5);
        race.start().unwrap();
        race.reset();

        let snap = race.snapshot();
        assert_eq!(snap.tick, 0);
        assert_eq!(snap.status, RaceStatus::Unstarted);
        assert!(snap.lanes.iter().all(|l| l.distance_travelled == 0 && !l.fallen));
        assert!(race.finish_order().is_empty());
        assert!(race.confidence_deltas().is_empty());

        let expected = race.next_race_id();
        assert!(expected.ends_with("-2"));
        let again = race.start().unwrap();
        assert_eq!(again.race_id, expected);
    }

    #[test]
    fn test_observer_sees_every_tick() {
        let mut race = full_race(&[0.9, 0.9], TrackCondition::Dry, 13);
        let mut ticks = Vec::new();
        let mut observer = |s: &RaceSnapshot| ticks.push((s.tick, s.status));
        let result = race.start_observed(&mut observer, &CancelToken::new()).unwrap();

        let running: Vec<u64> = ticks
            .iter()
            .filter(|(_, status)| *status == RaceStatus::Running)
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(running, (1..=result.ticks).collect::<Vec<_>>());
        assert_eq!(ticks.last().map(|(_, s)| *s), Some(RaceStatus::Complete));
    }

    #[test]
    fn test_observer_can_opt_out_of_snapshots() {
        struct Counter(usize);
        impl RaceObserver for Counter {
            fn on_tick(&mut self, _snapshot: &RaceSnapshot) {
                self.0 += 1;
            }
            fn wants_snapshots(&self) -> bool {
                false
            }
        }

        let mut race = full_race(&[0.9, 0.9], TrackCondition::Dry, 13);
        let mut counter = Counter(0);
        let result = race.start_observed(&mut counter, &CancelToken::new()).unwrap();
        assert!(result.ticks > 0);
        assert_eq!(counter.0, 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut a = full_race(&[0.7, 0.5, 0.9], TrackCondition::Muddy, 99);
        let mut b = full_race(&[0.7, 0.5, 0.9], TrackCondition::Muddy, 99);
        let ra = a.start().unwrap();
        let rb = b.start().unwrap();
        assert_eq!(ra.finish_order, rb.finish_order);
        assert_eq!(ra.stats, rb.stats);
    }
}
