//! Logical race tick
//!
//! Advances every active lane by one step. No pacing and no I/O here: the
//! caller decides how often to call `tick`.

use rand::Rng;

use super::competitor::Competitor;
use super::modifier::{self, ChanceInputs};
use super::state::{FinishEntry, LaneStatus, RaceState};
use super::track::Track;
use crate::settings::RaceSettings;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Lanes that moved forward
    pub moved: Vec<usize>,
    /// Lanes that crossed the line
    pub finished: Vec<usize>,
    /// Lanes that fell
    pub fallen: Vec<usize>,
    /// Lanes still racing after this tick
    pub active: usize,
}

/// Gather the modifier inputs for a competitor at its current distance
pub fn chance_inputs(competitor: &Competitor, track: &Track) -> ChanceInputs {
    let distance = competitor.distance_travelled();
    ChanceInputs {
        confidence: competitor.confidence(),
        distance_travelled: distance,
        length: track.length(),
        track_speed: track.speed_modifier(),
        track_fall_risk: track.fall_risk_modifier(),
        shape_adjustment: track.shape_speed_adjustment(distance),
        equipment_speed: modifier::equipment_speed_modifier(competitor.equipment()),
        equipment_endurance: modifier::equipment_endurance_modifier(competitor.equipment()),
        equipment_confidence: modifier::equipment_confidence_modifier(competitor.equipment()),
    }
}

/// True when no active lane can ever move or fall again.
///
/// Both chances depend only on distance and static inputs, so if every active
/// competitor has zero of each, the race can never progress.
pub fn is_frozen<R>(state: &RaceState<R>, track: &Track, settings: &RaceSettings) -> bool {
    state
        .lanes
        .iter()
        .zip(&state.lane_status)
        .filter(|(_, status)| status.is_active())
        .all(|(slot, _)| match slot {
            Some(c) => {
                let chances = chance_inputs(c, track);
                chances.move_chance() == 0.0
                    && chances.fall_chance(settings.base_fall_probability) == 0.0
            }
            None => true,
        })
}

/// Advance the race by one tick
pub fn tick<R: Rng>(state: &mut RaceState<R>, track: &Track, settings: &RaceSettings) -> TickReport {
    state.tick += 1;
    let mut report = TickReport::default();

    for (index, slot) in state.lanes.iter_mut().enumerate() {
        let lane = index + 1;
        let status = &mut state.lane_status[index];
        let Some(competitor) = slot.as_mut() else {
            continue;
        };
        if !status.is_active() {
            continue;
        }

        let chances = chance_inputs(competitor, track);
        // Both samples are always drawn so the RNG stream does not depend on outcomes
        let moves = state.rng.random_bool(chances.move_chance());
        let falls = state
            .rng
            .random_bool(chances.fall_chance(settings.base_fall_probability));

        if moves {
            competitor.move_forward();
            report.moved.push(lane);
        }

        if competitor.distance_travelled() >= track.length() {
            // Crossing the line wins over a same-tick fall
            let position = state.finish_order.len() + 1;
            state.finish_order.push(FinishEntry {
                lane,
                name: competitor.name().to_string(),
                symbol: competitor.symbol(),
                tick: state.tick,
            });
            *status = LaneStatus::Finished {
                position,
                tick: state.tick,
            };
            report.finished.push(lane);
            log::debug!(
                "{} finished in position {} at tick {}",
                competitor.name(),
                position,
                state.tick
            );
        } else if falls {
            competitor.fall();
            *status = LaneStatus::Fallen { tick: state.tick };
            report.fallen.push(lane);
            log::debug!(
                "{} fell at {} units on tick {}",
                competitor.name(),
                competitor.distance_travelled(),
                state.tick
            );
        }
    }

    report.active = state.active_count();
    report
}
