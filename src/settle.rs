//! Betting boundary
//!
//! The engine never prices a bet. It exposes the three inputs an odds formula
//! may use and decides which slips named the winner; the caller supplies the
//! formula.

use serde::{Deserialize, Serialize};

use crate::outcome::RaceResult;
use crate::sim::{Competitor, Track};

/// Inputs an odds formula is allowed to depend on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsInputs {
    pub confidence: f64,
    pub track_speed_modifier: f64,
    pub track_fall_risk_modifier: f64,
}

impl OddsInputs {
    pub fn new(competitor: &Competitor, track: &Track) -> Self {
        Self {
            confidence: competitor.confidence(),
            track_speed_modifier: track.speed_modifier(),
            track_fall_risk_modifier: track.fall_risk_modifier(),
        }
    }
}

/// A wager on one competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetSlip {
    pub race_id: String,
    pub competitor_name: String,
    pub competitor_symbol: char,
    pub amount: f64,
    /// Odds inputs captured when the bet was placed
    pub odds_inputs: OddsInputs,
}

impl BetSlip {
    /// Place a bet, capturing pre-race odds inputs
    pub fn place(race_id: impl Into<String>, competitor: &Competitor, track: &Track, amount: f64) -> Self {
        Self {
            race_id: race_id.into(),
            competitor_name: competitor.name().to_string(),
            competitor_symbol: competitor.symbol(),
            amount,
            odds_inputs: OddsInputs::new(competitor, track),
        }
    }
}

/// Outcome of one slip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub slip: BetSlip,
    pub won: bool,
    /// Payout for a winning slip, 0.0 otherwise
    pub winnings: f64,
}

/// Settle slips for `result`.
///
/// A slip wins iff it names the first finisher (name and symbol). Slips for
/// other races are skipped. With no finisher, every slip loses.
pub fn settle<F>(result: &RaceResult, slips: &[BetSlip], odds: F) -> Vec<Settlement>
where
    F: Fn(&OddsInputs) -> f64,
{
    slips
        .iter()
        .filter(|slip| slip.race_id == result.race_id)
        .map(|slip| {
            let won = result.is_winner(&slip.competitor_name, slip.competitor_symbol);
            let winnings = if won { slip.amount * odds(&slip.odds_inputs) } else { 0.0 };
            Settlement {
                slip: slip.clone(),
                won,
                winnings,
            }
        })
        .collect()
}
