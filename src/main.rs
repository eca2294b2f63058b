//! Derby Sim - terminal demo
//!
//! Runs one race on a worker thread, draws the lanes from the main thread by
//! polling published snapshots, then settles a couple of bets and stores the
//! outcome under `derby-data/`.
//!
//! Usage: `derby-sim [seed]`

use std::thread;
use std::time::Duration;

use derby_sim::persistence::{JsonFileStore, RaceStore, persist_outcome};
use derby_sim::settle::{self, BetSlip, OddsInputs};
use derby_sim::sim::{CancelToken, LaneSnapshot, PacedObserver, RaceSnapshot, RaceStatus, SnapshotBoard};
use derby_sim::stats::CompetitorSummary;
use derby_sim::{Competitor, Item, Race, RaceResult, RaceSettings, Track, TrackCondition, TrackShape};

const SETTINGS_FILE: &str = "derby-sim.json";
const DATA_DIR: &str = "derby-data";
const TRACK_NAME: &str = "Ascot";
const LOG_ENV: &str = "RUST_LOG";

/// Logger reading its filter from `var`, `info` when unset
fn log_builder(var: &str) -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(var, "info"))
}

/// Decimal odds: favourites pay less, and slow or risky going pays more
fn reference_decimal_odds(inputs: &OddsInputs) -> f64 {
    let base = 2.0 + (1.0 - inputs.confidence) * 8.0;
    let odds = base * (2.0 - inputs.track_speed_modifier) * (1.0 + inputs.track_fall_risk_modifier);
    odds.max(1.1)
}

fn lane_line(lane: &LaneSnapshot, length: u32) -> String {
    let marker = if lane.fallen { 'X' } else { lane.symbol };
    let position = lane.distance_travelled.min(length) as usize;
    let track_len = length as usize;
    let mut line = String::with_capacity(track_len + 8);
    line.push('|');
    line.extend(std::iter::repeat_n(' ', position));
    line.push(marker);
    line.extend(std::iter::repeat_n(' ', track_len - position));
    line.push('|');
    if lane.finished {
        line.push_str(" finished");
    }
    line
}

fn draw(snapshot: &RaceSnapshot) {
    let border = "=".repeat(snapshot.length as usize + 3);
    println!("{border}  tick {}", snapshot.tick);
    for lane in &snapshot.lanes {
        println!("{}", lane_line(lane, snapshot.length));
    }
    println!("{border}");
}

fn roster(store: &JsonFileStore) -> Vec<Competitor> {
    let mut horses = vec![
        Competitor::new('A', "Arrow", 0.55, "Arabian", "Bay"),
        Competitor::new('B', "Biscuit", 0.7, "Thoroughbred", "Chestnut"),
        Competitor::new('C', "Comet", 0.45, "Mustang", "Grey"),
    ];
    horses[1].equip(Item::equipment("Racing saddle", 1.1, 1.0, 1.0));
    horses[2].equip(Item::equipment("Blinkers", 1.0, 0.9, 1.2));
    horses[0].equip(Item::accessory("Red ribbon"));

    // Returning horses keep the confidence they earned in earlier runs
    match store.competitors() {
        Ok(saved) => {
            for horse in &mut horses {
                if let Some(previous) = saved.get(horse.name()) {
                    horse.set_confidence(previous.confidence());
                }
            }
        }
        Err(e) => log::warn!("Could not read saved competitors: {}", e),
    }
    horses
}

fn print_result(result: &RaceResult) {
    println!();
    match result.winner() {
        Some(winner) => println!("Winner: {} ({})", winner.name, winner.symbol),
        None => println!("No winner"),
    }
    if result.is_stalled() {
        println!("Race stalled after {} ticks", result.ticks);
    }
    if let Some(record) = &result.new_record {
        println!("New track record: {} ms by {}", record.best_time_ms, record.holder);
    }

    println!("\nPlacings:");
    for placing in &result.placings {
        let confidence = result
            .confidence_deltas
            .get(&placing.lane)
            .map(|c| format!("confidence {:.2} -> {:.2}", c.before, c.after))
            .unwrap_or_default();
        println!(
            "  {}. {} ({}) lane {} - {} units, {:?}, {}",
            placing.position,
            placing.name,
            placing.symbol,
            placing.lane,
            placing.distance_travelled,
            placing.status,
            confidence
        );
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = RaceSettings::load(SETTINGS_FILE);
    if let Some(arg) = std::env::args().nth(1) {
        settings.seed = arg.parse()?;
    }

    let mut store = JsonFileStore::open(DATA_DIR)?;
    let track = match store.track(TRACK_NAME)? {
        Some(track) => track,
        None => Track::new(TRACK_NAME, 3, 30, TrackShape::Oval, TrackCondition::Dry)?,
    };

    let mut race = Race::new(track, settings)?;
    for (i, horse) in roster(&store).into_iter().enumerate() {
        race.assign(horse, i + 1)?;
    }

    let race_id = race.next_race_id();
    let slips: Vec<BetSlip> = race
        .competitors()
        .map(|(_, horse)| BetSlip::place(race_id.clone(), horse, race.track(), 10.0))
        .collect();
    for slip in &slips {
        println!(
            "Bet {:.2} on {} at {:.2}",
            slip.amount,
            slip.competitor_name,
            reference_decimal_odds(&slip.odds_inputs)
        );
    }

    let board = SnapshotBoard::new();
    let cancel = CancelToken::new();
    let interval = Duration::from_millis(race.settings().tick_interval_ms);

    let worker = {
        let board = board.clone();
        let cancel = cancel.clone();
        thread::spawn(move || {
            let mut observer = PacedObserver::new(board, interval);
            let result = race.start_observed(&mut observer, &cancel);
            (race, result)
        })
    };

    let mut last_tick = None;
    loop {
        if let Some(snapshot) = board.latest() {
            if last_tick != Some(snapshot.tick) || snapshot.status == RaceStatus::Complete {
                draw(&snapshot);
                last_tick = Some(snapshot.tick);
            }
            if snapshot.status == RaceStatus::Complete {
                break;
            }
        }
        if worker.is_finished() {
            break;
        }
        thread::sleep(interval / 2);
    }

    let (race, result) = worker
        .join()
        .map_err(|_| "race thread panicked")?;
    let result = result?;
    print_result(&result);

    println!("\nBets:");
    for settlement in settle::settle(&result, &slips, reference_decimal_odds) {
        let verdict = if settlement.won { "won" } else { "lost" };
        println!(
            "  {} on {}: {} {:.2}",
            settlement.slip.amount, settlement.slip.competitor_name, verdict, settlement.winnings
        );
    }

    if let Err(e) = persist_outcome(&mut store, &result, &race) {
        eprintln!("Results were not saved: {e}");
        return Ok(());
    }

    let rows = store.stats_rows()?;
    println!("\nCareer:");
    for (_, horse) in race.competitors() {
        if let Some(summary) = CompetitorSummary::from_rows(horse.name(), &rows) {
            println!(
                "  {}: {} races, {} wins ({:.1}%), avg speed {:.2}",
                summary.name, summary.total_races, summary.wins, summary.win_rate, summary.avg_speed
            );
        }
    }
    Ok(())
}

fn main() {
    log_builder(LOG_ENV).init();
    log::info!("Derby Sim starting...");

    if let Err(e) = run() {
        eprintln!("derby-sim: {e}");
        std::process::exit(1);
    }
}
