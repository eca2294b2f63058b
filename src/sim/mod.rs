//! Deterministic race simulation
//!
//! All race logic lives here. This module must stay deterministic:
//! - Injected, seeded RNG only
//! - Stable iteration order (by lane)
//! - No pacing, rendering or storage dependencies

pub mod competitor;
pub mod modifier;
pub mod observer;
pub mod race;
pub mod state;
pub mod tick;
pub mod track;

pub use competitor::{Competitor, Item, ItemKind, ModifierProfile};
pub use modifier::ChanceInputs;
pub use observer::{CancelToken, NoopObserver, PacedObserver, RaceObserver, SnapshotBoard};
pub use race::Race;
pub use state::{
    FinishEntry, LaneSnapshot, LaneStatus, RaceSnapshot, RaceState, RaceStatus, Termination,
};
pub use tick::{TickReport, chance_inputs, is_frozen, tick};
pub use track::{Track, TrackCondition, TrackRecord, TrackShape};
