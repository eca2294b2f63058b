//! Observers, snapshot publication, pacing and cancellation
//!
//! The tick loop is the only writer of race state. Observers receive a
//! read-only snapshot after every tick; `SnapshotBoard` republishes it so
//! other threads can read the latest one without touching the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::state::RaceSnapshot;

/// Receives a snapshot at the end of every tick
pub trait RaceObserver {
    fn on_tick(&mut self, snapshot: &RaceSnapshot);

    /// False when `on_tick` ignores its input, letting the engine skip
    /// building per-tick snapshots
    fn wants_snapshots(&self) -> bool {
        true
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RaceObserver for NoopObserver {
    fn on_tick(&mut self, _snapshot: &RaceSnapshot) {}

    fn wants_snapshots(&self) -> bool {
        false
    }
}

impl<F: FnMut(&RaceSnapshot)> RaceObserver for F {
    fn on_tick(&mut self, snapshot: &RaceSnapshot) {
        self(snapshot)
    }
}

/// Latest snapshot, shared between the engine thread and readers
#[derive(Debug, Clone, Default)]
pub struct SnapshotBoard {
    latest: Arc<RwLock<Option<Arc<RaceSnapshot>>>>,
}

impl SnapshotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot
    pub fn publish(&self, snapshot: RaceSnapshot) {
        let snapshot = Arc::new(snapshot);
        // A poisoned lock only means a reader panicked; the slot is still usable
        let mut slot = self.latest.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(snapshot);
    }

    /// Most recent snapshot, if any tick has been published
    pub fn latest(&self) -> Option<Arc<RaceSnapshot>> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl RaceObserver for SnapshotBoard {
    fn on_tick(&mut self, snapshot: &RaceSnapshot) {
        self.publish(snapshot.clone());
    }
}

/// Wraps an observer and sleeps after each tick, for animation
#[derive(Debug, Clone)]
pub struct PacedObserver<O> {
    inner: O,
    interval: Duration,
}

impl<O: RaceObserver> PacedObserver<O> {
    pub fn new(inner: O, interval: Duration) -> Self {
        Self { inner, interval }
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: RaceObserver> RaceObserver for PacedObserver<O> {
    fn on_tick(&mut self, snapshot: &RaceSnapshot) {
        self.inner.on_tick(snapshot);
        if !self.interval.is_zero() {
            std::thread::sleep(self.interval);
        }
    }

    fn wants_snapshots(&self) -> bool {
        self.inner.wants_snapshots()
    }
}

/// Cooperative stop signal, checked once per tick
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
