//! Process-wide tick loop: physics step followed by delta broadcast

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::snapshot::{FanOut, SyncOutcome, Synchronizer};
use super::world::World;
use crate::util::time::TICK_INTERVAL;

/// Drives the simulation at a fixed rate. Started at most once.
pub struct TickLoop {
    started: AtomicBool,
    ticks: AtomicU64,
    broadcasts: AtomicU64,
}

impl TickLoop {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
        }
    }

    /// Spawn the loop on the current runtime. Returns false if it was
    /// already running; the loop lives until the process exits.
    pub fn start<F>(self: &Arc<Self>, world: Arc<World>, sync: Arc<Synchronizer>, out: Arc<F>) -> bool
    where
        F: FanOut + Send + Sync + 'static,
    {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let this = self.clone();
        tokio::spawn(async move {
            info!(interval_ms = TICK_INTERVAL.as_millis() as u64, "Tick loop started");

            let mut ticker = interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                this.run_once(&world, &sync, &*out);
            }
        });

        true
    }

    /// One cycle: tick, then synchronize
    pub fn run_once(&self, world: &World, sync: &Synchronizer, out: &impl FanOut) -> SyncOutcome {
        world.tick();
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let outcome = sync.sync(world, out);
        if let SyncOutcome::Broadcast(_) = outcome {
            self.broadcasts.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn broadcasts(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new()
    }
}
