//! Background Expiry Sweeper
//!
//! The sweeper is a Tokio task that wakes up every sweep interval, evicts the
//! entries at the front of the expiry heap whose time has passed, and exits
//! once the heap is empty.
//!
//! ## Lifecycle
//!
//! ```text
//!   insert() into empty heap ──> arm: spawn task, store SweepHandle
//!                                        │
//!                                        ▼
//!                              ┌───────────────────┐
//!                              │  sleep(interval)  │<──────┐
//!                              └─────────┬─────────┘       │
//!                                        ▼                 │
//!                              ┌───────────────────┐  heap │
//!                              │   sweep expired   │───────┘
//!                              └─────────┬─────────┘ non-empty
//!                                        │ heap empty
//!                                        ▼
//!                              disarm: drop SweepHandle, task ends
//! ```
//!
//! Only one sweeper is armed per set at a time. Every armed task carries an
//! epoch; a task that wakes up and finds a different epoch in the set (or no
//! handle at all) returns without touching anything.
//!
//! The task only holds a [`Weak`] reference to the set, so it never keeps the
//! set alive, and it never keeps the process alive: Tokio drops it along with
//! the runtime.

use crate::blacklist::set::Shared;
use std::hash::Hash;
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// A handle to an armed sweep task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub(crate) struct SweepHandle {
    /// Identifies which arming this task belongs to
    epoch: u64,
    /// The spawned task
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Spawns a sweep task on `runtime` for the set behind `shared`.
    pub(crate) fn spawn<K, V>(
        runtime: &Handle,
        shared: Weak<Shared<K, V>>,
        interval: Duration,
        epoch: u64,
    ) -> Self
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Send + 'static,
    {
        let task = runtime.spawn(sweeper_loop(shared, interval, epoch));

        debug!(
            epoch = epoch,
            interval_ms = interval.as_millis() as u64,
            "Blacklist sweeper armed"
        );

        Self { epoch, task }
    }

    /// Returns the epoch this handle was armed with.
    #[inline]
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns `false` once the task has ended, including when its runtime
    /// shut down underneath it.
    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(epoch = self.epoch, "Blacklist sweeper disarmed");
    }
}

/// The main sweeper loop.
async fn sweeper_loop<K, V>(shared: Weak<Shared<K, V>>, period: Duration, epoch: u64)
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    // The first sweep happens one full period after arming
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            trace!(epoch = epoch, "Blacklist dropped, sweeper exiting");
            return;
        };

        if !shared.sweep_from_task(epoch) {
            return;
        }
    }
}
