//! Periodic update scheduler.
//!
//! [`MarketUpdater`] drives a [`MarketFeed`] through two explicit steps:
//! [`run_once`](MarketUpdater::run_once) publishes immediately and
//! [`arm_periodic`](MarketUpdater::arm_periodic) spawns the repeating timer.
//! [`start`](MarketUpdater::start) composes them. A `watch` channel carries
//! the shutdown signal to the timer task and to the cycle it may be running.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use marketfeed_core::error::{MarketError, Result};
use marketfeed_core::types::MarketUpdate;

use crate::feed::MarketFeed;

/// Scheduler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdaterState {
    /// No timer is armed
    Stopped,
    /// The periodic timer is armed
    Running,
}

struct RunningTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic driver for a [`MarketFeed`].
pub struct MarketUpdater {
    feed: Arc<MarketFeed>,
    interval: Duration,
    task: Mutex<Option<RunningTask>>,
}

impl MarketUpdater {
    /// Creates a stopped updater using the feed's configured interval.
    pub fn new(feed: Arc<MarketFeed>) -> Result<Self> {
        feed.config().validate()?;
        let interval = feed.config().update_interval;

        Ok(Self {
            feed,
            interval,
            task: Mutex::new(None),
        })
    }

    /// Returns the driven feed.
    pub fn feed(&self) -> &Arc<MarketFeed> {
        &self.feed
    }

    /// Returns the update period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current state.
    pub fn state(&self) -> UpdaterState {
        match self.task.lock().as_ref() {
            Some(task) if !task.handle.is_finished() => UpdaterState::Running,
            _ => UpdaterState::Stopped,
        }
    }

    /// Returns true if the periodic timer is armed.
    pub fn is_running(&self) -> bool {
        self.state() == UpdaterState::Running
    }

    /// Runs one update cycle now.
    ///
    /// Returns `None` if a cycle was already in flight.
    pub async fn run_once(&self) -> Option<MarketUpdate> {
        self.feed.update().await
    }

    /// Spawns the repeating timer. The first tick fires one full interval
    /// from now. A cycle that overruns the interval pushes the next tick a
    /// full interval past its end.
    ///
    /// Returns `Ok(false)`, and arms nothing, if a timer is already armed.
    /// Fails with [`MarketError::SchedulerError`] outside a tokio runtime.
    pub fn arm_periodic(&self) -> Result<bool> {
        let runtime = Handle::try_current()
            .map_err(|e| MarketError::SchedulerError(format!("cannot arm periodic updates: {e}")))?;

        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            warn!("Periodic updates already armed");
            return Ok(false);
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let feed = self.feed.clone();
        let period = self.interval;
        let first_tick = Instant::now() + period;

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        debug!("Scheduled update cycle");
                        let started = Instant::now();
                        tokio::select! {
                            _ = shutdown_rx.changed() => {
                                debug!("Cancelled in-flight update cycle");
                                break;
                            }
                            _ = feed.update() => {}
                        }
                        if started.elapsed() >= period {
                            debug!("Update cycle overran its interval");
                            ticker.reset();
                        }
                    }
                }
            }

            debug!("Periodic update task exited");
        });

        *slot = Some(RunningTask { shutdown, handle });
        info!(interval_secs = period.as_secs(), "Periodic updates armed");
        Ok(true)
    }

    /// Publishes an update immediately, then arms the periodic timer.
    ///
    /// Returns `Ok(false)` without doing anything if already running.
    #[instrument(skip(self), fields(interval_secs = self.interval.as_secs()))]
    pub async fn start(&self) -> Result<bool> {
        if self.is_running() {
            warn!("Updater already running, ignoring start");
            return Ok(false);
        }

        self.run_once().await;
        self.arm_periodic()
    }

    /// Cancels the periodic timer and any cycle it is running, and waits for
    /// the task to exit.
    ///
    /// Returns false if the updater was not running.
    pub async fn stop(&self) -> bool {
        let Some(task) = self.task.lock().take() else {
            return false;
        };

        // The receiver is gone if the task already exited
        let _ = task.shutdown.send(true);

        if let Err(e) = task.handle.await {
            error!(error = %e, "Periodic update task failed");
        }

        info!("Periodic updates stopped");
        true
    }
}

impl Drop for MarketUpdater {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

impl std::fmt::Debug for MarketUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketUpdater")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}
