//! Timing discipline for an editing session: a short debounce for local
//! snapshot writes plus a fixed interval for remote sync ticks.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Whether the ticker should keep running after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickFlow {
    Continue,
    Stop,
}

/// Owns the two timers of a session and their shared shutdown signal.
///
/// The scheduler knows nothing about drafts; it only runs callbacks. This
/// keeps the timing behavior testable in isolation with a paused clock.
pub(crate) struct Scheduler {
    debounce: Duration,
    tick_interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl Scheduler {
    pub(crate) fn new(debounce: Duration, tick_interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            debounce,
            tick_interval,
            shutdown,
        }
    }

    /// Spawn the periodic tick driver.
    ///
    /// With `immediate`, one tick runs before the first interval elapses
    /// (used when a session starts with non-empty fields, e.g. after
    /// recovery). The driver exits when the callback asks to stop or the
    /// scheduler shuts down.
    pub(crate) fn spawn_ticker<F, Fut>(&self, immediate: bool, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickFlow> + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        let period = self.tick_interval;

        tokio::spawn(async move {
            if immediate && tick().await == TickFlow::Stop {
                return;
            }

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; consume it so
            // the first real tick lands one full period from now.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.changed() => return,
                    _ = interval.tick() => {}
                }
                if *shutdown.borrow() {
                    return;
                }
                if tick().await == TickFlow::Stop {
                    return;
                }
            }
        });
    }

    /// Run `action` after the debounce delay unless the scheduler shuts down
    /// first.
    ///
    /// Coalescing of rapid edits is the caller's concern: each call spawns
    /// its own delay and the action is expected to check a version counter,
    /// so only the latest scheduled write actually runs.
    pub(crate) fn spawn_debounce<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.debounce;
        let shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !*shutdown.borrow() {
                action();
            }
        });
    }

    /// Cancel both timers. No tick callback starts after this returns.
    pub(crate) fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}
