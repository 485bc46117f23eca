// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wall-clock ticker feeding a trigger inbox.
//!
//! The ticker never touches a site. It only sends [`TriggerEvent::Tick`]
//! into the site's inbox; the owner applies the ticks on its own thread,
//! where the enable gate is checked.
//!
//! [`TriggerEvent::Tick`]: crate::inbox::TriggerEvent::Tick

use crate::inbox::TriggerSender;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shortest accepted tick period
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running tick task. Dropping it stops the task.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl Ticker {
    /// Spawn a task sending one tick per `interval` on the current tokio
    /// runtime. The first tick comes one interval from now. Ticks missed
    /// while the runtime was stalled are skipped, not replayed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(interval: Duration, sender: TriggerSender) -> Self {
        let interval = interval.max(MIN_PERIOD);
        let handle = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if !sender.tick() {
                    tracing::debug!("Ticker stopping, inbox dropped");
                    break;
                }
            }
        });
        tracing::debug!("Ticker started ({:?} interval)", interval);
        Self { handle, interval }
    }

    /// Stop sending ticks
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Tick period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbox::{self, TriggerEvent};

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_interval() {
        let (sender, mut inbox) = inbox::channel();
        let _ticker = Ticker::spawn(Duration::from_secs(1), sender);

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(inbox.drain(), vec![TriggerEvent::Tick; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let (sender, mut inbox) = inbox::channel();
        let ticker = Ticker::spawn(Duration::from_secs(1), sender);

        time::sleep(Duration::from_millis(1500)).await;
        ticker.stop();
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(inbox.drain().len(), 1);
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_inbox_dropped() {
        let (sender, inbox) = inbox::channel();
        let ticker = Ticker::spawn(Duration::from_secs(1), sender);
        drop(inbox);

        time::sleep(Duration::from_millis(1500)).await;
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let (sender, _inbox) = inbox::channel();
        let ticker = Ticker::spawn(Duration::ZERO, sender);
        assert_eq!(ticker.interval(), MIN_PERIOD);
    }
}
