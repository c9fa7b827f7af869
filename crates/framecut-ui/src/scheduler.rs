//! Fixed-rate cooperative tick loop driving redraws and playback.
//!
//! Ticks that fall behind are skipped rather than bunched, so a slow frame
//! never causes a burst of catch-up renders.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Timing for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    /// Zero-based tick counter
    pub index: u64,
    /// Time since the loop started
    pub elapsed: Duration,
    /// Time since the previous tick; zero on the first
    pub delta: Duration,
}

impl TickInfo {
    pub fn delta_secs(&self) -> f64 {
        self.delta.as_secs_f64()
    }
}

/// Spawns tick loops on the current tokio runtime.
pub struct TickScheduler;

impl TickScheduler {
    /// Call `on_tick` at `rate_hz` until it breaks or the handle stops it.
    ///
    /// Dropping the [`TickHandle`] also stops the loop.
    pub fn spawn<F>(rate_hz: f64, mut on_tick: F) -> TickHandle
    where
        F: FnMut(TickInfo) -> ControlFlow<()> + Send + 'static,
    {
        let period = Duration::from_secs_f64(1.0 / rate_hz.clamp(1.0, 1000.0));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let started = Instant::now();
            let mut last: Option<Instant> = None;
            let mut index = 0u64;

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    now = interval.tick() => {
                        let info = TickInfo {
                            index,
                            elapsed: now.duration_since(started),
                            delta: last.map_or(Duration::ZERO, |l| now.duration_since(l)),
                        };
                        last = Some(now);
                        index += 1;
                        if on_tick(info).is_break() {
                            break;
                        }
                    }
                }
            }
            debug!(ticks = index, "tick loop stopped");
            index
        });

        debug!(period_ms = period.as_secs_f64() * 1000.0, "tick loop started");
        TickHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Control handle for a running tick loop.
pub struct TickHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl TickHandle {
    /// Ask the loop to stop after the current tick.
    pub fn stop(&self) {
        // Fails only when the loop already exited
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit; returns the number of ticks delivered.
    pub async fn join(self) -> u64 {
        let TickHandle { stop, task } = self;
        let ticks = match task.await {
            Ok(ticks) => ticks,
            Err(err) => {
                warn!(error = %err, "tick loop panicked");
                0
            }
        };
        drop(stop);
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_rate_until_break() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = TickScheduler::spawn(10.0, move |tick| {
            sink.lock().push(tick);
            if tick.index == 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(handle.join().await, 5);

        let seen = seen.lock();
        assert_eq!(seen[0].delta, Duration::ZERO);
        assert_eq!(seen[0].elapsed, Duration::ZERO);
        for tick in &seen[1..] {
            assert_eq!(tick.delta, Duration::from_millis(100));
        }
        assert_eq!(seen[4].elapsed, Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_handle() {
        let count = Arc::new(Mutex::new(0u64));
        let sink = Arc::clone(&count);
        let handle = TickScheduler::spawn(60.0, move |_| {
            *sink.lock() += 1;
            ControlFlow::Continue(())
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();
        let ticks = handle.join().await;
        assert!(ticks >= 1);
        assert_eq!(ticks, *count.lock());
    }
}
