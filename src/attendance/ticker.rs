use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::attendance::duration::{duration_value, wall_clock};
use crate::clock::Clock;
use crate::ui::Screen;

const TICK: Duration = Duration::from_secs(1);

/// Repeating once-a-second duration redraw. At most one task is alive:
/// `start` aborts the previous one before spawning.
#[derive(Debug, Default)]
pub struct DurationTicker {
    handle: Option<JoinHandle<()>>,
}

impl DurationTicker {
    pub fn new() -> Self {
        Self::default()
    }

    // The caller has already drawn the first value, so the first tick is one second out
    pub fn start(&mut self, since: DateTime<Utc>, clock: Arc<dyn Clock>, screen: Arc<dyn Screen>) {
        self.stop();

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let text = duration_value(Some(since), clock.now());
                screen.duration_line(&format!("Duration: {}", text));
            }
        });
        self.handle = Some(handle);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DurationTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Wall clock of an open page. Keeps redrawing whatever else the page is
/// waiting on, and stops when dropped.
#[derive(Debug)]
pub struct WallClockTicker {
    handle: JoinHandle<()>,
}

impl WallClockTicker {
    pub fn start(clock: Arc<dyn Clock>, screen: Arc<dyn Screen>, offset: FixedOffset) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                screen.wall_clock(&wall_clock(clock.now(), &offset));
            }
        });
        Self { handle }
    }
}

impl Drop for WallClockTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
