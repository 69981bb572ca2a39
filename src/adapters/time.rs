//! Host time adapters.
//!
//! - [`SystemClock`] implements [`ClockPort`] from the wall clock.
//! - [`IntervalTicker`] implements [`TickSource`] on top of
//!   `std::time::Instant`: ticks are computed from elapsed time when
//!   polled, so a slow poll loop never loses a tick, and `stop` discards
//!   whatever was not yet taken.

use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::app::ports::{ClockPort, TickSource};

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64)
    }
}

/// Monotonic periodic tick source.
#[derive(Debug, Default)]
pub struct IntervalTicker {
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    period: Duration,
    started: Instant,
    delivered: u64,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time until the next tick is due, `None` when stopped.
    pub fn until_next(&self) -> Option<Duration> {
        let r = self.running.as_ref()?;
        let next_at = r.period.checked_mul(u32::try_from(r.delivered + 1).ok()?)?;
        Some(next_at.saturating_sub(r.started.elapsed()))
    }
}

impl TickSource for IntervalTicker {
    fn start(&mut self, period: Duration) {
        self.running = Some(Running {
            period: period.max(Duration::from_millis(1)),
            started: Instant::now(),
            delivered: 0,
        });
    }

    fn stop(&mut self) {
        self.running = None;
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn take_due(&mut self) -> u32 {
        let Some(r) = self.running.as_mut() else {
            return 0;
        };
        let total = (r.started.elapsed().as_nanos() / r.period.as_nanos()) as u64;
        let due = total.saturating_sub(r.delivered);
        r.delivered = total;
        u32::try_from(due).unwrap_or(u32::MAX)
    }
}
