//! Wall-clock to virtual-time mapping.
//!
//! The simulation runs on virtual milliseconds. [`TickClock`] converts real
//! elapsed time into virtual time at a configurable scale and paces the run
//! loop between polls.

use std::time::{Duration, Instant};

/// Virtual-time clock driven by the wall clock.
#[derive(Debug)]
pub struct TickClock {
    /// Virtual milliseconds per real millisecond; 0 means unthrottled
    time_scale: f64,
    /// Time of the last advance
    last_poll: Instant,
    /// Real time between polls
    poll_interval: Duration,
    /// Largest virtual step per poll, so a stall does not flood the queue
    max_step_ms: u64,
    /// Current virtual time
    now_ms: u64,
    /// Sub-millisecond remainder carried between polls
    carry: f64,
}

impl TickClock {
    /// Create a clock at virtual time zero.
    #[must_use]
    pub fn new(time_scale: f64) -> Self {
        Self {
            time_scale: time_scale.max(0.0),
            last_poll: Instant::now(),
            poll_interval: Duration::from_millis(50),
            max_step_ms: 60_000,
            now_ms: 0,
            carry: 0.0,
        }
    }

    /// Returns true when the run should not wait on the wall clock.
    #[must_use]
    pub fn is_unthrottled(&self) -> bool {
        self.time_scale <= 0.0
    }

    /// Current virtual time.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance by the real time since the last poll; returns the new virtual time.
    pub fn advance(&mut self) -> u64 {
        let now = Instant::now();
        let elapsed = now - self.last_poll;
        self.last_poll = now;
        self.advance_real(elapsed)
    }

    /// Advance by a given amount of real time.
    pub fn advance_real(&mut self, elapsed: Duration) -> u64 {
        let scaled = elapsed.as_secs_f64() * 1000.0 * self.time_scale + self.carry;
        let whole = scaled.floor();
        self.carry = scaled - whole;
        let step = (whole as u64).min(self.max_step_ms);
        self.now_ms = self.now_ms.saturating_add(step);
        self.now_ms
    }

    /// Sleep for the remainder of the poll interval.
    pub fn sleep_remainder(&self) {
        if self.is_unthrottled() {
            return;
        }
        let elapsed = self.last_poll.elapsed();
        if elapsed < self.poll_interval {
            std::thread::sleep(self.poll_interval - elapsed);
        }
    }

    /// Reset the wall-clock reference (call after a pause).
    pub fn reset(&mut self) {
        self.last_poll = Instant::now();
        self.carry = 0.0;
    }
}
