//! # Fibonacci Backoff
//!
//! Retry delays for Packages whose reconcile pass failed. The sequence is kept
//! in minutes and handed out in seconds: 1m, 1m, 2m, 3m, 5m, 8m, then capped.
//!
//! ```rust
//! use package_manager_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 120);
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting from `min_minutes` and
/// never exceeding `max_minutes`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes.min(max_minutes),
            max_minutes,
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let seconds = self.current_minutes * 60;
        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);
        seconds
    }

    /// Same as [`Self::next_backoff_seconds`] as a `Duration`
    ///
    /// ```
    /// use package_manager_controller::controller::backoff::FibonacciBackoff;
    /// use std::time::Duration;
    ///
    /// let mut backoff = FibonacciBackoff::new(2, 60);
    /// assert_eq!(backoff.next_backoff(), Duration::from_secs(120));
    /// ```
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes.min(self.max_minutes);
    }
}
