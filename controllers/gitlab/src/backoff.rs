//! # Fibonacci Backoff
//!
//! Progressive requeue delays for failed reconciliations. The sequence grows
//! more slowly than exponential backoff: with a 5s minimum and 300s cap it is
//! 5s, 5s, 10s, 15s, 25s, 40s, 65s, 105s, 170s, 275s, 300s (max).
//!
//! [`BackoffTracker`] keeps one sequence per managed resource key so a failing
//! object does not slow down healthy ones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, capped at `max_secs`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff value in seconds (for reset)
    min_secs: u64,
    /// Previous backoff value in seconds
    prev_secs: u64,
    /// Current backoff value in seconds
    current_secs: u64,
    /// Maximum backoff value in seconds
    max_secs: u64,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with the given bounds in seconds
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs,
        }
    }

    /// Get the next backoff duration in seconds and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_secs;
        let next = self.prev_secs + self.current_secs;
        self.prev_secs = self.current_secs;
        self.current_secs = std::cmp::min(next, self.max_secs);
        result
    }

    /// Get the next backoff duration as a `Duration` and advance the sequence
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }

    /// Upper bound of the sequence
    pub fn max(&self) -> Duration {
        Duration::from_secs(self.max_secs)
    }

    /// Backoff for the nth consecutive error (0-indexed) without keeping state
    ///
    /// The sequence starts at `min_secs` for error counts 0 and 1, then follows
    /// min, min, min*2, min*3, min*5, min*8, ... capped at `max_secs`.
    #[must_use]
    pub fn calculate_for_error_count(error_count: u32, min_secs: u64, max_secs: u64) -> Duration {
        if error_count <= 1 {
            return Duration::from_secs(std::cmp::min(min_secs, max_secs));
        }

        let mut prev = min_secs;
        let mut current = min_secs;
        for _ in 2..=error_count {
            let next = prev + current;
            prev = current;
            current = std::cmp::min(next, max_secs);
            if current >= max_secs {
                break;
            }
        }
        Duration::from_secs(current)
    }
}

/// Backoff state for one resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Per-resource error backoff, keyed by `namespace/name`
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct BackoffTracker {
    min_secs: u64,
    max_secs: u64,
    states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl BackoffTracker {
    /// Delays start at `min` and never exceed `max`, both rounded to at least one second
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min_secs: min.as_secs().max(1),
            max_secs: max.as_secs().max(1),
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a failure for `key` and return how long to wait before retrying
    pub fn on_error(&self, key: &str) -> Duration {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let state = states.entry(key.to_string()).or_insert_with(|| BackoffState {
            backoff: FibonacciBackoff::new(self.min_secs, self.max_secs),
            error_count: 0,
        });
        state.error_count += 1;
        state.backoff.next_backoff()
    }

    /// Forget the failure history of `key`
    pub fn on_success(&self, key: &str) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = states.get_mut(key) {
            state.error_count = 0;
            state.backoff.reset();
        }
    }

    /// Consecutive failures recorded for `key`
    pub fn error_count(&self, key: &str) -> u32 {
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .map_or(0, |s| s.error_count)
    }

    /// Longest delay the tracker hands out
    pub fn max(&self) -> Duration {
        Duration::from_secs(self.max_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(5, 300);

        assert_eq!(backoff.next_backoff_seconds(), 5);
        assert_eq!(backoff.next_backoff_seconds(), 5);
        assert_eq!(backoff.next_backoff_seconds(), 10);
        assert_eq!(backoff.next_backoff_seconds(), 15);
        assert_eq!(backoff.next_backoff_seconds(), 25);
        assert_eq!(backoff.next_backoff_seconds(), 40);
        assert_eq!(backoff.next_backoff_seconds(), 65);
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(60, 600);

        for expected in [60, 60, 120, 180, 300, 480, 600, 600, 600] {
            assert_eq!(backoff.next_backoff_seconds(), expected);
        }
        assert_eq!(backoff.max(), Duration::from_secs(600));
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(5, 300);

        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.reset();

        assert_eq!(backoff.next_backoff_seconds(), 5);
        assert_eq!(backoff.next_backoff_seconds(), 5);
        assert_eq!(backoff.next_backoff_seconds(), 10);
    }

    #[test]
    fn test_calculate_for_error_count() {
        assert_eq!(FibonacciBackoff::calculate_for_error_count(0, 5, 300), Duration::from_secs(5));
        assert_eq!(FibonacciBackoff::calculate_for_error_count(1, 5, 300), Duration::from_secs(5));
        assert_eq!(FibonacciBackoff::calculate_for_error_count(2, 5, 300), Duration::from_secs(10));
        assert_eq!(FibonacciBackoff::calculate_for_error_count(4, 5, 300), Duration::from_secs(25));
        assert_eq!(FibonacciBackoff::calculate_for_error_count(50, 5, 300), Duration::from_secs(300));
    }

    #[test]
    fn test_tracker_is_per_key() {
        let tracker = BackoffTracker::new(Duration::from_secs(5), Duration::from_secs(300));

        assert_eq!(tracker.on_error("ns/a"), Duration::from_secs(5));
        assert_eq!(tracker.on_error("ns/a"), Duration::from_secs(5));
        assert_eq!(tracker.on_error("ns/a"), Duration::from_secs(10));
        assert_eq!(tracker.on_error("ns/b"), Duration::from_secs(5));
        assert_eq!(tracker.error_count("ns/a"), 3);

        tracker.on_success("ns/a");
        assert_eq!(tracker.error_count("ns/a"), 0);
        assert_eq!(tracker.on_error("ns/a"), Duration::from_secs(5));
    }
}
