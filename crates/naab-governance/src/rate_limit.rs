//! Fixed one-second window rate limiting for polyglot, stdlib and file
//! operations.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts operations per window. A limit of zero never throttles.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_second: u32,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(max_per_second: u32) -> Self {
        Self {
            max_per_second,
            window: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    pub fn limit(&self) -> u32 {
        self.max_per_second
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Same as [`try_acquire`](Self::try_acquire) with an explicit clock.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        if self.max_per_second == 0 {
            return true;
        }
        let Ok(mut window) = self.window.lock() else {
            return true;
        };
        if now.saturating_duration_since(window.started) >= WINDOW {
            window.started = now;
            window.count = 0;
        }
        if window.count >= self.max_per_second {
            return false;
        }
        window.count += 1;
        true
    }
}

/// What is being rate limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKind {
    Polyglot,
    Stdlib,
    FileOps,
}

impl RateKind {
    pub fn rule(self) -> &'static str {
        match self {
            RateKind::Polyglot => "limits.rate.max_polyglot_per_second",
            RateKind::Stdlib => "limits.rate.max_stdlib_calls_per_second",
            RateKind::FileOps => "limits.rate.max_file_ops_per_second",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RateKind::Polyglot => "polyglot block executions",
            RateKind::Stdlib => "stdlib calls",
            RateKind::FileOps => "file operations",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_unlimited() {
        let limiter = RateLimiter::new(0);
        for _ in 0..1000 {
            assert!(limiter.try_acquire());
        }
    }

    #[test]
    fn test_window_caps_and_resets() {
        let limiter = RateLimiter::new(2);
        let t0 = Instant::now();
        assert!(limiter.try_acquire_at(t0));
        assert!(limiter.try_acquire_at(t0 + Duration::from_millis(10)));
        assert!(!limiter.try_acquire_at(t0 + Duration::from_millis(20)));

        let later = t0 + Duration::from_millis(1500);
        assert!(limiter.try_acquire_at(later));
        assert!(limiter.try_acquire_at(later));
        assert!(!limiter.try_acquire_at(later));
    }
}
