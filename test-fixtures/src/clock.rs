//! A deterministic stand-in for `Utc::now()`. Every timing-sensitive
//! function in this workspace (`RetentionBlock::new_for_add`,
//! `decayed_retention`, `SnowflakeGenerator::next_id`) already takes "now"
//! as an explicit argument rather than reaching for the wall clock itself,
//! so tests that need to control elapsed time just need something to hand
//! those functions instead of `Utc::now()`.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// A clock that starts at a fixed instant and only moves when told to.
/// `Mutex`-guarded rather than `Cell`-guarded so it can be shared across
/// threads in async tests without extra wrapping.
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    /// Starts at an arbitrary but fixed instant (2024-01-01T00:00:00Z),
    /// chosen only so assertions printed on failure are legible; tests that
    /// care about a specific epoch should use `at` instead.
    pub fn new() -> Self {
        Self::at(DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc))
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, delta: Duration) -> DateTime<Utc> {
        let mut guard = self.now.lock().unwrap();
        *guard += delta;
        *guard
    }

    pub fn advance_hours(&self, hours: i64) -> DateTime<Utc> {
        self.advance(Duration::hours(hours))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_now_forward_by_the_given_delta() {
        let clock = FakeClock::new();
        let before = clock.now();
        let after = clock.advance_hours(5);
        assert_eq!(after, before + Duration::hours(5));
        assert_eq!(clock.now(), after);
    }

    #[test]
    fn is_stable_until_advanced() {
        let clock = FakeClock::new();
        assert_eq!(clock.now(), clock.now());
    }
}
