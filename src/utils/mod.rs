//! Project-specific utilities live here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond timestamps that never repeat or go backwards within one clock.
///
/// Two calls in the same millisecond get consecutive values, so identifiers
/// built from them cannot collide.
#[derive(Debug, Default)]
pub struct TokenClock {
    last: AtomicU64,
}

impl TokenClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next token: the current time, or one past the previous token if the
    /// clock has not moved on.
    pub fn next(&self) -> u64 {
        let now = now_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_strictly_increase() {
        let clock = TokenClock::new();
        let mut previous = clock.next();
        for _ in 0..1_000 {
            let token = clock.next();
            assert!(token > previous);
            previous = token;
        }
    }

    #[test]
    fn tokens_track_wall_clock() {
        let before = now_millis();
        let token = TokenClock::new().next();
        assert!(token >= before);
    }
}
