// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Millisecond timestamp, as stored in data files
pub type Timestamp = i64;

/// Gets the current unix time in milliseconds
#[must_use]
pub fn current_time_millis() -> Timestamp {
    let now = std::time::SystemTime::now();

    #[expect(clippy::expect_used, reason = "trivial")]
    let elapsed = now
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .expect("time went backwards");

    Timestamp::try_from(elapsed.as_millis()).unwrap_or(Timestamp::MAX)
}

/// Returns `true` if data ending at `end_time` is still readable under `ttl`.
///
/// A TTL of [`crate::NO_TTL`] never expires anything.
#[must_use]
pub fn is_alive(end_time: Timestamp, ttl: i64, now: Timestamp) -> bool {
    ttl == crate::NO_TTL || end_time >= now.saturating_sub(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NO_TTL;
    use test_log::test;

    #[test]
    fn alive_without_ttl() {
        assert!(is_alive(i64::MIN, NO_TTL, 1_000));
    }

    #[test]
    fn alive_boundary() {
        assert!(is_alive(900, 100, 1_000));
        assert!(!is_alive(899, 100, 1_000));
    }

    #[test]
    fn alive_no_overflow_with_huge_ttl() {
        // now - ttl saturates instead of wrapping to a large positive value
        assert!(is_alive(i64::MIN, i64::MAX - 1, -10));
    }

    #[test]
    fn current_time_is_positive() {
        assert!(current_time_millis() > 0);
    }
}
