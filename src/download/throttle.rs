//! Progress-notification throttling policy.
//!
//! A transfer can emit thousands of byte-count events per second while
//! observer updates are comparatively expensive, so intermediate samples are
//! suppressed below a minimum interval. Terminal samples bypass this policy
//! entirely; the engine forwards them unconditionally.

use std::time::{Duration, Instant};

/// Minimum interval between forwarded progress samples (200 ms).
pub const PROGRESS_NOTIFY_INTERVAL: Duration = Duration::from_millis(200);

/// Decides whether a progress sample taken at `now` should be forwarded.
///
/// The first sample (no prior notification) is always forwarded; later
/// samples only once `interval` has elapsed since the last forwarded one.
#[must_use]
pub fn should_forward(last_notified_at: Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last_notified_at {
        None => true,
        Some(last) => now.saturating_duration_since(last) > interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_always_forwarded() {
        assert!(should_forward(None, Instant::now(), PROGRESS_NOTIFY_INTERVAL));
    }

    #[test]
    fn test_sample_within_interval_suppressed() {
        let last = Instant::now();
        let now = last + Duration::from_millis(50);
        assert!(!should_forward(Some(last), now, PROGRESS_NOTIFY_INTERVAL));
    }

    #[test]
    fn test_sample_at_exact_interval_suppressed() {
        let last = Instant::now();
        let now = last + PROGRESS_NOTIFY_INTERVAL;
        assert!(!should_forward(Some(last), now, PROGRESS_NOTIFY_INTERVAL));
    }

    #[test]
    fn test_sample_after_interval_forwarded() {
        let last = Instant::now();
        let now = last + PROGRESS_NOTIFY_INTERVAL + Duration::from_millis(1);
        assert!(should_forward(Some(last), now, PROGRESS_NOTIFY_INTERVAL));
    }

    #[test]
    fn test_clock_skew_does_not_panic() {
        // now earlier than last: saturating arithmetic suppresses the sample
        let now = Instant::now();
        let last = now + Duration::from_millis(500);
        assert!(!should_forward(Some(last), now, PROGRESS_NOTIFY_INTERVAL));
    }
}
