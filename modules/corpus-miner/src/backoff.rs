use std::time::Duration;

use rand::Rng;

/// Upper bound on the random spread added by `jitter`.
const MAX_JITTER_MS: u64 = 250;
const MAX_JITTER: Duration = Duration::from_millis(MAX_JITTER_MS);

/// Base delay per failed page before jitter; multiplied by the page number.
const FAILURE_BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Page number at which the failure backoff stops growing.
const FAILURE_BACKOFF_MAX_STEPS: u32 = 5;

/// `base` plus a random spread of up to 20% of `base`, never more than 250ms.
pub fn jitter(base: Duration) -> Duration {
    let spread = max_spread(base);
    if spread.is_zero() {
        return base;
    }
    let spread_ms = u64::try_from(spread.as_millis()).unwrap_or(MAX_JITTER_MS);
    let extra = rand::rng().random_range(0..=spread_ms);
    base.saturating_add(Duration::from_millis(extra))
}

/// Largest spread `jitter` can add to `base`.
pub fn max_spread(base: Duration) -> Duration {
    (base / 5).min(MAX_JITTER)
}

/// Un-jittered delay after a failed fetch of `page`.
pub fn failure_backoff(page: u32) -> Duration {
    FAILURE_BACKOFF_STEP * page.clamp(1, FAILURE_BACKOFF_MAX_STEPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_spread() {
        let base = Duration::from_millis(600);
        for _ in 0..200 {
            let d = jitter(base);
            assert!(d >= base);
            assert!(d <= base + Duration::from_millis(120));
        }
    }

    #[test]
    fn spread_caps_at_250ms() {
        assert_eq!(max_spread(Duration::from_secs(10)), Duration::from_millis(250));
        assert_eq!(max_spread(Duration::from_millis(500)), Duration::from_millis(100));
    }

    #[test]
    fn very_long_base_still_caps_spread() {
        let base = Duration::from_secs(1 << 40);
        for _ in 0..50 {
            let d = jitter(base);
            assert!(d >= base);
            assert!(d <= base + MAX_JITTER);
        }
    }

    #[test]
    fn zero_base_has_no_jitter() {
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn failure_backoff_grows_then_plateaus() {
        assert_eq!(failure_backoff(1), Duration::from_millis(500));
        assert_eq!(failure_backoff(3), Duration::from_millis(1500));
        assert_eq!(failure_backoff(5), Duration::from_millis(2500));
        assert_eq!(failure_backoff(40), Duration::from_millis(2500));
    }
}
