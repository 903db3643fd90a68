//! Poll backoff: decides the delay between two polls.

use std::time::Duration;

use crate::error::SpecError;

/// Capped exponential backoff between polls.
///
/// delay(n) = min(base_delay * multiplier^(n - 1), max_delay)
///
/// With `base_delay > 0`, `multiplier >= 1.0` and `max_delay >= base_delay`
/// the sequence never decreases; [`PollBackoff::validate`] enforces all of it.
/// An unvalidated policy never panics: out-of-range delays clamp to
/// `[0, max_delay]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollBackoff {
    /// Delay after the first poll.
    pub base_delay: Duration,

    /// Growth factor per poll.
    pub multiplier: f64,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl PollBackoff {
    pub fn new(base_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay,
        }
    }

    /// Constant interval, mostly useful in tests.
    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, 1.0, interval)
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.base_delay.is_zero() {
            return Err(SpecError::InvalidBackoff("base_delay must be positive".to_string()));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(SpecError::InvalidBackoff(format!(
                "multiplier must be a finite value >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.max_delay < self.base_delay {
            return Err(SpecError::InvalidBackoff(format!(
                "max_delay {:?} is shorter than base_delay {:?}",
                self.max_delay, self.base_delay
            )));
        }
        Ok(())
    }

    /// Delay to sleep after poll number `polls` (1-indexed).
    ///
    /// `polls = 0` is treated like the first poll.
    pub fn next_delay(&self, polls: u32) -> Duration {
        let exponent = i32::try_from(polls.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max_secs = self.max_delay.as_secs_f64();
        if !delay_secs.is_finite() || delay_secs >= max_secs {
            return self.max_delay;
        }
        // negative multipliers alternate sign; never sleep less than zero
        Duration::from_secs_f64(delay_secs.max(0.0))
    }
}

impl Default for PollBackoff {
    /// 100ms, doubling, capped at 10s.
    fn default() -> Self {
        Self::new(Duration::from_millis(100), 2.0, Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_has_reasonable_values() {
        let backoff = PollBackoff::default();
        assert_eq!(backoff.base_delay, Duration::from_millis(100));
        assert_eq!(backoff.multiplier, 2.0);
        assert_eq!(backoff.max_delay, Duration::from_secs(10));
        assert!(backoff.validate().is_ok());
    }

    #[rstest]
    #[case(0, Duration::from_millis(100))]
    #[case(1, Duration::from_millis(100))]
    #[case(2, Duration::from_millis(200))]
    #[case(4, Duration::from_millis(800))]
    #[case(8, Duration::from_secs(10))]
    #[case(u32::MAX, Duration::from_secs(10))]
    fn exponential_backoff_is_capped(#[case] polls: u32, #[case] expected: Duration) {
        assert_eq!(PollBackoff::default().next_delay(polls), expected);
    }

    #[test]
    fn delays_never_decrease() {
        let backoff = PollBackoff::new(Duration::from_millis(30), 1.7, Duration::from_secs(3));
        let delays: Vec<Duration> = (1..64).map(|n| backoff.next_delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn fixed_interval_stays_constant() {
        let backoff = PollBackoff::fixed(Duration::from_secs(5));
        assert_eq!(backoff.next_delay(1), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(40), Duration::from_secs(5));
    }

    #[rstest]
    #[case::max_below_base(PollBackoff::new(Duration::from_secs(2), 2.0, Duration::from_secs(1)))]
    #[case::zero_base(PollBackoff::new(Duration::ZERO, 2.0, Duration::from_secs(1)))]
    #[case::zero_fixed(PollBackoff::fixed(Duration::ZERO))]
    #[case::shrinking(PollBackoff::new(Duration::from_secs(1), 0.5, Duration::from_secs(1)))]
    #[case::nan(PollBackoff::new(Duration::from_secs(1), f64::NAN, Duration::from_secs(1)))]
    fn invalid_policies_are_rejected(#[case] backoff: PollBackoff) {
        assert!(matches!(backoff.validate(), Err(SpecError::InvalidBackoff(_))));
    }

    #[rstest]
    #[case(1, Duration::from_secs(1))]
    #[case(2, Duration::ZERO)]
    #[case(3, Duration::from_secs(4))]
    fn negative_multiplier_does_not_panic(#[case] polls: u32, #[case] expected: Duration) {
        let backoff = PollBackoff {
            base_delay: Duration::from_secs(1),
            multiplier: -2.0,
            max_delay: Duration::from_secs(10),
        };
        assert!(backoff.validate().is_err());
        assert_eq!(backoff.next_delay(polls), expected);
    }
}
