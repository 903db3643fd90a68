//! Wait specification: what one wait invocation is waiting for.
//!
//! A `WaitSpec` is built at the start of a create/update/delete operation and
//! dropped when it returns. It is immutable once built; all counters live in
//! the waiter invocation, never here.

use std::fmt;
use std::time::Duration;

use super::status::StatusSet;
use crate::app::PollBackoff;
use crate::error::SpecError;

/// Default number of consecutive not-found polls tolerated.
pub const DEFAULT_NOT_FOUND_TOLERANCE: u32 = 20;

/// Default number of consecutive target observations required.
pub const DEFAULT_MIN_TARGET_STREAK: u32 = 1;

/// Immutable parameters of one wait.
///
/// - `pending`: statuses that mean "still in progress". Empty means any
///   non-target status counts as progress.
/// - `target`: statuses that mean "done". Empty means disappearance is success.
/// - `not_found_tolerance`: consecutive not-found polls allowed before absence
///   becomes terminal (success when `target` is empty, failure otherwise).
/// - `min_target_streak`: consecutive target observations required.
#[derive(Debug, Clone)]
pub struct WaitSpec<S> {
    pending: StatusSet<S>,
    target: StatusSet<S>,
    timeout: Duration,
    not_found_tolerance: u32,
    min_target_streak: u32,
    backoff: PollBackoff,
}

impl<S: PartialEq + fmt::Debug> WaitSpec<S> {
    pub fn builder(timeout: Duration) -> WaitSpecBuilder<S> {
        WaitSpecBuilder::new(timeout)
    }

    pub fn pending(&self) -> &StatusSet<S> {
        &self.pending
    }

    pub fn target(&self) -> &StatusSet<S> {
        &self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn not_found_tolerance(&self) -> u32 {
        self.not_found_tolerance
    }

    pub fn min_target_streak(&self) -> u32 {
        self.min_target_streak
    }

    pub fn backoff(&self) -> &PollBackoff {
        &self.backoff
    }

    /// True when this spec waits for the object to go away.
    pub fn expects_disappearance(&self) -> bool {
        self.target.is_empty()
    }
}

/// Fail-fast builder for [`WaitSpec`].
///
/// ```ignore
/// let spec = WaitSpec::builder(Duration::from_secs(1800))
///     .pending(["Pending"])
///     .target(["Updated"])
///     .min_target_streak(2)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct WaitSpecBuilder<S> {
    pending: StatusSet<S>,
    target: StatusSet<S>,
    timeout: Duration,
    not_found_tolerance: u32,
    min_target_streak: u32,
    backoff: PollBackoff,
}

impl<S: PartialEq + fmt::Debug> WaitSpecBuilder<S> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: StatusSet::empty(),
            target: StatusSet::empty(),
            timeout,
            not_found_tolerance: DEFAULT_NOT_FOUND_TOLERANCE,
            min_target_streak: DEFAULT_MIN_TARGET_STREAK,
            backoff: PollBackoff::default(),
        }
    }

    pub fn pending(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.pending = statuses.into_iter().collect();
        self
    }

    pub fn target(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.target = statuses.into_iter().collect();
        self
    }

    pub fn not_found_tolerance(mut self, checks: u32) -> Self {
        self.not_found_tolerance = checks;
        self
    }

    pub fn min_target_streak(mut self, streak: u32) -> Self {
        self.min_target_streak = streak;
        self
    }

    pub fn backoff(mut self, backoff: PollBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Validate and freeze the specification.
    ///
    /// # Errors
    /// - `OverlappingStatus` if a status is both pending and target
    /// - `ZeroTimeout` / `ZeroTargetStreak`
    /// - `InvalidBackoff` if the backoff could shrink between polls
    pub fn build(self) -> Result<WaitSpec<S>, SpecError> {
        if let Some(shared) = self.pending.first_shared(&self.target) {
            return Err(SpecError::OverlappingStatus(format!("{shared:?}")));
        }
        if self.timeout.is_zero() {
            return Err(SpecError::ZeroTimeout);
        }
        if self.min_target_streak == 0 {
            return Err(SpecError::ZeroTargetStreak);
        }
        self.backoff.validate()?;

        Ok(WaitSpec {
            pending: self.pending,
            target: self.target,
            timeout: self.timeout,
            not_found_tolerance: self.not_found_tolerance,
            min_target_streak: self.min_target_streak,
            backoff: self.backoff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_HOUR: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn defaults_are_non_zero() {
        let spec = WaitSpec::<&str>::builder(HALF_HOUR).target(["Normal"]).build().unwrap();
        assert_eq!(spec.not_found_tolerance(), DEFAULT_NOT_FOUND_TOLERANCE);
        assert_eq!(spec.min_target_streak(), 1);
        assert!(spec.pending().is_empty());
        assert!(!spec.expects_disappearance());
    }

    #[test]
    fn overlapping_sets_are_rejected() {
        let err = WaitSpec::builder(HALF_HOUR)
            .pending(["Pending", "Normal"])
            .target(["Normal"])
            .build()
            .unwrap_err();
        assert_eq!(err, SpecError::OverlappingStatus("\"Normal\"".to_string()));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = WaitSpec::<&str>::builder(Duration::ZERO).build().unwrap_err();
        assert_eq!(err, SpecError::ZeroTimeout);
    }

    #[test]
    fn zero_streak_is_rejected() {
        let err = WaitSpec::<&str>::builder(HALF_HOUR)
            .target(["Normal"])
            .min_target_streak(0)
            .build()
            .unwrap_err();
        assert_eq!(err, SpecError::ZeroTargetStreak);
    }

    #[test]
    fn shrinking_backoff_is_rejected() {
        let backoff = PollBackoff {
            base_delay: Duration::from_secs(1),
            multiplier: 0.5,
            max_delay: Duration::from_secs(10),
        };
        let err = WaitSpec::<&str>::builder(HALF_HOUR).backoff(backoff).build().unwrap_err();
        assert!(matches!(err, SpecError::InvalidBackoff(_)));
    }

    #[test]
    fn deletion_spec_expects_disappearance() {
        let spec = WaitSpec::builder(HALF_HOUR)
            .pending(["Deleting", "Normal"])
            .not_found_tolerance(0)
            .build()
            .unwrap();
        assert!(spec.expects_disappearance());
        assert_eq!(spec.not_found_tolerance(), 0);
    }
}
