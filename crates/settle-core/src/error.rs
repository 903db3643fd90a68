//! Error types shared across the crate.
//!
//! Resource level failures live in [`crate::resources::ResourceError`]; this
//! module holds the errors of the waiting machinery itself.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A terminal failure of [`crate::app::await_status`].
///
/// `T` is the snapshot type, `S` the status type and `E` the error type of
/// the poll function.
#[derive(Debug, Error)]
pub enum WaitError<T, S, E>
where
    T: fmt::Debug,
    S: fmt::Debug,
    E: std::error::Error + 'static,
{
    /// The describe call failed with something other than "not found".
    #[error("polling failed: {source}")]
    PollFailed {
        #[source]
        source: E,
    },

    /// The object stayed absent longer than tolerated while it was expected to exist.
    #[error("couldn't find resource ({checks} consecutive not-found checks)")]
    NotFoundExhausted { checks: u32 },

    /// The target condition was not reached in time.
    #[error(
        "timeout while waiting for state to become {expected:?} (last state: {last_status:?}, timeout: {timeout:?})"
    )]
    TimedOut {
        timeout: Duration,
        expected: Vec<S>,
        last_status: Option<S>,
        last_snapshot: Option<T>,
    },
}

impl<T, S, E> WaitError<T, S, E>
where
    T: fmt::Debug,
    S: fmt::Debug,
    E: std::error::Error + 'static,
{
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::TimedOut { .. })
    }

    /// Last status observed before the wait gave up, if any.
    pub fn last_status(&self) -> Option<&S> {
        match self {
            WaitError::TimedOut { last_status, .. } => last_status.as_ref(),
            _ => None,
        }
    }
}

/// Rejected [`crate::domain::WaitSpec`] configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("status {0} is both pending and target")]
    OverlappingStatus(String),

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("min_target_streak must be at least 1")]
    ZeroTargetStreak,

    #[error("invalid poll backoff: {0}")]
    InvalidBackoff(String),
}
