//! Resource lifecycles built on the waiter.
//!
//! Each resource translates a declarative model into remote API calls, waits
//! for the remote side to settle, and maps responses back into the model.
//! Failures are reported as `"<action> <service> <resource> (<id>): <cause>"`.

pub mod policy;
pub mod sink_policy;
pub mod tls_inspection;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::error::{SpecError, WaitError};
use crate::ports::ApiError;

pub use self::sink_policy::{SinkPolicyModel, SinkPolicyResource};
pub use self::tls_inspection::{TlsInspectionConfigurationModel, TlsInspectionConfigurationResource};

/// What the resource was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Creating,
    Reading,
    Updating,
    Deleting,
    Importing,
    WaitingForCreation,
    WaitingForUpdate,
    WaitingForDeletion,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Creating => "creating",
            Action::Reading => "reading",
            Action::Updating => "updating",
            Action::Deleting => "deleting",
            Action::Importing => "importing",
            Action::WaitingForCreation => "waiting for creation",
            Action::WaitingForUpdate => "waiting for update",
            Action::WaitingForDeletion => "waiting for deletion",
        };
        f.write_str(s)
    }
}

/// Lookup failure of a `find_*` helper.
///
/// An empty result counts as "not found", same as an explicit
/// ResourceNotFound from the service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FindError {
    #[error("couldn't find resource: {0}")]
    NotFound(#[source] ApiError),

    #[error("empty result")]
    EmptyResult,

    #[error(transparent)]
    Api(ApiError),

    #[error("remote returned a malformed policy: {0}")]
    Policy(#[from] policy::PolicyError),
}

impl FindError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FindError::NotFound(_) | FindError::EmptyResult)
    }
}

impl From<ApiError> for FindError {
    fn from(err: ApiError) -> Self {
        if err.is_not_found() {
            FindError::NotFound(err)
        } else {
            FindError::Api(err)
        }
    }
}

/// A wait failure with the snapshot dropped and the status rendered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaitFailure {
    #[error(transparent)]
    PollFailed(FindError),

    #[error("couldn't find resource ({checks} consecutive not-found checks)")]
    NotFoundExhausted { checks: u32 },

    #[error("timeout while waiting for state to become {expected:?} (last state: {last_status:?}, timeout: {timeout:?})")]
    TimedOut {
        timeout: Duration,
        expected: Vec<String>,
        last_status: Option<String>,
    },
}

impl<T, S> From<WaitError<T, S, FindError>> for WaitFailure
where
    T: fmt::Debug,
    S: fmt::Debug + fmt::Display,
{
    fn from(err: WaitError<T, S, FindError>) -> Self {
        match err {
            WaitError::PollFailed { source } => WaitFailure::PollFailed(source),
            WaitError::NotFoundExhausted { checks } => WaitFailure::NotFoundExhausted { checks },
            WaitError::TimedOut {
                timeout,
                expected,
                last_status,
                ..
            } => WaitFailure::TimedOut {
                timeout,
                expected: expected.iter().map(ToString::to_string).collect(),
                last_status: last_status.map(|s| s.to_string()),
            },
        }
    }
}

/// Why a resource operation failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Cause {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Find(#[from] FindError),

    #[error(transparent)]
    Wait(#[from] WaitFailure),

    #[error(transparent)]
    WaitSpec(#[from] SpecError),

    #[error(transparent)]
    Policy(#[from] policy::PolicyError),

    #[error("empty output")]
    EmptyOutput,

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("attribute `{0}` cannot be changed in place; the resource must be replaced")]
    RequiresReplace(&'static str),
}

/// A failed resource operation, in the provider's standard message format.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{action} {service} {resource} ({id}): {cause}")]
pub struct ResourceError {
    pub action: Action,
    pub service: &'static str,
    pub resource: &'static str,
    pub id: String,
    #[source]
    pub cause: Cause,
}

impl ResourceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, Cause::Wait(WaitFailure::TimedOut { .. }))
    }
}

/// What applying a desired model to the prior state will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    Replace,
    NoOp,
}

/// Builds [`ResourceError`]s for one resource type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Problem {
    pub service: &'static str,
    pub resource: &'static str,
}

impl Problem {
    pub(crate) fn error(&self, action: Action, id: impl Into<String>, cause: impl Into<Cause>) -> ResourceError {
        ResourceError {
            action,
            service: self.service,
            resource: self.resource,
            id: id.into(),
            cause: cause.into(),
        }
    }
}
