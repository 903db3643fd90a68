//! Poll outcome: the typed result of one describe call.

/// What a single poll observed.
///
/// - `Found`: the object exists and reported `status`.
/// - `NotFound`: the object is absent (or not yet visible).
/// - `Error`: any other failure of the describe call. Never retried by the waiter.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T, S, E> {
    Found { snapshot: T, status: S },
    NotFound,
    Error(E),
}

impl<T, S, E> PollOutcome<T, S, E> {
    pub fn found(snapshot: T, status: S) -> Self {
        PollOutcome::Found { snapshot, status }
    }

    /// Build an outcome from a lookup that reports absence as `Ok(None)`.
    pub fn from_lookup(result: Result<Option<T>, E>, status_of: impl FnOnce(&T) -> S) -> Self {
        match result {
            Ok(Some(snapshot)) => {
                let status = status_of(&snapshot);
                PollOutcome::Found { snapshot, status }
            }
            Ok(None) => PollOutcome::NotFound,
            Err(e) => PollOutcome::Error(e),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PollOutcome::NotFound)
    }

    pub fn status(&self) -> Option<&S> {
        match self {
            PollOutcome::Found { status, .. } => Some(status),
            _ => None,
        }
    }
}
