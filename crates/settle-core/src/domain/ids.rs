//! Resource identifiers.
//!
//! The identifier is assigned by the remote service (or supplied on import);
//! nothing in this crate generates one for a real resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a remote object, stable for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
