//! IAM-style policy document equivalence.
//!
//! Two documents are equivalent when they are equal after normalization:
//! - arrays are unordered and de-duplicated
//! - a single-element array equals its sole element (`"a"` ≡ `["a"]`)
//! - object key order never matters

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("policy contains an invalid JSON: {0}")]
    InvalidJson(String),

    #[error("policy must be a JSON object")]
    NotAnObject,
}

/// Parse a policy document, requiring a top-level object.
pub fn parse_policy(policy: &str) -> Result<Value, PolicyError> {
    let value: Value =
        serde_json::from_str(policy).map_err(|e| PolicyError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(PolicyError::NotAnObject);
    }
    Ok(value)
}

pub fn policies_are_equivalent(a: &str, b: &str) -> Result<bool, PolicyError> {
    let a = normalize(parse_policy(a)?);
    let b = normalize(parse_policy(b)?);
    Ok(a == b)
}

/// Choose the policy string to store in state.
///
/// Keeps `existing` when it is equivalent to `remote`, so formatting-only
/// differences never show up as drift.
pub fn policy_to_set(existing: &str, remote: &str) -> Result<String, PolicyError> {
    if !existing.trim().is_empty() && policies_are_equivalent(existing, remote)? {
        return Ok(existing.to_string());
    }
    let remote = parse_policy(remote)?;
    serde_json::to_string(&remote).map_err(|e| PolicyError::InvalidJson(e.to_string()))
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.into_iter().map(normalize).collect();
            items.sort_by_cached_key(Value::to_string);
            items.dedup();
            if items.len() == 1 {
                items.pop().unwrap_or(Value::Null)
            } else {
                Value::Array(items)
            }
        }
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}
