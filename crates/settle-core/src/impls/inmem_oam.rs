//! InMemoryOam - ポリシー反映の遅延を模した OamApi
//!
//! put したポリシーは `transition_reads` 回の get の間は古いまま見え、
//! その後に反映されます。保存時に JSON を正規化するので、
//! 返ってくる文字列は put した文字列と一致しないことがあります。

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{ACCOUNT_ID, Lag, fresh_id};
use crate::ports::oam::{PutSinkPolicyInput, SinkPolicyOutput};
use crate::ports::{ApiError, OamApi};

#[derive(Debug)]
struct Sink {
    arn: String,
    id: String,
    policy: Option<String>,
    /// Policy waiting to become visible, with the reads left until it does.
    propagating: Option<(String, u32)>,
}

impl Sink {
    fn output(&self) -> SinkPolicyOutput {
        SinkPolicyOutput {
            sink_arn: Some(self.arn.clone()),
            sink_id: Some(self.id.clone()),
            policy: self.policy.clone(),
        }
    }
}

pub struct InMemoryOam {
    region: String,
    lag: Lag,
    sinks: Mutex<HashMap<String, Sink>>,
}

impl InMemoryOam {
    pub fn new(lag: Lag) -> Self {
        Self::with_region("us-west-2", lag)
    }

    pub fn with_region(region: impl Into<String>, lag: Lag) -> Self {
        Self {
            region: region.into(),
            lag,
            sinks: Mutex::new(HashMap::new()),
        }
    }

    /// Create an empty sink and return its ARN.
    pub async fn create_sink(&self) -> String {
        let id = fresh_id();
        let arn = format!("arn:aws:oam:{}:{}:sink/{}", self.region, ACCOUNT_ID, id);
        self.sinks.lock().await.insert(
            id.clone(),
            Sink {
                arn: arn.clone(),
                id,
                policy: None,
                propagating: None,
            },
        );
        arn
    }

    /// Remove a sink together with its policy. Returns whether it existed.
    pub async fn delete_sink(&self, identifier: &str) -> bool {
        let mut sinks = self.sinks.lock().await;
        let key = sinks
            .values()
            .find(|s| s.arn == identifier || s.id == identifier)
            .map(|s| s.id.clone());
        key.and_then(|k| sinks.remove(&k)).is_some()
    }
}

impl Default for InMemoryOam {
    fn default() -> Self {
        Self::new(Lag::none())
    }
}

fn lookup<'a>(sinks: &'a mut HashMap<String, Sink>, identifier: &str) -> Result<&'a mut Sink, ApiError> {
    sinks
        .values_mut()
        .find(|s| s.arn == identifier || s.id == identifier)
        .ok_or_else(|| ApiError::ResourceNotFound(format!("sink {identifier} not found")))
}

#[async_trait]
impl OamApi for InMemoryOam {
    async fn put_sink_policy(&self, input: PutSinkPolicyInput) -> Result<SinkPolicyOutput, ApiError> {
        let document: Value = serde_json::from_str(&input.policy)
            .map_err(|e| ApiError::InvalidRequest(format!("policy is not valid JSON: {e}")))?;
        let stored = document.to_string();

        let mut sinks = self.sinks.lock().await;
        let sink = lookup(&mut sinks, &input.sink_identifier)?;
        if self.lag.transition_reads == 0 {
            sink.policy = Some(stored.clone());
            sink.propagating = None;
        } else {
            sink.propagating = Some((stored.clone(), self.lag.transition_reads));
        }

        Ok(SinkPolicyOutput {
            policy: Some(stored),
            ..sink.output()
        })
    }

    async fn get_sink_policy(&self, sink_identifier: &str) -> Result<SinkPolicyOutput, ApiError> {
        let mut sinks = self.sinks.lock().await;
        let sink = lookup(&mut sinks, sink_identifier)?;
        if let Some((pending, left)) = sink.propagating.take() {
            if left <= 1 {
                sink.policy = Some(pending);
            } else {
                sink.propagating = Some((pending, left - 1));
            }
        }
        Ok(sink.output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(sink: &str, policy: &str) -> PutSinkPolicyInput {
        PutSinkPolicyInput {
            sink_identifier: sink.to_string(),
            policy: policy.to_string(),
        }
    }

    #[tokio::test]
    async fn policy_propagates_after_lag() {
        let oam = InMemoryOam::new(Lag {
            invisible_reads: 0,
            transition_reads: 2,
        });
        let arn = oam.create_sink().await;

        oam.put_sink_policy(put(&arn, r#"{"Version": "2012-10-17"}"#)).await.unwrap();

        assert_eq!(oam.get_sink_policy(&arn).await.unwrap().policy, None);
        assert_eq!(
            oam.get_sink_policy(&arn).await.unwrap().policy.as_deref(),
            Some(r#"{"Version":"2012-10-17"}"#)
        );
    }

    #[tokio::test]
    async fn sink_is_addressable_by_id_or_arn() {
        let oam = InMemoryOam::default();
        let arn = oam.create_sink().await;
        let id = arn.rsplit('/').next().unwrap().to_string();

        oam.put_sink_policy(put(&id, "{}")).await.unwrap();
        let out = oam.get_sink_policy(&arn).await.unwrap();

        assert_eq!(out.sink_id.as_deref(), Some(id.as_str()));
        assert_eq!(out.policy.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn missing_sink_and_bad_json_are_rejected() {
        let oam = InMemoryOam::default();
        let arn = oam.create_sink().await;

        let err = oam.put_sink_policy(put(&arn, "{not json")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        assert!(oam.delete_sink(&arn).await);
        let err = oam.get_sink_policy(&arn).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
