//! OamApi port - CloudWatch Observability Access Manager の sink policy API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::network_firewall::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutSinkPolicyInput {
    pub sink_identifier: String,
    pub policy: String,
}

/// Output of both GetSinkPolicy and PutSinkPolicy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SinkPolicyOutput {
    pub sink_arn: Option<String>,
    pub sink_id: Option<String>,
    pub policy: Option<String>,
}

/// OamApi は sink policy の取得と設定を提供
///
/// sink policy は sink と一体で、単独では削除できない。
#[async_trait]
pub trait OamApi: Send + Sync {
    async fn put_sink_policy(&self, input: PutSinkPolicyInput) -> Result<SinkPolicyOutput, ApiError>;

    async fn get_sink_policy(&self, sink_identifier: &str) -> Result<SinkPolicyOutput, ApiError>;
}
