//! NetworkFirewallApi port - AWS Network Firewall の TLS inspection configuration API
//!
//! Wire types follow the service's JSON shapes (PascalCase). Only the
//! operations the TLS inspection configuration resource needs are modeled.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Tags;

/// Failure reported by a remote API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("ResourceNotFoundException: {0}")]
    ResourceNotFound(String),

    #[error("InvalidRequestException: {0}")]
    InvalidRequest(String),

    #[error("ThrottlingException: {0}")]
    Throttling(String),

    #[error("InternalServerError: {0}")]
    Internal(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ResourceNotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptionConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    #[serde(default, rename = "Type", skip_serializing_if = "Option::is_none")]
    pub encryption_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerCertificateConfiguration {
    pub certificate_authority_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TlsInspectionConfigurationBody {
    #[serde(default)]
    pub server_certificate_configurations: Vec<ServerCertificateConfiguration>,
}

/// The remote object as returned by create/describe/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TlsInspectionConfiguration {
    pub arn: Option<String>,
    pub tls_inspection_configuration_id: Option<String>,
    pub tls_inspection_configuration_name: Option<String>,
    #[serde(rename = "TlsInspectionConfigurationType")]
    pub configuration_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_configuration: Option<EncryptionConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_inspection_configuration: Option<TlsInspectionConfigurationBody>,
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

/// Output envelope. A missing body is treated as an empty result by callers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TlsInspectionConfigurationOutput {
    pub tls_inspection_configuration: Option<TlsInspectionConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTlsInspectionConfigurationInput {
    pub tls_inspection_configuration_name: String,
    #[serde(rename = "TlsInspectionConfigurationType")]
    pub configuration_type: String,
    pub description: Option<String>,
    pub encryption_configuration: Option<EncryptionConfiguration>,
    pub tls_inspection_configuration: Option<TlsInspectionConfigurationBody>,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateTlsInspectionConfigurationInput {
    pub tls_inspection_configuration_id: String,
    pub tls_inspection_configuration_name: String,
    #[serde(rename = "TlsInspectionConfigurationType")]
    pub configuration_type: String,
    pub description: Option<String>,
    pub encryption_configuration: Option<EncryptionConfiguration>,
    pub tls_inspection_configuration: Option<TlsInspectionConfigurationBody>,
}

/// NetworkFirewallApi は TLS inspection configuration の CRUD を提供
///
/// # 実装
/// - **InMemoryNetworkFirewall**: 結果整合性を模したテスト・開発用実装
#[async_trait]
pub trait NetworkFirewallApi: Send + Sync {
    async fn create_tls_inspection_configuration(
        &self,
        input: CreateTlsInspectionConfigurationInput,
    ) -> Result<TlsInspectionConfigurationOutput, ApiError>;

    async fn describe_tls_inspection_configuration(
        &self,
        id: &str,
    ) -> Result<TlsInspectionConfigurationOutput, ApiError>;

    async fn update_tls_inspection_configuration(
        &self,
        input: UpdateTlsInspectionConfigurationInput,
    ) -> Result<TlsInspectionConfigurationOutput, ApiError>;

    async fn delete_tls_inspection_configuration(&self, id: &str) -> Result<(), ApiError>;

    /// Add or overwrite tags on the resource identified by `resource_arn`.
    async fn tag_resource(&self, resource_arn: &str, tags: Tags) -> Result<(), ApiError>;

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), ApiError>;
}
