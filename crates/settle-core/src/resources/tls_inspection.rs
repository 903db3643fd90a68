//! `aws_networkfirewall_firewall_tls_inspection_configuration`
//!
//! Create, read, update, delete and import of a Network Firewall TLS
//! inspection configuration. Every mutation is followed by a wait, since the
//! service reports the new object (or its absence) only eventually.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Action, Cause, FindError, PlanAction, Problem, ResourceError, WaitFailure};
use crate::app::PollBackoff;
use crate::config::{ProviderConfig, TimeoutOverrides};
use crate::domain::{PollOutcome, ResourceId, Tags, WaitSpec, merge_tags};
use crate::error::SpecError;
use crate::ports::network_firewall::{
    CreateTlsInspectionConfigurationInput, EncryptionConfiguration, ServerCertificateConfiguration,
    TlsInspectionConfiguration, TlsInspectionConfigurationBody, UpdateTlsInspectionConfigurationInput,
};
use crate::ports::{ApiError, Describe, NetworkFirewallApi, wait_for};

pub const TYPE_NAME: &str = "aws_networkfirewall_firewall_tls_inspection_configuration";

const PROBLEM: Problem = Problem {
    service: "NetworkFirewall",
    resource: "Firewall Tls Inspection Configuration",
};

/// Status reported by the service for a TLS inspection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsConfigurationStatus {
    Pending,
    Deleting,
    Normal,
    Updated,
    /// Anything the service reports that we don't model.
    Other(String),
}

impl TlsConfigurationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TlsConfigurationStatus::Pending => "Pending",
            TlsConfigurationStatus::Deleting => "Deleting",
            TlsConfigurationStatus::Normal => "Normal",
            TlsConfigurationStatus::Updated => "Updated",
            TlsConfigurationStatus::Other(s) => s,
        }
    }
}

impl From<&str> for TlsConfigurationStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => TlsConfigurationStatus::Pending,
            "Deleting" => TlsConfigurationStatus::Deleting,
            "Normal" => TlsConfigurationStatus::Normal,
            "Updated" => TlsConfigurationStatus::Updated,
            other => TlsConfigurationStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TlsConfigurationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation: any non-target status is progress; the new object may be
/// invisible for a while.
pub fn wait_created_spec(
    timeout: Duration,
    backoff: PollBackoff,
) -> Result<WaitSpec<TlsConfigurationStatus>, SpecError> {
    WaitSpec::builder(timeout)
        .target([TlsConfigurationStatus::Normal])
        .not_found_tolerance(20)
        .min_target_streak(2)
        .backoff(backoff)
        .build()
}

pub fn wait_updated_spec(
    timeout: Duration,
    backoff: PollBackoff,
) -> Result<WaitSpec<TlsConfigurationStatus>, SpecError> {
    WaitSpec::builder(timeout)
        .pending([TlsConfigurationStatus::Pending])
        .target([TlsConfigurationStatus::Updated])
        .not_found_tolerance(20)
        .min_target_streak(2)
        .backoff(backoff)
        .build()
}

/// Deletion: the first not-found observation ends the wait.
pub fn wait_deleted_spec(
    timeout: Duration,
    backoff: PollBackoff,
) -> Result<WaitSpec<TlsConfigurationStatus>, SpecError> {
    WaitSpec::builder(timeout)
        .pending([TlsConfigurationStatus::Deleting, TlsConfigurationStatus::Normal])
        .not_found_tolerance(0)
        .backoff(backoff)
        .build()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfigurationModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub encryption_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerCertificateConfigurationModel {
    pub certificate_authority_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsInspectionBlock {
    #[serde(default)]
    pub server_certificate_configurations: Vec<ServerCertificateConfigurationModel>,
}

/// Declarative model (plan and state) of the resource.
///
/// The nested blocks hold at most one element, so they are plain `Option`s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsInspectionConfigurationModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Changing the name forces a new resource.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub configuration_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_configuration: Option<EncryptionConfigurationModel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_inspection_configuration: Option<TlsInspectionBlock>,

    #[serde(default)]
    pub tags: Tags,

    #[serde(default)]
    pub tags_all: Tags,

    #[serde(default, skip_serializing_if = "TimeoutOverrides::is_empty")]
    pub timeouts: TimeoutOverrides,
}

impl TlsInspectionConfigurationModel {
    pub fn validate(&self) -> Result<(), Cause> {
        if self.name.trim().is_empty() {
            return Err(Cause::Invalid("name must not be empty".to_string()));
        }
        if self.configuration_type.trim().is_empty() {
            return Err(Cause::Invalid("type must not be empty".to_string()));
        }
        if let Some(block) = &self.tls_inspection_configuration
            && block
                .server_certificate_configurations
                .iter()
                .any(|c| c.certificate_authority_arn.trim().is_empty())
        {
            return Err(Cause::Invalid(
                "certificate_authority_arn must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// True when an attribute that the update call carries has changed.
    fn differs_remotely(&self, other: &Self) -> bool {
        self.name != other.name
            || self.description != other.description
            || self.configuration_type != other.configuration_type
            || self.encryption_configuration != other.encryption_configuration
            || self.tls_inspection_configuration != other.tls_inspection_configuration
    }
}

fn expand_encryption_configuration(
    model: Option<&EncryptionConfigurationModel>,
) -> Option<EncryptionConfiguration> {
    model.map(|m| EncryptionConfiguration {
        key_id: m.key_id.clone(),
        encryption_type: m.encryption_type.clone(),
    })
}

fn expand_tls_inspection_configuration(
    model: Option<&TlsInspectionBlock>,
) -> Option<TlsInspectionConfigurationBody> {
    model.map(|m| TlsInspectionConfigurationBody {
        server_certificate_configurations: m
            .server_certificate_configurations
            .iter()
            .map(|c| ServerCertificateConfiguration {
                certificate_authority_arn: c.certificate_authority_arn.clone(),
            })
            .collect(),
    })
}

fn flatten_encryption_configuration(
    remote: Option<&EncryptionConfiguration>,
) -> Option<EncryptionConfigurationModel> {
    remote.map(|r| EncryptionConfigurationModel {
        key_id: r.key_id.clone(),
        encryption_type: r.encryption_type.clone(),
    })
}

fn flatten_tls_inspection_configuration(
    remote: Option<&TlsInspectionConfigurationBody>,
) -> Option<TlsInspectionBlock> {
    remote.map(|r| TlsInspectionBlock {
        server_certificate_configurations: r
            .server_certificate_configurations
            .iter()
            .map(|c| ServerCertificateConfigurationModel {
                certificate_authority_arn: c.certificate_authority_arn.clone(),
            })
            .collect(),
    })
}

/// Look up a configuration by id.
///
/// # Errors
/// - `FindError::NotFound` when the service reports ResourceNotFound
/// - `FindError::EmptyResult` when the response has no body
pub async fn find_tls_inspection_configuration_by_id<C>(
    client: &C,
    id: &str,
) -> Result<TlsInspectionConfiguration, FindError>
where
    C: NetworkFirewallApi + ?Sized,
{
    let out = client.describe_tls_inspection_configuration(id).await?;
    out.tls_inspection_configuration.ok_or(FindError::EmptyResult)
}

/// Bring the remote tags of `arn` from `old` to `new`.
async fn update_tags<C>(client: &C, arn: &str, old: &Tags, new: &Tags) -> Result<(), ApiError>
where
    C: NetworkFirewallApi + ?Sized,
{
    let removed: Vec<String> = old.keys().filter(|k| !new.contains_key(*k)).cloned().collect();
    if !removed.is_empty() {
        client.untag_resource(arn, removed).await?;
    }
    let upserted: Tags = new
        .iter()
        .filter(|(k, v)| old.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !upserted.is_empty() {
        client.tag_resource(arn, upserted).await?;
    }
    Ok(())
}

pub struct TlsInspectionConfigurationResource<C> {
    client: Arc<C>,
    config: Arc<ProviderConfig>,
}

impl<C: NetworkFirewallApi> TlsInspectionConfigurationResource<C> {
    pub fn new(client: Arc<C>, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }

    /// Decide what applying `desired` on top of `prior` will do.
    pub fn plan(
        prior: Option<&TlsInspectionConfigurationModel>,
        desired: &TlsInspectionConfigurationModel,
    ) -> PlanAction {
        match prior {
            None => PlanAction::Create,
            Some(prior) if prior.name != desired.name => PlanAction::Replace,
            Some(prior) if desired.differs_remotely(prior) || prior.tags != desired.tags => {
                PlanAction::Update
            }
            Some(_) => PlanAction::NoOp,
        }
    }

    pub async fn create(
        &self,
        mut plan: TlsInspectionConfigurationModel,
    ) -> Result<TlsInspectionConfigurationModel, ResourceError> {
        plan.validate()
            .map_err(|cause| PROBLEM.error(Action::Creating, &plan.name, cause))?;
        plan.tags_all = merge_tags(&self.config.default_tags, &plan.tags);

        let input = CreateTlsInspectionConfigurationInput {
            tls_inspection_configuration_name: plan.name.clone(),
            configuration_type: plan.configuration_type.clone(),
            description: plan.description.clone(),
            encryption_configuration: expand_encryption_configuration(
                plan.encryption_configuration.as_ref(),
            ),
            tls_inspection_configuration: expand_tls_inspection_configuration(
                plan.tls_inspection_configuration.as_ref(),
            ),
            tags: plan.tags_all.clone(),
        };

        info!(name = %plan.name, "creating TLS inspection configuration");
        let out = self
            .client
            .create_tls_inspection_configuration(input)
            .await
            .map_err(|e| PROBLEM.error(Action::Creating, &plan.name, e))?;
        let created = out
            .tls_inspection_configuration
            .ok_or_else(|| PROBLEM.error(Action::Creating, &plan.name, Cause::EmptyOutput))?;
        let id = created
            .tls_inspection_configuration_id
            .clone()
            .ok_or_else(|| PROBLEM.error(Action::Creating, &plan.name, Cause::EmptyOutput))?;
        plan.arn = created.arn;
        plan.id = Some(id.clone());

        let timeouts = self.config.timeouts.resolve(&plan.timeouts);
        let spec = wait_created_spec(timeouts.create, self.config.poll.backoff())
            .map_err(|e| PROBLEM.error(Action::WaitingForCreation, &plan.name, e))?;
        debug!(%id, timeout = ?timeouts.create, "waiting for TLS inspection configuration creation");
        wait_for(self, &ResourceId::new(id), &spec)
            .await
            .map_err(|e| PROBLEM.error(Action::WaitingForCreation, &plan.name, WaitFailure::from(e)))?;

        Ok(plan)
    }

    /// Refresh `state` from the service.
    ///
    /// Returns `Ok(None)` when the configuration no longer exists, meaning it
    /// should be removed from state.
    pub async fn read(
        &self,
        mut state: TlsInspectionConfigurationModel,
    ) -> Result<Option<TlsInspectionConfigurationModel>, ResourceError> {
        let Some(id) = state.id.clone() else {
            return Ok(None);
        };

        let remote = match find_tls_inspection_configuration_by_id(self.client.as_ref(), &id).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                warn!(%id, "TLS inspection configuration not found, removing from state");
                return Ok(None);
            }
            Err(e) => return Err(PROBLEM.error(Action::Reading, &id, e)),
        };

        state.arn = remote.arn;
        state.id = remote.tls_inspection_configuration_id.or(Some(id));
        if let Some(name) = remote.tls_inspection_configuration_name {
            state.name = name;
        }
        if let Some(configuration_type) = remote.configuration_type {
            state.configuration_type = configuration_type;
        }
        state.description = remote.description;
        state.encryption_configuration =
            flatten_encryption_configuration(remote.encryption_configuration.as_ref());
        state.tls_inspection_configuration =
            flatten_tls_inspection_configuration(remote.tls_inspection_configuration.as_ref());

        let defaults = &self.config.default_tags;
        state.tags = remote
            .tags
            .iter()
            .filter(|(k, v)| state.tags.contains_key(*k) || defaults.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        state.tags_all = remote.tags;

        Ok(Some(state))
    }

    pub async fn update(
        &self,
        mut plan: TlsInspectionConfigurationModel,
        state: &TlsInspectionConfigurationModel,
    ) -> Result<TlsInspectionConfigurationModel, ResourceError> {
        let id = state.id.clone().ok_or_else(|| {
            PROBLEM.error(
                Action::Updating,
                &state.name,
                Cause::Invalid("state has no id".to_string()),
            )
        })?;
        if plan.name != state.name {
            return Err(PROBLEM.error(Action::Updating, &id, Cause::RequiresReplace("name")));
        }
        plan.validate()
            .map_err(|cause| PROBLEM.error(Action::Updating, &id, cause))?;

        plan.id = Some(id.clone());
        plan.arn = state.arn.clone();
        plan.tags_all = merge_tags(&self.config.default_tags, &plan.tags);

        if plan.differs_remotely(state) {
            self.update_configuration(&mut plan, &id).await?;
        } else {
            debug!(%id, "no remote attribute changed, skipping update call");
        }

        if plan.tags_all != state.tags_all {
            let arn = plan.arn.clone().ok_or_else(|| {
                PROBLEM.error(
                    Action::Updating,
                    &id,
                    Cause::Invalid("state has no arn".to_string()),
                )
            })?;
            info!(%id, "updating tags");
            update_tags(self.client.as_ref(), &arn, &state.tags_all, &plan.tags_all)
                .await
                .map_err(|e| PROBLEM.error(Action::Updating, &id, e))?;
        }

        Ok(plan)
    }

    /// Push the non-tag attributes of `plan` and wait for `Updated`.
    async fn update_configuration(
        &self,
        plan: &mut TlsInspectionConfigurationModel,
        id: &str,
    ) -> Result<(), ResourceError> {
        let input = UpdateTlsInspectionConfigurationInput {
            tls_inspection_configuration_id: id.to_string(),
            tls_inspection_configuration_name: plan.name.clone(),
            configuration_type: plan.configuration_type.clone(),
            description: plan.description.clone(),
            encryption_configuration: expand_encryption_configuration(
                plan.encryption_configuration.as_ref(),
            ),
            tls_inspection_configuration: expand_tls_inspection_configuration(
                plan.tls_inspection_configuration.as_ref(),
            ),
        };

        info!(%id, "updating TLS inspection configuration");
        let out = self
            .client
            .update_tls_inspection_configuration(input)
            .await
            .map_err(|e| PROBLEM.error(Action::Updating, id, e))?;
        let updated = out
            .tls_inspection_configuration
            .ok_or_else(|| PROBLEM.error(Action::Updating, id, Cause::EmptyOutput))?;
        if updated.arn.is_some() {
            plan.arn = updated.arn;
        }
        if let Some(new_id) = updated.tls_inspection_configuration_id {
            plan.id = Some(new_id);
        }

        let timeouts = self.config.timeouts.resolve(&plan.timeouts);
        let spec = wait_updated_spec(timeouts.update, self.config.poll.backoff())
            .map_err(|e| PROBLEM.error(Action::WaitingForUpdate, id, e))?;
        debug!(%id, timeout = ?timeouts.update, "waiting for TLS inspection configuration update");
        wait_for(self, &ResourceId::new(id), &spec)
            .await
            .map_err(|e| PROBLEM.error(Action::WaitingForUpdate, id, WaitFailure::from(e)))?;

        Ok(())
    }

    pub async fn delete(&self, state: &TlsInspectionConfigurationModel) -> Result<(), ResourceError> {
        let Some(id) = state.id.clone() else {
            return Ok(());
        };

        info!(%id, "deleting TLS inspection configuration");
        match self.client.delete_tls_inspection_configuration(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(PROBLEM.error(Action::Deleting, &id, e)),
        }

        let timeouts = self.config.timeouts.resolve(&state.timeouts);
        let spec = wait_deleted_spec(timeouts.delete, self.config.poll.backoff())
            .map_err(|e| PROBLEM.error(Action::WaitingForDeletion, &id, e))?;
        wait_for(self, &ResourceId::new(id.clone()), &spec)
            .await
            .map_err(|e| PROBLEM.error(Action::WaitingForDeletion, &id, WaitFailure::from(e)))?;

        Ok(())
    }

    /// Import by id, then read the rest from the service.
    pub async fn import(
        &self,
        id: &str,
    ) -> Result<Option<TlsInspectionConfigurationModel>, ResourceError> {
        if id.trim().is_empty() {
            return Err(PROBLEM.error(
                Action::Importing,
                id,
                Cause::Invalid("import id must not be empty".to_string()),
            ));
        }
        let state = TlsInspectionConfigurationModel {
            id: Some(id.to_string()),
            ..Default::default()
        };
        self.read(state).await
    }
}

#[async_trait]
impl<C: NetworkFirewallApi> Describe for TlsInspectionConfigurationResource<C> {
    type Snapshot = TlsInspectionConfiguration;
    type Status = TlsConfigurationStatus;
    type Error = FindError;

    async fn describe(
        &self,
        id: &ResourceId,
    ) -> PollOutcome<TlsInspectionConfiguration, TlsConfigurationStatus, FindError> {
        match find_tls_inspection_configuration_by_id(self.client.as_ref(), id.as_str()).await {
            Ok(remote) => {
                let status = TlsConfigurationStatus::from(remote.status.as_deref().unwrap_or_default());
                PollOutcome::found(remote, status)
            }
            Err(e) if e.is_not_found() => PollOutcome::NotFound,
            Err(e) => PollOutcome::Error(e),
        }
    }
}
