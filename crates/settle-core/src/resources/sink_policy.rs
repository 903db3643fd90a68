//! `aws_oam_sink_policy`
//!
//! The policy attached to an Observability Access Manager sink. A put is
//! acknowledged before GetSinkPolicy reflects it, so every put waits until
//! the remote document is equivalent to the desired one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::policy::{parse_policy, policies_are_equivalent, policy_to_set};
use super::{Action, Cause, FindError, PlanAction, Problem, ResourceError, WaitFailure};
use crate::app::{PollBackoff, await_status};
use crate::config::{ProviderConfig, TimeoutOverrides};
use crate::domain::{PollOutcome, WaitSpec};
use crate::error::SpecError;
use crate::ports::OamApi;
use crate::ports::oam::{PutSinkPolicyInput, SinkPolicyOutput};

pub const TYPE_NAME: &str = "aws_oam_sink_policy";

const PROBLEM: Problem = Problem {
    service: "ObservabilityAccessManager",
    resource: "Sink Policy",
};

/// Whether GetSinkPolicy already returns the desired document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStatus {
    Propagated,
    Stale,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStatus::Propagated => f.write_str("Propagated"),
            PolicyStatus::Stale => f.write_str("Stale"),
        }
    }
}

pub fn wait_propagated_spec(
    timeout: Duration,
    backoff: PollBackoff,
) -> Result<WaitSpec<PolicyStatus>, SpecError> {
    WaitSpec::builder(timeout)
        .pending([PolicyStatus::Stale])
        .target([PolicyStatus::Propagated])
        .not_found_tolerance(20)
        .min_target_streak(2)
        .backoff(backoff)
        .build()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkPolicyModel {
    /// Same as `sink_identifier`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// ARN or id of the sink. Changing it forces a new resource.
    pub sink_identifier: String,

    /// JSON policy document.
    pub policy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_id: Option<String>,

    #[serde(default, skip_serializing_if = "TimeoutOverrides::is_empty")]
    pub timeouts: TimeoutOverrides,
}

impl SinkPolicyModel {
    pub fn validate(&self) -> Result<(), Cause> {
        if self.sink_identifier.trim().is_empty() {
            return Err(Cause::Invalid("sink_identifier must not be empty".to_string()));
        }
        parse_policy(&self.policy)?;
        Ok(())
    }
}

/// # Errors
/// - `FindError::NotFound` when the sink doesn't exist
pub async fn find_sink_policy_by_id<C>(client: &C, sink_identifier: &str) -> Result<SinkPolicyOutput, FindError>
where
    C: OamApi + ?Sized,
{
    Ok(client.get_sink_policy(sink_identifier).await?)
}

async fn poll_propagation<C>(
    client: &C,
    sink_identifier: &str,
    desired: &str,
) -> PollOutcome<SinkPolicyOutput, PolicyStatus, FindError>
where
    C: OamApi + ?Sized,
{
    match find_sink_policy_by_id(client, sink_identifier).await {
        Ok(out) => {
            let propagated = match out.policy.as_deref() {
                Some(remote) => match policies_are_equivalent(desired, remote) {
                    Ok(equivalent) => equivalent,
                    Err(e) => return PollOutcome::Error(FindError::Policy(e)),
                },
                None => false,
            };
            let status = if propagated {
                PolicyStatus::Propagated
            } else {
                PolicyStatus::Stale
            };
            PollOutcome::found(out, status)
        }
        Err(e) if e.is_not_found() => PollOutcome::NotFound,
        Err(e) => PollOutcome::Error(e),
    }
}

pub struct SinkPolicyResource<C> {
    client: Arc<C>,
    config: Arc<ProviderConfig>,
}

impl<C: OamApi> SinkPolicyResource<C> {
    pub fn new(client: Arc<C>, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }

    pub fn plan(prior: Option<&SinkPolicyModel>, desired: &SinkPolicyModel) -> PlanAction {
        match prior {
            None => PlanAction::Create,
            Some(prior) if prior.sink_identifier != desired.sink_identifier => PlanAction::Replace,
            Some(prior) if policies_are_equivalent(&prior.policy, &desired.policy).unwrap_or(false) => {
                PlanAction::NoOp
            }
            Some(_) => PlanAction::Update,
        }
    }

    pub async fn create(&self, plan: SinkPolicyModel) -> Result<SinkPolicyModel, ResourceError> {
        let timeout = self.config.timeouts.resolve(&plan.timeouts).create;
        self.put(plan, Action::Creating, Action::WaitingForCreation, timeout)
            .await
    }

    pub async fn update(
        &self,
        plan: SinkPolicyModel,
        state: &SinkPolicyModel,
    ) -> Result<SinkPolicyModel, ResourceError> {
        if plan.sink_identifier != state.sink_identifier {
            return Err(PROBLEM.error(
                Action::Updating,
                &state.sink_identifier,
                Cause::RequiresReplace("sink_identifier"),
            ));
        }
        let timeout = self.config.timeouts.resolve(&plan.timeouts).update;
        self.put(plan, Action::Updating, Action::WaitingForUpdate, timeout)
            .await
    }

    async fn put(
        &self,
        mut plan: SinkPolicyModel,
        action: Action,
        wait_action: Action,
        timeout: Duration,
    ) -> Result<SinkPolicyModel, ResourceError> {
        let sink = plan.sink_identifier.clone();
        plan.validate().map_err(|cause| PROBLEM.error(action, &sink, cause))?;

        info!(sink_identifier = %sink, "putting sink policy");
        let out = self
            .client
            .put_sink_policy(PutSinkPolicyInput {
                sink_identifier: sink.clone(),
                policy: plan.policy.clone(),
            })
            .await
            .map_err(|e| PROBLEM.error(action, &sink, e))?;
        plan.id = Some(sink.clone());
        plan.arn = out.sink_arn;
        plan.sink_id = out.sink_id;

        let spec = wait_propagated_spec(timeout, self.config.poll.backoff())
            .map_err(|e| PROBLEM.error(wait_action, &sink, e))?;
        debug!(sink_identifier = %sink, ?timeout, "waiting for sink policy to propagate");
        let client = self.client.as_ref();
        let (sink_ref, desired) = (sink.as_str(), plan.policy.as_str());
        await_status(&spec, || poll_propagation(client, sink_ref, desired))
            .await
            .map_err(|e| PROBLEM.error(wait_action, &sink, WaitFailure::from(e)))?;

        Ok(plan)
    }

    /// Refresh `state`. `Ok(None)` means the sink (or its policy) is gone.
    pub async fn read(&self, mut state: SinkPolicyModel) -> Result<Option<SinkPolicyModel>, ResourceError> {
        let id = state
            .id
            .clone()
            .unwrap_or_else(|| state.sink_identifier.clone());
        if id.is_empty() {
            return Ok(None);
        }

        let out = match find_sink_policy_by_id(self.client.as_ref(), &id).await {
            Ok(out) => out,
            Err(e) if e.is_not_found() => {
                warn!(sink_identifier = %id, "sink not found, removing policy from state");
                return Ok(None);
            }
            Err(e) => return Err(PROBLEM.error(Action::Reading, &id, e)),
        };
        let Some(remote) = out.policy else {
            warn!(sink_identifier = %id, "sink has no policy, removing from state");
            return Ok(None);
        };

        state.policy =
            policy_to_set(&state.policy, &remote).map_err(|e| PROBLEM.error(Action::Reading, &id, e))?;
        state.arn = out.sink_arn;
        state.sink_id = out.sink_id;
        state.sink_identifier = id.clone();
        state.id = Some(id);
        Ok(Some(state))
    }

    /// Sink policies live and die with their sink; this only forgets the
    /// resource.
    pub async fn delete(&self, state: &SinkPolicyModel) -> Result<(), ResourceError> {
        info!(
            sink_identifier = %state.sink_identifier,
            "sink policy can't be deleted on its own, removing from state only"
        );
        Ok(())
    }

    pub async fn import(&self, sink_identifier: &str) -> Result<Option<SinkPolicyModel>, ResourceError> {
        if sink_identifier.trim().is_empty() {
            return Err(PROBLEM.error(
                Action::Importing,
                sink_identifier,
                Cause::Invalid("import id must not be empty".to_string()),
            ));
        }
        let state = SinkPolicyModel {
            id: Some(sink_identifier.to_string()),
            sink_identifier: sink_identifier.to_string(),
            ..Default::default()
        };
        self.read(state).await
    }
}
