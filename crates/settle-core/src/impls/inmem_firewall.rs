//! InMemoryNetworkFirewall - 結果整合性を模した NetworkFirewallApi
//!
//! # 学習ポイント
//! - tokio::sync::Mutex による状態の排他制御
//! - describe ごとに進むフェーズで「遅れて見える」挙動を再現
//! - 障害注入（n 回目以降の describe を失敗させる）

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{ACCOUNT_ID, Lag, fresh_id};
use crate::domain::Tags;
use crate::ports::network_firewall::{
    CreateTlsInspectionConfigurationInput, TlsInspectionConfiguration, TlsInspectionConfigurationOutput,
    UpdateTlsInspectionConfigurationInput,
};
use crate::ports::{ApiError, NetworkFirewallApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Creating,
    Updating,
    Deleting,
    Settled,
}

#[derive(Debug)]
struct Entry {
    config: TlsInspectionConfiguration,
    phase: Phase,
    reads: u32,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    describe_calls: u32,
    fail_describe: Option<(u32, ApiError)>,
}

/// InMemoryNetworkFirewall は開発用の TLS inspection configuration ストア
///
/// # フェーズ
/// - Creating: `invisible_reads` 回は NotFound、次の `transition_reads` 回は Pending、その後 Normal
/// - Updating: `transition_reads` 回は Pending、その後 Updated
/// - Deleting: `transition_reads` 回は Deleting、その後削除されて NotFound
pub struct InMemoryNetworkFirewall {
    region: String,
    lag: Lag,
    state: Mutex<State>,
}

impl InMemoryNetworkFirewall {
    pub fn new(lag: Lag) -> Self {
        Self::with_region("us-west-2", lag)
    }

    pub fn with_region(region: impl Into<String>, lag: Lag) -> Self {
        Self {
            region: region.into(),
            lag,
            state: Mutex::new(State::default()),
        }
    }

    /// Total describe calls served so far, failed ones included.
    pub async fn describe_calls(&self) -> u32 {
        self.state.lock().await.describe_calls
    }

    /// Fail every describe after the first `successes` calls with `err`.
    pub async fn fail_describe_after(&self, successes: u32, err: ApiError) {
        self.state.lock().await.fail_describe = Some((successes, err));
    }

    fn arn(&self, name: &str) -> String {
        format!(
            "arn:aws:network-firewall:{}:{}:tls-configuration/{}",
            self.region, ACCOUNT_ID, name
        )
    }

    fn by_arn<'a>(state: &'a mut State, arn: &str) -> Result<&'a mut Entry, ApiError> {
        state
            .entries
            .values_mut()
            .find(|e| e.phase != Phase::Deleting && e.config.arn.as_deref() == Some(arn))
            .ok_or_else(|| ApiError::ResourceNotFound(format!("resource {arn} not found")))
    }

    /// Advance `entry` by one read. Returns `None` when the read sees nothing.
    fn observe(lag: Lag, entry: &mut Entry) -> Option<&'static str> {
        entry.reads = entry.reads.saturating_add(1);
        match entry.phase {
            Phase::Creating => {
                if entry.reads <= lag.invisible_reads {
                    None
                } else if entry.reads <= lag.invisible_reads.saturating_add(lag.transition_reads) {
                    Some("Pending")
                } else {
                    entry.phase = Phase::Settled;
                    Some("Normal")
                }
            }
            Phase::Updating => {
                if entry.reads <= lag.transition_reads {
                    Some("Pending")
                } else {
                    entry.phase = Phase::Settled;
                    Some("Updated")
                }
            }
            Phase::Deleting => {
                if entry.reads <= lag.transition_reads {
                    Some("Deleting")
                } else {
                    None
                }
            }
            Phase::Settled => Some(match entry.config.status.as_deref() {
                Some("Updated") => "Updated",
                _ => "Normal",
            }),
        }
    }
}

impl Default for InMemoryNetworkFirewall {
    fn default() -> Self {
        Self::new(Lag::none())
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError::ResourceNotFound(format!("TLS inspection configuration {id} not found"))
}

fn output(config: &TlsInspectionConfiguration) -> TlsInspectionConfigurationOutput {
    TlsInspectionConfigurationOutput {
        tls_inspection_configuration: Some(config.clone()),
    }
}

#[async_trait]
impl NetworkFirewallApi for InMemoryNetworkFirewall {
    async fn create_tls_inspection_configuration(
        &self,
        input: CreateTlsInspectionConfigurationInput,
    ) -> Result<TlsInspectionConfigurationOutput, ApiError> {
        let mut state = self.state.lock().await;
        let name = input.tls_inspection_configuration_name;
        let taken = state.entries.values().any(|e| {
            e.phase != Phase::Deleting && e.config.tls_inspection_configuration_name.as_deref() == Some(name.as_str())
        });
        if taken {
            return Err(ApiError::InvalidRequest(format!(
                "a TLS inspection configuration named {name} already exists"
            )));
        }

        let id = fresh_id();
        let config = TlsInspectionConfiguration {
            arn: Some(self.arn(&name)),
            tls_inspection_configuration_id: Some(id.clone()),
            tls_inspection_configuration_name: Some(name),
            configuration_type: Some(input.configuration_type),
            description: input.description,
            encryption_configuration: input.encryption_configuration,
            tls_inspection_configuration: input.tls_inspection_configuration,
            status: Some("Pending".to_string()),
            tags: input.tags,
            last_modified_time: Some(Utc::now()),
        };
        let out = output(&config);
        state.entries.insert(
            id,
            Entry {
                config,
                phase: Phase::Creating,
                reads: 0,
            },
        );
        Ok(out)
    }

    async fn describe_tls_inspection_configuration(
        &self,
        id: &str,
    ) -> Result<TlsInspectionConfigurationOutput, ApiError> {
        let mut state = self.state.lock().await;
        state.describe_calls = state.describe_calls.saturating_add(1);
        if let Some((successes, err)) = &state.fail_describe
            && state.describe_calls > *successes
        {
            return Err(err.clone());
        }

        let entry = state.entries.get_mut(id).ok_or_else(|| not_found(id))?;
        match Self::observe(self.lag, entry) {
            Some(status) => {
                entry.config.status = Some(status.to_string());
                Ok(output(&entry.config))
            }
            None if entry.phase == Phase::Deleting => {
                state.entries.remove(id);
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }

    async fn update_tls_inspection_configuration(
        &self,
        input: UpdateTlsInspectionConfigurationInput,
    ) -> Result<TlsInspectionConfigurationOutput, ApiError> {
        let mut state = self.state.lock().await;
        let id = input.tls_inspection_configuration_id;
        let entry = state
            .entries
            .get_mut(&id)
            .filter(|e| e.phase != Phase::Deleting)
            .ok_or_else(|| not_found(&id))?;

        entry.config.tls_inspection_configuration_name = Some(input.tls_inspection_configuration_name);
        entry.config.configuration_type = Some(input.configuration_type);
        entry.config.description = input.description;
        entry.config.encryption_configuration = input.encryption_configuration;
        entry.config.tls_inspection_configuration = input.tls_inspection_configuration;
        entry.config.status = Some("Pending".to_string());
        entry.config.last_modified_time = Some(Utc::now());
        entry.phase = Phase::Updating;
        entry.reads = 0;
        Ok(output(&entry.config))
    }

    async fn tag_resource(&self, resource_arn: &str, tags: Tags) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        let entry = Self::by_arn(&mut state, resource_arn)?;
        entry.config.tags.extend(tags);
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        let entry = Self::by_arn(&mut state, resource_arn)?;
        for key in &tag_keys {
            entry.config.tags.remove(key);
        }
        Ok(())
    }

    async fn delete_tls_inspection_configuration(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        let entry = state.entries.get_mut(id).ok_or_else(|| not_found(id))?;
        if entry.phase != Phase::Deleting {
            entry.config.status = Some("Deleting".to_string());
            entry.phase = Phase::Deleting;
            entry.reads = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> CreateTlsInspectionConfigurationInput {
        CreateTlsInspectionConfigurationInput {
            tls_inspection_configuration_name: name.to_string(),
            configuration_type: "STATEFUL".to_string(),
            tags: Tags::new(),
            ..Default::default()
        }
    }

    async fn statuses(api: &InMemoryNetworkFirewall, id: &str, n: usize) -> Vec<Option<String>> {
        let mut seen = Vec::with_capacity(n);
        for _ in 0..n {
            let status = api
                .describe_tls_inspection_configuration(id)
                .await
                .ok()
                .and_then(|out| out.tls_inspection_configuration)
                .and_then(|c| c.status);
            seen.push(status);
        }
        seen
    }

    #[tokio::test]
    async fn creation_becomes_visible_then_settles() {
        let api = InMemoryNetworkFirewall::new(Lag {
            invisible_reads: 2,
            transition_reads: 1,
        });
        let out = api.create_tls_inspection_configuration(input("edge")).await.unwrap();
        let id = out.tls_inspection_configuration.unwrap().tls_inspection_configuration_id.unwrap();

        let seen = statuses(&api, &id, 5).await;

        assert_eq!(
            seen,
            vec![
                None,
                None,
                Some("Pending".to_string()),
                Some("Normal".to_string()),
                Some("Normal".to_string()),
            ]
        );
        assert_eq!(api.describe_calls().await, 5);
    }

    #[tokio::test]
    async fn deletion_goes_through_deleting() {
        let api = InMemoryNetworkFirewall::new(Lag {
            invisible_reads: 0,
            transition_reads: 1,
        });
        let out = api.create_tls_inspection_configuration(input("edge")).await.unwrap();
        let id = out.tls_inspection_configuration.unwrap().tls_inspection_configuration_id.unwrap();
        statuses(&api, &id, 2).await;

        api.delete_tls_inspection_configuration(&id).await.unwrap();
        let seen = statuses(&api, &id, 2).await;

        assert_eq!(seen, vec![Some("Deleting".to_string()), None]);
        let err = api.delete_tls_inspection_configuration(&id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let api = InMemoryNetworkFirewall::default();
        api.create_tls_inspection_configuration(input("edge")).await.unwrap();

        let err = api.create_tls_inspection_configuration(input("edge")).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn tags_follow_the_arn() {
        let api = InMemoryNetworkFirewall::default();
        let out = api.create_tls_inspection_configuration(input("edge")).await.unwrap();
        let created = out.tls_inspection_configuration.unwrap();
        let (id, arn) = (
            created.tls_inspection_configuration_id.unwrap(),
            created.arn.unwrap(),
        );

        let tags = Tags::from([
            ("env".to_string(), "prod".to_string()),
            ("team".to_string(), "net".to_string()),
        ]);
        api.tag_resource(&arn, tags).await.unwrap();
        api.untag_resource(&arn, vec!["team".to_string()]).await.unwrap();

        let tags = api
            .describe_tls_inspection_configuration(&id)
            .await
            .unwrap()
            .tls_inspection_configuration
            .unwrap()
            .tags;
        assert_eq!(tags, Tags::from([("env".to_string(), "prod".to_string())]));

        let err = api.tag_resource("arn:missing", Tags::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_start_after_successes() {
        let api = InMemoryNetworkFirewall::default();
        api.fail_describe_after(1, ApiError::Internal("boom".to_string())).await;

        let first = api.describe_tls_inspection_configuration("missing").await.unwrap_err();
        let second = api.describe_tls_inspection_configuration("missing").await.unwrap_err();

        assert!(first.is_not_found());
        assert_eq!(second, ApiError::Internal("boom".to_string()));
    }
}
