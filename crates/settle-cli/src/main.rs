use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settle_core::config::ProviderConfig;
use settle_core::impls::{InMemoryNetworkFirewall, InMemoryOam, Lag};
use settle_core::resources::tls_inspection::{
    EncryptionConfigurationModel, ServerCertificateConfigurationModel, TlsInspectionBlock,
};
use settle_core::resources::{
    PlanAction, SinkPolicyModel, SinkPolicyResource, TlsInspectionConfigurationModel,
    TlsInspectionConfigurationResource,
};

/// Drive resource lifecycles against eventually consistent in-memory services.
#[derive(Parser, Debug)]
#[command(name = "settle", version, about)]
struct Cli {
    /// Provider configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reads before a new object becomes visible
    #[arg(long, global = true, default_value_t = 2)]
    invisible_reads: u32,

    /// Reads spent in a transitional status
    #[arg(long, global = true, default_value_t = 2)]
    transition_reads: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, update, import and destroy a TLS inspection configuration
    Tls(TlsArgs),
    /// Put, update and import an OAM sink policy
    SinkPolicy(SinkPolicyArgs),
}

#[derive(Args, Debug)]
struct TlsArgs {
    /// Configuration name
    #[arg(long, default_value = "settle-demo")]
    name: String,

    /// Configuration type
    #[arg(long = "type", default_value = "STATEFUL")]
    configuration_type: String,

    /// Certificate authority ARN (repeatable)
    #[arg(long = "ca-arn")]
    ca_arns: Vec<String>,
}

#[derive(Args, Debug)]
struct SinkPolicyArgs {
    /// Policy document file; a default allow-CreateLink policy otherwise
    #[arg(long)]
    policy_file: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Arc<ProviderConfig>> {
    let config = match path {
        Some(path) => ProviderConfig::load(path)
            .with_context(|| format!("loading provider config {}", path.display()))?,
        None => ProviderConfig::default(),
    };
    Ok(Arc::new(config))
}

fn print_state<T: Serialize>(label: &str, state: &T) -> Result<()> {
    println!("# {label}");
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}

async fn run_tls(args: TlsArgs, config: Arc<ProviderConfig>, lag: Lag) -> Result<()> {
    let api = Arc::new(InMemoryNetworkFirewall::with_region(config.region.clone(), lag));
    let resource = TlsInspectionConfigurationResource::new(api, config);

    let ca_arns = if args.ca_arns.is_empty() {
        vec!["arn:aws:acm:us-east-1:123456789012:certificate-authority/demo".to_string()]
    } else {
        args.ca_arns
    };
    let desired = TlsInspectionConfigurationModel {
        name: args.name,
        configuration_type: args.configuration_type,
        description: Some("created by settle".to_string()),
        encryption_configuration: Some(EncryptionConfigurationModel {
            key_id: None,
            encryption_type: Some("AWS_OWNED_KMS_KEY".to_string()),
        }),
        tls_inspection_configuration: Some(TlsInspectionBlock {
            server_certificate_configurations: ca_arns
                .into_iter()
                .map(|certificate_authority_arn| ServerCertificateConfigurationModel {
                    certificate_authority_arn,
                })
                .collect(),
        }),
        ..Default::default()
    };

    let state = resource.create(desired.clone()).await?;
    print_state("created", &state)?;

    let mut changed = desired;
    changed.description = Some("updated by settle".to_string());
    let state = match TlsInspectionConfigurationResource::<InMemoryNetworkFirewall>::plan(Some(&state), &changed) {
        PlanAction::Update => resource.update(changed, &state).await?,
        action => bail!("expected an in-place update, planned {action:?}"),
    };
    print_state("updated", &state)?;

    let id = state.id.clone().context("created configuration has no id")?;
    let imported = resource
        .import(&id)
        .await?
        .context("imported configuration disappeared")?;
    print_state("imported", &imported)?;

    resource.delete(&state).await?;
    if resource.read(state).await?.is_some() {
        bail!("configuration {id} still exists after delete");
    }
    info!(%id, "TLS inspection configuration destroyed");
    Ok(())
}

const DEFAULT_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [{
    "Action": ["oam:CreateLink", "oam:UpdateLink"],
    "Effect": "Allow",
    "Resource": "*",
    "Principal": {"AWS": ["arn:aws:iam::123456789012:root"]},
    "Condition": {
      "ForAllValues:StringEquals": {
        "oam:ResourceTypes": ["AWS::CloudWatch::Metric", "AWS::Logs::LogGroup"]
      }
    }
  }]
}"#;

async fn run_sink_policy(args: SinkPolicyArgs, config: Arc<ProviderConfig>, lag: Lag) -> Result<()> {
    let policy = match &args.policy_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading policy {}", path.display()))?,
        None => DEFAULT_POLICY.to_string(),
    };

    let oam = Arc::new(InMemoryOam::with_region(config.region.clone(), lag));
    let sink = oam.create_sink().await;
    info!(%sink, "created sink");
    let resource = SinkPolicyResource::new(oam, config);

    let state = resource
        .create(SinkPolicyModel {
            sink_identifier: sink.clone(),
            policy,
            ..Default::default()
        })
        .await?;
    print_state("created", &state)?;

    let narrowed = SinkPolicyModel {
        policy: DEFAULT_POLICY.replace(r#"["oam:CreateLink", "oam:UpdateLink"]"#, r#""oam:CreateLink""#),
        ..state.clone()
    };
    let state = match SinkPolicyResource::<InMemoryOam>::plan(Some(&state), &narrowed) {
        PlanAction::Update => resource.update(narrowed, &state).await?,
        PlanAction::NoOp => state,
        action => bail!("unexpected plan {action:?}"),
    };
    print_state("updated", &state)?;

    let imported = resource
        .import(&sink)
        .await?
        .context("imported sink policy disappeared")?;
    print_state("imported", &imported)?;

    resource.delete(&imported).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "settle_core=info,settle_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let lag = Lag {
        invisible_reads: cli.invisible_reads,
        transition_reads: cli.transition_reads,
    };
    info!(region = %config.region, ?lag, "starting");

    match cli.command {
        Command::Tls(args) => run_tls(args, config, lag).await,
        Command::SinkPolicy(args) => run_sink_policy(args, config, lag).await,
    }
}
