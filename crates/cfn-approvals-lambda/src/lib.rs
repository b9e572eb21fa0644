// AWS Lambda runtime adapter
//
// Receives CodePipeline job invocations and runs the approval gate.
// Configuration, AWS clients and logging are set up once per cold start.
//
// Philosophy: Use lambda_runtime's provided tokio

use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use cfn_approvals_config::{LogFormat, RuntimeConfig};
use cfn_approvals_core::{
    run_job, Collaborators, DriftPolicy, GateOutcome, GateSettings, JobRequest,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

mod event;

pub use event::CodePipelineEvent;

/// Per-process state shared by all invocations
#[derive(Clone)]
pub struct LambdaState {
    pub settings: GateSettings,
    pub collaborators: Collaborators,
}

/// Lambda handler for CodePipeline job events.
///
/// Gate failures are reported to the pipeline, not returned to the runtime,
/// so a retried invocation cannot report the same job twice.
pub async fn handle_job(
    event: LambdaEvent<CodePipelineEvent>,
    state: Arc<LambdaState>,
) -> Result<GateOutcome, Error> {
    let (payload, context) = event.into_parts();
    let request = JobRequest::from(payload);

    info!(request_id = %context.request_id, "Received CodePipeline job");
    Ok(run_job(&request, &state.settings, &state.collaborators).await)
}

/// Gate settings derived from the runtime configuration
pub fn gate_settings(config: &RuntimeConfig) -> GateSettings {
    GateSettings {
        region: config.region.clone(),
        key_prefix: config.storage.key_prefix.clone(),
        link_expiry: config.storage.link_expiry(),
        web_url: config.web_url.clone(),
        detect_drift: config.drift.enabled,
        drift_policy: DriftPolicy {
            poll_interval: config.drift.poll_interval(),
            max_polls: config.drift.max_polls,
        },
        build_timeout: config.job.build_timeout(),
        report_success_on_publish: config.job.report_success_on_publish,
    }
}

/// Initialize tracing/logging from RuntimeConfig
fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // CloudWatch adds its own timestamps and does not render ANSI colors
    match config.log.format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().without_time().with_current_span(false))
                .init();
        }
        LogFormat::Text => {
            registry
                .with(fmt::layer().with_ansi(false).without_time())
                .init();
        }
    }
}

async fn build_state(config: &RuntimeConfig) -> anyhow::Result<LambdaState> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    Ok(LambdaState {
        settings: gate_settings(config),
        collaborators: cfn_approvals_aws::collaborators(&sdk_config, config),
    })
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = RuntimeConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);

    info!(
        region = %config.region,
        bucket = %config.storage.bucket,
        drift = config.drift.enabled,
        report_success_on_publish = config.job.report_success_on_publish,
        "Starting approval gate"
    );

    let state = Arc::new(build_state(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<CodePipelineEvent>| {
        let state = state.clone();
        async move { handle_job(event, state).await }
    }))
    .await
}
