//! Pipeline job gate
//!
//! One invocation handles one pipeline job: parse the action configuration,
//! find pending change sets, build and publish the review package, notify
//! the reviewer and acknowledge the job. Errors are caught here once and
//! turned into a single job-failure report; nothing is published or sent
//! after a failure.

use crate::cloud::{CloudFormationApi, CredentialIssuer, Notifier, PipelineApi, ReviewStore};
use crate::collector::collect;
use crate::drift::DriftPolicy;
use crate::error::{ApprovalError, Result};
use crate::model::ReviewPackage;
use crate::package::{BuildOptions, JobContext, ReviewPackageBuilder};
use crate::user_params::UserParameters;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// SNS rejects subjects longer than this
const MAX_SUBJECT_CHARS: usize = 100;

/// Pipeline job as delivered to the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub job_id: String,
    pub account_id: String,
    /// Raw `UserParameters` string of the action configuration
    pub user_parameters: Option<String>,
}

/// Deployment-level settings for the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSettings {
    pub region: String,
    pub key_prefix: String,
    pub link_expiry: Duration,
    /// Approval page; the presigned URL is appended as a fragment
    pub web_url: Option<String>,
    pub detect_drift: bool,
    pub drift_policy: DriftPolicy,
    pub build_timeout: Duration,
    /// Acknowledge the job as soon as the package is published. When off,
    /// the job stays open until the reviewer acknowledges it with the
    /// delegated credentials.
    pub report_success_on_publish: bool,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            key_prefix: "approvals/".to_string(),
            link_expiry: Duration::from_secs(1800),
            web_url: None,
            detect_drift: true,
            drift_policy: DriftPolicy::default(),
            build_timeout: Duration::from_secs(840),
            report_success_on_publish: true,
        }
    }
}

/// Services the gate depends on
#[derive(Clone)]
pub struct Collaborators {
    pub cloudformation: Arc<dyn CloudFormationApi>,
    pub store: Arc<dyn ReviewStore>,
    pub credentials: Arc<dyn CredentialIssuer>,
    pub notifier: Arc<dyn Notifier>,
    pub pipeline: Arc<dyn PipelineApi>,
}

/// What an invocation ended with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateOutcome {
    /// No stack had a pending change set; the job was acknowledged
    NoChanges,
    /// A review package was stored and linked
    Published {
        key: String,
        link: String,
        stacks: usize,
        notified: bool,
        acknowledged: bool,
    },
    /// A failure was reported to the pipeline
    Failed {
        kind: &'static str,
        message: &'static str,
    },
}

/// Run the gate for one job. Never fails: errors become a job-failure report.
pub async fn run_job(
    request: &JobRequest,
    settings: &GateSettings,
    collaborators: &Collaborators,
) -> GateOutcome {
    info!(job_id = %request.job_id, "Processing approval job");

    match review(request, settings, collaborators).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(
                job_id = %request.job_id,
                kind = err.kind(),
                error = %err,
                "Approval job failed"
            );
            if let Err(report_err) = collaborators
                .pipeline
                .put_job_failure(&request.job_id, err.failure_message())
                .await
            {
                error!(
                    job_id = %request.job_id,
                    error = %report_err,
                    "Failed to report job failure"
                );
            }
            GateOutcome::Failed {
                kind: err.kind(),
                message: err.failure_message(),
            }
        }
    }
}

async fn review(
    request: &JobRequest,
    settings: &GateSettings,
    collaborators: &Collaborators,
) -> Result<GateOutcome> {
    let params = UserParameters::parse(request.user_parameters.as_deref())?;

    let references = collect(collaborators.cloudformation.as_ref(), &params.stacks).await?;
    if references.is_empty() {
        info!(job_id = %request.job_id, "No pending change sets, approving job");
        collaborators.pipeline.put_job_success(&request.job_id).await?;
        return Ok(GateOutcome::NoChanges);
    }

    let details = collaborators.pipeline.job_details(&request.job_id).await?;
    let job = JobContext {
        job_id: request.job_id.clone(),
        account_id: request.account_id.clone(),
        pipeline_name: details.pipeline_name,
        region: settings.region.clone(),
    };
    let options = BuildOptions {
        detect_drift: params.detect_drift.unwrap_or(settings.detect_drift),
        drift_policy: settings.drift_policy,
    };

    let builder = ReviewPackageBuilder::new(
        collaborators.cloudformation.as_ref(),
        collaborators.credentials.as_ref(),
        options,
    );
    let package = tokio::time::timeout(settings.build_timeout, builder.build(&references, &job))
        .await
        .map_err(|_| ApprovalError::DeadlineExceeded(settings.build_timeout))??;

    let key = review_key(&settings.key_prefix, &job.job_id);
    let body = serde_json::to_vec(&package).map_err(|e| ApprovalError::publish(e.to_string()))?;
    collaborators.store.put_review(&key, body).await?;
    let presigned = collaborators
        .store
        .presign_review(&key, settings.link_expiry)
        .await?;
    let link = review_link(settings.web_url.as_deref(), &presigned);
    info!(job_id = %job.job_id, key = %key, "Review package published");

    let notified = match params.topic_arn.as_deref() {
        Some(topic_arn) => {
            collaborators
                .notifier
                .publish(
                    topic_arn,
                    &notification_subject(&package),
                    &notification_message(&package, &link),
                )
                .await?;
            true
        }
        None => false,
    };

    let acknowledged = settings.report_success_on_publish
        && acknowledge(collaborators, &job.job_id, notified).await?;

    Ok(GateOutcome::Published {
        key,
        link,
        stacks: package.stacks.len(),
        notified,
        acknowledged,
    })
}

/// Report job success once the review is out. After the reviewer has been
/// notified a failed report leaves the job open for them instead of
/// failing it.
async fn acknowledge(collaborators: &Collaborators, job_id: &str, notified: bool) -> Result<bool> {
    match collaborators.pipeline.put_job_success(job_id).await {
        Ok(()) => Ok(true),
        Err(err) if notified => {
            error!(
                job_id = %job_id,
                error = %err,
                "Failed to acknowledge job after notifying reviewer, leaving it open"
            );
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Object key of a job's review document
pub fn review_key(prefix: &str, job_id: &str) -> String {
    format!("{}{}.json", prefix, job_id)
}

/// Reviewer-facing link. With an approval page configured the presigned URL
/// (minus its scheme) travels in the page's fragment.
pub fn review_link(web_url: Option<&str>, presigned_url: &str) -> String {
    match web_url {
        Some(web_url) => {
            let target = presigned_url
                .split_once("//")
                .map(|(_, rest)| rest)
                .unwrap_or(presigned_url);
            format!("{}#/{}", web_url, target)
        }
        None => presigned_url.to_string(),
    }
}

pub fn notification_subject(package: &ReviewPackage) -> String {
    let subject = format!(
        "Approval required: CodePipeline {} ({})",
        package.pipeline.pipeline_name, package.pipeline.region
    );
    subject.chars().take(MAX_SUBJECT_CHARS).collect()
}

pub fn notification_message(package: &ReviewPackage, link: &str) -> String {
    format!(
        "Please approve or reject changes for {}\n\n{}",
        package.stack_names(),
        link
    )
}
