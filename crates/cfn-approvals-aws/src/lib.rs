//! AWS SDK implementations of the approval gate's service traits
//!
//! Every client wraps one SDK client and converts its responses into the
//! plain types of `cfn_approvals_core::cloud`. SDK errors are rendered with
//! their full context into `ApprovalError`; nothing SDK-specific leaks past
//! this crate.

use aws_config::SdkConfig;
use cfn_approvals_config::RuntimeConfig;
use cfn_approvals_core::Collaborators;
use std::sync::Arc;

mod cloudformation;
mod codepipeline;
mod s3;
mod sns;
mod sts;

pub use cloudformation::CloudFormationClient;
pub use codepipeline::CodePipelineClient;
pub use s3::S3ReviewStore;
pub use sns::SnsNotifier;
pub use sts::{job_policy, session_name, StsCredentialIssuer};

/// Build SDK-backed collaborators sharing one loaded AWS configuration
pub fn collaborators(sdk_config: &SdkConfig, config: &RuntimeConfig) -> Collaborators {
    Collaborators {
        cloudformation: Arc::new(CloudFormationClient::new(sdk_config)),
        store: Arc::new(S3ReviewStore::new(sdk_config, &config.storage)),
        credentials: Arc::new(StsCredentialIssuer::new(
            sdk_config,
            config.role_arn.clone(),
            config.job.credential_duration(),
        )),
        notifier: Arc::new(SnsNotifier::new(sdk_config)),
        pipeline: Arc::new(CodePipelineClient::new(sdk_config)),
    }
}

/// Render an SDK error with its whole source chain
fn error_context<E: std::error::Error>(err: &E) -> String {
    aws_sdk_cloudformation::error::DisplayErrorContext(err).to_string()
}

/// Owned copy of an optional or required string member
fn text<'a>(value: impl Into<Option<&'a str>>) -> Option<String> {
    value.into().map(str::to_string)
}

/// Wire value of an optional or required SDK enum member
fn enum_text<'a, T: AsRef<str> + 'a>(value: impl Into<Option<&'a T>>) -> Option<String> {
    value.into().map(|v| v.as_ref().to_string())
}
