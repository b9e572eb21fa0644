use crate::{error_context, text};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::primitives::DateTime;
use aws_sdk_sts::Client;
use cfn_approvals_core::{ApprovalError, CredentialIssuer, DelegatedCredentials, Result};
use serde_json::json;
use std::time::Duration;
use tracing::info;

const SESSION_PREFIX: &str = "pipeline-changes-";

/// STS caps role session names at this length
const MAX_SESSION_NAME: usize = 64;

/// Mints short-lived credentials that can only report the pipeline job result
#[derive(Clone)]
pub struct StsCredentialIssuer {
    client: Client,
    role_arn: String,
    duration: Duration,
}

impl StsCredentialIssuer {
    pub fn new(sdk_config: &SdkConfig, role_arn: String, duration: Duration) -> Self {
        Self {
            client: Client::new(sdk_config),
            role_arn,
            duration,
        }
    }
}

/// Session policy restricting the assumed role to job result reporting
pub fn job_policy() -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": [
                "codepipeline:PutJobFailureResult",
                "codepipeline:PutJobSuccessResult",
                "codepipeline:GetJobDetails"
            ],
            "Resource": "*"
        }]
    })
}

/// Role session name for a job, trimmed to the STS limit
pub fn session_name(job_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, job_id)
        .chars()
        .take(MAX_SESSION_NAME)
        .collect()
}

#[async_trait]
impl CredentialIssuer for StsCredentialIssuer {
    async fn issue_job_credentials(&self, job_id: &str) -> Result<DelegatedCredentials> {
        let resp = self
            .client
            .assume_role()
            .role_arn(&self.role_arn)
            .role_session_name(session_name(job_id))
            .policy(job_policy().to_string())
            .duration_seconds(i32::try_from(self.duration.as_secs()).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(&self.role_arn, error_context(&e)))?;

        let credentials = resp
            .credentials()
            .ok_or_else(|| ApprovalError::lookup(&self.role_arn, "no credentials returned"))?;

        let missing = || ApprovalError::lookup(&self.role_arn, "incomplete credentials returned");
        let issued = DelegatedCredentials {
            access_key_id: text(credentials.access_key_id()).ok_or_else(missing)?,
            secret_access_key: text(credentials.secret_access_key()).ok_or_else(missing)?,
            session_token: text(credentials.session_token()).ok_or_else(missing)?,
            expiration: rfc3339(credentials.expiration()),
        };

        info!(
            job_id = %job_id,
            access_key_id = %issued.access_key_id,
            "Issued job credentials"
        );
        Ok(issued)
    }
}

fn rfc3339<'a>(value: impl Into<Option<&'a DateTime>>) -> Option<String> {
    let value = value.into()?;
    chrono::DateTime::from_timestamp(value.secs(), value.subsec_nanos()).map(|t| t.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_allows_only_job_reporting() {
        let policy = job_policy();
        let statements = policy["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0]["Effect"], "Allow");
        assert_eq!(statements[0]["Resource"], "*");
        let actions: Vec<_> = statements[0]["Action"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        assert_eq!(
            actions,
            vec![
                "codepipeline:PutJobFailureResult",
                "codepipeline:PutJobSuccessResult",
                "codepipeline:GetJobDetails"
            ]
        );
    }

    #[test]
    fn test_session_name() {
        assert_eq!(session_name("abc"), "pipeline-changes-abc");
        let long = session_name(&"x".repeat(100));
        assert_eq!(long.len(), MAX_SESSION_NAME);
        assert!(long.starts_with(SESSION_PREFIX));
    }

    #[test]
    fn test_expiration_format() {
        let expiry = DateTime::from_secs(1_700_000_000);
        assert_eq!(
            rfc3339(&expiry).as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );
        assert_eq!(rfc3339(None::<&DateTime>), None);
    }
}
