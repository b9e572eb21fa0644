use crate::{error_context, text};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_codepipeline::types::{FailureDetails, FailureType};
use aws_sdk_codepipeline::Client;
use cfn_approvals_core::{ApprovalError, JobDetails, PipelineApi, Result};
use tracing::info;

/// Reads job details and reports job results to CodePipeline
#[derive(Clone)]
pub struct CodePipelineClient {
    client: Client,
}

impl CodePipelineClient {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

/// Failure details as shown in the pipeline console
fn failure_details(message: &str) -> Result<FailureDetails> {
    FailureDetails::builder()
        .r#type(FailureType::JobFailed)
        .message(message)
        .build()
        .map_err(|e| ApprovalError::publish(e.to_string()))
}

#[async_trait]
impl PipelineApi for CodePipelineClient {
    async fn job_details(&self, job_id: &str) -> Result<JobDetails> {
        let resp = self
            .client
            .get_job_details()
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(job_id, error_context(&e)))?;

        let pipeline_name = resp
            .job_details()
            .and_then(|details| details.data())
            .and_then(|data| data.pipeline_context())
            .and_then(|context| text(context.pipeline_name()))
            .ok_or_else(|| ApprovalError::lookup(job_id, "job has no pipeline context"))?;

        Ok(JobDetails { pipeline_name })
    }

    async fn put_job_success(&self, job_id: &str) -> Result<()> {
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| ApprovalError::publish(error_context(&e)))?;

        info!(job_id = %job_id, "Reported job success");
        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<()> {
        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(failure_details(message)?)
            .send()
            .await
            .map_err(|e| ApprovalError::publish(error_context(&e)))?;

        info!(job_id = %job_id, message = %message, "Reported job failure");
        Ok(())
    }
}
