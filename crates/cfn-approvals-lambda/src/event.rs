// CodePipeline job invocation payload
//
// Only the fields the gate reads are modelled; artifacts and artifact
// credentials are ignored.

use cfn_approvals_core::JobRequest;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CodePipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: CodePipelineJob,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePipelineJob {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub data: JobData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    #[serde(default)]
    pub action_configuration: ActionConfiguration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionConfiguration {
    #[serde(default)]
    pub configuration: ActionSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionSettings {
    #[serde(default)]
    pub user_parameters: Option<String>,
}

impl From<CodePipelineEvent> for JobRequest {
    fn from(event: CodePipelineEvent) -> Self {
        let job = event.job;
        JobRequest {
            job_id: job.id,
            account_id: job.account_id,
            user_parameters: job.data.action_configuration.configuration.user_parameters,
        }
    }
}
