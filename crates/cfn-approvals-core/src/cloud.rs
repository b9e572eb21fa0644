//! Collaborator interfaces and the typed shapes of their responses
//!
//! Every cloud service the gate talks to sits behind one of these traits so
//! the package builder and job gate can run against in-memory fakes. Adapters
//! convert SDK responses into the structs below before anything else sees
//! them.

use crate::drift::ResourceDriftStatus;
use crate::error::Result;
use crate::model::{Change, DelegatedCredentials};
use crate::template::TemplateBody;
use async_trait::async_trait;
use std::time::Duration;

/// Stack status of a stack created by a change set and never executed
pub const REVIEW_IN_PROGRESS: &str = "REVIEW_IN_PROGRESS";

/// Change-set execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Available,
    Unavailable,
    ExecuteInProgress,
    ExecuteComplete,
    ExecuteFailed,
    Obsolete,
    Other(String),
}

impl ExecutionStatus {
    pub fn from_api(value: &str) -> Self {
        match value {
            "AVAILABLE" => Self::Available,
            "UNAVAILABLE" => Self::Unavailable,
            "EXECUTE_IN_PROGRESS" => Self::ExecuteInProgress,
            "EXECUTE_COMPLETE" => Self::ExecuteComplete,
            "EXECUTE_FAILED" => Self::ExecuteFailed,
            "OBSOLETE" => Self::Obsolete,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Unavailable => "UNAVAILABLE",
            Self::ExecuteInProgress => "EXECUTE_IN_PROGRESS",
            Self::ExecuteComplete => "EXECUTE_COMPLETE",
            Self::ExecuteFailed => "EXECUTE_FAILED",
            Self::Obsolete => "OBSOLETE",
            Self::Other(value) => value,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a stack's change-set listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetSummary {
    pub change_set_id: String,
    pub execution_status: ExecutionStatus,
}

/// Stack or change-set parameter value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackParameter {
    pub key: String,
    pub value: Option<String>,
    pub use_previous_value: bool,
}

impl StackParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            use_previous_value: false,
        }
    }
}

/// Parameter declared by a deployed template (from the template summary)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclaration {
    pub key: String,
    pub default_value: Option<String>,
}

/// Full description of one change set
#[derive(Debug, Clone)]
pub struct ChangeSetDetail {
    pub stack_name: String,
    pub parameters: Vec<StackParameter>,
    pub changes: Vec<Change>,
}

/// Live stack description
#[derive(Debug, Clone)]
pub struct StackDetail {
    pub stack_name: String,
    pub status: String,
    pub parameters: Vec<StackParameter>,
}

impl StackDetail {
    /// True when the stack only exists as the target of an unexecuted change set
    pub fn is_review_in_progress(&self) -> bool {
        self.status == REVIEW_IN_PROGRESS
    }
}

/// Drift detection progress as reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionState {
    InProgress,
    Complete,
    Failed,
    Other(String),
}

impl DetectionState {
    pub fn from_api(value: &str) -> Self {
        match value {
            "DETECTION_IN_PROGRESS" => Self::InProgress,
            "DETECTION_COMPLETE" => Self::Complete,
            "DETECTION_FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Snapshot of a drift detection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionStatus {
    pub state: DetectionState,
    /// Stack-level drift status, only meaningful once the run is complete
    pub stack_drift_status: Option<String>,
    pub reason: Option<String>,
}

/// Drift of a single stack resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDrift {
    pub logical_resource_id: String,
    pub physical_resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub status: ResourceDriftStatus,
    pub expected_properties: Option<String>,
    pub actual_properties: Option<String>,
}

/// Pipeline job details needed for the review package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub pipeline_name: String,
}

/// Change-management service (CloudFormation)
#[async_trait]
pub trait CloudFormationApi: Send + Sync {
    /// All change sets of a stack, in service order
    async fn list_change_sets(&self, stack_name: &str) -> Result<Vec<ChangeSetSummary>>;

    async fn describe_change_set(&self, change_set_id: &str) -> Result<ChangeSetDetail>;

    async fn describe_stack(&self, stack_name: &str) -> Result<StackDetail>;

    /// Processed template of a change set
    async fn change_set_template(&self, change_set_id: &str) -> Result<TemplateBody>;

    /// Processed template currently deployed for a stack
    async fn stack_template(&self, stack_name: &str) -> Result<TemplateBody>;

    /// Parameters declared by the deployed template, with defaults
    async fn template_parameters(&self, stack_name: &str) -> Result<Vec<ParameterDeclaration>>;

    /// Start a drift detection run, returning its id
    async fn detect_stack_drift(&self, stack_name: &str) -> Result<String>;

    async fn drift_detection_status(&self, detection_id: &str) -> Result<DetectionStatus>;

    async fn resource_drifts(&self, stack_name: &str) -> Result<Vec<ResourceDrift>>;
}

/// Object storage for review documents
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn put_review(&self, key: &str, body: Vec<u8>) -> Result<()>;

    /// Time-limited GET URL for a stored review document
    async fn presign_review(&self, key: &str, expires_in: Duration) -> Result<String>;
}

/// Issues credentials that can only acknowledge one pipeline job
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue_job_credentials(&self, job_id: &str) -> Result<DelegatedCredentials>;
}

/// Pub/sub notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<()>;
}

/// Pipeline job acknowledgement
#[async_trait]
pub trait PipelineApi: Send + Sync {
    async fn job_details(&self, job_id: &str) -> Result<JobDetails>;

    async fn put_job_success(&self, job_id: &str) -> Result<()>;

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_status_round_trips_unknown_values() {
        assert_eq!(
            ExecutionStatus::from_api("AVAILABLE"),
            ExecutionStatus::Available
        );
        let other = ExecutionStatus::from_api("PENDING_SOMETHING");
        assert_eq!(other.as_str(), "PENDING_SOMETHING");
    }

    #[test]
    fn test_detection_state_from_api() {
        assert_eq!(
            DetectionState::from_api("DETECTION_IN_PROGRESS"),
            DetectionState::InProgress
        );
        assert_eq!(
            DetectionState::from_api("DETECTION_COMPLETE"),
            DetectionState::Complete
        );
        assert_eq!(
            DetectionState::from_api("DETECTION_FAILED"),
            DetectionState::Failed
        );
        assert_eq!(
            DetectionState::from_api("SOMETHING_ELSE"),
            DetectionState::Other("SOMETHING_ELSE".into())
        );
    }

    #[test]
    fn test_review_in_progress() {
        let stack = StackDetail {
            stack_name: "app".into(),
            status: REVIEW_IN_PROGRESS.into(),
            parameters: vec![],
        };
        assert!(stack.is_review_in_progress());
    }
}
