//! In-memory collaborators for gate and package tests
//!
//! Each fake records the calls it receives so tests can assert on side
//! effects (stored documents, notifications, job results) without any cloud
//! access.

#![allow(dead_code)]

use async_trait::async_trait;
use cfn_approvals_core::{
    ApprovalError, ChangeSetDetail, ChangeSetSummary, CloudFormationApi, Collaborators,
    CredentialIssuer, DelegatedCredentials, DetectionState, DetectionStatus, ExecutionStatus,
    JobDetails, Notifier, ParameterDeclaration, PipelineApi, ResourceDrift, Result, ReviewStore,
    StackDetail, StackParameter, TemplateBody,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A stack known to the fake CloudFormation service
#[derive(Clone)]
pub struct FakeStack {
    pub status: String,
    pub parameters: Vec<StackParameter>,
    pub template: TemplateBody,
    pub declarations: Vec<ParameterDeclaration>,
    pub change_sets: Vec<ChangeSetSummary>,
    pub resource_drifts: Vec<ResourceDrift>,
}

impl FakeStack {
    pub fn deployed(template: TemplateBody) -> Self {
        Self {
            status: "UPDATE_COMPLETE".to_string(),
            parameters: Vec::new(),
            template,
            declarations: Vec::new(),
            change_sets: Vec::new(),
            resource_drifts: Vec::new(),
        }
    }

    pub fn new_stack() -> Self {
        Self {
            status: "REVIEW_IN_PROGRESS".to_string(),
            ..Self::deployed(TemplateBody::empty())
        }
    }
}

struct PendingChangeSet {
    detail: ChangeSetDetail,
    template: TemplateBody,
}

#[derive(Default)]
pub struct FakeCloudFormation {
    stacks: Mutex<HashMap<String, FakeStack>>,
    change_sets: Mutex<HashMap<String, PendingChangeSet>>,
    detection_script: Mutex<VecDeque<DetectionStatus>>,
    pub status_polls: AtomicU32,
    pub detections_started: Mutex<Vec<String>>,
}

impl FakeCloudFormation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stack(&self, name: &str, stack: FakeStack) {
        self.stacks.lock().unwrap().insert(name.to_string(), stack);
    }

    /// Register a change set against an existing stack
    pub fn add_change_set(
        &self,
        stack_name: &str,
        change_set_id: &str,
        status: &str,
        parameters: Vec<StackParameter>,
        template: TemplateBody,
    ) {
        let mut stacks = self.stacks.lock().unwrap();
        let stack = stacks.get_mut(stack_name).expect("stack registered first");
        stack.change_sets.push(ChangeSetSummary {
            change_set_id: change_set_id.to_string(),
            execution_status: ExecutionStatus::from_api(status),
        });
        self.change_sets.lock().unwrap().insert(
            change_set_id.to_string(),
            PendingChangeSet {
                detail: ChangeSetDetail {
                    stack_name: stack_name.to_string(),
                    parameters,
                    changes: Vec::new(),
                },
                template,
            },
        );
    }

    /// Statuses returned by successive drift status polls
    pub fn script_detection(&self, statuses: Vec<DetectionStatus>) {
        *self.detection_script.lock().unwrap() = statuses.into();
    }

    fn stack(&self, name: &str) -> Result<FakeStack> {
        self.stacks
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                ApprovalError::lookup(name, format!("Stack with id {} does not exist", name))
            })
    }
}

pub fn detection(state: DetectionState, drift: Option<&str>) -> DetectionStatus {
    DetectionStatus {
        state,
        stack_drift_status: drift.map(str::to_string),
        reason: None,
    }
}

#[async_trait]
impl CloudFormationApi for FakeCloudFormation {
    async fn list_change_sets(&self, stack_name: &str) -> Result<Vec<ChangeSetSummary>> {
        Ok(self.stack(stack_name)?.change_sets)
    }

    async fn describe_change_set(&self, change_set_id: &str) -> Result<ChangeSetDetail> {
        self.change_sets
            .lock()
            .unwrap()
            .get(change_set_id)
            .map(|c| c.detail.clone())
            .ok_or_else(|| ApprovalError::lookup(change_set_id, "ChangeSetNotFound"))
    }

    async fn describe_stack(&self, stack_name: &str) -> Result<StackDetail> {
        let stack = self.stack(stack_name)?;
        Ok(StackDetail {
            stack_name: stack_name.to_string(),
            status: stack.status,
            parameters: stack.parameters,
        })
    }

    async fn change_set_template(&self, change_set_id: &str) -> Result<TemplateBody> {
        self.change_sets
            .lock()
            .unwrap()
            .get(change_set_id)
            .map(|c| c.template.clone())
            .ok_or_else(|| ApprovalError::lookup(change_set_id, "ChangeSetNotFound"))
    }

    async fn stack_template(&self, stack_name: &str) -> Result<TemplateBody> {
        Ok(self.stack(stack_name)?.template)
    }

    async fn template_parameters(&self, stack_name: &str) -> Result<Vec<ParameterDeclaration>> {
        Ok(self.stack(stack_name)?.declarations)
    }

    async fn detect_stack_drift(&self, stack_name: &str) -> Result<String> {
        self.stack(stack_name)?;
        self.detections_started
            .lock()
            .unwrap()
            .push(stack_name.to_string());
        Ok(format!("detection-{}", stack_name))
    }

    async fn drift_detection_status(&self, _detection_id: &str) -> Result<DetectionStatus> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let next = self.detection_script.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| detection(DetectionState::Complete, Some("IN_SYNC"))))
    }

    async fn resource_drifts(&self, stack_name: &str) -> Result<Vec<ResourceDrift>> {
        Ok(self.stack(stack_name)?.resource_drifts)
    }
}

/// Object store keeping documents in memory
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_puts: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn document(&self, key: &str) -> Option<serde_json::Value> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|body| serde_json::from_slice(body).unwrap())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn put_review(&self, key: &str, body: Vec<u8>) -> Result<()> {
        if self.fail_puts {
            return Err(ApprovalError::publish("AccessDenied"));
        }
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn presign_review(&self, key: &str, expires_in: Duration) -> Result<String> {
        Ok(format!(
            "https://s3.amazonaws.com/reviews/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }
}

pub struct StaticCredentials;

#[async_trait]
impl CredentialIssuer for StaticCredentials {
    async fn issue_job_credentials(&self, job_id: &str) -> Result<DelegatedCredentials> {
        Ok(DelegatedCredentials {
            access_key_id: "ASIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: format!("session-{}", job_id),
            expiration: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic_arn: String,
    pub subject: String,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Notification {
            topic_arn: topic_arn.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Success(String),
    Failure(String, String),
}

pub struct RecordingPipeline {
    pub pipeline_name: String,
    pub results: Mutex<Vec<JobResult>>,
    pub reject_success: bool,
}

impl Default for RecordingPipeline {
    fn default() -> Self {
        Self {
            pipeline_name: "release".to_string(),
            results: Mutex::new(Vec::new()),
            reject_success: false,
        }
    }
}

impl RecordingPipeline {
    /// A pipeline whose success reports fail
    pub fn rejecting_success() -> Self {
        Self {
            reject_success: true,
            ..Self::default()
        }
    }

    pub fn results(&self) -> Vec<JobResult> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait]
impl PipelineApi for RecordingPipeline {
    async fn job_details(&self, _job_id: &str) -> Result<JobDetails> {
        Ok(JobDetails {
            pipeline_name: self.pipeline_name.clone(),
        })
    }

    async fn put_job_success(&self, job_id: &str) -> Result<()> {
        if self.reject_success {
            return Err(ApprovalError::publish("InvalidJobStateException"));
        }
        self.results
            .lock()
            .unwrap()
            .push(JobResult::Success(job_id.to_string()));
        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<()> {
        self.results
            .lock()
            .unwrap()
            .push(JobResult::Failure(job_id.to_string(), message.to_string()));
        Ok(())
    }
}

/// All fakes wired together
pub struct Fixture {
    pub cloudformation: Arc<FakeCloudFormation>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub pipeline: Arc<RecordingPipeline>,
}

impl Fixture {
    pub fn new(cloudformation: FakeCloudFormation) -> Self {
        Self::with_store(cloudformation, MemoryStore::default())
    }

    pub fn with_store(cloudformation: FakeCloudFormation, store: MemoryStore) -> Self {
        Self {
            cloudformation: Arc::new(cloudformation),
            store: Arc::new(store),
            notifier: Arc::new(RecordingNotifier::default()),
            pipeline: Arc::new(RecordingPipeline::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            cloudformation: self.cloudformation.clone(),
            store: self.store.clone(),
            credentials: Arc::new(StaticCredentials),
            notifier: self.notifier.clone(),
            pipeline: self.pipeline.clone(),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.sent.lock().unwrap().clone()
    }
}
