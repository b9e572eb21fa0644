//! CloudFormation change-set review packages
//!
//! Turns the pending change sets of a list of stacks into one review
//! document: canonical template diffs, reconciled parameters and drift
//! status per stack, plus credentials that let the reviewer acknowledge the
//! pipeline job. Cloud services are reached through the traits in [`cloud`];
//! the `cfn-approvals-aws` crate provides the SDK-backed implementations.

pub mod cloud;
pub mod collector;
pub mod diff;
pub mod drift;
pub mod error;
pub mod gate;
pub mod model;
pub mod package;
pub mod parameters;
pub mod template;
pub mod user_params;

pub use cloud::{
    ChangeSetDetail, ChangeSetSummary, CloudFormationApi, CredentialIssuer, DetectionState,
    DetectionStatus, ExecutionStatus, JobDetails, Notifier, ParameterDeclaration, PipelineApi,
    ResourceDrift, ReviewStore, StackDetail, StackParameter, REVIEW_IN_PROGRESS,
};
pub use collector::collect;
pub use diff::unified_diff;
pub use drift::{inspect_drift, DriftInspection, DriftPolicy, DriftStatus, ResourceDriftStatus};
pub use error::{ApprovalError, Result};
pub use gate::{run_job, Collaborators, GateOutcome, GateSettings, JobRequest};
pub use model::{
    Change, ChangeSetReference, DelegatedCredentials, DriftRecord, ModuleInfo, ParameterRow,
    PipelineContext, ResourceChange, ResourceChangeDetail, ResourceTargetDefinition,
    ReviewPackage, StackReport, REVIEW_SCHEMA_VERSION,
};
pub use package::{BuildOptions, JobContext, ReviewPackageBuilder};
pub use parameters::{reconcile, ParameterSet};
pub use template::{canonicalize, TemplateBody};
pub use user_params::UserParameters;
