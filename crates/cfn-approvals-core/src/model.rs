//! Review package document model
//!
//! Field names serialize in PascalCase; the approval web page reads them
//! as-is.

use crate::drift::{DriftStatus, ResourceDriftStatus};
use serde::Serialize;

/// Schema tag written into every review package
pub const REVIEW_SCHEMA_VERSION: &str = "1";

/// Pending change set selected for review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetReference {
    pub change_set_id: String,
    pub stack_name: String,
}

/// One reconciled parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterRow {
    pub name: String,
    pub default: Option<String>,
    pub current_value: Option<String>,
    pub new_value: Option<String>,
}

/// Drift outcome of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriftRecord {
    pub logical_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub drift_status: ResourceDriftStatus,
    pub actual_properties: String,
    pub expected_properties: String,
    pub properties_diff: String,
}

/// Proposed change from a change-set description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_invocation_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_change: Option<ResourceChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChange {
    /// `Delete`, `Retain` or `Snapshot` for removed resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    pub scope: Vec<String>,
    pub details: Vec<ResourceChangeDetail>,
    /// Nested stack change set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_info: Option<ModuleInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hierarchy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_id_hierarchy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChangeDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ResourceTargetDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causing_entity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceTargetDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_recreation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_change_type: Option<String>,
}

/// Everything a reviewer needs to judge one change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackReport {
    pub stack_name: String,
    pub change_set_id: String,
    pub parameters: Vec<ParameterRow>,
    pub template_diff: String,
    pub changes: Vec<Change>,
    pub old_template: String,
    pub drift_status: Option<DriftStatus>,
    pub drifts: Vec<DriftRecord>,
}

/// Pipeline the job belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineContext {
    pub region: String,
    pub job_id: String,
    pub pipeline_name: String,
    pub account_id: String,
}

/// Short-lived credentials allowing the reviewer to acknowledge the job
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DelegatedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// RFC 3339 expiry, when the issuer reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl std::fmt::Debug for DelegatedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Top-level review document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReviewPackage {
    pub version: &'static str,
    pub pipeline: PipelineContext,
    pub credentials: DelegatedCredentials,
    pub stacks: Vec<StackReport>,
}

impl ReviewPackage {
    /// Comma-separated stack names, in report order
    pub fn stack_names(&self) -> String {
        self.stacks
            .iter()
            .map(|s| s.stack_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
