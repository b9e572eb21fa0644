use crate::{enum_text, error_context, text};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::types::{self as cfn, TemplateStage};
use aws_sdk_cloudformation::Client;
use cfn_approvals_core::cloud::{
    ChangeSetDetail, ChangeSetSummary, CloudFormationApi, DetectionState, DetectionStatus,
    ExecutionStatus, ParameterDeclaration, ResourceDrift, StackDetail, StackParameter,
};
use cfn_approvals_core::model::{
    Change, ModuleInfo, ResourceChange, ResourceChangeDetail, ResourceTargetDefinition,
};
use cfn_approvals_core::{ApprovalError, ResourceDriftStatus, Result, TemplateBody};
use tracing::debug;

/// CloudFormation read access plus drift detection
#[derive(Clone)]
pub struct CloudFormationClient {
    client: Client,
}

impl CloudFormationClient {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl CloudFormationApi for CloudFormationClient {
    async fn list_change_sets(&self, stack_name: &str) -> Result<Vec<ChangeSetSummary>> {
        let mut summaries = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_change_sets()
                .stack_name(stack_name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ApprovalError::lookup(stack_name, error_context(&e)))?;

            summaries.extend(resp.summaries().iter().filter_map(change_set_summary));

            match text(resp.next_token()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!(stack = %stack_name, count = summaries.len(), "Listed change sets");
        Ok(summaries)
    }

    async fn describe_change_set(&self, change_set_id: &str) -> Result<ChangeSetDetail> {
        let mut detail: Option<ChangeSetDetail> = None;
        let mut next_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .describe_change_set()
                .change_set_name(change_set_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ApprovalError::lookup(change_set_id, error_context(&e)))?;

            let changes = resp.changes().iter().map(change);
            match detail.as_mut() {
                Some(detail) => detail.changes.extend(changes),
                None => {
                    detail = Some(ChangeSetDetail {
                        stack_name: text(resp.stack_name()).ok_or_else(|| {
                            ApprovalError::lookup(change_set_id, "change set has no stack name")
                        })?,
                        parameters: resp.parameters().iter().filter_map(parameter).collect(),
                        changes: changes.collect(),
                    })
                }
            }

            match text(resp.next_token()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        detail.ok_or_else(|| ApprovalError::lookup(change_set_id, "empty change set description"))
    }

    async fn describe_stack(&self, stack_name: &str) -> Result<StackDetail> {
        let resp = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(stack_name, error_context(&e)))?;

        let stack = resp
            .stacks()
            .first()
            .ok_or_else(|| ApprovalError::lookup(stack_name, "stack not found"))?;

        Ok(StackDetail {
            stack_name: text(stack.stack_name()).unwrap_or_else(|| stack_name.to_string()),
            status: enum_text(stack.stack_status()).unwrap_or_default(),
            parameters: stack.parameters().iter().filter_map(parameter).collect(),
        })
    }

    async fn change_set_template(&self, change_set_id: &str) -> Result<TemplateBody> {
        let resp = self
            .client
            .get_template()
            .change_set_name(change_set_id)
            .template_stage(TemplateStage::Processed)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(change_set_id, error_context(&e)))?;

        Ok(text(resp.template_body())
            .map(TemplateBody::from_api)
            .unwrap_or_else(TemplateBody::empty))
    }

    async fn stack_template(&self, stack_name: &str) -> Result<TemplateBody> {
        let resp = self
            .client
            .get_template()
            .stack_name(stack_name)
            .template_stage(TemplateStage::Processed)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(stack_name, error_context(&e)))?;

        Ok(text(resp.template_body())
            .map(TemplateBody::from_api)
            .unwrap_or_else(TemplateBody::empty))
    }

    async fn template_parameters(&self, stack_name: &str) -> Result<Vec<ParameterDeclaration>> {
        let resp = self
            .client
            .get_template_summary()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(stack_name, error_context(&e)))?;

        Ok(resp
            .parameters()
            .iter()
            .filter_map(|p| {
                Some(ParameterDeclaration {
                    key: text(p.parameter_key())?,
                    default_value: text(p.default_value()),
                })
            })
            .collect())
    }

    async fn detect_stack_drift(&self, stack_name: &str) -> Result<String> {
        let resp = self
            .client
            .detect_stack_drift()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(stack_name, error_context(&e)))?;

        text(resp.stack_drift_detection_id())
            .ok_or_else(|| ApprovalError::lookup(stack_name, "no drift detection id returned"))
    }

    async fn drift_detection_status(&self, detection_id: &str) -> Result<DetectionStatus> {
        let resp = self
            .client
            .describe_stack_drift_detection_status()
            .stack_drift_detection_id(detection_id)
            .send()
            .await
            .map_err(|e| ApprovalError::lookup(detection_id, error_context(&e)))?;

        let state = enum_text(resp.detection_status()).unwrap_or_default();
        Ok(DetectionStatus {
            state: DetectionState::from_api(&state),
            stack_drift_status: enum_text(resp.stack_drift_status()),
            reason: text(resp.detection_status_reason()),
        })
    }

    async fn resource_drifts(&self, stack_name: &str) -> Result<Vec<ResourceDrift>> {
        let mut drifts = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .describe_stack_resource_drifts()
                .stack_name(stack_name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ApprovalError::lookup(stack_name, error_context(&e)))?;

            drifts.extend(resp.stack_resource_drifts().iter().map(resource_drift));

            match text(resp.next_token()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(drifts)
    }
}

fn change_set_summary(summary: &cfn::ChangeSetSummary) -> Option<ChangeSetSummary> {
    Some(ChangeSetSummary {
        change_set_id: text(summary.change_set_id())?,
        execution_status: ExecutionStatus::from_api(
            &enum_text(summary.execution_status()).unwrap_or_default(),
        ),
    })
}

fn parameter(param: &cfn::Parameter) -> Option<StackParameter> {
    Some(StackParameter {
        key: text(param.parameter_key())?,
        value: text(param.parameter_value()),
        use_previous_value: param.use_previous_value().unwrap_or(false),
    })
}

fn change(change: &cfn::Change) -> Change {
    Change {
        change_type: enum_text(change.r#type()),
        hook_invocation_count: change.hook_invocation_count(),
        resource_change: change.resource_change().map(resource_change),
    }
}

fn resource_change(rc: &cfn::ResourceChange) -> ResourceChange {
    ResourceChange {
        policy_action: enum_text(rc.policy_action()),
        action: enum_text(rc.action()),
        logical_resource_id: text(rc.logical_resource_id()),
        physical_resource_id: text(rc.physical_resource_id()),
        resource_type: text(rc.resource_type()),
        replacement: enum_text(rc.replacement()),
        scope: rc.scope().iter().map(|s| s.as_str().to_string()).collect(),
        details: rc
            .details()
            .iter()
            .map(|d| ResourceChangeDetail {
                target: d.target().map(|t| ResourceTargetDefinition {
                    attribute: enum_text(t.attribute()),
                    name: text(t.name()),
                    requires_recreation: enum_text(t.requires_recreation()),
                    path: text(t.path()),
                    before_value: text(t.before_value()),
                    after_value: text(t.after_value()),
                    attribute_change_type: enum_text(t.attribute_change_type()),
                }),
                evaluation: enum_text(d.evaluation()),
                change_source: enum_text(d.change_source()),
                causing_entity: text(d.causing_entity()),
            })
            .collect(),
        change_set_id: text(rc.change_set_id()),
        module_info: rc.module_info().map(|m| ModuleInfo {
            type_hierarchy: text(m.type_hierarchy()),
            logical_id_hierarchy: text(m.logical_id_hierarchy()),
        }),
        before_context: text(rc.before_context()),
        after_context: text(rc.after_context()),
    }
}

fn resource_drift(drift: &cfn::StackResourceDrift) -> ResourceDrift {
    ResourceDrift {
        logical_resource_id: text(drift.logical_resource_id()).unwrap_or_default(),
        physical_resource_id: text(drift.physical_resource_id()),
        resource_type: text(drift.resource_type()),
        status: ResourceDriftStatus::from_api(
            &enum_text(drift.stack_resource_drift_status()).unwrap_or_default(),
        ),
        expected_properties: text(drift.expected_properties()),
        actual_properties: text(drift.actual_properties()),
    }
}
