//! Review package assembly

use crate::cloud::{CloudFormationApi, CredentialIssuer};
use crate::diff::unified_diff;
use crate::drift::{inspect_drift, DriftInspection, DriftPolicy};
use crate::error::Result;
use crate::model::{
    ChangeSetReference, PipelineContext, ReviewPackage, StackReport, REVIEW_SCHEMA_VERSION,
};
use crate::parameters::{declared_defaults, proposed_values, reconcile, stack_values, ParameterSet};
use crate::template::canonicalize;
use futures::future::try_join_all;
use tracing::{debug, info};

/// Pipeline job the package is built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub job_id: String,
    pub account_id: String,
    pub pipeline_name: String,
    pub region: String,
}

/// Per-build switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub detect_drift: bool,
    pub drift_policy: DriftPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            detect_drift: true,
            drift_policy: DriftPolicy::default(),
        }
    }
}

/// Builds one [`ReviewPackage`] from the selected change sets
pub struct ReviewPackageBuilder<'a> {
    cloudformation: &'a dyn CloudFormationApi,
    credentials: &'a dyn CredentialIssuer,
    options: BuildOptions,
}

impl<'a> ReviewPackageBuilder<'a> {
    pub fn new(
        cloudformation: &'a dyn CloudFormationApi,
        credentials: &'a dyn CredentialIssuer,
        options: BuildOptions,
    ) -> Self {
        Self {
            cloudformation,
            credentials,
            options,
        }
    }

    /// Build reports for every reference, then attach job credentials.
    ///
    /// Reports come back in reference order. The first failing stack aborts
    /// the whole build.
    pub async fn build(
        &self,
        references: &[ChangeSetReference],
        job: &JobContext,
    ) -> Result<ReviewPackage> {
        let stacks = try_join_all(references.iter().map(|r| self.stack_report(r))).await?;

        let credentials = self.credentials.issue_job_credentials(&job.job_id).await?;

        info!(
            job_id = %job.job_id,
            stacks = stacks.len(),
            "Review package assembled"
        );

        Ok(ReviewPackage {
            version: REVIEW_SCHEMA_VERSION,
            pipeline: PipelineContext {
                region: job.region.clone(),
                job_id: job.job_id.clone(),
                pipeline_name: job.pipeline_name.clone(),
                account_id: job.account_id.clone(),
            },
            credentials,
            stacks,
        })
    }

    /// Report for a single change set
    pub async fn stack_report(&self, reference: &ChangeSetReference) -> Result<StackReport> {
        let api = self.cloudformation;
        let change_set = api.describe_change_set(&reference.change_set_id).await?;
        let stack = api.describe_stack(&change_set.stack_name).await?;

        let new_template = api.change_set_template(&reference.change_set_id).await?;
        let new_template = canonicalize(&new_template)?;

        if stack.is_review_in_progress() {
            // First deployment: nothing to compare against and nothing to drift
            debug!(stack = %stack.stack_name, "Stack is new, skipping history and drift");
            let empty = ParameterSet::new();
            let proposed = proposed_values(&change_set.parameters, &empty);
            return Ok(StackReport {
                stack_name: change_set.stack_name,
                change_set_id: reference.change_set_id.clone(),
                parameters: reconcile(&empty, &empty, &proposed),
                template_diff: unified_diff("", &new_template),
                changes: change_set.changes,
                old_template: String::new(),
                drift_status: None,
                drifts: Vec::new(),
            });
        }

        let old_template = canonicalize(&api.stack_template(&stack.stack_name).await?)?;
        let defaults = declared_defaults(&api.template_parameters(&stack.stack_name).await?);
        let current = stack_values(&stack.parameters);
        let proposed = proposed_values(&change_set.parameters, &current);

        let drift = if self.options.detect_drift {
            Some(inspect_drift(api, &stack.stack_name, &self.options.drift_policy).await?)
        } else {
            None
        };
        let (drift_status, drifts) = match drift {
            Some(DriftInspection { status, records }) => (Some(status), records),
            None => (None, Vec::new()),
        };

        debug!(
            stack = %stack.stack_name,
            changes = change_set.changes.len(),
            "Built stack report"
        );

        Ok(StackReport {
            stack_name: change_set.stack_name,
            change_set_id: reference.change_set_id.clone(),
            parameters: reconcile(&defaults, &current, &proposed),
            template_diff: unified_diff(&old_template, &new_template),
            changes: change_set.changes,
            old_template,
            drift_status,
            drifts,
        })
    }
}
