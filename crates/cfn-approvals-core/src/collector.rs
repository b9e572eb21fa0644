//! Pending change-set discovery

use crate::cloud::{CloudFormationApi, ExecutionStatus};
use crate::error::Result;
use crate::model::ChangeSetReference;
use tracing::{debug, info, warn};

/// Find the first `AVAILABLE` change set of every stack.
///
/// Selection follows the order the service lists change sets in; when a
/// stack has several available change sets only the first is reviewed.
/// Stacks without one are skipped. Any lookup failure aborts collection.
pub async fn collect(
    api: &dyn CloudFormationApi,
    stack_names: &[String],
) -> Result<Vec<ChangeSetReference>> {
    let mut references = Vec::new();

    for stack_name in stack_names {
        let summaries = api.list_change_sets(stack_name).await?;
        for skipped in summaries
            .iter()
            .take_while(|s| s.execution_status != ExecutionStatus::Available)
        {
            debug!(
                stack = %stack_name,
                change_set_id = %skipped.change_set_id,
                status = %skipped.execution_status,
                "Skipping change set"
            );
        }
        let available = summaries
            .into_iter()
            .find(|s| s.execution_status == ExecutionStatus::Available);

        match available {
            Some(summary) => {
                info!(
                    stack = %stack_name,
                    change_set_id = %summary.change_set_id,
                    "Found pending change set"
                );
                references.push(ChangeSetReference {
                    change_set_id: summary.change_set_id,
                    stack_name: stack_name.clone(),
                });
            }
            None => warn!(stack = %stack_name, "No change set available for stack"),
        }
    }

    Ok(references)
}
