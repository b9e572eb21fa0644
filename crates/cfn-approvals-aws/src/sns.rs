use crate::error_context;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client;
use cfn_approvals_core::{ApprovalError, Notifier, Result};
use tracing::info;

/// Sends reviewer notifications through an SNS topic
#[derive(Clone)]
pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<()> {
        let resp = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| {
                ApprovalError::publish(format!("SNS publish error: {}", error_context(&e)))
            })?;

        info!(
            topic_arn = %topic_arn,
            message_id = resp.message_id().unwrap_or(""),
            "Sent approval notification"
        );
        Ok(())
    }
}
