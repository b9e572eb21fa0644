use crate::error_context;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use cfn_approvals_config::StorageConfig;
use cfn_approvals_core::{ApprovalError, Result, ReviewStore};
use std::time::Duration;
use tracing::debug;

const CONTENT_TYPE: &str = "application/json";

/// Stores review documents in one bucket and hands out presigned GET links
#[derive(Clone)]
pub struct S3ReviewStore {
    client: Client,
    bucket: String,
}

impl S3ReviewStore {
    pub fn new(sdk_config: &SdkConfig, storage: &StorageConfig) -> Self {
        // Path-style keeps presigned links valid for dotted bucket names
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config).force_path_style(true);
        if let Some(endpoint) = &storage.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: storage.bucket.clone(),
        }
    }
}

#[async_trait]
impl ReviewStore for S3ReviewStore {
    async fn put_review(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                ApprovalError::publish(format!("S3 write error: {}", error_context(&e)))
            })?;

        debug!(bucket = %self.bucket, key = %key, bytes = size, "Stored review document");
        Ok(())
    }

    async fn presign_review(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| ApprovalError::publish(format!("invalid link expiry: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                ApprovalError::publish(format!("S3 presign error: {}", error_context(&e)))
            })?;

        Ok(request.uri().to_string())
    }
}
