// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

/// Lambda functions cannot run longer than this
const MAX_INVOCATION_SECS: u64 = 900;

/// S3 presigned URLs expire after at most seven days
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 3600;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    if config.region.is_empty() {
        bail!("region is required (set CFN_APPROVALS_REGION or AWS_REGION)");
    }

    if config.role_arn.is_empty() {
        bail!("role_arn is required (set CFN_APPROVALS_ROLE_ARN or ROLE_ARN)");
    }

    validate_storage_config(&config.storage)?;
    validate_drift_config(&config.drift)?;
    validate_job_config(&config.job)?;

    if let Some(ref web_url) = config.web_url {
        if !web_url.starts_with("https://") && !web_url.starts_with("http://") {
            bail!("web_url must be an http(s) URL");
        }
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.bucket.is_empty() {
        bail!("storage.bucket is required (set CFN_APPROVALS_BUCKET or BUCKET)");
    }

    if config.link_expiry_secs == 0 {
        bail!("storage.link_expiry_secs must be greater than 0");
    }

    if config.link_expiry_secs > MAX_PRESIGN_SECS {
        bail!(
            "storage.link_expiry_secs must not exceed {} (presigned URL limit)",
            MAX_PRESIGN_SECS
        );
    }

    Ok(())
}

fn validate_drift_config(config: &DriftConfig) -> Result<()> {
    if config.poll_interval_secs == 0 {
        bail!("drift.poll_interval_secs must be greater than 0");
    }

    if config.max_polls == 0 {
        bail!("drift.max_polls must be greater than 0");
    }

    let worst_case = config.poll_interval_secs * u64::from(config.max_polls);
    if config.enabled && worst_case > MAX_INVOCATION_SECS {
        warn!(
            worst_case_secs = worst_case,
            "drift polling budget exceeds the Lambda invocation limit"
        );
    }

    Ok(())
}

fn validate_job_config(config: &JobConfig) -> Result<()> {
    if config.build_timeout_secs == 0 {
        bail!("job.build_timeout_secs must be greater than 0");
    }

    if config.build_timeout_secs >= MAX_INVOCATION_SECS {
        warn!(
            build_timeout_secs = config.build_timeout_secs,
            "job.build_timeout_secs leaves no time to report the job result"
        );
    }

    // STS session limits
    if !(900..=43_200).contains(&config.credential_duration_secs) {
        bail!("job.credential_duration_secs must be between 900 and 43200");
    }

    Ok(())
}
