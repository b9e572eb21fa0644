use crate::{LogFormat, RuntimeConfig};
use anyhow::{Context, Result};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "CFN_APPROVALS_";

/// Abstraction over environment-variable lookups so tests and embedding
/// runtimes can supply their own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the CFN_APPROVALS_ prefix
    /// Used for the deployment variables (ROLE_ARN, BUCKET, AWS_REGION, ...)
    fn get_raw(&self, key: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to parse {}{key}={value:?}: {reason}", ENV_PREFIX)]
pub struct InvalidEnvValue {
    key: String,
    value: String,
    reason: String,
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
///
/// Prefixed variables win over their unprefixed deployment counterparts.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Identity and links
    if let Some(region) = get_env_string(env, "REGION")
        .or_else(|| env.get_raw("AWS_REGION"))
        .or_else(|| env.get_raw("AWS_DEFAULT_REGION"))
    {
        config.region = region;
    }
    if let Some(role_arn) = get_env_string(env, "ROLE_ARN").or_else(|| env.get_raw("ROLE_ARN")) {
        config.role_arn = role_arn;
    }
    if let Some(web_url) = get_env_string(env, "WEB_URL").or_else(|| env.get_raw("WEB_URL")) {
        config.web_url = Some(web_url).filter(|u| !u.is_empty());
    }

    // Storage
    if let Some(bucket) = get_env_string(env, "BUCKET").or_else(|| env.get_raw("BUCKET")) {
        config.storage.bucket = bucket;
    }
    if let Some(prefix) = get_env_string(env, "KEY_PREFIX") {
        config.storage.key_prefix = normalize_prefix(&prefix);
    }
    if let Some(val) = get_env_parsed::<u64, E>(env, "LINK_EXPIRY_SECS")? {
        config.storage.link_expiry_secs = val;
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT") {
        config.storage.endpoint = Some(endpoint);
    }

    // Drift detection
    if let Some(val) = get_env_parsed::<bool, E>(env, "DRIFT_ENABLED")? {
        config.drift.enabled = val;
    }
    if let Some(val) = get_env_parsed::<u64, E>(env, "DRIFT_POLL_INTERVAL_SECS")? {
        config.drift.poll_interval_secs = val;
    }
    if let Some(val) = get_env_parsed::<u32, E>(env, "DRIFT_MAX_POLLS")? {
        config.drift.max_polls = val;
    }

    // Job handling
    if let Some(val) = get_env_parsed::<u64, E>(env, "BUILD_TIMEOUT_SECS")? {
        config.job.build_timeout_secs = val;
    }
    if let Some(val) = get_env_parsed::<bool, E>(env, "REPORT_SUCCESS_ON_PUBLISH")? {
        config.job.report_success_on_publish = val;
    }
    if let Some(val) = get_env_parsed::<u64, E>(env, "CREDENTIAL_DURATION_SECS")? {
        config.job.credential_duration_secs = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid CFN_APPROVALS_LOG_FORMAT value")?;
    }

    Ok(())
}

/// Non-empty prefixes always end with "/"
fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_parsed<T, E>(env: &E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: EnvSource,
{
    match get_env_string(env, key) {
        Some(value) => {
            let parsed = value.trim().parse::<T>().map_err(|e| InvalidEnvValue {
                key: key.to_string(),
                reason: e.to_string(),
                value,
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
