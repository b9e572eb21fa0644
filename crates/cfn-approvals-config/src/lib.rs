// cfn-approvals-config - Runtime configuration for the approval gate
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority), CFN_APPROVALS_* plus the
//    unprefixed ROLE_ARN / BUCKET / WEB_URL / AWS_REGION variables
// 2. Config file path from CFN_APPROVALS_CONFIG env var
// 3. Config file contents from CFN_APPROVALS_CONFIG_CONTENT env var
// 4. Default config file location (./cfn-approvals.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};
pub use sources::StdEnvSource;

/// Main runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Region reported in review documents and notifications
    #[serde(default)]
    pub region: String,

    /// Role assumed to mint reviewer credentials
    #[serde(default)]
    pub role_arn: String,

    /// Approval page the presigned link is appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub drift: DriftConfig,

    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Where review documents are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_link_expiry_secs")]
    pub link_expiry_secs: u64,
    /// Custom S3 endpoint (e.g. a local emulator)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_key_prefix() -> String {
    "approvals/".to_string()
}

fn default_link_expiry_secs() -> u64 {
    1800
}

impl StorageConfig {
    pub fn link_expiry(&self) -> Duration {
        Duration::from_secs(self.link_expiry_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            key_prefix: default_key_prefix(),
            link_expiry_secs: default_link_expiry_secs(),
            endpoint: None,
        }
    }
}

/// Drift detection polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_polls() -> u32 {
    60
}

impl DriftConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
            max_polls: default_max_polls(),
        }
    }
}

/// Per-job behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_build_timeout_secs")]
    pub build_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub report_success_on_publish: bool,
    #[serde(default = "default_credential_duration_secs")]
    pub credential_duration_secs: u64,
}

fn default_build_timeout_secs() -> u64 {
    840
}

fn default_credential_duration_secs() -> u64 {
    3600
}

impl JobConfig {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn credential_duration(&self) -> Duration {
        Duration::from_secs(self.credential_duration_secs)
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            build_timeout_secs: default_build_timeout_secs(),
            report_success_on_publish: true,
            credential_duration_secs: default_credential_duration_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            role_arn: String::new(),
            web_url: None,
            storage: StorageConfig::default(),
            drift: DriftConfig::default(),
            job: JobConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Build a configuration from optional inline TOML plus overrides
    /// supplied by an `EnvSource`. Used by tests and by callers that do not
    /// read the process environment directly.
    pub fn load_with_env<E: EnvSource>(inline_config: Option<&str>, env: &E) -> Result<Self> {
        let mut config = RuntimeConfig::default();

        if let Some(inline) = inline_config {
            let file_config: RuntimeConfig =
                toml::from_str(inline).context("Failed to parse inline config content")?;
            config.merge(file_config);
        }

        config.apply_env_overrides_from(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (used for TOML layering).
    ///
    /// Sections are taken whole from `other`; top-level strings only when set.
    pub fn merge(&mut self, other: RuntimeConfig) {
        if !other.region.is_empty() {
            self.region = other.region;
        }
        if !other.role_arn.is_empty() {
            self.role_arn = other.role_arn;
        }
        if other.web_url.is_some() {
            self.web_url = other.web_url;
        }
        self.storage = other.storage;
        self.drift = other.drift;
        self.job = other.job;
        self.log = other.log;
    }

    /// Apply environment overrides from a custom source
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("plain".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_configs() {
        let config = RuntimeConfig::default();
        assert_eq!(config.storage.key_prefix, "approvals/");
        assert_eq!(config.storage.link_expiry(), Duration::from_secs(1800));
        assert!(config.drift.enabled);
        assert_eq!(config.drift.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.drift.max_polls, 60);
        assert!(config.job.report_success_on_publish);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_partial_toml_keeps_section_defaults() {
        let parsed: RuntimeConfig = toml::from_str(
            r#"
            region = "eu-west-1"

            [storage]
            bucket = "reviews"

            [drift]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(parsed.region, "eu-west-1");
        assert_eq!(parsed.storage.bucket, "reviews");
        assert_eq!(parsed.storage.key_prefix, "approvals/");
        assert!(!parsed.drift.enabled);
        assert_eq!(parsed.drift.max_polls, 60);
        assert_eq!(parsed.job, JobConfig::default());
    }

    struct NoEnv;

    impl EnvSource for NoEnv {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn get_raw(&self, _key: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_load_with_env_validates() {
        let inline = r#"
            region = "eu-west-1"
            role_arn = "arn:aws:iam::123456789012:role/approver"

            [storage]
            bucket = "reviews"
        "#;
        let config = RuntimeConfig::load_with_env(Some(inline), &NoEnv).unwrap();
        assert_eq!(config.storage.bucket, "reviews");

        let err = RuntimeConfig::load_with_env(None, &NoEnv).unwrap_err();
        assert!(err.to_string().contains("region is required"));
    }

    #[test]
    fn test_merge_keeps_unset_top_level_values() {
        let mut base = RuntimeConfig {
            region: "us-east-1".to_string(),
            role_arn: "arn:aws:iam::1:role/base".to_string(),
            ..RuntimeConfig::default()
        };
        let overlay = RuntimeConfig {
            region: "eu-west-1".to_string(),
            ..RuntimeConfig::default()
        };
        base.merge(overlay);
        assert_eq!(base.region, "eu-west-1");
        assert_eq!(base.role_arn, "arn:aws:iam::1:role/base");
    }
}
