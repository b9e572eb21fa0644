//! Error types for review package construction

use std::time::Duration;
use thiserror::Error;

/// Failure message reported to the pipeline for configuration errors
pub const INVALID_CONFIGURATION: &str = "invalid configuration";

/// Failure message reported to the pipeline for everything else.
/// Details stay in the function log.
pub const INTERNAL_ERROR: &str = "internal error";

/// Errors raised while turning a pipeline job into a review package
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// User parameters could not be parsed or are missing required fields
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A stack, change set or service call could not be resolved
    #[error("lookup failed for '{resource}': {message}")]
    Lookup { resource: String, message: String },

    /// A structured template could not be rendered to canonical text
    #[error("failed to render template: {0}")]
    Template(String),

    /// The review document could not be stored or linked
    #[error("failed to publish review package: {0}")]
    Publish(String),

    /// The package build ran past its wall-clock budget
    #[error("review package build exceeded {}s", .0.as_secs())]
    DeadlineExceeded(Duration),
}

impl ApprovalError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn lookup(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish(message.into())
    }

    /// Error kind string for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Lookup { .. } => "LookupError",
            Self::Template(_) => "TemplateError",
            Self::Publish(_) => "PublishError",
            Self::DeadlineExceeded(_) => "DeadlineExceeded",
        }
    }

    /// Message reported to the pipeline. Never carries internal detail.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => INVALID_CONFIGURATION,
            _ => INTERNAL_ERROR,
        }
    }
}

/// Result type alias for ApprovalError
pub type Result<T> = std::result::Result<T, ApprovalError>;
