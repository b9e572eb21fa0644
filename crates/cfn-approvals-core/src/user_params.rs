//! Action configuration supplied with each pipeline job
//!
//! The pipeline passes `UserParameters` as a free-form string; it is parsed
//! as YAML so both JSON and YAML configurations are accepted.

use crate::error::{ApprovalError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserParameters {
    /// Stacks whose pending change sets should be reviewed
    pub stacks: Vec<String>,
    /// Notification topic; no notification is sent when absent
    #[serde(default)]
    pub topic_arn: Option<String>,
    /// Overrides the configured drift detection default for this job
    #[serde(default)]
    pub detect_drift: Option<bool>,
}

impl UserParameters {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ApprovalError::configuration("UserParameters is empty"))?;

        let params: UserParameters =
            serde_yaml::from_str(raw).map_err(|e| ApprovalError::configuration(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        if let Some(position) = self.stacks.iter().position(|s| s.trim().is_empty()) {
            return Err(ApprovalError::configuration(format!(
                "Stacks[{}] must not be empty",
                position
            )));
        }
        if matches!(self.topic_arn.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(ApprovalError::configuration("TopicArn must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let params = UserParameters::parse(Some(
            r#"{"Stacks": ["network", "app"], "TopicArn": "arn:aws:sns:eu-west-1:1:approvals"}"#,
        ))
        .unwrap();
        assert_eq!(params.stacks, vec!["network", "app"]);
        assert_eq!(
            params.topic_arn.as_deref(),
            Some("arn:aws:sns:eu-west-1:1:approvals")
        );
        assert_eq!(params.detect_drift, None);
    }

    #[test]
    fn test_parse_yaml() {
        let params = UserParameters::parse(Some("Stacks:\n  - app\nDetectDrift: false\n")).unwrap();
        assert_eq!(params.stacks, vec!["app"]);
        assert_eq!(params.topic_arn, None);
        assert_eq!(params.detect_drift, Some(false));
    }

    #[test]
    fn test_malformed_is_configuration_error() {
        for raw in ["{not valid", "Stacks: 5", "TopicArn: x", "", "   "] {
            let err = UserParameters::parse(Some(raw)).unwrap_err();
            assert!(
                matches!(err, ApprovalError::Configuration(_)),
                "{raw:?} gave {err:?}"
            );
        }
        assert!(matches!(
            UserParameters::parse(None),
            Err(ApprovalError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_stack_name_rejected() {
        let err = UserParameters::parse(Some(r#"{"Stacks": ["ok", " "]}"#)).unwrap_err();
        assert!(err.to_string().contains("Stacks[1]"));
    }
}
