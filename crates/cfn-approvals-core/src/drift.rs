//! Stack drift inspection
//!
//! Detection is asynchronous on the service side: a run is started, then
//! polled until it leaves `DETECTION_IN_PROGRESS`. Polling is bounded by a
//! [`DriftPolicy`]; the first poll happens right after the run starts and
//! every further poll waits `poll_interval`.

use crate::cloud::{CloudFormationApi, DetectionState, ResourceDrift};
use crate::diff::labelled_diff;
use crate::error::Result;
use crate::model::DriftRecord;
use crate::template::{canonicalize, TemplateBody};
use serde::{Serialize, Serializer};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Polling bounds for drift detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftPolicy {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polls: 60,
        }
    }
}

/// Stack-level drift outcome as shown to the reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    InSync,
    Drifted,
    NotChecked,
    Unknown,
    /// Detection run ended in `DETECTION_FAILED`
    DetectionFailed,
    /// Poll budget ran out before the run finished
    TimedOut,
    /// Any other value, surfaced verbatim
    Unrecognized(String),
}

impl DriftStatus {
    pub fn from_api(value: &str) -> Self {
        match value {
            "IN_SYNC" => Self::InSync,
            "DRIFTED" => Self::Drifted,
            "NOT_CHECKED" => Self::NotChecked,
            "UNKNOWN" => Self::Unknown,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::InSync => "IN_SYNC",
            Self::Drifted => "DRIFTED",
            Self::NotChecked => "NOT_CHECKED",
            Self::Unknown => "UNKNOWN",
            Self::DetectionFailed => "DETECTION_FAILED",
            Self::TimedOut => "DETECTION_TIMED_OUT",
            Self::Unrecognized(value) => value,
        }
    }
}

impl Serialize for DriftStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drift status of a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDriftStatus {
    InSync,
    Modified,
    Deleted,
    NotChecked,
    Other(String),
}

impl ResourceDriftStatus {
    pub fn from_api(value: &str) -> Self {
        match value {
            "IN_SYNC" => Self::InSync,
            "MODIFIED" => Self::Modified,
            "DELETED" => Self::Deleted,
            "NOT_CHECKED" => Self::NotChecked,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::InSync => "IN_SYNC",
            Self::Modified => "MODIFIED",
            Self::Deleted => "DELETED",
            Self::NotChecked => "NOT_CHECKED",
            Self::Other(value) => value,
        }
    }
}

impl Serialize for ResourceDriftStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result of inspecting one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftInspection {
    pub status: DriftStatus,
    pub records: Vec<DriftRecord>,
}

/// Run drift detection for a stack and collect per-resource drift.
///
/// Resource drifts are only fetched when the run completes. Failed or
/// unrecognized terminal states and poll exhaustion are reported through
/// the returned status, not as errors.
pub async fn inspect_drift(
    api: &dyn CloudFormationApi,
    stack_name: &str,
    policy: &DriftPolicy,
) -> Result<DriftInspection> {
    let detection_id = api.detect_stack_drift(stack_name).await?;
    debug!(stack = %stack_name, detection_id = %detection_id, "Started drift detection");

    let mut polls = 0u32;
    let status = loop {
        let progress = api.drift_detection_status(&detection_id).await?;
        polls += 1;

        match progress.state {
            DetectionState::InProgress => {
                if polls >= policy.max_polls {
                    warn!(
                        stack = %stack_name,
                        polls,
                        "Drift detection still in progress after poll budget"
                    );
                    return Ok(DriftInspection {
                        status: DriftStatus::TimedOut,
                        records: Vec::new(),
                    });
                }
                tokio::time::sleep(policy.poll_interval).await;
            }
            DetectionState::Complete => {
                break progress
                    .stack_drift_status
                    .as_deref()
                    .map(DriftStatus::from_api)
                    .unwrap_or(DriftStatus::Unknown);
            }
            DetectionState::Failed => {
                warn!(
                    stack = %stack_name,
                    reason = progress.reason.as_deref().unwrap_or(""),
                    "Drift detection failed"
                );
                return Ok(DriftInspection {
                    status: DriftStatus::DetectionFailed,
                    records: Vec::new(),
                });
            }
            DetectionState::Other(value) => {
                warn!(stack = %stack_name, status = %value, "Unexpected drift detection status");
                return Ok(DriftInspection {
                    status: DriftStatus::Unrecognized(value),
                    records: Vec::new(),
                });
            }
        }
    };

    let drifts = api.resource_drifts(stack_name).await?;
    let records = drifts
        .into_iter()
        .map(drift_record)
        .collect::<Result<Vec<_>>>()?;

    info!(
        stack = %stack_name,
        status = %status,
        resources = records.len(),
        polls,
        "Drift detection complete"
    );

    Ok(DriftInspection { status, records })
}

/// Canonicalize a resource's property blobs and diff expected against actual
pub fn drift_record(drift: ResourceDrift) -> Result<DriftRecord> {
    let expected = canonical_properties(drift.expected_properties.as_deref())?;
    let actual = canonical_properties(drift.actual_properties.as_deref())?;

    let properties_diff = if drift.status == ResourceDriftStatus::InSync {
        String::new()
    } else {
        labelled_diff(&expected, &actual, "expected", "actual")
    };

    Ok(DriftRecord {
        logical_resource_id: drift.logical_resource_id,
        physical_resource_id: drift.physical_resource_id,
        resource_type: drift.resource_type,
        drift_status: drift.status,
        actual_properties: actual,
        expected_properties: expected,
        properties_diff,
    })
}

/// Properties are JSON documents; text that does not parse is kept verbatim
fn canonical_properties(raw: Option<&str>) -> Result<String> {
    let Some(raw) = raw else {
        return Ok(String::new());
    };
    let body = match serde_json::from_str(raw) {
        Ok(document) => TemplateBody::Document(document),
        Err(_) => TemplateBody::Text(raw.to_string()),
    };
    canonicalize(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drift(status: ResourceDriftStatus, expected: &str, actual: &str) -> ResourceDrift {
        ResourceDrift {
            logical_resource_id: "Queue".into(),
            physical_resource_id: Some("https://sqs/queue".into()),
            resource_type: Some("AWS::SQS::Queue".into()),
            status,
            expected_properties: Some(expected.into()),
            actual_properties: Some(actual.into()),
        }
    }

    #[test]
    fn test_in_sync_has_empty_diff() {
        let record = drift_record(drift(
            ResourceDriftStatus::InSync,
            r#"{"VisibilityTimeout": 30, "DelaySeconds": 0}"#,
            r#"{"DelaySeconds": 0, "VisibilityTimeout": 30}"#,
        ))
        .unwrap();
        assert_eq!(record.properties_diff, "");
        assert_eq!(record.actual_properties, record.expected_properties);
        assert_eq!(
            record.actual_properties,
            "DelaySeconds: 0\nVisibilityTimeout: 30\n"
        );
    }

    #[test]
    fn test_modified_diffs_expected_to_actual() {
        let record = drift_record(drift(
            ResourceDriftStatus::Modified,
            r#"{"VisibilityTimeout": 30}"#,
            r#"{"VisibilityTimeout": 60}"#,
        ))
        .unwrap();
        assert!(record.properties_diff.contains("-VisibilityTimeout: 30"));
        assert!(record.properties_diff.contains("+VisibilityTimeout: 60"));
        assert!(record.properties_diff.starts_with("--- expected\n+++ actual\n"));
    }

    #[test]
    fn test_unparseable_properties_kept_verbatim() {
        let record = drift_record(drift(ResourceDriftStatus::Deleted, "not json", "")).unwrap();
        assert_eq!(record.expected_properties, "not json");
        assert_eq!(record.actual_properties, "");
        assert!(record.properties_diff.contains("-not json"));
    }

    #[test]
    fn test_missing_properties() {
        let mut d = drift(ResourceDriftStatus::Deleted, "{}", "{}");
        d.actual_properties = None;
        let record = drift_record(d).unwrap();
        assert_eq!(record.actual_properties, "");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(DriftStatus::from_api("DRIFTED"), DriftStatus::Drifted);
        assert_eq!(DriftStatus::TimedOut.as_str(), "DETECTION_TIMED_OUT");
        assert_eq!(DriftStatus::from_api("WEIRD").as_str(), "WEIRD");
        assert_eq!(
            ResourceDriftStatus::from_api("UNKNOWN"),
            ResourceDriftStatus::Other("UNKNOWN".into())
        );
        assert_eq!(
            serde_json::to_string(&ResourceDriftStatus::Modified).unwrap(),
            "\"MODIFIED\""
        );
    }
}
