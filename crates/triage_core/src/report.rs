//! The result envelope returned by every flow execution.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Outcome of one flow run: the single structured contract the system
/// guarantees to its callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug_label: Option<String>,
    /// RFC 3339 completion time.
    pub timestamp: String,
}

impl RunReport {
    pub fn success(result: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
            execution_time_seconds: elapsed.as_secs_f64(),
            repository: None,
            recipient_email: None,
            meeting_minutes: None,
            bug_label: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            execution_time_seconds: elapsed.as_secs_f64(),
            repository: None,
            recipient_email: None,
            meeting_minutes: None,
            bug_label: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_recipient(mut self, email: impl Into<String>) -> Self {
        self.recipient_email = Some(email.into());
        self
    }

    pub fn with_meeting_minutes(mut self, minutes: u32) -> Self {
        self.meeting_minutes = Some(minutes);
        self
    }

    pub fn with_bug_label(mut self, label: impl Into<String>) -> Self {
        self.bug_label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_report_shape() {
        let report = RunReport::success("done", Duration::from_millis(1500))
            .with_repository("vercel/next-learn")
            .with_meeting_minutes(30);

        assert!(report.success);
        assert_eq!(report.result.as_deref(), Some("done"));
        assert!(report.error.is_none());
        assert!(report.execution_time_seconds >= 0.0);
        assert_eq!(report.repository.as_deref(), Some("vercel/next-learn"));
        assert_eq!(report.meeting_minutes, Some(30));
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn test_failure_report_shape() {
        let report = RunReport::failure("connection refused", Duration::from_secs(2));

        assert!(!report.success);
        assert!(report.result.is_none());
        assert!(!report.error.as_deref().unwrap().is_empty());
        assert!(report.execution_time_seconds >= 0.0);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn test_report_serializes_without_absent_fields() {
        let report = RunReport::success("ok", Duration::ZERO);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("repository").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["success"], true);
    }
}
