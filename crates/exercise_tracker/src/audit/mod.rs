//! Best-effort audit trail of tracker operations.
//!
//! Operations hand events to an [`AuditSink`]; the production sink forwards
//! them over a bounded channel to a background writer that appends JSON
//! lines under `data/logs/audit`. Nothing on this path can fail a request.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TrackerError;

mod file_log;
mod writer;

pub use file_log::{append_audit_event, read_audit_events};
pub use writer::{AuditHandle, spawn_audit_writer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Success { response: Value },
    Failure { error_kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub request: Value,
    pub outcome: AuditOutcome,
    pub duration_ms: u64,
}

impl AuditEvent {
    pub fn success(operation: &str, request: Value, response: Value) -> Self {
        Self::new(operation, request, AuditOutcome::Success { response })
    }

    pub fn failure(operation: &str, request: Value, error: &TrackerError) -> Self {
        Self::new(
            operation,
            request,
            AuditOutcome::Failure {
                error_kind: error.kind().to_string(),
                message: error.to_string(),
            },
        )
    }

    fn new(operation: &str, request: Value, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation: operation.to_string(),
            user_id: None,
            request,
            outcome,
            duration_ms: 0,
        }
    }

    pub fn with_user(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AuditOutcome::Success { .. })
    }
}

pub trait AuditSink: Send + Sync {
    /// Hand off an event. Must not block and must not fail the caller.
    fn record(&self, event: AuditEvent);
}

/// Sink used when auditing is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_events_carry_error_kind() {
        let err = TrackerError::not_found("abc");
        let event = AuditEvent::failure("logs.query", json!({ "userId": "abc" }), &err)
            .with_user("abc")
            .with_duration(Duration::from_millis(7));

        assert!(!event.is_success());
        assert_eq!(event.duration_ms, 7);

        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["outcome"]["status"], "failure");
        assert_eq!(encoded["outcome"]["error_kind"], "not_found");
        assert_eq!(encoded["outcome"]["message"], "user abc not found");
        assert_eq!(encoded["user_id"], "abc");
    }

    #[test]
    fn success_events_omit_missing_user() {
        let event = AuditEvent::success("users.list", Value::Null, json!([]));

        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["outcome"]["status"], "success");
        assert!(encoded.get("user_id").is_none());
    }
}
