//! Alertmanager webhook payload

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{FieldRef, FieldSource};

/// Status of an alert or alert group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Condition is active
    #[default]
    Firing,
    /// Condition has cleared
    Resolved,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Firing => f.write_str("firing"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// Body of an Alertmanager webhook notification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Payload schema version
    #[serde(default)]
    pub version: Option<String>,

    /// Key identifying the alert group
    #[serde(default)]
    pub group_key: Option<String>,

    /// Group status
    #[serde(default)]
    pub status: Option<AlertStatus>,

    /// Receiver name in the Alertmanager route
    #[serde(default)]
    pub receiver: Option<String>,

    /// Labels used to group the alerts
    #[serde(default)]
    pub group_labels: HashMap<String, String>,

    /// Labels shared by every alert
    #[serde(default)]
    pub common_labels: HashMap<String, String>,

    /// Annotations shared by every alert
    #[serde(default)]
    pub common_annotations: HashMap<String, String>,

    /// Link back to Alertmanager
    #[serde(default, rename = "externalURL")]
    pub external_url: Option<String>,

    /// Alerts in payload order
    pub alerts: Vec<Alert>,
}

impl WebhookPayload {
    /// Decode a webhook body.
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(bytes).map_err(crate::Error::Decode)
    }
}

/// A single firing or resolved alert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Alert status
    #[serde(default)]
    pub status: AlertStatus,

    /// Identifying labels
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Informational annotations
    #[serde(default)]
    pub annotations: HashMap<String, String>,

    /// When the alert started firing
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,

    /// When the alert resolved (zero time while firing)
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,

    /// Link to the expression that produced the alert
    #[serde(default, rename = "generatorURL")]
    pub generator_url: Option<String>,

    /// Stable identifier of the label set
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl Alert {
    /// Value of a label or annotation.
    pub fn field(&self, field: &FieldRef) -> Option<&str> {
        let map = match field.source {
            FieldSource::Labels => &self.labels,
            FieldSource::Annotations => &self.annotations,
        };
        map.get(&field.key).map(String::as_str)
    }

    /// `alertname` label, if present
    pub fn name(&self) -> Option<&str> {
        self.labels.get("alertname").map(String::as_str)
    }

    /// Text to send for this alert.
    ///
    /// Uses the configured field, falling back to `[<status>] <alertname>`.
    pub fn message(&self, field: &FieldRef) -> String {
        match self.field(field) {
            Some(message) => message.to_string(),
            None => format!("[{}] {}", self.status, self.name().unwrap_or("unknown")),
        }
    }

    /// Recipient group name for this alert
    pub fn recipient(&self, field: &FieldRef) -> Option<&str> {
        self.field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertFieldsConfig;

    const SAMPLE: &str = r#"{
        "version": "4",
        "groupKey": "{}:{alertname=\"DiskFull\"}",
        "status": "firing",
        "receiver": "sms",
        "groupLabels": {"alertname": "DiskFull"},
        "commonLabels": {"alertname": "DiskFull"},
        "commonAnnotations": {},
        "externalURL": "http://alertmanager:9093",
        "alerts": [
            {
                "status": "firing",
                "labels": {"alertname": "DiskFull", "recipient": "ops"},
                "annotations": {"message": "disk full"},
                "startsAt": "2024-01-01T00:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z",
                "generatorURL": "http://prometheus:9090/graph",
                "fingerprint": "c5d8f1b2a3e4"
            }
        ]
    }"#;

    #[test]
    fn test_decode_alertmanager_payload() {
        let payload = WebhookPayload::from_slice(SAMPLE.as_bytes()).unwrap();

        assert_eq!(payload.status, Some(AlertStatus::Firing));
        assert_eq!(payload.external_url.as_deref(), Some("http://alertmanager:9093"));
        assert_eq!(payload.alerts.len(), 1);
        assert_eq!(payload.alerts[0].name(), Some("DiskFull"));
    }

    #[test]
    fn test_decode_minimal_payload() {
        let payload = WebhookPayload::from_slice(br#"{"alerts": []}"#).unwrap();
        assert!(payload.alerts.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let err = WebhookPayload::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));

        let err = WebhookPayload::from_slice(br#"{"status": "firing"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn test_message_and_recipient_from_default_fields() {
        let fields = AlertFieldsConfig::default();
        let payload = WebhookPayload::from_slice(SAMPLE.as_bytes()).unwrap();
        let alert = &payload.alerts[0];

        assert_eq!(alert.message(&fields.message), "disk full");
        assert_eq!(alert.recipient(&fields.recipient), Some("ops"));
    }

    #[test]
    fn test_message_falls_back_to_alertname() {
        let fields = AlertFieldsConfig::default();
        let alert = Alert {
            status: AlertStatus::Resolved,
            labels: HashMap::from([("alertname".to_string(), "HighLatency".to_string())]),
            ..Alert::default()
        };

        assert_eq!(alert.message(&fields.message), "[resolved] HighLatency");
        assert_eq!(alert.recipient(&fields.recipient), None);
    }
}
