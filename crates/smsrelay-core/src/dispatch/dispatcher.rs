//! Fans one webhook out into provider sends

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::Result;
use crate::models::WebhookPayload;
use crate::provider::{encode, shape, SendOutcome, SmsSender};

/// Outcome of one (alert, member) send
#[derive(Debug)]
pub struct Delivery {
    /// Recipient group the member belongs to
    pub recipient: String,
    /// Phone number
    pub member: String,
    /// Query string appended to the provider URL
    pub query: String,
    /// Encoded body, absent when encoding failed
    pub body: Option<String>,
    /// Send result
    pub result: Result<SendOutcome>,
}

/// Everything attempted for one webhook
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Attempted sends, in payload order
    pub deliveries: Vec<Delivery>,
    /// Alerts whose recipient group did not resolve to any member
    pub unrouted: usize,
}

impl DispatchReport {
    /// Number of sends that returned successfully
    pub fn succeeded(&self) -> usize {
        self.deliveries.iter().filter(|d| d.result.is_ok()).count()
    }

    /// Number of sends that failed
    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.succeeded()
    }
}

/// Resolves recipients and sends one SMS per (alert, member) pair
pub struct Dispatcher {
    config: Arc<RelayConfig>,
    sender: Arc<dyn SmsSender>,
}

impl Dispatcher {
    /// Create a dispatcher over an immutable relay configuration
    pub fn new(config: Arc<RelayConfig>, sender: Arc<dyn SmsSender>) -> Self {
        Self { config, sender }
    }

    /// Dispatch every alert in `payload`.
    ///
    /// Alerts and members are processed sequentially in payload order. A
    /// failed send is logged and recorded; it never stops the remaining ones.
    pub async fn dispatch(&self, payload: &WebhookPayload) -> DispatchReport {
        let mut report = DispatchReport::default();
        let fields = &self.config.alert;

        for alert in &payload.alerts {
            let message = alert.message(&fields.message);

            let Some(recipient) = alert.recipient(&fields.recipient) else {
                warn!(
                    alert = alert.name().unwrap_or("unknown"),
                    field = %fields.recipient.key,
                    "Alert has no recipient field, skipping"
                );
                report.unrouted += 1;
                metrics::counter!("smsrelay_alerts_unrouted_total").increment(1);
                continue;
            };

            let Some(members) = self.config.members_of(recipient) else {
                warn!(
                    alert = alert.name().unwrap_or("unknown"),
                    recipient,
                    "Unknown recipient group, skipping"
                );
                report.unrouted += 1;
                metrics::counter!("smsrelay_alerts_unrouted_total").increment(1);
                continue;
            };

            debug!(recipient, members = members.len(), "Dispatching alert");

            for member in members {
                let delivery = self.deliver(recipient, member, &message).await;
                report.deliveries.push(delivery);
            }
        }

        info!(
            sent = report.succeeded(),
            failed = report.failed(),
            unrouted = report.unrouted,
            "Dispatch finished"
        );
        report
    }

    async fn deliver(&self, recipient: &str, member: &str, message: &str) -> Delivery {
        let provider = &self.config.provider;
        let request = shape(member, message, &provider.parameters);

        let (body, result) = match encode(&provider.content_type, &request.body) {
            Ok(encoded) => {
                let result = self.sender.send(&encoded, &request.query).await;
                (Some(encoded.payload), result)
            }
            Err(e) => (None, Err(e)),
        };

        let outcome = match &result {
            Ok(SendOutcome::Simulated) => "simulated",
            Ok(SendOutcome::Delivered { .. }) => "delivered",
            Err(e) => {
                error!(recipient, member, error = %e, "Failed to send SMS");
                "failed"
            }
        };
        metrics::counter!("smsrelay_sms_sent_total", "outcome" => outcome).increment(1);

        Delivery {
            recipient: recipient.to_string(),
            member: member.to_string(),
            query: request.query,
            body,
            result,
        }
    }
}
