//! The relay service
//!
//! Wires the validated configuration, the provider client, the dispatch
//! workers and the HTTP server together.

use std::collections::HashMap;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::api::{AppState, HttpServer};
use crate::config::{Config, FieldSource};
use crate::dispatch::{DispatchQueue, DispatchReport, Dispatcher};
use crate::error::Result;
use crate::models::{Alert, AlertStatus, WebhookPayload};
use crate::provider::ProviderClient;

/// The main relay service
pub struct Relay {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
}

impl Relay {
    /// Build the relay from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        let relay_config = Arc::new(config.smsrelay.clone());
        let client = ProviderClient::new(&relay_config.provider, relay_config.simulation)?;

        if client.is_simulation() {
            info!("Simulation mode enabled, no SMS will be sent");
        }

        let dispatcher = Arc::new(Dispatcher::new(relay_config, Arc::new(client)));

        Ok(Self {
            config: Arc::new(config),
            dispatcher,
        })
    }

    /// Start the dispatch workers and serve HTTP until Ctrl+C
    pub async fn start(&self, metrics: Option<PrometheusHandle>) -> Result<()> {
        let (queue, workers) =
            DispatchQueue::start(&self.config.smsrelay.dispatch, Arc::clone(&self.dispatcher));

        let state = AppState {
            queue,
            auth: Arc::new(self.config.smsrelay.auth.clone()),
            metrics,
        };

        let server = &self.config.server;
        let addr = format!("{}:{}", server.host, server.port);
        let result = HttpServer::new(state, server.path.clone()).serve(&addr).await;

        // In-flight dispatches are abandoned on shutdown.
        for worker in workers {
            worker.abort();
        }

        info!("Relay stopped");
        result
    }

    /// Send `message` to a recipient group right away, bypassing the queue
    pub async fn send_once(&self, recipient: &str, message: &str) -> DispatchReport {
        let fields = &self.config.smsrelay.alert;
        let mut alert = Alert {
            status: AlertStatus::Firing,
            labels: HashMap::from([("alertname".to_string(), "ManualSend".to_string())]),
            ..Alert::default()
        };

        for (field, value) in [(&fields.recipient, recipient), (&fields.message, message)] {
            let map = match field.source {
                FieldSource::Labels => &mut alert.labels,
                FieldSource::Annotations => &mut alert.annotations,
            };
            map.insert(field.key.clone(), value.to_string());
        }

        let payload = WebhookPayload {
            alerts: vec![alert],
            ..WebhookPayload::default()
        };
        self.dispatcher.dispatch(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SendOutcome;

    #[tokio::test]
    async fn test_send_once_in_simulation() {
        let config = Config::from_yaml(
            r#"
smsrelay:
  provider:
    url: "https://sms.example.com/send"
    parameters:
      from:
        param_value: "SVC"
      message:
        param_name: "text"
  recipients:
    - name: ops
      members: ["+15551234567", "+15557654321"]
"#,
        )
        .unwrap();

        let relay = Relay::new(config).unwrap();
        let report = relay.send_once("ops", "test message").await;

        assert_eq!(report.deliveries.len(), 2);
        assert!(report
            .deliveries
            .iter()
            .all(|d| matches!(d.result, Ok(SendOutcome::Simulated))));
        assert!(report.deliveries[0]
            .body
            .as_deref()
            .unwrap()
            .contains("\"text\":\"test message\""));
    }
}
