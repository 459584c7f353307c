//! Bounded background dispatch
//!
//! Accepted webhooks are queued and drained by a fixed number of workers.
//! Each job runs to completion on one worker; its outcome is only visible
//! through logs and metrics.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::{Error, Result};
use crate::models::WebhookPayload;

use super::dispatcher::Dispatcher;

/// Queue feeding webhooks to dispatch workers
#[derive(Clone)]
pub struct DispatchQueue {
    job_tx: mpsc::Sender<WebhookPayload>,
}

impl DispatchQueue {
    /// Spawn `config.workers` workers sharing one bounded queue.
    ///
    /// Must be called from within a tokio runtime. Workers exit once every
    /// queue handle has been dropped and the queue is drained.
    pub fn start(config: &DispatchConfig, dispatcher: Arc<Dispatcher>) -> (Self, Vec<JoinHandle<()>>) {
        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers: Vec<JoinHandle<()>> = (0..config.workers)
            .map(|id| {
                let job_rx = Arc::clone(&job_rx);
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { run_worker(id, job_rx, dispatcher).await })
            })
            .collect();

        info!(
            workers = config.workers,
            capacity = config.queue_capacity,
            "Dispatch queue started"
        );

        (Self { job_tx }, workers)
    }

    /// Queue a webhook without waiting.
    ///
    /// Fails with [`Error::QueueFull`] when every slot is taken.
    pub fn submit(&self, payload: WebhookPayload) -> Result<()> {
        self.job_tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                warn!("Dispatch queue full, rejecting webhook");
                Error::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => Error::QueueClosed,
        })
    }
}

async fn run_worker(
    id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<WebhookPayload>>>,
    dispatcher: Arc<Dispatcher>,
) {
    loop {
        // Lock only while waiting for the next job.
        let job = job_rx.lock().await.recv().await;
        let Some(payload) = job else {
            debug!(worker = id, "Dispatch worker stopped");
            break;
        };

        debug!(worker = id, alerts = payload.alerts.len(), "Dispatching webhook");
        dispatcher.dispatch(&payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::ProviderClient;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(url: String) -> Arc<Dispatcher> {
        let yaml = format!(
            r#"
smsrelay:
  simulation: false
  provider:
    url: "{url}"
    parameters:
      from:
        param_value: "SVC"
      message:
        param_name: "text"
  recipients:
    - name: ops
      members: ["+15551234567"]
"#
        );
        let relay = Config::from_yaml(&yaml).unwrap().smsrelay;
        let sender = ProviderClient::new(&relay.provider, relay.simulation).unwrap();
        Arc::new(Dispatcher::new(Arc::new(relay), Arc::new(sender)))
    }

    fn payload() -> WebhookPayload {
        serde_json::from_value(serde_json::json!({
            "alerts": [{"labels": {"recipient": "ops"}, "annotations": {"message": "hi"}}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_submitted_jobs_are_dispatched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let config = DispatchConfig {
            workers: 2,
            queue_capacity: 4,
        };
        let (queue, workers) = DispatchQueue::start(&config, dispatcher(server.uri()));

        queue.submit(payload()).unwrap();
        queue.submit(payload()).unwrap();
        drop(queue);

        for worker in workers {
            worker.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = DispatchConfig {
            workers: 1,
            queue_capacity: 1,
        };
        let (queue, _workers) = DispatchQueue::start(&config, dispatcher(server.uri()));

        let results: Vec<_> = (0..3).map(|_| queue.submit(payload())).collect();

        assert!(results[0].is_ok());
        assert!(results.iter().any(|r| matches!(r, Err(Error::QueueFull))));
    }
}
