//! HTTP client for the SMS provider API

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

use super::encoding::EncodedBody;

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Simulation mode: nothing left the process
    Simulated,
    /// Provider accepted the message
    Delivered {
        /// Raw response body, empty if it could not be read
        response_body: String,
    },
}

/// Anything able to deliver one encoded SMS request
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send `body` to the provider with `query` appended to its URL
    async fn send(&self, body: &EncodedBody, query: &str) -> Result<SendOutcome>;
}

/// Sends SMS requests to the configured provider
pub struct ProviderClient {
    client: Client,
    url: String,
    authorization: Option<String>,
    simulation: bool,
}

impl ProviderClient {
    /// Create a client for `provider`; the timeout bounds each whole request.
    pub fn new(provider: &ProviderConfig, simulation: bool) -> Result<Self> {
        let client = Client::builder().timeout(provider.timeout).build()?;

        Ok(Self {
            client,
            url: provider.url.clone(),
            authorization: provider.authentication.header_value(),
            simulation,
        })
    }

    /// Whether requests are only logged
    pub fn is_simulation(&self) -> bool {
        self.simulation
    }
}

#[async_trait]
impl SmsSender for ProviderClient {
    async fn send(&self, body: &EncodedBody, query: &str) -> Result<SendOutcome> {
        let url = format!("{}{}", self.url, query);

        if self.simulation {
            info!(
                url = %url,
                content_type = %body.content_type,
                body = %body.payload,
                "Simulated SMS request"
            );
            return Ok(SendOutcome::Simulated);
        }

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, &body.content_type)
            .body(body.payload.clone());
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await?;
        let status = response.status();

        let response_body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to read response body");
                String::new()
            }
        };

        if status != StatusCode::OK {
            debug!(%status, response = %response_body, "Provider rejected request");
            return Err(Error::provider_status(status.to_string()));
        }

        info!(url = %url, body = %body.payload, "SMS request sent");
        info!(response = %response_body, "Provider response");

        Ok(SendOutcome::Delivered { response_body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Authorization, ProviderAuthentication};
    use std::time::Duration;
    use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(url: String) -> ProviderConfig {
        ProviderConfig {
            url,
            timeout: Duration::from_secs(2),
            ..ProviderConfig::default()
        }
    }

    fn json_body() -> EncodedBody {
        EncodedBody {
            content_type: "application/json".to_string(),
            payload: r#"{"from":"SVC","message":"disk full","to":"+15551234567"}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_simulation_performs_no_io() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ProviderClient::new(&provider(format!("{}/send", server.uri())), true).unwrap();
        let outcome = client.send(&json_body(), "?to=+1555").await.unwrap();

        assert_eq!(outcome, SendOutcome::Simulated);
    }

    #[tokio::test]
    async fn test_simulation_succeeds_for_unreachable_url() {
        let client =
            ProviderClient::new(&provider("http://127.0.0.1:1/send".to_string()), true).unwrap();

        assert!(client.send(&json_body(), "").await.is_ok());
    }

    #[tokio::test]
    async fn test_delivered_with_authorization_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(query_param("to", "15551234567"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Bearer abc123"))
            .and(body_string(json_body().payload))
            .respond_with(ResponseTemplate::new(200).set_body_string("queued"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = provider(format!("{}/send", server.uri()));
        config.authentication = ProviderAuthentication {
            enabled: true,
            authorization: Authorization {
                auth_type: "Bearer".to_string(),
                credential: "abc123".to_string(),
            },
        };

        let client = ProviderClient::new(&config, false).unwrap();
        let outcome = client.send(&json_body(), "?to=15551234567").await.unwrap();

        assert_eq!(
            outcome,
            SendOutcome::Delivered {
                response_body: "queued".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_no_authorization_header_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProviderClient::new(&provider(format!("{}/send", server.uri())), false).unwrap();

        assert!(client.send(&json_body(), "").await.is_ok());
    }

    #[tokio::test]
    async fn test_non_200_is_provider_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .mount(&server)
            .await;

        let client = ProviderClient::new(&provider(format!("{}/send", server.uri())), false).unwrap();
        let err = client.send(&json_body(), "").await.unwrap_err();

        match err {
            Error::ProviderStatus { status } => assert_eq!(status, "201 Created"),
            other => panic!("expected provider status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = provider(format!("{}/send", server.uri()));
        config.timeout = Duration::from_millis(100);

        let client = ProviderClient::new(&config, false).unwrap();
        let err = client.send(&json_body(), "").await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client =
            ProviderClient::new(&provider("http://127.0.0.1:1/send".to_string()), false).unwrap();
        let err = client.send(&json_body(), "").await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
    }
}
