//! HttpSender - one GET per record

use std::time::Duration;

use contracts::{DeliveryError, Record, RecordSender};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, instrument};

use crate::error::DispatcherError;

/// Sender issuing one HTTP GET per record to a fixed URL
///
/// The client (and its connection pool) is shared by every worker.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    url: Url,
    target: String,
}

impl HttpSender {
    /// Create a sender for `target_url` with a per-request `timeout`
    pub fn new(target_url: &str, timeout: Duration) -> Result<Self, DispatcherError> {
        let url = Url::parse(target_url)
            .map_err(|e| DispatcherError::invalid_target(target_url, e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("line-relay/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DispatcherError::sender_creation(target_url, e.to_string()))?;

        debug!(
            target_url = %url,
            timeout_ms = timeout.as_millis() as u64,
            "HttpSender created"
        );

        Ok(Self {
            client,
            url,
            target: target_url.to_string(),
        })
    }
}

fn classify(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else if err.is_connect() {
        DeliveryError::Connect(err.to_string())
    } else {
        DeliveryError::Transport(err.to_string())
    }
}

impl RecordSender for HttpSender {
    fn target(&self) -> &str {
        &self.target
    }

    #[instrument(
        name = "http_sender_send",
        skip(self, record, query),
        fields(line = record.index)
    )]
    async fn send(&self, record: &Record, query: &[(String, String)]) -> Result<(), DeliveryError> {
        let mut request = self.client.get(self.url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();

        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}
