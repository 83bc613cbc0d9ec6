use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("push provider rejected the message: {0}")]
    Rejected(String),
}

/// Plain-text push notification transport. One multiline payload per
/// `Decision` or summary job, never structured content.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_push(&self, token: &str, recipient: &str, text: &str) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct PushPayload<'a> {
    to: &'a str,
    body: &'a str,
}

/// Sends via a generic HTTP push-notification endpoint (e.g. Expo,
/// Pushover, ntfy) bearer-authenticated with `token`.
pub struct HttpPushTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPushTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MessageTransport for HttpPushTransport {
    async fn send_push(&self, token: &str, recipient: &str, text: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&PushPayload { to: recipient, body: text })
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!(
                "status {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every send; lets gate tests assert on what would have
    /// been sent without making network calls.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<String>>,
        pub should_fail: bool,
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        async fn send_push(&self, _token: &str, _recipient: &str, text: &str) -> Result<(), TransportError> {
            if self.should_fail {
                return Err(TransportError::Rejected("forced failure".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }
}
