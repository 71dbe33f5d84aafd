use crate::error::{DispatchError, REFUSED_STREAM};
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Future returned by [`WebhookSink::post`]
pub type PostFuture = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send>>;

/// Destination that accepts a serialized payload
///
/// Only transport success or failure is reported; response bodies are not
/// interpreted.
#[cfg_attr(test, mockall::automock)]
pub trait WebhookSink: Send + Sync {
    fn post(&self, url: &str, body: String) -> PostFuture;
}

/// Webhook sink backed by a reqwest client
pub struct HttpWebhook {
    client: Client,
}

impl HttpWebhook {
    /// Create a sink with a bounded request timeout
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Transport` if the HTTP client cannot be built
    /// (for example when no TLS backend is available).
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Transport(describe(&e)))?;
        Ok(Self { client })
    }
}

impl WebhookSink for HttpWebhook {
    fn post(&self, url: &str, body: String) -> PostFuture {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| DispatchError::Transport(describe(&e)))?;

            let status = response.status();
            if status.is_success() {
                debug!("Webhook accepted payload with status {}", status);
            } else {
                warn!("Webhook responded with status {}", status);
            }
            Ok(())
        })
    }
}

/// Render an error with its whole source chain
///
/// Stream refusals from the HTTP/2 layer only name `REFUSED_STREAM` in their
/// debug form, so the code is appended when the chain text lacks it.
fn describe<E: std::error::Error>(err: &E) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    if !message.contains(REFUSED_STREAM) && format!("{:?}", err).contains(REFUSED_STREAM) {
        message.push_str(" (");
        message.push_str(REFUSED_STREAM);
        message.push(')');
    }
    message
}
