//! Transport to the review service
//!
//! - [`CompletionTransport`]: the seam the background commit talks through
//! - [`HttpTransport`]: reqwest implementation against the JSON API

use std::future::Future;

use danci_review_algo::{BatchCompletionRequest, BatchCompletionResponse, SessionDelivery};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::TransportError;

pub trait CompletionTransport: Send + Sync + 'static {
    fn complete(
        &self,
        request: &BatchCompletionRequest,
    ) -> impl Future<Output = Result<BatchCompletionResponse, TransportError>> + Send;
}

/// Response envelope: `{success, data}` or `{success: false, error, code}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    code: Option<String>,
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Ask the service to compose a session, optionally for a named pattern
    pub async fn next_session(
        &self,
        pattern: Option<&str>,
    ) -> Result<SessionDelivery, TransportError> {
        let url = format!("{}/api/sessions/next", self.base_url);
        let mut request = self.client.get(&url).bearer_auth(&self.token);
        if let Some(pattern) = pattern {
            request = request.query(&[("pattern", pattern)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode_envelope(status, &body)
    }
}

impl CompletionTransport for HttpTransport {
    async fn complete(
        &self,
        request: &BatchCompletionRequest,
    ) -> Result<BatchCompletionResponse, TransportError> {
        let url = format!("{}/api/sessions/complete", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        decode_envelope(status, &body)
    }
}

fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, TransportError> {
    let envelope: Option<Envelope<T>> = serde_json::from_slice(body).ok();

    if status.is_success() {
        return match envelope {
            Some(Envelope {
                success: true,
                data: Some(data),
                ..
            }) => Ok(data),
            _ => Err(TransportError::Decode(format!(
                "unexpected body for HTTP {}",
                status.as_u16()
            ))),
        };
    }

    let (code, message) = match envelope {
        Some(env) => (
            env.code.unwrap_or_default(),
            env.error.unwrap_or_default(),
        ),
        None => (String::new(), String::from_utf8_lossy(body).into_owned()),
    };

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TransportError::Unauthorized(status.as_u16())
        }
        s if s.is_client_error() => TransportError::Rejected {
            status: s.as_u16(),
            code,
            message,
        },
        s => TransportError::Server {
            status: s.as_u16(),
            message,
        },
    })
}
