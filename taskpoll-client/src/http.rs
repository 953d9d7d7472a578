//! HTTP implementation of [`TaskApi`].

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Serialize;
use serde_json::{Value, json};
use taskpoll_core::TaskId;
use tracing::{debug, instrument, warn};

use crate::api::{SubmitPayload, TaskApi};
use crate::config::ClientConfig;
use crate::error::{TaskError, TransportError};

/// Submission endpoint path.
pub const SUBMIT_PATH: &str = "/chatCompletion";

/// Result endpoint path.
pub const RESULT_PATH: &str = "/chatResult";

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "x-custom-token";

/// User agent string.
const USER_AGENT: &str = concat!("taskpoll/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt kept in an error.
const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// HTTP Task API
// ============================================================================

/// [`TaskApi`] over HTTP with a single shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    inner: Client,
    submit_url: String,
    result_url: String,
}

impl HttpTaskApi {
    /// Builds a client from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, TaskError> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let mut token = header::HeaderValue::from_str(&config.api_token)
            .map_err(|_| TaskError::Config("API token contains invalid characters".to_string()))?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| TaskError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            inner,
            submit_url: config.endpoint(SUBMIT_PATH),
            result_url: config.endpoint(RESULT_PATH),
        })
    }

    #[instrument(skip(self, body), fields(url = %url))]
    async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Value, TransportError> {
        debug!("POST request");

        let response = self.inner.post(url).json(body).send().await?;
        let status = response.status();
        debug!(status = %status, "Response received");

        let text = response.text().await?;
        check_status(status.as_u16(), &text)?;

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Response body is not JSON");
            TransportError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn submit(&self, payload: &SubmitPayload) -> Result<Value, TransportError> {
        self.post_json(&self.submit_url, payload).await
    }

    async fn poll(&self, task_id: TaskId) -> Result<Value, TransportError> {
        self.post_json(&self.result_url, &json!({ "id": task_id.get() }))
            .await
    }
}

/// Maps a non-2xx status to a transport error.
fn check_status(status: u16, body: &str) -> Result<(), TransportError> {
    let excerpt = || truncate(body, MAX_ERROR_BODY);
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(TransportError::Authentication { status }),
        400 => Err(TransportError::BadRequest(excerpt())),
        429 => Err(TransportError::RateLimited),
        500..=599 => Err(TransportError::Server {
            status,
            body: excerpt(),
        }),
        _ => Err(TransportError::Status {
            status,
            body: excerpt(),
        }),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
