//! HTTP client abstraction for fetching season datasets.
//!
//! This module defines the `HttpClient` trait to abstract HTTP retrieval,
//! enabling testability with mock implementations. Unlike a plain
//! request/response client, the response surfaces the body either as an
//! incremental chunk stream or as a fully buffered string, so the fetch
//! stage can report download progress while the transfer is in flight.

use crate::error::{CompmetaError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;

/// Response from an HTTP GET.
///
/// Status inspection is the caller's job; the client returns whatever the
/// server answered, success or not.
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase for the status (e.g. "Not Found")
    pub status_text: String,
    /// Total body size hint from the Content-Length header, when present
    pub content_length: Option<u64>,
    /// Response body, streamed or buffered depending on the transport
    pub body: HttpBody,
}

/// Body of an HTTP response.
pub enum HttpBody {
    /// Incremental chunk stream; the receiver owns and drains it exclusively.
    Streamed(BoxStream<'static, Result<Bytes>>),
    /// Fully buffered body, for transports without incremental reads.
    Buffered(String),
}

impl std::fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpBody::Streamed(_) => f.write_str("Streamed(..)"),
            HttpBody::Buffered(body) => f.debug_tuple("Buffered").field(&body.len()).finish(),
        }
    }
}

/// Trait for retrieving a resource over HTTP.
///
/// This abstraction allows for different implementations (production vs.
/// testing) and makes the fetch task logic testable without making real
/// network calls.
///
/// # Example
/// ```ignore
/// let client = ReqwestHttpClient::new();
/// let response = client.get("https://api.example.com/meta/composition-data/14").await?;
/// println!("Status: {}", response.status);
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Issue a GET request to the given URL.
    ///
    /// # Errors
    /// Returns an error only for transport-level failures (connection, DNS,
    /// timeout). Non-success HTTP statuses are returned as a normal
    /// [`HttpResponse`].
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new reqwest-based HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!(url = %url, "Executing HTTP request");

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "HTTP request failed");
            e
        })?;

        let status = response.status();
        let content_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        tracing::debug!(
            status = status.as_u16(),
            content_length = ?content_length,
            "Response headers received"
        );

        // reqwest always exposes an incremental reader.
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CompmetaError::from))
            .boxed();

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            content_length,
            body: HttpBody::Streamed(stream),
        })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Mock HTTP client for testing.
///
/// Allows configuring predetermined responses for specific URLs without
/// making actual network calls. Responses for the same URL are served in
/// FIFO order. Every call is recorded for later inspection.
///
/// # Example
/// ```ignore
/// let mock = MockHttpClient::new();
/// mock.add_response(
///     "https://api.example.com/meta/composition-data/14",
///     Ok(MockResponse::ok(r#"{"season_id":14}"#)),
/// );
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, Vec<Result<MockResponse>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

/// A canned response served by [`MockHttpClient`].
#[derive(Debug)]
pub struct MockResponse {
    pub status: u16,
    pub status_text: String,
    pub content_length: Option<u64>,
    pub body: MockBody,
}

/// Body shape of a canned response.
#[derive(Debug)]
pub enum MockBody {
    /// Served as [`HttpBody::Buffered`] - the no-incremental-reader transport.
    Buffered(String),
    /// Served as [`HttpBody::Streamed`], one chunk at a time, sleeping for
    /// each chunk's delay first. Delays cooperate with `tokio::time::pause`.
    Chunks(Vec<MockChunk>),
}

/// One chunk of a scripted streamed body.
#[derive(Debug, Clone)]
pub struct MockChunk {
    /// Sleep applied before this chunk is yielded
    pub delay: Duration,
    /// Raw bytes of the chunk; need not align with character boundaries
    pub bytes: Vec<u8>,
}

impl MockChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            delay: Duration::ZERO,
            bytes: bytes.into(),
        }
    }

    pub fn after(delay: Duration, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            delay,
            bytes: bytes.into(),
        }
    }
}

impl MockResponse {
    /// 200 OK with a buffered body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            content_length: None,
            body: MockBody::Buffered(body.into()),
        }
    }

    /// 200 OK with a scripted chunk stream. Content-Length is left unset;
    /// use [`MockResponse::with_content_length`] to advertise a total.
    pub fn ok_chunks(chunks: Vec<MockChunk>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            content_length: None,
            body: MockBody::Chunks(chunks),
        }
    }

    /// A non-success status with an empty buffered body.
    pub fn status(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            content_length: None,
            body: MockBody::Buffered(String::new()),
        }
    }

    pub fn with_content_length(mut self, total: u64) -> Self {
        self.content_length = Some(total);
        self
    }
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predetermined response for a URL. Multiple responses for the
    /// same URL are returned in FIFO order.
    pub fn add_response(&self, url: &str, response: Result<MockResponse>) {
        self.responses
            .lock()
            .entry(url.to_string())
            .or_default()
            .push(response);
    }

    /// Get all URLs that have been requested, in call order.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().push(url.to_string());

        let canned = {
            let mut responses = self.responses.lock();
            match responses.get_mut(url) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        let canned = match canned {
            Some(result) => result?,
            None => {
                return Err(crate::error::CompmetaError::Other(anyhow::anyhow!(
                    "No mock response configured for GET {}",
                    url
                )));
            }
        };

        let body = match canned.body {
            MockBody::Buffered(text) => HttpBody::Buffered(text),
            MockBody::Chunks(chunks) => {
                let stream = futures::stream::iter(chunks)
                    .then(|chunk| async move {
                        if !chunk.delay.is_zero() {
                            tokio::time::sleep(chunk.delay).await;
                        }
                        Ok::<Bytes, CompmetaError>(Bytes::from(chunk.bytes))
                    })
                    .boxed();
                HttpBody::Streamed(stream)
            }
        };

        Ok(HttpResponse {
            status: canned.status,
            status_text: canned.status_text,
            content_length: canned.content_length,
            body,
        })
    }
}
