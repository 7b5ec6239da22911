//! Streaming fetch task for season datasets.
//!
//! One task instance per in-flight request: the task retrieves the dataset
//! over the [`HttpClient`], decodes the body incrementally, and emits a
//! bounded-rate sequence of progress events followed by exactly one terminal
//! result on its outbound channel. The task owns its response stream
//! exclusively and shares no mutable state with its caller or with other
//! task instances.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{CompmetaError, Result};
use crate::http::{HttpBody, HttpClient};
use crate::request::{
    FetchMessage, FetchOutcome, FetchRequest, FetchResult, ProgressEvent, ProgressStage, RequestId,
};
use crate::SeasonDataset;

pub mod decode;

use decode::Utf8StreamDecoder;

/// Configuration for the fetch stage.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Minimum wall-clock gap between intermediate download progress events
    /// for one request. Stage-boundary events (5, 90, 98) are exempt.
    pub progress_throttle: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            progress_throttle: Duration::from_millis(100),
        }
    }
}

/// Spawns one isolated fetch task per request.
///
/// The fetcher itself is cheap to clone and holds only the shared HTTP
/// client and configuration; all per-request state lives inside the
/// spawned task.
#[derive(Clone)]
pub struct StreamFetcher<H: HttpClient> {
    client: Arc<H>,
    config: FetcherConfig,
}

impl<H: HttpClient + 'static> StreamFetcher<H> {
    /// Create a fetcher with the default configuration.
    pub fn new(client: Arc<H>) -> Self {
        Self {
            client,
            config: FetcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FetcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Launch one fetch as an isolated task.
    ///
    /// The task emits zero or more [`FetchMessage::Progress`] items on `tx`
    /// followed by exactly one [`FetchMessage::Result`], which is always the
    /// last message for the request's id. The task never panics past its
    /// boundary and never fails because `tx` cannot accept a message; a
    /// caller that wants to abandon the fetch simply stops listening.
    pub fn spawn(&self, request: FetchRequest, tx: mpsc::Sender<FetchMessage>) -> JoinHandle<()> {
        let client = self.client.clone();
        let throttle = self.config.progress_throttle;
        tokio::spawn(run(client, throttle, request, tx))
    }
}

#[tracing::instrument(
    skip(client, throttle, request, tx),
    fields(request_id = %request.request_id, season_id = request.season_id)
)]
async fn run<H: HttpClient>(
    client: Arc<H>,
    throttle: Duration,
    request: FetchRequest,
    tx: mpsc::Sender<FetchMessage>,
) {
    let request_id = request.request_id;

    let outcome = match fetch(client.as_ref(), throttle, &request, &tx).await {
        Ok(season) => {
            tracing::info!(
                season_name = %season.season_name,
                runs = season.data.len(),
                "Season dataset fetched"
            );
            FetchOutcome::Success(season)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Fetch failed");
            FetchOutcome::Failure(e.to_string())
        }
    };

    // Terminal delivery is best-effort too: a coordinator that stopped
    // listening must not bring the task down.
    let result = FetchResult {
        request_id,
        outcome,
    };
    if tx.send(FetchMessage::Result(result)).await.is_err() {
        tracing::debug!("Receiver dropped before terminal result");
    }
}

async fn fetch<H: HttpClient>(
    client: &H,
    throttle: Duration,
    request: &FetchRequest,
    tx: &mpsc::Sender<FetchMessage>,
) -> Result<SeasonDataset> {
    if request.api_base_url.trim().is_empty() {
        return Err(CompmetaError::MissingBaseUrl);
    }

    let url = request.url();
    emit_progress(tx, request.request_id, ProgressStage::Requesting, 5);
    tracing::debug!(url = %url, "Requesting season dataset");

    let response = client.get(&url).await?;
    if !(200..300).contains(&response.status) {
        return Err(CompmetaError::HttpStatus {
            status: response.status,
            status_text: response.status_text,
        });
    }

    let text = match response.body {
        HttpBody::Streamed(stream) => {
            read_streamed(
                stream,
                response.content_length,
                request.request_id,
                throttle,
                tx,
            )
            .await?
        }
        HttpBody::Buffered(body) => {
            // No incremental reader: a single mid-point download event.
            emit_progress(tx, request.request_id, ProgressStage::Downloading, 50);
            body
        }
    };

    let season: SeasonDataset = serde_json::from_str(&text)?;
    emit_progress(tx, request.request_id, ProgressStage::Finalizing, 98);
    Ok(season)
}

/// Drain the response stream, decoding incrementally and emitting throttled
/// download progress when the total size is known.
async fn read_streamed(
    mut stream: BoxStream<'static, Result<Bytes>>,
    total_bytes: Option<u64>,
    request_id: RequestId,
    throttle: Duration,
    tx: &mpsc::Sender<FetchMessage>,
) -> Result<String> {
    emit_progress(tx, request_id, ProgressStage::Downloading, 15);

    let mut decoder = Utf8StreamDecoder::new();
    let mut text = String::new();
    let mut received: u64 = 0;
    let mut last_emit = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        received += chunk.len() as u64;
        decoder.decode(&chunk, &mut text)?;

        // Rate gate, not a timer: checked on each read so progress emission
        // never blocks the read loop.
        if let Some(total) = total_bytes {
            if total > 0 && last_emit.elapsed() >= throttle {
                let pct = download_pct(received, total);
                emit_progress(tx, request_id, ProgressStage::Downloading, pct);
                last_emit = Instant::now();
            }
        }
    }

    decoder.finish()?;
    emit_progress(tx, request_id, ProgressStage::Parsing, 90);
    Ok(text)
}

/// Map received/total bytes onto the downloading band [15, 85].
fn download_pct(received: u64, total: u64) -> u8 {
    let scaled = (received as f64 / total as f64 * 70.0).floor() as i64 + 15;
    scaled.clamp(15, 85) as u8
}

/// Best-effort, non-blocking progress delivery. A full or closed channel
/// drops the event; it never aborts an otherwise-successful fetch.
fn emit_progress(
    tx: &mpsc::Sender<FetchMessage>,
    request_id: RequestId,
    stage: ProgressStage,
    progress: u8,
) {
    let event = ProgressEvent {
        request_id,
        stage,
        progress,
    };
    if let Err(e) = tx.try_send(FetchMessage::Progress(event)) {
        tracing::trace!(
            request_id = %request_id,
            stage = %stage,
            error = %e,
            "Dropped progress event"
        );
    }
}
