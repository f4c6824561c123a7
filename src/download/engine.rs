//! Download orchestration engine.
//!
//! This module provides the [`DownloadEngine`], which turns a
//! [`DownloadRequest`] into exactly one terminal outcome (destination path
//! or typed failure) while streaming throttled progress notifications to a
//! [`ProgressObserver`].
//!
//! # Overview
//!
//! Each accepted request becomes a task in the [`TaskRegistry`], keyed by an
//! opaque [`TaskHandle`], and is driven by its own spawned worker: probe →
//! register → streaming GET → temp artifact → relocation → resolve. Workers
//! never share state except through the registry, so concurrent downloads
//! cannot cross-talk, and resolution is idempotent — a late duplicate
//! terminal event is a no-op.
//!
//! # Example
//!
//! ```no_run
//! use filefetch_core::{DownloadEngine, DownloadRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new("./downloads");
//! let request = DownloadRequest::new("https://example.com/paper.pdf", "paper.pdf")
//!     .with_subfolder("papers")
//!     .with_progress(true);
//! let path = engine.download_file(request).await?;
//! println!("saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::HttpClient;
use super::constants::PARTIAL_DIR;
use super::error::DownloadError;
use super::observer::{NoopProgressObserver, ProgressObserver, status};
use super::registry::{TaskHandle, TaskRegistry, TaskState};
use super::relocate::relocate;
use super::throttle::{PROGRESS_NOTIFY_INTERVAL, should_forward};
use super::{filename, probe};

/// An immutable download request.
///
/// Invariants checked by the engine: the URL must parse as an absolute URL
/// and the file name must be non-empty after sanitization.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Source URL.
    pub url: String,
    /// Desired destination file name.
    pub file_name: String,
    /// Optional subfolder under the storage root; empty means the root.
    pub subfolder: Option<String>,
    /// Extra request headers sent with the probe and the transfer.
    pub headers: HashMap<String, String>,
    /// Whether to forward progress notifications to the observer.
    pub report_progress: bool,
}

impl DownloadRequest {
    /// Creates a request for `url` saved under `file_name`.
    pub fn new(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
            subfolder: None,
            headers: HashMap::new(),
            report_progress: false,
        }
    }

    /// Places the file under `subfolder` inside the storage root.
    #[must_use]
    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = Some(subfolder.into());
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Enables or disables progress observation for this request.
    #[must_use]
    pub fn with_progress(mut self, report_progress: bool) -> Self {
        self.report_progress = report_progress;
        self
    }
}

/// An accepted download whose result can be awaited.
///
/// Returned by [`DownloadEngine::start`]; exposes the task handle for
/// cancellation while the transfer runs.
#[derive(Debug)]
pub struct PendingDownload {
    handle: TaskHandle,
    url: String,
    result_rx: oneshot::Receiver<Result<PathBuf, DownloadError>>,
}

impl PendingDownload {
    /// The handle identifying this download in the registry.
    #[must_use]
    pub fn handle(&self) -> TaskHandle {
        self.handle
    }

    /// Waits for the terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns the download's typed failure, or
    /// [`DownloadError::Interrupted`] if the worker died without delivering
    /// a result.
    pub async fn wait(self) -> Result<PathBuf, DownloadError> {
        match self.result_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(DownloadError::interrupted(
                self.url,
                "download worker terminated before delivering a result",
            )),
        }
    }
}

/// Orchestrates concurrent streaming downloads.
///
/// Owns the task registry (no ambient global state) and the shared HTTP
/// client. Cheap to share behind an `Arc`; all methods take `&self`.
pub struct DownloadEngine {
    client: HttpClient,
    registry: Arc<TaskRegistry>,
    observer: Arc<dyn ProgressObserver>,
    base_dir: PathBuf,
    notify_interval: Duration,
}

impl fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("base_dir", &self.base_dir)
            .field("notify_interval", &self.notify_interval)
            .field("active_tasks", &self.registry.active())
            .finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates an engine storing downloads under `base_dir`.
    ///
    /// Defaults: a fresh [`HttpClient`], the no-op observer, and the
    /// reference notification interval.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: HttpClient::new(),
            registry: Arc::new(TaskRegistry::new()),
            observer: Arc::new(NoopProgressObserver),
            base_dir: base_dir.into(),
            notify_interval: PROGRESS_NOTIFY_INTERVAL,
        }
    }

    /// Replaces the HTTP client (custom timeouts, shared pool).
    #[must_use]
    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Overrides the minimum interval between forwarded progress samples.
    #[must_use]
    pub fn with_notify_interval(mut self, interval: Duration) -> Self {
        self.notify_interval = interval;
        self
    }

    /// Read-only view of the task registry.
    #[must_use]
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Downloads a file and waits for its terminal outcome.
    ///
    /// Safe to call concurrently and repeatedly, including with identical
    /// URLs — each call yields its own independent task.
    ///
    /// # Errors
    ///
    /// One typed [`DownloadError`] per call; see [`DownloadError::kind`] for
    /// the taxonomy.
    #[instrument(skip(self, request), fields(url = %request.url, file = %request.file_name))]
    pub async fn download_file(&self, request: DownloadRequest) -> Result<PathBuf, DownloadError> {
        self.start(request).await?.wait().await
    }

    /// Validates and probes the request, then registers and spawns the
    /// transfer, returning a ticket exposing the task handle.
    ///
    /// # Errors
    ///
    /// Fails fast with [`DownloadError::InvalidInput`] (malformed URL, empty
    /// file name, bad header — nothing allocated) or
    /// [`DownloadError::NotDownloadable`] (probe rejected — no task
    /// registered).
    #[instrument(skip(self, request), fields(url = %request.url, file = %request.file_name))]
    pub async fn start(&self, request: DownloadRequest) -> Result<PendingDownload, DownloadError> {
        let file_name = filename::sanitize_file_name(&request.file_name);
        if file_name.is_empty() {
            return Err(DownloadError::invalid_input("file name must be non-empty"));
        }

        let url = Url::parse(request.url.trim())
            .map_err(|_| DownloadError::invalid_input(format!("malformed URL: {}", request.url)))?;
        let headers = build_header_map(&request.headers)?;

        if !probe::is_downloadable(&self.client, &url, &headers).await {
            debug!("probe rejected resource");
            return Err(DownloadError::not_downloadable(url.to_string()));
        }

        let request = DownloadRequest { file_name, ..request };
        let (result_tx, result_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = self.registry.register(request.clone(), result_tx, cancel_tx);
        info!(%handle, "download task registered");

        let events = request
            .report_progress
            .then(|| spawn_notifier(Arc::clone(&self.observer), request.file_name.clone()));
        emit(&events, ObserverEvent::Started);
        emit(
            &events,
            ObserverEvent::Progress {
                fraction: 0.0,
                status: status::STARTING,
            },
        );

        let ctx = TransferContext {
            client: self.client.clone(),
            registry: Arc::clone(&self.registry),
            handle,
            url: url.clone(),
            headers,
            request,
            base_dir: self.base_dir.clone(),
            notify_interval: self.notify_interval,
            events,
        };
        tokio::spawn(run_transfer(ctx, cancel_rx));

        Ok(PendingDownload {
            handle,
            url: url.to_string(),
            result_rx,
        })
    }

    /// Triggers cancellation of an in-flight download.
    ///
    /// Returns `false` for unknown or already-finished handles. The task
    /// resolves with [`DownloadError::Cancelled`]; no relocation occurs.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        self.registry.cancel(handle)
    }
}

/// Everything a transfer worker needs, cloned out of the engine so workers
/// share nothing but the registry.
struct TransferContext {
    client: HttpClient,
    registry: Arc<TaskRegistry>,
    handle: TaskHandle,
    url: Url,
    headers: HeaderMap,
    request: DownloadRequest,
    base_dir: PathBuf,
    notify_interval: Duration,
    events: Option<mpsc::UnboundedSender<ObserverEvent>>,
}

/// Notification queued for the observer; drained in order per task.
enum ObserverEvent {
    Started,
    Progress { fraction: f64, status: &'static str },
    Ended,
}

/// Spawns the per-task notifier draining observer events in order.
///
/// The transfer worker only enqueues; it never awaits observer-side work,
/// so a slow observer cannot stall event delivery.
fn spawn_notifier(
    observer: Arc<dyn ProgressObserver>,
    key: String,
) -> mpsc::UnboundedSender<ObserverEvent> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                ObserverEvent::Started => observer.started(&key).await,
                ObserverEvent::Progress { fraction, status } => {
                    observer.updated(&key, fraction, status).await;
                }
                ObserverEvent::Ended => observer.ended(&key).await,
            }
        }
    });
    events_tx
}

fn emit(events: &Option<mpsc::UnboundedSender<ObserverEvent>>, event: ObserverEvent) {
    if let Some(events) = events {
        let _ = events.send(event);
    }
}

/// Drives one transfer to its terminal outcome and resolves the task.
async fn run_transfer(ctx: TransferContext, mut cancel_rx: watch::Receiver<bool>) {
    let outcome = transfer(&ctx, &mut cancel_rx).await;

    match &outcome {
        Ok(path) => {
            info!(handle = %ctx.handle, path = %path.display(), "download completed");
            emit(
                &ctx.events,
                ObserverEvent::Progress {
                    fraction: 1.0,
                    status: status::DONE,
                },
            );
        }
        Err(DownloadError::Cancelled { .. }) => {
            info!(handle = %ctx.handle, "download cancelled");
            emit(
                &ctx.events,
                ObserverEvent::Progress {
                    fraction: 1.0,
                    status: status::CANCELLED,
                },
            );
        }
        Err(error) => {
            warn!(handle = %ctx.handle, error = %error, "download failed");
            emit(
                &ctx.events,
                ObserverEvent::Progress {
                    fraction: 1.0,
                    status: status::FAILED,
                },
            );
        }
    }
    emit(&ctx.events, ObserverEvent::Ended);

    if !ctx.registry.resolve(ctx.handle, outcome) {
        warn!(handle = %ctx.handle, "duplicate terminal event ignored");
    }
}

/// The streaming transfer itself: GET → temp artifact → relocation.
async fn transfer(
    ctx: &TransferContext,
    cancel_rx: &mut watch::Receiver<bool>,
) -> Result<PathBuf, DownloadError> {
    let url = ctx.url.as_str();

    let response = tokio::select! {
        response = ctx.client.send_get(url, &ctx.headers) => response?,
        () = cancelled(cancel_rx) => return Err(DownloadError::cancelled(url)),
    };

    ctx.registry
        .update(ctx.handle, |task| task.state = TaskState::Transferring);

    // Unknown (or decompressed) body size means no intermediate progress;
    // the terminal 1.0 sample is still forwarded.
    let expected_bytes = response.content_length().filter(|len| *len > 0);
    debug!(handle = %ctx.handle, expected = ?expected_bytes, "transfer streaming");

    let partial_dir = ctx.base_dir.join(PARTIAL_DIR);
    tokio::fs::create_dir_all(&partial_dir)
        .await
        .map_err(|e| DownloadError::filesystem(partial_dir.clone(), e))?;
    let temp_path = partial_dir.join(format!("{}.part", ctx.handle));

    let file = File::create(&temp_path)
        .await
        .map_err(|e| DownloadError::filesystem(temp_path.clone(), e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    let streamed: Result<(), DownloadError> = loop {
        let next = tokio::select! {
            next = stream.next() => next,
            () = cancelled(cancel_rx) => break Err(DownloadError::cancelled(url)),
        };
        let Some(chunk) = next else { break Ok(()) };
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => break Err(DownloadError::network(url, e)),
        };
        if let Err(e) = writer.write_all(&chunk).await {
            break Err(DownloadError::filesystem(temp_path.clone(), e));
        }
        bytes_written += chunk.len() as u64;
        if let Some(expected) = expected_bytes {
            forward_progress(ctx, fraction(bytes_written, expected));
        }
    };

    let flushed = match streamed {
        Ok(()) => writer
            .flush()
            .await
            .map_err(|e| DownloadError::filesystem(temp_path.clone(), e)),
        Err(error) => Err(error),
    };
    drop(writer);
    if let Err(error) = flushed {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error);
    }

    // A clean EOF short of the announced length is a transport failure, not
    // a partial success.
    if let Some(expected) = expected_bytes {
        if bytes_written != expected {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(DownloadError::interrupted(
                url,
                format!("body ended after {bytes_written} of {expected} bytes"),
            ));
        }
    }

    ctx.registry
        .update(ctx.handle, |task| task.state = TaskState::Relocating);

    match relocate(
        &temp_path,
        &ctx.base_dir,
        ctx.request.subfolder.as_deref(),
        &ctx.request.file_name,
    )
    .await
    {
        Ok(destination) => Ok(destination),
        Err(error) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            Err(error)
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn fraction(bytes_written: u64, expected: u64) -> f64 {
    (bytes_written as f64 / expected as f64).min(1.0)
}

/// Forwards a progress sample through the throttle, keeping the per-task
/// bookkeeping inside the registry's synchronized access.
fn forward_progress(ctx: &TransferContext, fraction: f64) {
    let Some(events) = &ctx.events else { return };
    let now = Instant::now();
    let forwarded = ctx
        .registry
        .update(ctx.handle, |task| {
            if fraction < task.last_progress {
                return false;
            }
            if !should_forward(task.last_notified_at, now, ctx.notify_interval) {
                return false;
            }
            task.last_notified_at = Some(now);
            task.last_progress = fraction;
            true
        })
        .unwrap_or(false);
    if forwarded {
        let _ = events.send(ObserverEvent::Progress {
            fraction,
            status: status::DOWNLOADING,
        });
    }
}

/// Resolves once the task's cancellation signal fires; pends otherwise.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            // The sender lives in the registry entry for the whole transfer;
            // if it is gone the task is already resolved.
            std::future::pending::<()>().await;
        }
    }
}

fn build_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, DownloadError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DownloadError::invalid_input(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            DownloadError::invalid_input(format!("invalid value for header {name}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
