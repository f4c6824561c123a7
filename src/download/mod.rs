//! Streaming download orchestration.
//!
//! This module turns URL-fetch requests into exactly-once results while an
//! observer receives throttled progress events.
//!
//! # Features
//!
//! - Downloadability probing before any resources are committed
//! - Streaming transfers (memory-efficient for large files)
//! - Concurrent downloads keyed by opaque task handles, no cross-talk
//! - Temp-file staging with relocation into the caller's storage layout
//! - Throttled, in-order progress notification (200 ms reference interval)
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use filefetch_core::{DownloadEngine, DownloadRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new("./downloads");
//! let path = engine
//!     .download_file(DownloadRequest::new("https://example.com/paper.pdf", "paper.pdf"))
//!     .await?;
//! println!("Downloaded: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
pub mod filename;
mod observer;
mod probe;
mod registry;
mod relocate;
pub mod throttle;

pub use client::HttpClient;
pub use engine::{DownloadEngine, DownloadRequest, PendingDownload};
pub use error::{DownloadError, FailureKind};
pub use observer::{NoopProgressObserver, ProgressObserver, status};
pub use probe::classify_response;
pub use registry::{TaskHandle, TaskRegistry, TaskState};
pub use relocate::relocate;

// Note: no module-local Result aliases. Use `Result<T, DownloadError>`
// explicitly in function signatures.
