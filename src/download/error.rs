//! Error types for the download module.
//!
//! This module defines structured errors for all download operations,
//! providing context-rich error messages for debugging and user feedback.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during file downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request itself is unusable (malformed URL, empty file name,
    /// invalid header). Fails fast; nothing is allocated.
    #[error("invalid input: {detail}")]
    InvalidInput {
        /// What was wrong with the request.
        detail: String,
    },

    /// The downloadability probe rejected the resource. Fails fast; no task
    /// is registered.
    #[error("not a downloadable resource: {url}")]
    NotDownloadable {
        /// The URL that failed the probe.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors,
    /// timeouts, mid-stream resets).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The transfer request returned an error status (4xx, 5xx).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body ended before the announced length, or the worker driving the
    /// transfer died without delivering a result.
    #[error("transfer interrupted for {url}: {detail}")]
    Interrupted {
        /// The URL whose transfer was cut short.
        url: String,
        /// What was observed.
        detail: String,
    },

    /// File system error (temp-file creation, write, directory creation,
    /// final move).
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The download was cancelled through its task handle. Distinct from
    /// transport failure by design.
    #[error("download cancelled: {url}")]
    Cancelled {
        /// The URL whose transfer was cancelled.
        url: String,
    },
}

/// Coarse failure taxonomy, one kind per terminal outcome class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Malformed request; nothing was allocated.
    InvalidInput,
    /// Probe rejected the resource; no task was registered.
    NotDownloadable,
    /// Network or protocol failure during the transfer.
    Transport,
    /// Directory creation, write, or move failure.
    Filesystem,
    /// Explicit cancellation.
    Cancelled,
}

impl DownloadError {
    /// Creates an invalid-input error.
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            detail: detail.into(),
        }
    }

    /// Creates a probe-rejection error.
    pub fn not_downloadable(url: impl Into<String>) -> Self {
        Self::NotDownloadable { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an interrupted-transfer error.
    pub fn interrupted(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Interrupted {
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates a cancellation outcome.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Maps this error onto the coarse failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput { .. } => FailureKind::InvalidInput,
            Self::NotDownloadable { .. } => FailureKind::NotDownloadable,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::Interrupted { .. } => {
                FailureKind::Transport
            }
            Self::Filesystem { .. } => FailureKind::Filesystem,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because the variants require context (url, path)
// that the source errors don't carry. The helper constructors are the
// correct pattern here.
