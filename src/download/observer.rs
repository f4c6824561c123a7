//! Progress observer boundary.
//!
//! The engine reports download lifecycle events through this trait and
//! never waits on observer-side work: notifications are queued per task and
//! drained by a dedicated notifier, so a slow observer cannot stall a
//! transfer. Implementations that cannot (or should not) display progress
//! substitute [`NoopProgressObserver`]; the engine always talks to the same
//! interface.

use async_trait::async_trait;

/// Status texts forwarded with progress updates.
pub mod status {
    /// Sent once before the first byte arrives.
    pub const STARTING: &str = "starting";
    /// Sent with every intermediate sample.
    pub const DOWNLOADING: &str = "downloading";
    /// Terminal status of a successful download.
    pub const DONE: &str = "done";
    /// Terminal status of a failed download.
    pub const FAILED: &str = "failed";
    /// Terminal status of a cancelled download.
    pub const CANCELLED: &str = "cancelled";
}

/// Receives start/update/end notifications for a download.
///
/// `key` derives from the requested file name, not the internal task handle,
/// so concurrent downloads of distinct file names produce distinct observer
/// entries. For a single key, `started` comes first, `updated` fractions are
/// non-decreasing in `[0, 1]`, and `ended` is last. A failing observer never
/// fails the download.
#[async_trait]
pub trait ProgressObserver: Send + Sync + 'static {
    /// A download for `key` has been registered and is about to transfer.
    async fn started(&self, key: &str);

    /// A progress sample passed the throttle, or a terminal sample arrived.
    async fn updated(&self, key: &str, fraction: f64, status: &str);

    /// No further notifications will arrive for `key`.
    async fn ended(&self, key: &str);
}

/// Observer used when progress observation is unsupported or disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressObserver;

#[async_trait]
impl ProgressObserver for NoopProgressObserver {
    async fn started(&self, _key: &str) {}

    async fn updated(&self, _key: &str, _fraction: f64, _status: &str) {}

    async fn ended(&self, _key: &str) {}
}
