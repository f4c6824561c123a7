//! Concurrency-safe registry of in-flight download tasks.
//!
//! The registry is the only mutable state shared across concurrent
//! transfers. It owns every `DownloadTask` from registration to removal;
//! nothing outside this module can reach task internals except through the
//! synchronized accessors here. Exactly-once result delivery is enforced
//! structurally: `resolve` removes the entry and takes the task's oneshot
//! sender in one step, so a duplicate terminal event finds no task and
//! becomes a no-op.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::{oneshot, watch};
use tracing::debug;

use super::engine::DownloadRequest;
use super::error::DownloadError;

/// Opaque identifier scoping all per-download mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle states of a download task.
///
/// Terminal states are never stored: reaching one coincides with the entry's
/// removal, so `state()` returns `None` once a task has completed, failed,
/// or been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Registered; the transfer request has not produced a response yet.
    Probing,
    /// Streaming bytes to the temporary artifact.
    Transferring,
    /// Moving the finished artifact into place.
    Relocating,
    /// Finished with a destination path.
    Completed,
    /// Finished with a failure.
    Failed,
    /// Finished by explicit cancellation.
    Cancelled,
}

/// Per-download mutable state, owned exclusively by the registry.
#[derive(Debug)]
pub(crate) struct DownloadTask {
    pub(crate) request: DownloadRequest,
    pub(crate) state: TaskState,
    /// Last fraction forwarded to the observer; non-decreasing.
    pub(crate) last_progress: f64,
    /// When the last sample was forwarded, for throttling.
    pub(crate) last_notified_at: Option<Instant>,
    /// Single-assignment result slot; taken exactly once by `resolve`.
    result_tx: Option<oneshot::Sender<Result<PathBuf, DownloadError>>>,
    /// Level-triggered cancellation signal.
    cancel_tx: watch::Sender<bool>,
}

/// Concurrency-safe map from task handle to per-download state.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    next_handle: AtomicU64,
    tasks: DashMap<TaskHandle, DownloadTask>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new task and returns its handle.
    pub(crate) fn register(
        &self,
        request: DownloadRequest,
        result_tx: oneshot::Sender<Result<PathBuf, DownloadError>>,
        cancel_tx: watch::Sender<bool>,
    ) -> TaskHandle {
        let handle = TaskHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.tasks.insert(
            handle,
            DownloadTask {
                request,
                state: TaskState::Probing,
                last_progress: 0.0,
                last_notified_at: None,
                result_tx: Some(result_tx),
                cancel_tx,
            },
        );
        handle
    }

    /// Returns whether `handle` is still registered.
    #[must_use]
    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    /// Returns the current state of `handle`, or `None` once resolved.
    #[must_use]
    pub fn state(&self, handle: TaskHandle) -> Option<TaskState> {
        self.tasks.get(&handle).map(|task| task.state)
    }

    /// Number of in-flight tasks.
    #[must_use]
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    /// Applies `mutate` to the task under the map's synchronization.
    ///
    /// A no-op returning `None` for unknown or already-removed handles. The
    /// closure must not block or await.
    pub(crate) fn update<R>(
        &self,
        handle: TaskHandle,
        mutate: impl FnOnce(&mut DownloadTask) -> R,
    ) -> Option<R> {
        self.tasks
            .get_mut(&handle)
            .map(|mut entry| mutate(entry.value_mut()))
    }

    /// Resolves the task exactly once: removes the entry and delivers the
    /// outcome on its result channel.
    ///
    /// Returns `false` when the handle was already resolved (a duplicate
    /// terminal event) or never existed. The result is delivered even if the
    /// caller has stopped waiting; the send failure is then irrelevant.
    pub(crate) fn resolve(
        &self,
        handle: TaskHandle,
        result: Result<PathBuf, DownloadError>,
    ) -> bool {
        let Some((_, mut task)) = self.tasks.remove(&handle) else {
            debug!(%handle, "terminal event for unknown task ignored");
            return false;
        };
        match task.result_tx.take() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Triggers cancellation of `handle`.
    ///
    /// Returns `false` for unknown or already-resolved handles.
    pub(crate) fn cancel(&self, handle: TaskHandle) -> bool {
        match self.tasks.get(&handle) {
            Some(task) => {
                let _ = task.cancel_tx.send(true);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn request() -> DownloadRequest {
        DownloadRequest::new("https://example.com/a.pdf", "a.pdf")
    }

    fn register_one(
        registry: &TaskRegistry,
    ) -> (TaskHandle, oneshot::Receiver<Result<PathBuf, DownloadError>>) {
        let (result_tx, result_rx) = oneshot::channel();
        let (cancel_tx, _cancel_rx) = watch::channel(false);
        let handle = registry.register(request(), result_tx, cancel_tx);
        (handle, result_rx)
    }

    #[test]
    fn test_register_assigns_unique_handles() {
        let registry = TaskRegistry::new();
        let (first, _rx1) = register_one(&registry);
        let (second, _rx2) = register_one(&registry);
        assert_ne!(first, second);
        assert_eq!(registry.active(), 2);
    }

    #[test]
    fn test_new_task_starts_probing() {
        let registry = TaskRegistry::new();
        let (handle, _rx) = register_one(&registry);
        assert_eq!(registry.state(handle), Some(TaskState::Probing));
    }

    #[test]
    fn test_update_transitions_state() {
        let registry = TaskRegistry::new();
        let (handle, _rx) = register_one(&registry);

        registry.update(handle, |task| task.state = TaskState::Transferring);
        assert_eq!(registry.state(handle), Some(TaskState::Transferring));
    }

    #[test]
    fn test_update_unknown_handle_is_noop() {
        let registry = TaskRegistry::new();
        let (handle, _rx) = register_one(&registry);
        assert!(registry.resolve(handle, Ok(PathBuf::from("/tmp/a"))));

        let touched = registry.update(handle, |task| task.state = TaskState::Failed);
        assert!(touched.is_none());
    }

    #[tokio::test]
    async fn test_resolve_delivers_exactly_once() {
        let registry = TaskRegistry::new();
        let (handle, result_rx) = register_one(&registry);

        assert!(registry.resolve(handle, Ok(PathBuf::from("/data/a.pdf"))));
        // A spurious duplicate terminal event is a no-op.
        assert!(!registry.resolve(handle, Err(DownloadError::cancelled("u"))));

        let delivered = result_rx.await.unwrap();
        assert_eq!(delivered.unwrap(), PathBuf::from("/data/a.pdf"));
        assert_eq!(registry.active(), 0);
        assert!(!registry.contains(handle));
    }

    #[test]
    fn test_resolve_with_dropped_receiver_still_removes_entry() {
        let registry = TaskRegistry::new();
        let (handle, result_rx) = register_one(&registry);
        drop(result_rx);

        assert!(registry.resolve(handle, Ok(PathBuf::from("/data/a.pdf"))));
        assert!(!registry.contains(handle));
    }

    #[test]
    fn test_cancel_signals_registered_task() {
        let registry = TaskRegistry::new();
        let (result_tx, _result_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = registry.register(request(), result_tx, cancel_tx);

        assert!(registry.cancel(handle));
        assert!(*cancel_rx.borrow());
    }

    #[test]
    fn test_cancel_after_resolve_is_noop() {
        let registry = TaskRegistry::new();
        let (handle, _rx) = register_one(&registry);
        registry.resolve(handle, Ok(PathBuf::from("/tmp/a")));
        assert!(!registry.cancel(handle));
    }

    #[tokio::test]
    async fn test_concurrent_registration_yields_unique_handles() {
        let registry = Arc::new(TaskRegistry::new());
        let mut joins = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            joins.push(tokio::spawn(async move {
                let (result_tx, _result_rx) = oneshot::channel();
                let (cancel_tx, _cancel_rx) = watch::channel(false);
                registry.register(request(), result_tx, cancel_tx)
            }));
        }

        let mut handles = Vec::new();
        for join in joins {
            handles.push(join.await.unwrap());
        }
        handles.sort_by_key(|handle| handle.to_string());
        handles.dedup();
        assert_eq!(handles.len(), 16);
        assert_eq!(registry.active(), 16);
    }
}
