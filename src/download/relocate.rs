//! Relocation of completed temporary artifacts.
//!
//! Moves a finished temp file to `base_dir[/subfolder]/file_name`, creating
//! the subfolder as needed and overwriting any file already at the
//! destination. This is a move, not a copy: no byte duplication.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use super::error::DownloadError;

/// Moves `temp_path` into place under `base_dir`.
///
/// A `None` or empty subfolder targets the base directory root. Directory
/// creation is idempotent. An existing destination file is removed first,
/// best-effort — if removal fails but the destination can still be replaced,
/// the rename succeeds anyway; if it truly cannot be, the rename fails
/// loudly.
///
/// # Errors
///
/// Returns [`DownloadError::Filesystem`] with the failing path when the
/// subfolder cannot be created or the move fails.
#[instrument(level = "debug", skip(temp_path, base_dir), fields(file = %file_name))]
pub async fn relocate(
    temp_path: &Path,
    base_dir: &Path,
    subfolder: Option<&str>,
    file_name: &str,
) -> Result<PathBuf, DownloadError> {
    let target_dir = match subfolder.filter(|s| !s.is_empty()) {
        Some(sub) => {
            let dir = base_dir.join(sub);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| DownloadError::filesystem(dir.clone(), e))?;
            dir
        }
        None => base_dir.to_path_buf(),
    };

    let destination = target_dir.join(file_name);
    let _ = tokio::fs::remove_file(&destination).await;

    tokio::fs::rename(temp_path, &destination)
        .await
        .map_err(|e| DownloadError::filesystem(destination.clone(), e))?;

    debug!(path = %destination.display(), "artifact relocated");
    Ok(destination)
}
