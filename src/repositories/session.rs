use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::session::SessionRecord;
use crate::storage::atomic::{parent_dir, write_atomic};

/// Name of the flag file dropped next to the session after a dashboard login.
pub const MANUAL_CONNECT_FLAG: &str = "smartapi_manual_connect.flag";

/// Persists the session record, replacing any previous one.
///
/// # Arguments
///
/// * `session_file` - Target path of the session JSON.
/// * `web_root` - Directory the file must stay out of.
/// * `record` - The record to write.
pub async fn save_session(
    session_file: &Path,
    web_root: &Path,
    record: SessionRecord,
) -> Result<()> {
    let dir = parent_dir(session_file);
    if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        create_session_dir(&dir).await?;
        tracing::info!("📁 Created session directory {}", dir.display());
    }

    let session_file = session_file.to_path_buf();
    let web_root = web_root.to_path_buf();

    tokio::task::spawn_blocking(move || write_atomic(&session_file, &record, &web_root))
        .await
        .map_err(|e| AppError::Internal(format!("Session write task failed: {}", e)))?
}

async fn create_session_dir(dir: &Path) -> Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o750);

    builder.create(dir).await.map_err(|e| {
        AppError::Storage(format!(
            "Cannot create session directory: {} ({})",
            dir.display(),
            e
        ))
    })
}

/// Drops the manual-connect flag next to the session file.
///
/// Best effort: the flag is advisory, so failures are logged and dropped.
pub async fn mark_manual_connect(session_file: &Path, unix_ts: i64) {
    let flag = manual_connect_flag_path(session_file);
    if let Err(e) = tokio::fs::write(&flag, unix_ts.to_string()).await {
        tracing::warn!("⚠️ Could not write {}: {}", flag.display(), e);
    }
}

/// Where [`mark_manual_connect`] writes its flag.
pub fn manual_connect_flag_path(session_file: &Path) -> PathBuf {
    parent_dir(session_file).join(MANUAL_CONNECT_FLAG)
}
