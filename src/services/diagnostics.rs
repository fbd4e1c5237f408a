//! Flat-file operator logs, kept alongside `tracing` output.
//!
//! Every append is best effort: a broken log must never change what the
//! caller of the connect endpoint sees.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;
use crate::models::smartapi::UpstreamReply;

/// How much of an upstream body goes into the debug log.
const DEBUG_EXCERPT_CHARS: usize = 200;

/// Append-only diagnostic logs.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    error_log: PathBuf,
    debug_log: PathBuf,
}

impl Diagnostics {
    pub fn new(error_log: PathBuf, debug_log: PathBuf) -> Self {
        Self {
            error_log,
            debug_log,
        }
    }

    /// Records a failed connect attempt.
    pub async fn record_error(&self, error: &AppError) {
        let line = format!("{} | ERROR: {}\n", Utc::now().to_rfc3339(), error);
        append_line(&self.error_log, &line).await;
    }

    /// Records the status and the start of an upstream reply.
    pub async fn record_upstream_reply(&self, reply: &UpstreamReply) {
        let line = format!(
            "{} | HTTP {} | resp: {}\n",
            Utc::now().to_rfc3339(),
            reply.status.as_u16(),
            reply.body_excerpt(DEBUG_EXCERPT_CHARS)
        );
        append_line(&self.debug_log, &line).await;
    }
}

async fn append_line(path: &Path, line: &str) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!("⚠️ Cannot create log directory {}: {}", parent.display(), e);
            return;
        }
    }

    let result = async {
        let mut options = tokio::fs::OpenOptions::new();
        options.create(true).append(true);
        // Upstream replies carry the session token.
        #[cfg(unix)]
        options.mode(0o640);

        let mut file = options.open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = result {
        tracing::warn!("⚠️ Cannot append to {}: {}", path.display(), e);
    }
}
