//! Plain-text request and metrics logs
//!
//! Separate from the tracing output: these files are what `GET /logs`
//! serves and what `DELETE /clear_logs` truncates.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::{GatewayError, GatewayResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

pub struct RequestLog {
    request_path: PathBuf,
    metrics_path: PathBuf,
    // Serializes appends and truncation across both files
    lock: Mutex<()>,
}

impl RequestLog {
    pub fn new(request_path: impl Into<PathBuf>, metrics_path: impl Into<PathBuf>) -> Self {
        Self {
            request_path: request_path.into(),
            metrics_path: metrics_path.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn append_request(&self, message: &str) -> GatewayResult<()> {
        let _guard = self.lock.lock().await;
        append_line(&self.request_path, message).await
    }

    pub async fn append_metrics(&self, message: &str) -> GatewayResult<()> {
        let _guard = self.lock.lock().await;
        append_line(&self.metrics_path, message).await
    }

    /// Full request log contents. A log that was never written reads as empty.
    pub async fn read_requests(&self) -> GatewayResult<String> {
        let _guard = self.lock.lock().await;
        match fs::read_to_string(&self.request_path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(io_err(&self.request_path, e)),
        }
    }

    /// Truncate both files
    pub async fn clear(&self) -> GatewayResult<()> {
        let _guard = self.lock.lock().await;
        for path in [&self.request_path, &self.metrics_path] {
            ensure_parent(path).await?;
            fs::write(path, b"").await.map_err(|e| io_err(path, e))?;
        }
        Ok(())
    }
}

async fn append_line(path: &Path, message: &str) -> GatewayResult<()> {
    ensure_parent(path).await?;
    let line = format!("{} - {}\n", Utc::now().format(TIMESTAMP_FORMAT), message);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| io_err(path, e))?;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| io_err(path, e))?;
    file.flush().await.map_err(|e| io_err(path, e))
}

async fn ensure_parent(path: &Path) -> GatewayResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .await
            .map_err(|e| io_err(dir, e)),
        _ => Ok(()),
    }
}

fn io_err(path: &Path, e: std::io::Error) -> GatewayError {
    GatewayError::StorageUnavailable(format!("{}: {}", path.display(), e))
}
