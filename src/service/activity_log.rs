//! Append-only activity log.
//!
//! One UTF-8 line per event: `<local timestamp> - <message>`. Writers are
//! serialized so concurrent handlers never interleave partial lines.

use crate::error::Result;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Truncate the file and write the header line.
    pub async fn init(&self, header: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::write(&self.path, format_line(header)).await?;
        Ok(())
    }

    /// Append one line.
    pub async fn append(&self, message: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format_line(message).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Append one line, logging instead of returning failures.
    pub async fn record(&self, message: &str) {
        if let Err(e) = self.append(message).await {
            warn!(path = %self.path.display(), "activity log write failed: {e}");
        }
    }
}

fn format_line(message: &str) -> String {
    format!(
        "{} - {message}\n",
        chrono::Local::now().format(TIMESTAMP_FORMAT)
    )
}
