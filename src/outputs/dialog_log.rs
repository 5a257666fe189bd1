//! Per-user append-only dialog log.
//!
//! Every message a user sends and every reply the bot sends is appended as a
//! single JSON line to `{log_dir}/{user_id}.jsonl`. Files are opened in append
//! mode for each record and never rewritten.

use crate::models::DialogEntry;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Sink for dialog records.
pub trait DialogLog {
    async fn record(&self, entry: &DialogEntry) -> Result<(), Box<dyn Error>>;
}

/// [`DialogLog`] writing JSON lines into one file per user.
#[derive(Debug, Clone)]
pub struct FileDialogLog {
    dir: PathBuf,
}

impl FileDialogLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Log file for `user_id`.
    pub fn path_for(&self, user_id: i64) -> PathBuf {
        self.dir.join(format!("{user_id}.jsonl"))
    }
}

impl DialogLog for FileDialogLog {
    #[instrument(level = "debug", skip_all, fields(user_id = entry.user_id, is_bot = entry.is_bot))]
    async fn record(&self, entry: &DialogEntry) -> Result<(), Box<dyn Error>> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let path = self.path_for(entry.user_id);
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), "Appended dialog entry");
        Ok(())
    }
}
