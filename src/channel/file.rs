//! File channel: appends one JSON line per group to a target file.
//!
//! The dev and test channel; the line carries the whole group so a
//! reader can reconstruct what would have been delivered.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::channel::{ChannelSender, SendReceipt};
use crate::model::MessageContentGroup;

/// File channel configuration.
#[derive(Debug, Clone)]
pub struct FileChannelConfig {
    pub key: String,
    pub path: PathBuf,
}

pub struct FileChannel {
    config: FileChannelConfig,
}

impl FileChannel {
    pub fn new(config: FileChannelConfig) -> Self {
        Self { config }
    }
}

impl ChannelSender for FileChannel {
    fn key(&self) -> &str {
        &self.config.key
    }

    fn send(&self, group: &MessageContentGroup) -> Result<SendReceipt> {
        use fs2::FileExt;

        if let Some(parent) = self.config.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.path)?;

        file.lock_exclusive()?;
        let mut file = file;
        writeln!(file, "{}", serde_json::to_string(group)?)?;
        file.unlock()?;

        info!(
            channel = %self.config.key,
            event_id = %group.event_id,
            path = %self.config.path.display(),
            "group appended"
        );
        Ok(SendReceipt::Accepted)
    }
}
