//! Console channel: prints the rendered group to stdout.

use anyhow::Result;

use crate::channel::{render::render_group, ChannelSender, SendReceipt};
use crate::model::MessageContentGroup;

/// Always-accepting stdout channel; also the dry-run fallback.
pub struct ConsoleChannel {
    key: String,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self::with_key("console")
    }

    /// Registers under a custom key instead of the default "console".
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSender for ConsoleChannel {
    fn key(&self) -> &str {
        &self.key
    }

    fn send(&self, group: &MessageContentGroup) -> Result<SendReceipt> {
        println!("📨 {}", render_group(group).trim_end());
        Ok(SendReceipt::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DistributionJob, FrequencyType, JobFilterCriteria};

    #[test]
    fn test_console_always_accepts() {
        let job = DistributionJob::new(
            "console test",
            FrequencyType::RealTime,
            "console",
            JobFilterCriteria::for_provider(1),
        );
        let group = MessageContentGroup::new(&job);

        let channel = ConsoleChannel::new();
        assert_eq!(channel.key(), "console");
        assert_eq!(channel.send(&group).unwrap(), SendReceipt::Accepted);
    }
}
