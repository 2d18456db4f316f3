//! External command channel.
//!
//! Pipes the rendered text to a configured command over stdin, in the
//! style of a sendmail hand-off. Relative program names are resolved
//! through PATH at construction time so a missing binary surfaces as a
//! configuration error, not a per-send failure.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::channel::{render::render_group, ChannelSender, SendReceipt};
use crate::model::MessageContentGroup;

/// Command channel configuration.
#[derive(Debug, Clone)]
pub struct CommandChannelConfig {
    pub key: String,
    /// Program name or absolute path.
    pub program: String,
    pub args: Vec<String>,
}

pub struct CommandChannel {
    config: CommandChannelConfig,
    resolved: PathBuf,
}

impl CommandChannel {
    pub fn new(config: CommandChannelConfig) -> Result<Self> {
        let program = Path::new(&config.program);
        let resolved = if program.is_absolute() {
            program.to_path_buf()
        } else {
            which::which(&config.program)
                .with_context(|| format!("command '{}' not found in PATH", config.program))?
        };

        Ok(Self { config, resolved })
    }
}

impl ChannelSender for CommandChannel {
    fn key(&self) -> &str {
        &self.config.key
    }

    fn send(&self, group: &MessageContentGroup) -> Result<SendReceipt> {
        let rendered = render_group(group);

        let mut child = Command::new(&self.resolved)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.resolved.display()))?;

        {
            let mut stdin = child.stdin.take().context("command stdin unavailable")?;
            stdin.write_all(rendered.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            info!(
                channel = %self.config.key,
                event_id = %group.event_id,
                "command delivery succeeded"
            );
            Ok(SendReceipt::Accepted)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                channel = %self.config.key,
                error = %stderr,
                "command delivery failed"
            );
            Ok(SendReceipt::Rejected(stderr.trim().to_string()))
        }
    }
}
