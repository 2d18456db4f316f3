//! 出站渠道 trait 与注册表

pub mod command;
pub mod console;
pub mod file;
pub mod render;
pub mod webhook;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::model::MessageContentGroup;

pub use command::{CommandChannel, CommandChannelConfig};
pub use console::ConsoleChannel;
pub use file::{FileChannel, FileChannelConfig};
pub use webhook::{WebhookChannel, WebhookChannelConfig};

/// 发送回执
///
/// `Rejected` 表示渠道端点明确拒绝（HTTP 非 2xx、命令非零退出），
/// 传输层故障走 `Err`。两者对派发网关都算渠道错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendReceipt {
    Accepted,
    Rejected(String),
}

/// 出站渠道
pub trait ChannelSender: Send + Sync {
    /// 渠道键（任务配置里引用的标识）
    fn key(&self) -> &str;

    /// 同步发送一个消息组
    fn send(&self, group: &MessageContentGroup) -> Result<SendReceipt>;
}

/// 渠道注册表（键 → 发送器）
///
/// 可设置兜底发送器：键未注册时使用兜底（dry-run 把兜底设为
/// 控制台渠道，让所有任务的输出落到终端）。
#[derive(Default)]
pub struct ChannelRegistry {
    senders: HashMap<String, Arc<dyn ChannelSender>>,
    fallback: Option<Arc<dyn ChannelSender>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册发送器，键取自发送器自身
    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(sender.key().to_string(), sender);
    }

    /// 设置兜底发送器
    pub fn with_fallback(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.fallback = Some(sender);
        self
    }

    /// 按键解析发送器，未注册时返回兜底（若有）
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn ChannelSender>> {
        self.senders
            .get(key)
            .cloned()
            .or_else(|| self.fallback.clone())
    }

    /// 已注册的渠道键（排序后，用于日志）
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.senders.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullChannel {
        key: String,
    }

    impl ChannelSender for NullChannel {
        fn key(&self) -> &str {
            &self.key
        }

        fn send(&self, _group: &MessageContentGroup) -> Result<SendReceipt> {
            Ok(SendReceipt::Accepted)
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ChannelRegistry::new();
        registry.register(Arc::new(NullChannel {
            key: "team-slack".to_string(),
        }));

        assert!(registry.resolve("team-slack").is_some());
        assert!(registry.resolve("missing").is_none());
        assert_eq!(registry.keys(), vec!["team-slack"]);
    }

    #[test]
    fn test_fallback_covers_unknown_keys() {
        let registry = ChannelRegistry::new().with_fallback(Arc::new(NullChannel {
            key: "console".to_string(),
        }));

        let sender = registry.resolve("anything").unwrap();
        assert_eq!(sender.key(), "console");
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ChannelRegistry::new();
        registry.register(Arc::new(NullChannel {
            key: "dup".to_string(),
        }));
        registry.register(Arc::new(NullChannel {
            key: "dup".to_string(),
        }));

        assert_eq!(registry.keys().len(), 1);
    }
}
