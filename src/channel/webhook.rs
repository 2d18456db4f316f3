//! Webhook 渠道 - 把消息组投递到聊天 webhook
//!
//! 发送渲染文本加事件 ID 的 JSON 载荷；非 2xx 响应算拒绝，
//! 传输失败走错误。

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::channel::{render::render_group, ChannelSender, SendReceipt};
use crate::model::MessageContentGroup;

/// Webhook 渠道配置
#[derive(Debug, Clone)]
pub struct WebhookChannelConfig {
    /// 渠道键
    pub key: String,
    /// 目标 URL
    pub url: String,
    /// Bearer token（可选）
    pub token: Option<String>,
    /// 超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for WebhookChannelConfig {
    fn default() -> Self {
        Self {
            key: "webhook".to_string(),
            url: String::new(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Webhook 请求载荷
#[derive(Debug, Serialize)]
struct WebhookPayload {
    text: String,
    event_id: Uuid,
    job_id: Uuid,
}

/// Webhook 渠道
pub struct WebhookChannel {
    client: reqwest::blocking::Client,
    config: WebhookChannelConfig,
}

impl WebhookChannel {
    pub fn new(config: WebhookChannelConfig) -> Result<Self> {
        if config.url.is_empty() {
            anyhow::bail!("webhook channel '{}' 缺少 url", config.key);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("构建 HTTP 客户端失败")?;

        Ok(Self { client, config })
    }
}

impl ChannelSender for WebhookChannel {
    fn key(&self) -> &str {
        &self.config.key
    }

    fn send(&self, group: &MessageContentGroup) -> Result<SendReceipt> {
        let payload = WebhookPayload {
            text: render_group(group),
            event_id: group.event_id,
            job_id: group.job_id,
        };

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().context("webhook 请求失败")?;
        let status = response.status();

        if status.is_success() {
            info!(
                channel = %self.config.key,
                event_id = %group.event_id,
                "webhook 投递成功"
            );
            Ok(SendReceipt::Accepted)
        } else {
            let body = response.text().unwrap_or_default();
            Ok(SendReceipt::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_is_rejected_at_construction() {
        let result = WebhookChannel::new(WebhookChannelConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = WebhookChannelConfig::default();
        assert_eq!(config.key, "webhook");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload {
            text: "[real_time] 1 finding(s)".to_string(),
            event_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json["text"].is_string());
        assert!(json["event_id"].is_string());
        assert!(json["job_id"].is_string());
    }
}
