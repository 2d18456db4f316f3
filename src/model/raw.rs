//! 原始通知模型 - 提供方轮询落库后的未加工事件
//!
//! 管道只读：由提供方轮询器（外部协作方）写入，保留策略（外部）负责归档清理。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 提供方通知类型
///
/// 线上格式使用提供方的大写蛇形命名（`RULE_VIOLATION` 等）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// 策略规则违规
    RuleViolation,
    /// 策略违规已清除
    RuleViolationCleared,
    /// 策略被人工豁免
    PolicyOverride,
    /// 漏洞通知
    Vulnerability,
    /// BOM 组件编辑
    BomEdit,
    /// 项目版本创建/删除等
    ProjectVersion,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RuleViolation => "RULE_VIOLATION",
            NotificationType::RuleViolationCleared => "RULE_VIOLATION_CLEARED",
            NotificationType::PolicyOverride => "POLICY_OVERRIDE",
            NotificationType::Vulnerability => "VULNERABILITY",
            NotificationType::BomEdit => "BOM_EDIT",
            NotificationType::ProjectVersion => "PROJECT_VERSION",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 原始提供方通知
///
/// `content` 是提供方序列化的不透明载荷，按 `notification_type` 由提取器解析。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNotification {
    /// 通知 ID（存储层分配）
    pub id: i64,
    /// 提供方配置 ID（区分多个提供方实例）
    pub provider_config_id: i64,
    /// 通知类型
    pub notification_type: NotificationType,
    /// 入库时间
    pub created_at: DateTime<Utc>,
    /// 提供方侧的产生时间
    pub provider_creation_time: DateTime<Utc>,
    /// 提供方载荷（不透明 JSON）
    pub content: Value,
}

impl RawNotification {
    /// 创建新的原始通知，两个时间戳默认取当前时刻
    pub fn new(
        id: i64,
        provider_config_id: i64,
        notification_type: NotificationType,
        content: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            provider_config_id,
            notification_type,
            created_at: now,
            provider_creation_time: now,
            content,
        }
    }

    /// 设置入库时间（链式调用）
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// 设置提供方产生时间（链式调用）
    pub fn with_provider_creation_time(mut self, time: DateTime<Utc>) -> Self {
        self.provider_creation_time = time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_wire_format() {
        // 序列化必须是提供方的大写蛇形格式
        let json = serde_json::to_string(&NotificationType::RuleViolation).unwrap();
        assert_eq!(json, "\"RULE_VIOLATION\"");

        let parsed: NotificationType =
            serde_json::from_str("\"RULE_VIOLATION_CLEARED\"").unwrap();
        assert_eq!(parsed, NotificationType::RuleViolationCleared);
    }

    #[test]
    fn test_notification_type_as_str() {
        assert_eq!(NotificationType::PolicyOverride.as_str(), "POLICY_OVERRIDE");
        assert_eq!(NotificationType::Vulnerability.as_str(), "VULNERABILITY");
        assert_eq!(NotificationType::BomEdit.as_str(), "BOM_EDIT");
    }

    #[test]
    fn test_raw_notification_roundtrip() {
        let raw = RawNotification::new(
            7,
            1,
            NotificationType::Vulnerability,
            serde_json::json!({"componentName": "openssl"}),
        );

        let json = serde_json::to_string(&raw).unwrap();
        let parsed: RawNotification = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.provider_config_id, 1);
        assert_eq!(parsed.notification_type, NotificationType::Vulnerability);
        assert_eq!(parsed.content["componentName"], "openssl");
    }

    #[test]
    fn test_with_created_at() {
        let ts = "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let raw = RawNotification::new(1, 1, NotificationType::BomEdit, Value::Null)
            .with_created_at(ts)
            .with_provider_creation_time(ts);

        assert_eq!(raw.created_at, ts);
        assert_eq!(raw.provider_creation_time, ts);
    }
}
