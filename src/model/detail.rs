//! 提取后的通知明细模型
//!
//! 每条原始通知经提取器展开为零或多条明细：一条明细只描述一个
//! (项目, 版本, 关注点) 组合，是匹配、合并、分组的最小单元。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::raw::{NotificationType, RawNotification};

/// 通知类别 - 决定合并规则与过滤子条件的适用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// 策略违规/清除/豁免
    Policy,
    /// 漏洞
    Vulnerability,
    /// BOM 组件编辑
    BomEdit,
    /// 其他（项目版本创建/删除等）
    Other,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Policy => "policy",
            NotificationCategory::Vulnerability => "vulnerability",
            NotificationCategory::BomEdit => "bom_edit",
            NotificationCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 策略明细的状态
///
/// `InViolation` 是活跃状态，`Cleared` / `Overridden` 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    InViolation,
    Cleared,
    Overridden,
}

impl PolicyStatus {
    /// 是否为终态（违规已关闭）
    pub fn is_terminal(&self) -> bool {
        matches!(self, PolicyStatus::Cleared | PolicyStatus::Overridden)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::InViolation => "in_violation",
            PolicyStatus::Cleared => "cleared",
            PolicyStatus::Overridden => "overridden",
        }
    }
}

impl std::fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 漏洞严重度 - 线上格式沿用提供方的大写形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VulnerabilitySeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl VulnerabilitySeverity {
    /// 数值权重，越大越严重
    pub fn rank(&self) -> u8 {
        match self {
            VulnerabilitySeverity::Critical => 4,
            VulnerabilitySeverity::High => 3,
            VulnerabilitySeverity::Medium => 2,
            VulnerabilitySeverity::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnerabilitySeverity::Critical => "CRITICAL",
            VulnerabilitySeverity::High => "HIGH",
            VulnerabilitySeverity::Medium => "MEDIUM",
            VulnerabilitySeverity::Low => "LOW",
        }
    }

    /// 从提供方字符串解析，大小写不敏感，未知值返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(VulnerabilitySeverity::Critical),
            "HIGH" => Some(VulnerabilitySeverity::High),
            "MEDIUM" => Some(VulnerabilitySeverity::Medium),
            "LOW" => Some(VulnerabilitySeverity::Low),
            _ => None,
        }
    }
}

impl Ord for VulnerabilitySeverity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for VulnerabilitySeverity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for VulnerabilitySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 内容键 - 明细的稳定事实标识
///
/// 键相等表示"同一演化中的事实"：合并器只在键相等时考虑抵消/合并。
/// 各类别使用的槽位不同（策略带 policy/component，漏洞带 component，
/// Other 带 operation），未用槽位保持 None。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub category: NotificationCategory,
    pub project_name: String,
    pub project_version_name: Option<String>,
    pub policy_name: Option<String>,
    pub component_name: Option<String>,
    pub component_version_name: Option<String>,
    pub operation: Option<String>,
}

impl ContentKey {
    pub fn new(category: NotificationCategory, project_name: impl Into<String>) -> Self {
        Self {
            category,
            project_name: project_name.into(),
            project_version_name: None,
            policy_name: None,
            component_name: None,
            component_version_name: None,
            operation: None,
        }
    }

    pub fn with_project_version(mut self, version: Option<String>) -> Self {
        self.project_version_name = version;
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy_name = Some(policy.into());
        self
    }

    pub fn with_component(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.component_name = Some(name.into());
        self.component_version_name = version;
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![self.category.as_str().to_string(), self.project_name.clone()];
        for slot in [
            &self.project_version_name,
            &self.policy_name,
            &self.component_name,
            &self.component_version_name,
            &self.operation,
        ] {
            if let Some(value) = slot {
                parts.push(value.clone());
            }
        }
        write!(f, "{}", parts.join("|"))
    }
}

/// 策略明细载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPayload {
    pub policy_name: String,
    pub component_name: String,
    pub component_version_name: Option<String>,
    pub status: PolicyStatus,
    /// 豁免操作人（仅 Overridden 状态携带）
    pub overrider: Option<String>,
}

/// 漏洞明细载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityPayload {
    pub component_name: String,
    pub component_version_name: Option<String>,
    /// 去重后的严重度集合
    pub severities: Vec<VulnerabilitySeverity>,
    pub new_ids: Vec<String>,
    pub updated_ids: Vec<String>,
    pub deleted_ids: Vec<String>,
}

/// BOM 编辑明细载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEditPayload {
    pub component_name: String,
    pub component_version_name: Option<String>,
}

/// 其他类别载荷（项目版本创建/删除等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherPayload {
    pub operation: String,
}

/// 按类别区分的明细载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailPayload {
    Policy(PolicyPayload),
    Vulnerability(VulnerabilityPayload),
    BomEdit(BomEditPayload),
    Other(OtherPayload),
}

/// 提取后的通知明细
///
/// 提取阶段之后管道只操作这个类型，不再回看原始载荷。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedNotificationContent {
    /// 来源原始通知 ID
    pub source_notification_id: i64,
    pub provider_config_id: i64,
    pub notification_type: NotificationType,
    pub category: NotificationCategory,
    pub project_name: String,
    pub project_version_name: Option<String>,
    pub content_key: ContentKey,
    pub payload: DetailPayload,
    /// 来源通知的入库时间（合并时保留较早者）
    pub created_at: DateTime<Utc>,
}

impl DetailedNotificationContent {
    /// 构造策略类明细，内容键由 (项目, 版本, 策略, 组件) 推导
    pub fn policy(
        source: &RawNotification,
        project_name: impl Into<String>,
        project_version_name: Option<String>,
        payload: PolicyPayload,
    ) -> Self {
        let project_name = project_name.into();
        let content_key = ContentKey::new(NotificationCategory::Policy, project_name.clone())
            .with_project_version(project_version_name.clone())
            .with_policy(payload.policy_name.clone())
            .with_component(
                payload.component_name.clone(),
                payload.component_version_name.clone(),
            );
        Self {
            source_notification_id: source.id,
            provider_config_id: source.provider_config_id,
            notification_type: source.notification_type,
            category: NotificationCategory::Policy,
            project_name,
            project_version_name,
            content_key,
            payload: DetailPayload::Policy(payload),
            created_at: source.created_at,
        }
    }

    /// 构造漏洞类明细，内容键由 (项目, 版本, 组件) 推导
    pub fn vulnerability(
        source: &RawNotification,
        project_name: impl Into<String>,
        project_version_name: Option<String>,
        payload: VulnerabilityPayload,
    ) -> Self {
        let project_name = project_name.into();
        let content_key =
            ContentKey::new(NotificationCategory::Vulnerability, project_name.clone())
                .with_project_version(project_version_name.clone())
                .with_component(
                    payload.component_name.clone(),
                    payload.component_version_name.clone(),
                );
        Self {
            source_notification_id: source.id,
            provider_config_id: source.provider_config_id,
            notification_type: source.notification_type,
            category: NotificationCategory::Vulnerability,
            project_name,
            project_version_name,
            content_key,
            payload: DetailPayload::Vulnerability(payload),
            created_at: source.created_at,
        }
    }

    /// 构造 BOM 编辑明细
    pub fn bom_edit(
        source: &RawNotification,
        project_name: impl Into<String>,
        project_version_name: Option<String>,
        payload: BomEditPayload,
    ) -> Self {
        let project_name = project_name.into();
        let content_key = ContentKey::new(NotificationCategory::BomEdit, project_name.clone())
            .with_project_version(project_version_name.clone())
            .with_component(
                payload.component_name.clone(),
                payload.component_version_name.clone(),
            );
        Self {
            source_notification_id: source.id,
            provider_config_id: source.provider_config_id,
            notification_type: source.notification_type,
            category: NotificationCategory::BomEdit,
            project_name,
            project_version_name,
            content_key,
            payload: DetailPayload::BomEdit(payload),
            created_at: source.created_at,
        }
    }

    /// 构造其他类别明细（操作名进入内容键，创建/删除不会互相折叠）
    pub fn other(
        source: &RawNotification,
        project_name: impl Into<String>,
        project_version_name: Option<String>,
        payload: OtherPayload,
    ) -> Self {
        let project_name = project_name.into();
        let content_key = ContentKey::new(NotificationCategory::Other, project_name.clone())
            .with_project_version(project_version_name.clone())
            .with_operation(payload.operation.clone());
        Self {
            source_notification_id: source.id,
            provider_config_id: source.provider_config_id,
            notification_type: source.notification_type,
            category: NotificationCategory::Other,
            project_name,
            project_version_name,
            content_key,
            payload: DetailPayload::Other(payload),
            created_at: source.created_at,
        }
    }

    /// 策略状态（非策略类别返回 None）
    pub fn policy_status(&self) -> Option<PolicyStatus> {
        match &self.payload {
            DetailPayload::Policy(p) => Some(p.status),
            _ => None,
        }
    }

    /// 严重度集合（非漏洞类别返回空切片）
    pub fn severities(&self) -> &[VulnerabilitySeverity] {
        match &self.payload {
            DetailPayload::Vulnerability(p) => &p.severities,
            _ => &[],
        }
    }
}
