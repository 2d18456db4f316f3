//! 明细提取 - 原始通知展开为可匹配的明细
//!
//! 按通知类型分派到各类别的纯提取函数；载荷损坏或引用不可解析时
//! 记 warn 并返回空结果，提取永远不会让整次运行失败。

pub mod bom_edit;
pub mod policy;
pub mod project;
pub mod vulnerability;

use crate::model::{DetailedNotificationContent, NotificationType, PolicyStatus, RawNotification};
use crate::provider::ResolverCache;

/// 明细提取器
///
/// 每次运行创建一个，内部共享同一个解析缓存。
pub struct DetailExtractor<'a> {
    resolver: &'a ResolverCache,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(resolver: &'a ResolverCache) -> Self {
        Self { resolver }
    }

    /// 展开一条原始通知，返回零或多条明细
    pub fn extract(&self, raw: &RawNotification) -> Vec<DetailedNotificationContent> {
        match raw.notification_type {
            NotificationType::RuleViolation => {
                policy::extract_violation(raw, PolicyStatus::InViolation)
            }
            NotificationType::RuleViolationCleared => {
                policy::extract_violation(raw, PolicyStatus::Cleared)
            }
            NotificationType::PolicyOverride => policy::extract_override(raw),
            NotificationType::Vulnerability => vulnerability::extract(raw),
            NotificationType::BomEdit => bom_edit::extract(raw, self.resolver),
            NotificationType::ProjectVersion => project::extract(raw),
        }
    }

    /// 按输入顺序展开整批通知
    pub fn extract_all(&self, raws: &[RawNotification]) -> Vec<DetailedNotificationContent> {
        raws.iter().flat_map(|raw| self.extract(raw)).collect()
    }
}
