//! 领域数据模型
//!
//! 原始通知 → 提取明细 → 任务/过滤条件 → 消息组/审计，
//! 管道各阶段之间传递的都是这里定义的类型。

pub mod detail;
pub mod job;
pub mod message;
pub mod raw;

pub use detail::{
    BomEditPayload, ContentKey, DetailPayload, DetailedNotificationContent, NotificationCategory,
    OtherPayload, PolicyPayload, PolicyStatus, VulnerabilityPayload, VulnerabilitySeverity,
};
pub use job::{DistributionJob, FrequencyType, JobFilterCriteria, ProcessingType};
pub use message::{
    AuditRecord, DispatchOutcome, MessageContentGroup, MessageTopic, RunSummary,
};
pub use raw::{NotificationType, RawNotification};
