//! Alert Relay - SCA 安全通知的匹配、合并与分发管道

pub mod channel;
pub mod cli;
pub mod config;
pub mod model;
pub mod processor;
pub mod provider;
pub mod store;

// 常用类型的顶层再导出
pub use channel::{ChannelRegistry, ChannelSender, SendReceipt};
pub use config::{ChannelConfig, RelayConfig};
pub use model::{
    AuditRecord, ContentKey, DetailedNotificationContent, DispatchOutcome, DistributionJob,
    FrequencyType, JobFilterCriteria, MessageContentGroup, NotificationType, RawNotification,
    RunSummary,
};
pub use processor::{combine_all, Combinable, CombineOutcome, NotificationPipeline};
pub use provider::{ProjectVersionRef, ProjectVersionResolver};
pub use store::{AuditStore, JobStore, NotificationStore, WatermarkStore};
