//! 协作方存取接口
//!
//! 管道核心只依赖这里的四个 trait：原始通知读取、任务读取、
//! 审计写入、水位线读写。内存实现给测试和嵌入方用，
//! JSONL 实现给 CLI 的文件持久化用。

pub mod jsonl;
pub mod memory;

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{AuditRecord, DistributionJob, FrequencyType, RawNotification};

pub use jsonl::{
    default_data_dir, JsonlAuditStore, JsonlNotificationStore, JsonlWatermarkStore,
};
pub use memory::{
    MemoryAuditStore, MemoryJobStore, MemoryNotificationStore, MemoryWatermarkStore,
};

/// 原始通知只读接口
///
/// 管道从不写通知；写入方是外部的提供方轮询器（或测试）。
pub trait NotificationStore: Send + Sync {
    /// 按入库时间窗口读取，窗口为左开右闭 `(start, end]`
    ///
    /// `start` 为 None 时从头读起。返回按 (created_at, id) 升序。
    fn find_created_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawNotification>>;

    /// 最近 N 条（按入库时间升序），供运维查看
    fn recent(&self, limit: usize) -> Result<Vec<RawNotification>>;
}

/// 分发任务读取接口
pub trait JobStore: Send + Sync {
    /// 指定频率下启用中的任务，停用任务永不返回
    fn jobs_by_frequency(&self, frequencies: &[FrequencyType]) -> Result<Vec<DistributionJob>>;

    /// 按 ID 查找（含停用任务）
    fn job_by_id(&self, job_id: Uuid) -> Result<Option<DistributionJob>>;
}

/// 审计写入接口
pub trait AuditStore: Send + Sync {
    fn record(&self, record: &AuditRecord) -> Result<()>;

    /// 最近 N 条（按时间升序），供运维查看
    fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>>;
}

/// 汇总水位线读写接口
///
/// 每个任务一个游标；只在整窗派发无渠道错误后推进（至少一次语义）。
pub trait WatermarkStore: Send + Sync {
    fn last_processed(&self, job_id: Uuid) -> Result<Option<DateTime<Utc>>>;

    fn advance(&self, job_id: Uuid, to: DateTime<Utc>) -> Result<()>;
}
