// src/cli/bootstrap.rs
//! 命令公共装配 - 配置加载与管道构建
//!
//! run/watch/ingest 共用的装配逻辑：加载配置、准备数据目录、
//! 构建存储与管道。dry-run 模式用一张只有控制台兜底的空注册表，
//! 所有任务的输出落到终端，审计与水位线走内存存储不落盘。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::channel::{ChannelRegistry, ConsoleChannel};
use crate::config::RelayConfig;
use crate::processor::NotificationPipeline;
use crate::store::{
    AuditStore, JsonlAuditStore, JsonlNotificationStore, JsonlWatermarkStore, MemoryAuditStore,
    MemoryJobStore, MemoryWatermarkStore, WatermarkStore,
};

/// 装配完成的运行上下文
pub struct PipelineContext {
    pub config: RelayConfig,
    pub data_dir: PathBuf,
    pub notifications: Arc<JsonlNotificationStore>,
    pub pipeline: NotificationPipeline,
}

/// 配置路径：显式参数优先，否则默认路径
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(|p| p.to_path_buf())
        .unwrap_or_else(RelayConfig::default_path)
}

/// 加载配置并装配管道
pub fn build_context(config_path: Option<&Path>, dry_run: bool) -> Result<PipelineContext> {
    let path = resolve_config_path(config_path);
    let config = RelayConfig::load_or_default(&path)?;
    debug!(config = %path.display(), jobs = config.jobs.len(), "配置加载完成");

    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("创建数据目录失败: {}", data_dir.display()))?;

    let registry = if dry_run {
        ChannelRegistry::new().with_fallback(Arc::new(ConsoleChannel::new()))
    } else {
        config.build_registry()?
    };

    let notifications = Arc::new(JsonlNotificationStore::new(&data_dir));
    let jobs = Arc::new(MemoryJobStore::with_jobs(config.jobs.clone()));
    // dry-run 不留任何痕迹：审计和水位线都进内存
    let (audit, watermarks): (Arc<dyn AuditStore>, Arc<dyn WatermarkStore>) = if dry_run {
        (
            Arc::new(MemoryAuditStore::new()),
            Arc::new(MemoryWatermarkStore::new()),
        )
    } else {
        (
            Arc::new(JsonlAuditStore::new(&data_dir)),
            Arc::new(JsonlWatermarkStore::new(&data_dir)),
        )
    };

    let pipeline = NotificationPipeline::new(
        notifications.clone(),
        jobs,
        audit,
        watermarks,
        config.build_resolver(),
        Arc::new(registry),
    );

    Ok(PipelineContext {
        config,
        data_dir,
        notifications,
        pipeline,
    })
}
