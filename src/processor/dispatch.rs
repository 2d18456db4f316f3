//! 派发网关
//!
//! 按消息组的渠道键解析发送器并派发，每次派发写一条审计记录。
//! 渠道缺失是配置问题记 Skipped；发送被拒或传输失败记
//! ChannelError，本轮不重试。审计写入失败只记日志，不改变派发
//! 结果。

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::channel::{ChannelRegistry, SendReceipt};
use crate::model::{AuditRecord, DispatchOutcome, MessageContentGroup};
use crate::store::AuditStore;

pub struct DispatchGateway {
    registry: Arc<ChannelRegistry>,
    audit: Arc<dyn AuditStore>,
}

impl DispatchGateway {
    pub fn new(registry: Arc<ChannelRegistry>, audit: Arc<dyn AuditStore>) -> Self {
        Self { registry, audit }
    }

    /// 派发一个消息组，返回结果并落审计
    pub fn dispatch(&self, group: &MessageContentGroup, run_id: Uuid) -> DispatchOutcome {
        let outcome = match self.registry.resolve(&group.channel_key) {
            None => {
                warn!(
                    job_id = %group.job_id,
                    channel = %group.channel_key,
                    "渠道未注册，消息组跳过"
                );
                DispatchOutcome::Skipped(format!("unknown channel '{}'", group.channel_key))
            }
            Some(sender) => match sender.send(group) {
                Ok(SendReceipt::Accepted) => {
                    info!(
                        job_id = %group.job_id,
                        channel = %group.channel_key,
                        event_id = %group.event_id,
                        detail_count = group.detail_count(),
                        "消息组已派发"
                    );
                    DispatchOutcome::Sent
                }
                Ok(SendReceipt::Rejected(reason)) => {
                    error!(
                        job_id = %group.job_id,
                        channel = %group.channel_key,
                        reason = %reason,
                        "渠道拒绝消息组"
                    );
                    DispatchOutcome::ChannelError(reason)
                }
                Err(e) => {
                    error!(
                        job_id = %group.job_id,
                        channel = %group.channel_key,
                        error = %e,
                        "渠道发送失败"
                    );
                    DispatchOutcome::ChannelError(e.to_string())
                }
            },
        };

        self.write_audit(group.job_id, run_id, Some(group.event_id), outcome.clone());
        outcome
    }

    /// 为组装前被跳过的任务写审计（无事件 ID）
    pub fn audit_skip(&self, job_id: Uuid, run_id: Uuid, reason: impl Into<String>) {
        self.write_audit(
            job_id,
            run_id,
            None,
            DispatchOutcome::Skipped(reason.into()),
        );
    }

    fn write_audit(
        &self,
        job_id: Uuid,
        run_id: Uuid,
        event_id: Option<Uuid>,
        outcome: DispatchOutcome,
    ) {
        let mut record = AuditRecord::new(job_id, run_id, outcome);
        if let Some(event_id) = event_id {
            record = record.with_event_id(event_id);
        }
        if let Err(e) = self.audit.record(&record) {
            error!(job_id = %job_id, error = %e, "审计写入失败");
        }
    }
}
