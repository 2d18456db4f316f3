//! 出站消息与审计模型
//!
//! 组装器把合并后的明细按 (项目, 版本) 主题分组为消息组；
//! 网关派发消息组并为每个 (任务, 运行) 写一条审计记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::detail::DetailedNotificationContent;
use crate::model::job::{DistributionJob, FrequencyType};

/// 消息主题 - 同一 (项目, 版本) 下的明细集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTopic {
    pub project_name: String,
    pub project_version_name: Option<String>,
    /// 按 created_at 升序
    pub details: Vec<DetailedNotificationContent>,
}

impl MessageTopic {
    pub fn new(project_name: impl Into<String>, project_version_name: Option<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_version_name,
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<DetailedNotificationContent>) -> Self {
        self.details = details;
        self
    }
}

/// 消息组 - 一个任务一次运行的全部待发内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContentGroup {
    pub job_id: Uuid,
    pub channel_key: String,
    pub frequency: FrequencyType,
    /// 按首次出现顺序排列的主题
    pub topics: Vec<MessageTopic>,
    /// 本组的事件 ID（审计与渠道侧幂等去重用）
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MessageContentGroup {
    /// 从任务派生消息组骨架，事件 ID 现场生成
    pub fn new(job: &DistributionJob) -> Self {
        Self {
            job_id: job.job_id,
            channel_key: job.channel_key.clone(),
            frequency: job.frequency,
            topics: Vec::new(),
            event_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    pub fn with_topics(mut self, topics: Vec<MessageTopic>) -> Self {
        self.topics = topics;
        self
    }

    /// 全部主题的明细总数
    pub fn detail_count(&self) -> usize {
        self.topics.iter().map(|t| t.details.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// 派发结果
///
/// `Skipped` 是配置问题（渠道缺失等），`ChannelError` 是外部故障；
/// 两者都写入审计，但只有后者会阻止汇总水位线推进。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent,
    Skipped(String),
    ChannelError(String),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }

    pub fn is_channel_error(&self) -> bool {
        matches!(self, DispatchOutcome::ChannelError(_))
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Sent => write!(f, "sent"),
            DispatchOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            DispatchOutcome::ChannelError(message) => write!(f, "channel error: {}", message),
        }
    }
}

/// 审计记录 - 每个 (任务, 运行) 一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub job_id: Uuid,
    pub run_id: Uuid,
    /// 对应消息组的事件 ID；任务在组装前被跳过时为 None
    pub event_id: Option<Uuid>,
    pub outcome: DispatchOutcome,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(job_id: Uuid, run_id: Uuid, outcome: DispatchOutcome) -> Self {
        Self {
            job_id,
            run_id,
            event_id: None,
            outcome,
            timestamp: Utc::now(),
        }
    }

    pub fn with_event_id(mut self, event_id: Uuid) -> Self {
        self.event_id = Some(event_id);
        self
    }
}

/// 单次运行的汇总统计，返回给调用方/CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub frequencies: Vec<FrequencyType>,
    pub jobs_processed: usize,
    pub jobs_skipped: usize,
    pub groups_sent: usize,
    pub groups_failed: usize,
    pub groups_skipped: usize,
}

impl RunSummary {
    pub fn new(run_id: Uuid, frequencies: Vec<FrequencyType>) -> Self {
        Self {
            run_id,
            frequencies,
            jobs_processed: 0,
            jobs_skipped: 0,
            groups_sent: 0,
            groups_failed: 0,
            groups_skipped: 0,
        }
    }

    /// 按派发结果累加计数
    pub fn record_outcome(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Sent => self.groups_sent += 1,
            DispatchOutcome::Skipped(_) => self.groups_skipped += 1,
            DispatchOutcome::ChannelError(_) => self.groups_failed += 1,
        }
    }

    pub fn had_failures(&self) -> bool {
        self.groups_failed > 0
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let freqs: Vec<&str> = self.frequencies.iter().map(|fr| fr.as_str()).collect();
        write!(
            f,
            "run {} [{}]: {} jobs processed, {} skipped; groups {} sent / {} failed / {} skipped",
            self.run_id,
            freqs.join(","),
            self.jobs_processed,
            self.jobs_skipped,
            self.groups_sent,
            self.groups_failed,
            self.groups_skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::job::JobFilterCriteria;

    #[test]
    fn test_group_derives_from_job() {
        let job = DistributionJob::new(
            "digest",
            FrequencyType::Daily,
            "webhook",
            JobFilterCriteria::for_provider(1),
        );
        let group = MessageContentGroup::new(&job);

        assert_eq!(group.job_id, job.job_id);
        assert_eq!(group.channel_key, "webhook");
        assert_eq!(group.frequency, FrequencyType::Daily);
        assert!(group.is_empty());
        assert_eq!(group.detail_count(), 0);
    }

    #[test]
    fn test_dispatch_outcome_serde() {
        let outcome = DispatchOutcome::Skipped("unknown channel 'slack'".to_string());
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "skipped");
        assert_eq!(json["detail"], "unknown channel 'slack'");

        let sent: DispatchOutcome = serde_json::from_value(serde_json::json!({
            "status": "sent"
        }))
        .unwrap();
        assert!(sent.is_sent());
    }

    #[test]
    fn test_run_summary_counts() {
        let mut summary = RunSummary::new(Uuid::new_v4(), vec![FrequencyType::RealTime]);
        summary.record_outcome(&DispatchOutcome::Sent);
        summary.record_outcome(&DispatchOutcome::Sent);
        summary.record_outcome(&DispatchOutcome::ChannelError("timeout".to_string()));
        summary.record_outcome(&DispatchOutcome::Skipped("no channel".to_string()));

        assert_eq!(summary.groups_sent, 2);
        assert_eq!(summary.groups_failed, 1);
        assert_eq!(summary.groups_skipped, 1);
        assert!(summary.had_failures());
    }

    #[test]
    fn test_audit_record_event_id_optional() {
        let record = AuditRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            DispatchOutcome::Skipped("job busy".to_string()),
        );
        assert!(record.event_id.is_none());

        let event_id = Uuid::new_v4();
        let record = record.with_event_id(event_id);
        assert_eq!(record.event_id, Some(event_id));
    }
}
