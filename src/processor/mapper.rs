//! 任务-通知关联
//!
//! 在 (任务 × 明细) 笛卡尔积上求值过滤条件，产出每个任务的命中
//! 子集。任务顺序与任务库返回一致，明细保持输入顺序。一条明细
//! 可进入多个任务的关联，各任务互不影响。

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::model::{DetailedNotificationContent, DistributionJob, FrequencyType};
use crate::processor::matcher::JobFilterMatcher;
use crate::store::JobStore;

/// 一个任务与其命中的明细
#[derive(Debug, Clone)]
pub struct JobAssociation {
    pub job: DistributionJob,
    pub details: Vec<DetailedNotificationContent>,
}

/// 一次映射的结果
#[derive(Debug, Clone)]
pub struct MappingResult {
    /// 有命中的任务关联（空命中的任务不在内）
    pub associations: Vec<JobAssociation>,
    /// 因过滤条件不可用被跳过的任务数
    pub jobs_skipped: usize,
}

pub struct JobNotificationMapper {
    job_store: Arc<dyn JobStore>,
}

impl JobNotificationMapper {
    pub fn new(job_store: Arc<dyn JobStore>) -> Self {
        Self { job_store }
    }

    /// 加载指定频率下的启用任务并逐一关联
    pub fn map(
        &self,
        details: &[DetailedNotificationContent],
        frequencies: &[FrequencyType],
    ) -> Result<MappingResult> {
        let jobs = self.job_store.jobs_by_frequency(frequencies)?;

        let mut associations = Vec::new();
        let mut jobs_skipped = 0;
        for job in jobs {
            match Self::associate(&job, details) {
                Some(matched) if !matched.is_empty() => {
                    associations.push(JobAssociation {
                        job,
                        details: matched,
                    });
                }
                Some(_) => {} // 无命中，正常略过
                None => jobs_skipped += 1,
            }
        }

        Ok(MappingResult {
            associations,
            jobs_skipped,
        })
    }

    /// 单任务关联：返回命中明细（输入顺序）
    ///
    /// 过滤条件编译失败（正则非法）返回 None，任务本轮跳过。
    pub fn associate(
        job: &DistributionJob,
        details: &[DetailedNotificationContent],
    ) -> Option<Vec<DetailedNotificationContent>> {
        let matcher = match JobFilterMatcher::compile(&job.filter) {
            Ok(m) => m,
            Err(e) => {
                warn!(job = %job.name, job_id = %job.job_id, error = %e, "任务过滤条件不可用，本轮跳过");
                return None;
            }
        };

        Some(
            details
                .iter()
                .filter(|d| matcher.matches(d))
                .cloned()
                .collect(),
        )
    }
}
