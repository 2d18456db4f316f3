//! 管道编排
//!
//! 一次运行 = 提取 → 关联 → 合并 → 组装 → 派发。任务之间互相
//! 独立：一个任务的渠道故障或配置错误不影响其他任务；任务内部
//! 严格串行（合并依赖顺序敏感的归约）。同一任务不允许并发运行，
//! 正在处理中的任务直接跳过本轮。
//!
//! 实时路径由调用方提供原始批次；汇总路径按任务水位线自取窗口，
//! 只有整窗派发无渠道错误才推进水位线（至少一次语义，重复投递
//! 由内容键合并吸收）。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::channel::ChannelRegistry;
use crate::model::{DistributionJob, FrequencyType, RawNotification, RunSummary};
use crate::processor::assembler;
use crate::processor::combine::combine_all;
use crate::processor::dispatch::DispatchGateway;
use crate::processor::extract::DetailExtractor;
use crate::processor::mapper::{JobAssociation, JobNotificationMapper};
use crate::provider::{ProjectVersionResolver, ResolverCache};
use crate::store::{AuditStore, JobStore, NotificationStore, WatermarkStore};

/// 任务互斥锁注册表
///
/// 每个任务 ID 一把锁，`try_lock` 语义：拿不到就跳过，不等待。
#[derive(Default)]
pub struct JobLockRegistry {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl JobLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取任务对应的锁（不存在则创建）
    pub fn lock_for(&self, job_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(job_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// 通知管道
pub struct NotificationPipeline {
    notifications: Arc<dyn NotificationStore>,
    watermarks: Arc<dyn WatermarkStore>,
    jobs: Arc<dyn JobStore>,
    resolver: Arc<dyn ProjectVersionResolver>,
    gateway: DispatchGateway,
    mapper: JobNotificationMapper,
    job_locks: JobLockRegistry,
}

impl NotificationPipeline {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        jobs: Arc<dyn JobStore>,
        audit: Arc<dyn AuditStore>,
        watermarks: Arc<dyn WatermarkStore>,
        resolver: Arc<dyn ProjectVersionResolver>,
        registry: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            notifications,
            watermarks,
            jobs: jobs.clone(),
            resolver,
            gateway: DispatchGateway::new(registry, audit),
            mapper: JobNotificationMapper::new(jobs),
            job_locks: JobLockRegistry::new(),
        }
    }

    /// 实时批处理：对一批原始通知跑完整管道
    ///
    /// 原始批次由调用方提供（轮询游标归调用方管）。批内共享一个
    /// 解析缓存；每个命中任务独立走 合并 → 组装 → 派发。
    pub fn process_batch(
        &self,
        raws: &[RawNotification],
        frequencies: &[FrequencyType],
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::new(run_id, frequencies.to_vec());

        if raws.is_empty() {
            return Ok(summary);
        }

        let cache = ResolverCache::new(self.resolver.clone());
        let extractor = DetailExtractor::new(&cache);
        let details = extractor.extract_all(raws);
        if details.is_empty() {
            debug!(run_id = %run_id, raws = raws.len(), "批内无可提取明细");
            return Ok(summary);
        }

        let mapping = self.mapper.map(&details, frequencies)?;
        summary.jobs_skipped += mapping.jobs_skipped;

        for association in mapping.associations {
            self.process_association(association, run_id, &mut summary);
        }

        info!(
            run_id = %run_id,
            jobs = summary.jobs_processed,
            sent = summary.groups_sent,
            failed = summary.groups_failed,
            "实时批处理完成"
        );
        Ok(summary)
    }

    fn process_association(
        &self,
        association: JobAssociation,
        run_id: Uuid,
        summary: &mut RunSummary,
    ) {
        let job = association.job;

        let lock = self.job_locks.lock_for(job.job_id);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(job = %job.name, job_id = %job.job_id, "任务正在处理中，本批跳过");
                summary.jobs_skipped += 1;
                return;
            }
        };

        let combined = combine_all(association.details);
        match assembler::assemble(&job, combined) {
            Some(group) => {
                let outcome = self.gateway.dispatch(&group, run_id);
                summary.record_outcome(&outcome);
            }
            None => {
                // 明细全部互相抵消，无消息可发
                debug!(job = %job.name, "合并后无剩余内容");
            }
        }
        summary.jobs_processed += 1;
    }

    /// 汇总运行：逐任务按水位线取窗口处理
    pub fn run_digest(&self, frequency: FrequencyType, now: DateTime<Utc>) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::new(run_id, vec![frequency]);

        let jobs = self.jobs.jobs_by_frequency(&[frequency])?;
        if jobs.is_empty() {
            return Ok(summary);
        }

        // 本轮所有任务共享解析缓存
        let cache = ResolverCache::new(self.resolver.clone());

        for job in jobs {
            if let Err(e) = self.run_digest_job(&job, now, run_id, &cache, &mut summary) {
                error!(job = %job.name, job_id = %job.job_id, error = %e, "任务汇总处理失败");
            }
        }

        info!(
            run_id = %run_id,
            frequency = %frequency,
            jobs = summary.jobs_processed,
            sent = summary.groups_sent,
            failed = summary.groups_failed,
            "汇总运行完成"
        );
        Ok(summary)
    }

    fn run_digest_job(
        &self,
        job: &DistributionJob,
        now: DateTime<Utc>,
        run_id: Uuid,
        cache: &ResolverCache,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let lock = self.job_locks.lock_for(job.job_id);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(job = %job.name, job_id = %job.job_id, "任务正在处理中，本轮跳过");
                self.gateway.audit_skip(job.job_id, run_id, "job busy");
                summary.jobs_skipped += 1;
                return Ok(());
            }
        };

        // 窗口 (水位线, now]；无水位线则从头读
        let window_start = self.watermarks.last_processed(job.job_id)?;
        let raws = self.notifications.find_created_between(window_start, now)?;

        let extractor = DetailExtractor::new(cache);
        let details = extractor.extract_all(&raws);

        let matched = match JobNotificationMapper::associate(job, &details) {
            Some(matched) => matched,
            None => {
                self.gateway
                    .audit_skip(job.job_id, run_id, "invalid filter configuration");
                summary.jobs_skipped += 1;
                return Ok(());
            }
        };

        let combined = combine_all(matched);
        let mut window_clean = true;
        match assembler::assemble(job, combined) {
            Some(group) => {
                let outcome = self.gateway.dispatch(&group, run_id);
                if outcome.is_channel_error() {
                    window_clean = false;
                }
                summary.record_outcome(&outcome);
            }
            None => {
                debug!(job = %job.name, "窗口内无可发内容");
                self.gateway
                    .audit_skip(job.job_id, run_id, "no content in window");
            }
        }
        summary.jobs_processed += 1;

        if window_clean {
            // 空窗也推进：下一轮从 now 之后读起
            self.watermarks.advance(job.job_id, now)?;
            debug!(job = %job.name, to = %now, "水位线推进");
        } else {
            warn!(
                job = %job.name,
                job_id = %job.job_id,
                "存在渠道错误，水位线保持，下轮重读整窗"
            );
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn job_locks(&self) -> &JobLockRegistry {
        &self.job_locks
    }
}
