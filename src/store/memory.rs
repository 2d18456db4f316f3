//! In-memory store implementations backed by `Mutex`-guarded collections.
//!
//! Used by tests and by embedders that source jobs from configuration
//! rather than from files.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{AuditRecord, DistributionJob, FrequencyType, RawNotification};
use crate::store::{AuditStore, JobStore, NotificationStore, WatermarkStore};

/// In-memory raw notification store.
#[derive(Default)]
pub struct MemoryNotificationStore {
    records: Mutex<Vec<RawNotification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: RawNotification) {
        self.records.lock().unwrap().push(notification);
    }

    pub fn push_all(&self, notifications: Vec<RawNotification>) {
        self.records.lock().unwrap().extend(notifications);
    }
}

impl NotificationStore for MemoryNotificationStore {
    fn find_created_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawNotification>> {
        let records = self.records.lock().unwrap();
        let mut hits: Vec<RawNotification> = records
            .iter()
            .filter(|n| start.map_or(true, |s| n.created_at > s) && n.created_at <= end)
            .cloned()
            .collect();
        hits.sort_by_key(|n| (n.created_at, n.id));
        Ok(hits)
    }

    fn recent(&self, limit: usize) -> Result<Vec<RawNotification>> {
        let records = self.records.lock().unwrap();
        let mut all: Vec<RawNotification> = records.clone();
        all.sort_by_key(|n| (n.created_at, n.id));
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}

/// In-memory distribution job store.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<DistributionJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: Vec<DistributionJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
        }
    }

    /// Insert or replace by job id.
    pub fn put(&self, job: DistributionJob) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(existing) = jobs.iter_mut().find(|j| j.job_id == job.job_id) {
            *existing = job;
        } else {
            jobs.push(job);
        }
    }
}

impl JobStore for MemoryJobStore {
    fn jobs_by_frequency(&self, frequencies: &[FrequencyType]) -> Result<Vec<DistributionJob>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .filter(|j| j.enabled && frequencies.contains(&j.frequency))
            .cloned()
            .collect())
    }

    fn job_by_id(&self, job_id: Uuid) -> Result<Option<DistributionJob>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().find(|j| j.job_id == job_id).cloned())
    }
}

/// In-memory audit store; `all()` exposes the full trail for assertions.
#[derive(Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditStore for MemoryAuditStore {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        let records = self.records.lock().unwrap();
        let start = records.len().saturating_sub(limit);
        Ok(records[start..].to_vec())
    }
}

/// In-memory watermark store.
#[derive(Default)]
pub struct MemoryWatermarkStore {
    marks: Mutex<HashMap<Uuid, DateTime<Utc>>>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    fn last_processed(&self, job_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        Ok(self.marks.lock().unwrap().get(&job_id).copied())
    }

    fn advance(&self, job_id: Uuid, to: DateTime<Utc>) -> Result<()> {
        self.marks.lock().unwrap().insert(job_id, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobFilterCriteria, NotificationType};

    fn raw_at(id: i64, ts: &str) -> RawNotification {
        RawNotification::new(id, 1, NotificationType::Vulnerability, serde_json::Value::Null)
            .with_created_at(ts.parse().unwrap())
    }

    #[test]
    fn test_window_is_half_open() {
        let store = MemoryNotificationStore::new();
        store.push(raw_at(1, "2024-05-01T10:00:00Z"));
        store.push(raw_at(2, "2024-05-01T11:00:00Z"));
        store.push(raw_at(3, "2024-05-01T12:00:00Z"));

        let start = "2024-05-01T10:00:00Z".parse().unwrap();
        let end = "2024-05-01T11:00:00Z".parse().unwrap();
        let hits = store.find_created_between(Some(start), end).unwrap();

        // start exclusive, end inclusive: only the 11:00 record
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn test_none_start_reads_from_beginning() {
        let store = MemoryNotificationStore::new();
        store.push(raw_at(2, "2024-05-01T11:00:00Z"));
        store.push(raw_at(1, "2024-05-01T10:00:00Z"));

        let end = "2024-05-01T12:00:00Z".parse().unwrap();
        let hits = store.find_created_between(None, end).unwrap();

        assert_eq!(hits.len(), 2);
        // sorted by created_at regardless of insertion order
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 2);
    }

    #[test]
    fn test_jobs_by_frequency_excludes_disabled() {
        let store = MemoryJobStore::new();
        store.put(DistributionJob::new(
            "active",
            FrequencyType::RealTime,
            "console",
            JobFilterCriteria::for_provider(1),
        ));
        store.put(
            DistributionJob::new(
                "disabled",
                FrequencyType::RealTime,
                "console",
                JobFilterCriteria::for_provider(1),
            )
            .with_enabled(false),
        );

        let jobs = store
            .jobs_by_frequency(&[FrequencyType::RealTime])
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "active");
    }

    #[test]
    fn test_job_by_id_includes_disabled() {
        let store = MemoryJobStore::new();
        let job = DistributionJob::new(
            "disabled",
            FrequencyType::Daily,
            "file",
            JobFilterCriteria::for_provider(1),
        )
        .with_enabled(false);
        let job_id = job.job_id;
        store.put(job);

        let found = store.job_by_id(job_id).unwrap();
        assert!(found.is_some());
        assert!(!found.unwrap().enabled);
    }

    #[test]
    fn test_put_replaces_by_id() {
        let store = MemoryJobStore::new();
        let job = DistributionJob::new(
            "before",
            FrequencyType::RealTime,
            "console",
            JobFilterCriteria::for_provider(1),
        );
        let job_id = job.job_id;
        store.put(job.clone());

        let mut renamed = job;
        renamed.name = "after".to_string();
        store.put(renamed);

        let found = store.job_by_id(job_id).unwrap().unwrap();
        assert_eq!(found.name, "after");
    }

    #[test]
    fn test_watermark_roundtrip() {
        let store = MemoryWatermarkStore::new();
        let job_id = Uuid::new_v4();

        assert!(store.last_processed(job_id).unwrap().is_none());

        let ts = "2024-05-01T10:00:00Z".parse().unwrap();
        store.advance(job_id, ts).unwrap();
        assert_eq!(store.last_processed(job_id).unwrap(), Some(ts));
    }
}
