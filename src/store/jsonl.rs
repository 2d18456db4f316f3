//! 本地文件存储 - JSONL 追加与 JSON 整写
//!
//! 通知与审计是追加型 JSONL（带 fs2 文件锁），水位线是整写型 JSON
//! （锁 + 临时文件 + 原子改名）。默认数据目录 `~/.alert-relay`。

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{AuditRecord, RawNotification};
use crate::store::{AuditStore, NotificationStore, WatermarkStore};

/// 默认数据目录
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".alert-relay")
}

/// 追加一行 JSON（带独占文件锁）
fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    use fs2::FileExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    file.lock_exclusive()?;
    let mut file = file;
    writeln!(file, "{}", serde_json::to_string(record)?)?;
    file.unlock()?;

    Ok(())
}

/// 读取全部 JSONL 行，坏行跳过
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file =
        File::open(path).with_context(|| format!("打开存储文件失败: {}", path.display()))?;
    let reader = BufReader::new(file);
    Ok(reader
        .lines()
        .filter_map(|line| line.ok())
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect())
}

/// 原始通知 JSONL 存储
pub struct JsonlNotificationStore {
    path: PathBuf,
}

impl JsonlNotificationStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("notifications.jsonl"),
        }
    }

    /// 追加一条原始通知（提供方轮询器/测试注入用）
    pub fn append(&self, notification: &RawNotification) -> Result<()> {
        append_line(&self.path, notification)
    }
}

impl NotificationStore for JsonlNotificationStore {
    fn find_created_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawNotification>> {
        let mut hits: Vec<RawNotification> = read_jsonl(&self.path)?
            .into_iter()
            .filter(|n: &RawNotification| {
                start.map_or(true, |s| n.created_at > s) && n.created_at <= end
            })
            .collect();
        hits.sort_by_key(|n| (n.created_at, n.id));
        Ok(hits)
    }

    fn recent(&self, limit: usize) -> Result<Vec<RawNotification>> {
        let mut all: Vec<RawNotification> = read_jsonl(&self.path)?;
        all.sort_by_key(|n| (n.created_at, n.id));
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}

/// 审计记录 JSONL 存储
pub struct JsonlAuditStore {
    path: PathBuf,
}

impl JsonlAuditStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("audit.jsonl"),
        }
    }
}

impl AuditStore for JsonlAuditStore {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        append_line(&self.path, record)
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        let mut all: Vec<AuditRecord> = read_jsonl(&self.path)?;
        all.sort_by_key(|r| r.timestamp);
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}

/// 水位线 JSON 存储（任务 ID → 已处理时间）
pub struct JsonlWatermarkStore {
    path: PathBuf,
}

impl JsonlWatermarkStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("watermarks.json"),
        }
    }

    fn read_map(&self) -> Result<HashMap<Uuid, DateTime<Utc>>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("读取水位线文件失败: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("解析水位线文件失败: {}", self.path.display()))
    }
}

impl WatermarkStore for JsonlWatermarkStore {
    fn last_processed(&self, job_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_map()?.get(&job_id).copied())
    }

    fn advance(&self, job_id: Uuid, to: DateTime<Utc>) -> Result<()> {
        use fs2::FileExt;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // 锁住现文件再整写临时文件并原子改名
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut marks = self.read_map().unwrap_or_default();
        marks.insert(job_id, to);

        let temp_path = self.path.with_extension("tmp");
        {
            let temp_file = File::create(&temp_path)?;
            serde_json::to_writer_pretty(temp_file, &marks)?;
        }
        fs::rename(&temp_path, &self.path)?;

        file.unlock()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DispatchOutcome, NotificationType};

    fn raw_at(id: i64, ts: &str) -> RawNotification {
        RawNotification::new(id, 1, NotificationType::BomEdit, serde_json::Value::Null)
            .with_created_at(ts.parse().unwrap())
    }

    #[test]
    fn test_notification_append_and_window_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlNotificationStore::new(dir.path());

        store.append(&raw_at(1, "2024-05-01T10:00:00Z")).unwrap();
        store.append(&raw_at(2, "2024-05-01T11:00:00Z")).unwrap();
        store.append(&raw_at(3, "2024-05-01T12:00:00Z")).unwrap();

        let start = "2024-05-01T10:00:00Z".parse().unwrap();
        let end = "2024-05-01T12:00:00Z".parse().unwrap();
        let hits = store.find_created_between(Some(start), end).unwrap();

        assert_eq!(hits.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_notification_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlNotificationStore::new(dir.path());

        let hits = store
            .find_created_between(None, Utc::now())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_audit_recent_tail() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlAuditStore::new(dir.path());

        for i in 0..5 {
            let record = AuditRecord::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                if i % 2 == 0 {
                    DispatchOutcome::Sent
                } else {
                    DispatchOutcome::ChannelError("boom".to_string())
                },
            );
            store.record(&record).unwrap();
        }

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_watermark_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let job_id = Uuid::new_v4();
        let ts: DateTime<Utc> = "2024-05-01T10:00:00Z".parse().unwrap();

        {
            let store = JsonlWatermarkStore::new(dir.path());
            store.advance(job_id, ts).unwrap();
        }

        // 新实例读同一目录
        let store = JsonlWatermarkStore::new(dir.path());
        assert_eq!(store.last_processed(job_id).unwrap(), Some(ts));
        assert!(store.last_processed(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_watermark_advance_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlWatermarkStore::new(dir.path());
        let job_id = Uuid::new_v4();

        let first: DateTime<Utc> = "2024-05-01T10:00:00Z".parse().unwrap();
        let second: DateTime<Utc> = "2024-05-02T10:00:00Z".parse().unwrap();
        store.advance(job_id, first).unwrap();
        store.advance(job_id, second).unwrap();

        assert_eq!(store.last_processed(job_id).unwrap(), Some(second));
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlNotificationStore::new(dir.path());
        store.append(&raw_at(1, "2024-05-01T10:00:00Z")).unwrap();

        // 手工写入一行坏数据
        let path = dir.path().join("notifications.jsonl");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json at all").unwrap();

        let hits = store.find_created_between(None, Utc::now()).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
