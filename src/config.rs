//! 运行配置
//!
//! 单个 JSON 文件承载数据目录、渠道定义、任务定义和离线的项目
//! 版本映射。任务的 job_id 必须显式写在配置里：水位线按任务 ID
//! 存储，ID 稳定才有意义。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::channel::{
    ChannelRegistry, CommandChannel, CommandChannelConfig, ConsoleChannel, FileChannel,
    FileChannelConfig, WebhookChannel, WebhookChannelConfig,
};
use crate::model::DistributionJob;
use crate::provider::{MemoryResolver, ProjectVersionRef};
use crate::store::default_data_dir;

fn default_timeout_secs() -> u64 {
    30
}

fn default_console_key() -> String {
    "console".to_string()
}

/// 渠道配置条目
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelConfig {
    Webhook {
        key: String,
        url: String,
        #[serde(default)]
        token: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Command {
        key: String,
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    File {
        key: String,
        path: PathBuf,
    },
    Console {
        #[serde(default = "default_console_key")]
        key: String,
    },
}

/// 顶层配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 数据目录，默认 `~/.alert-relay`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub jobs: Vec<DistributionJob>,
    /// 提供方项目版本 URL → 名称映射（bom edit 解析用）
    #[serde(default)]
    pub project_version_refs: HashMap<String, ProjectVersionRef>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            channels: vec![ChannelConfig::Console {
                key: default_console_key(),
            }],
            jobs: Vec::new(),
            project_version_refs: HashMap::new(),
        }
    }
}

impl RelayConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        default_data_dir().join("config.json")
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 加载；文件不存在时用默认配置
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// 生效的数据目录
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// 按配置构建渠道注册表
    pub fn build_registry(&self) -> Result<ChannelRegistry> {
        let mut registry = ChannelRegistry::new();
        for entry in &self.channels {
            match entry {
                ChannelConfig::Webhook {
                    key,
                    url,
                    token,
                    timeout_secs,
                } => {
                    let channel = WebhookChannel::new(WebhookChannelConfig {
                        key: key.clone(),
                        url: url.clone(),
                        token: token.clone(),
                        timeout_secs: *timeout_secs,
                    })
                    .with_context(|| format!("构建 webhook 渠道 '{}' 失败", key))?;
                    registry.register(Arc::new(channel));
                }
                ChannelConfig::Command { key, program, args } => {
                    let channel = CommandChannel::new(CommandChannelConfig {
                        key: key.clone(),
                        program: program.clone(),
                        args: args.clone(),
                    })
                    .with_context(|| format!("构建 command 渠道 '{}' 失败", key))?;
                    registry.register(Arc::new(channel));
                }
                ChannelConfig::File { key, path } => {
                    registry.register(Arc::new(FileChannel::new(FileChannelConfig {
                        key: key.clone(),
                        path: path.clone(),
                    })));
                }
                ChannelConfig::Console { key } => {
                    registry.register(Arc::new(ConsoleChannel::with_key(key.clone())));
                }
            }
        }
        Ok(registry)
    }

    /// 按配置映射构建离线解析器
    pub fn build_resolver(&self) -> Arc<MemoryResolver> {
        let resolver = MemoryResolver::new();
        for (url, reference) in &self.project_version_refs {
            resolver.insert(
                url.clone(),
                reference.project_name.clone(),
                reference.project_version_name.clone(),
            );
        }
        Arc::new(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FrequencyType;
    use crate::provider::ProjectVersionResolver;

    const SAMPLE: &str = r#"{
        "data_dir": "/tmp/alert-relay-test",
        "channels": [
            {"type": "console"},
            {"type": "file", "key": "file", "path": "/tmp/alert-relay-test/out.jsonl"},
            {"type": "webhook", "key": "team-chat", "url": "https://chat.example.com/hook", "token": "secret"}
        ],
        "jobs": [
            {
                "job_id": "4f5b1f9e-0c6a-4f6e-9d3a-1a2b3c4d5e6f",
                "name": "realtime policy",
                "frequency": "real_time",
                "processing_type": "default",
                "channel_key": "team-chat",
                "filter": {
                    "provider_config_id": 1,
                    "notification_types": ["RULE_VIOLATION", "RULE_VIOLATION_CLEARED"]
                }
            }
        ],
        "project_version_refs": {
            "https://provider/api/versions/42": {
                "project_name": "alpha",
                "project_version_name": "1.0.0"
            }
        }
    }"#;

    #[test]
    fn test_parse_sample_config() {
        let config: RelayConfig = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/alert-relay-test")));
        assert_eq!(config.channels.len(), 3);
        assert_eq!(config.jobs.len(), 1);
        assert_eq!(config.jobs[0].frequency, FrequencyType::RealTime);
        assert_eq!(config.jobs[0].filter.notification_types.len(), 2);
    }

    #[test]
    fn test_default_has_console_channel() {
        let config = RelayConfig::default();
        let registry = config.build_registry().unwrap();
        assert!(registry.resolve("console").is_some());
    }

    #[test]
    fn test_registry_built_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig {
            channels: vec![
                ChannelConfig::Console {
                    key: "console".to_string(),
                },
                ChannelConfig::File {
                    key: "audit-file".to_string(),
                    path: dir.path().join("out.jsonl"),
                },
            ],
            ..Default::default()
        };

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.keys(), vec!["audit-file", "console"]);
    }

    #[test]
    fn test_webhook_without_url_fails_build() {
        let config = RelayConfig {
            channels: vec![ChannelConfig::Webhook {
                key: "bad".to_string(),
                url: String::new(),
                token: None,
                timeout_secs: 30,
            }],
            ..Default::default()
        };

        assert!(config.build_registry().is_err());
    }

    #[test]
    fn test_resolver_seeded_from_refs() {
        let config: RelayConfig = serde_json::from_str(SAMPLE).unwrap();
        let resolver = config.build_resolver();

        let hit = resolver
            .resolve("https://provider/api/versions/42")
            .unwrap();
        assert_eq!(hit, Some(ProjectVersionRef::new("alpha", "1.0.0")));
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.jobs.len(), 0);
        assert_eq!(config.channels.len(), 1);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(RelayConfig::load(&path).is_err());
    }
}
