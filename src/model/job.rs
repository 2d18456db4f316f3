//! 分发任务模型
//!
//! 任务是用户配置的"订阅"：一组过滤条件 + 一个出站渠道 + 触发频率。
//! 一条明细可被多个任务命中，各任务独立处理互不影响。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::detail::VulnerabilitySeverity;
use crate::model::raw::NotificationType;

/// 任务触发频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyType {
    /// 每批原始通知到达即处理
    RealTime,
    /// 每日汇总
    Daily,
    /// 每周汇总
    Weekly,
}

impl FrequencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyType::RealTime => "real_time",
            FrequencyType::Daily => "daily",
            FrequencyType::Weekly => "weekly",
        }
    }

    /// 是否走水位线窗口（汇总频率）
    pub fn is_digest(&self) -> bool {
        matches!(self, FrequencyType::Daily | FrequencyType::Weekly)
    }
}

impl std::fmt::Display for FrequencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FrequencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "real_time" | "realtime" => Ok(FrequencyType::RealTime),
            "daily" => Ok(FrequencyType::Daily),
            "weekly" => Ok(FrequencyType::Weekly),
            other => Err(format!("未知频率: {}", other)),
        }
    }
}

/// 批内处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingType {
    /// 逐批直发
    Default,
    /// 窗口内汇总后单次发送
    Digest,
}

impl ProcessingType {
    /// 频率对应的默认处理方式
    pub fn default_for(frequency: FrequencyType) -> Self {
        if frequency.is_digest() {
            ProcessingType::Digest
        } else {
            ProcessingType::Default
        }
    }
}

/// 任务过滤条件
///
/// 各子条件之间是合取关系。列表条件为空时表示"不限制"，
/// 唯一例外是 `notification_types`：空集不命中任何通知（显式订阅制）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFilterCriteria {
    /// 限定的提供方配置
    pub provider_config_id: i64,
    /// 订阅的通知类型（空 = 不订阅任何类型）
    #[serde(default)]
    pub notification_types: Vec<NotificationType>,
    /// 项目白名单
    #[serde(default)]
    pub project_names: Vec<String>,
    /// 项目名正则（整串匹配），与白名单取并
    #[serde(default)]
    pub project_name_pattern: Option<String>,
    /// 策略名白名单（仅作用于策略类别）
    #[serde(default)]
    pub policy_names: Vec<String>,
    /// 严重度过滤（仅作用于漏洞类别，集合相交即命中）
    #[serde(default)]
    pub vulnerability_severities: Vec<VulnerabilitySeverity>,
}

impl JobFilterCriteria {
    pub fn for_provider(provider_config_id: i64) -> Self {
        Self {
            provider_config_id,
            notification_types: Vec::new(),
            project_names: Vec::new(),
            project_name_pattern: None,
            policy_names: Vec::new(),
            vulnerability_severities: Vec::new(),
        }
    }

    pub fn with_notification_types(mut self, types: Vec<NotificationType>) -> Self {
        self.notification_types = types;
        self
    }

    pub fn with_project_names(mut self, names: Vec<String>) -> Self {
        self.project_names = names;
        self
    }

    pub fn with_project_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.project_name_pattern = Some(pattern.into());
        self
    }

    pub fn with_policy_names(mut self, names: Vec<String>) -> Self {
        self.policy_names = names;
        self
    }

    pub fn with_vulnerability_severities(
        mut self,
        severities: Vec<VulnerabilitySeverity>,
    ) -> Self {
        self.vulnerability_severities = severities;
        self
    }

    /// 是否配置了项目维度限制（白名单或正则）
    pub fn filters_by_project(&self) -> bool {
        !self.project_names.is_empty() || self.project_name_pattern.is_some()
    }
}

/// 分发任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionJob {
    pub job_id: Uuid,
    pub name: String,
    /// 停用的任务不参与任何一次运行
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub frequency: FrequencyType,
    pub processing_type: ProcessingType,
    /// 出站渠道键（渠道注册表中的标识）
    pub channel_key: String,
    pub filter: JobFilterCriteria,
}

fn default_enabled() -> bool {
    true
}

impl DistributionJob {
    /// 创建任务，处理方式按频率取默认值
    pub fn new(
        name: impl Into<String>,
        frequency: FrequencyType,
        channel_key: impl Into<String>,
        filter: JobFilterCriteria,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            name: name.into(),
            enabled: true,
            frequency,
            processing_type: ProcessingType::default_for(frequency),
            channel_key: channel_key.into(),
            filter,
        }
    }

    /// 指定任务 ID（测试/配置还原用）
    pub fn with_job_id(mut self, job_id: Uuid) -> Self {
        self.job_id = job_id;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_processing_type(mut self, processing_type: ProcessingType) -> Self {
        self.processing_type = processing_type;
        self
    }
}
