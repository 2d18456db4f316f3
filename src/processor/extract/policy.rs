//! 策略类通知提取
//!
//! 违规/清除载荷携带 policyInfos × componentVersionStatuses，
//! 每个 (策略, 组件) 组合产出一条明细；豁免载荷携带单个组件和
//! 操作人姓名，每个策略产出一条 Overridden 明细。

use serde::Deserialize;
use tracing::warn;

use crate::model::{DetailedNotificationContent, PolicyPayload, PolicyStatus, RawNotification};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleViolationContent {
    project_name: String,
    project_version_name: Option<String>,
    #[serde(default)]
    policy_infos: Vec<PolicyInfo>,
    #[serde(default)]
    component_version_statuses: Vec<ComponentVersionStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyInfo {
    policy_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentVersionStatus {
    component_name: String,
    component_version_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyOverrideContent {
    project_name: String,
    project_version_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    policy_infos: Vec<PolicyInfo>,
    component_name: String,
    component_version_name: Option<String>,
}

/// 提取违规/清除明细，状态由通知类型决定
pub fn extract_violation(
    raw: &RawNotification,
    status: PolicyStatus,
) -> Vec<DetailedNotificationContent> {
    let content: RuleViolationContent = match serde_json::from_value(raw.content.clone()) {
        Ok(c) => c,
        Err(e) => {
            warn!(notification_id = raw.id, error = %e, "策略载荷解析失败，跳过");
            return Vec::new();
        }
    };

    let mut details = Vec::new();
    for policy in &content.policy_infos {
        for component in &content.component_version_statuses {
            details.push(DetailedNotificationContent::policy(
                raw,
                content.project_name.clone(),
                content.project_version_name.clone(),
                PolicyPayload {
                    policy_name: policy.policy_name.clone(),
                    component_name: component.component_name.clone(),
                    component_version_name: component.component_version_name.clone(),
                    status,
                    overrider: None,
                },
            ));
        }
    }
    details
}

/// 提取豁免明细
pub fn extract_override(raw: &RawNotification) -> Vec<DetailedNotificationContent> {
    let content: PolicyOverrideContent = match serde_json::from_value(raw.content.clone()) {
        Ok(c) => c,
        Err(e) => {
            warn!(notification_id = raw.id, error = %e, "豁免载荷解析失败，跳过");
            return Vec::new();
        }
    };

    let overrider = match (&content.first_name, &content.last_name) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        (Some(first), None) => Some(first.clone()),
        (None, Some(last)) => Some(last.clone()),
        (None, None) => None,
    };

    content
        .policy_infos
        .iter()
        .map(|policy| {
            DetailedNotificationContent::policy(
                raw,
                content.project_name.clone(),
                content.project_version_name.clone(),
                PolicyPayload {
                    policy_name: policy.policy_name.clone(),
                    component_name: content.component_name.clone(),
                    component_version_name: content.component_version_name.clone(),
                    status: PolicyStatus::Overridden,
                    overrider: overrider.clone(),
                },
            )
        })
        .collect()
}
