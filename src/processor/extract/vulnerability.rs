//! 漏洞类通知提取
//!
//! 一条漏洞通知影响多个项目版本（affectedProjectVersions），
//! 每个受影响版本产出一条明细，携带去重后的严重度集合与
//! 新增/更新/删除三组漏洞 ID。

use serde::Deserialize;
use tracing::warn;

use crate::model::{
    DetailedNotificationContent, RawNotification, VulnerabilityPayload, VulnerabilitySeverity,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VulnerabilityContent {
    component_name: String,
    #[serde(alias = "versionName")]
    component_version_name: Option<String>,
    #[serde(default)]
    new_vulnerability_ids: Vec<VulnerabilityId>,
    #[serde(default)]
    updated_vulnerability_ids: Vec<VulnerabilityId>,
    #[serde(default)]
    deleted_vulnerability_ids: Vec<VulnerabilityId>,
    #[serde(default)]
    affected_project_versions: Vec<AffectedProjectVersion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VulnerabilityId {
    id: String,
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AffectedProjectVersion {
    project_name: String,
    project_version_name: Option<String>,
}

/// 提取漏洞明细
pub fn extract(raw: &RawNotification) -> Vec<DetailedNotificationContent> {
    let content: VulnerabilityContent = match serde_json::from_value(raw.content.clone()) {
        Ok(c) => c,
        Err(e) => {
            warn!(notification_id = raw.id, error = %e, "漏洞载荷解析失败，跳过");
            return Vec::new();
        }
    };

    // 严重度来自新增与更新两组；删除的不再构成当前威胁
    let mut severities: Vec<VulnerabilitySeverity> = Vec::new();
    for entry in content
        .new_vulnerability_ids
        .iter()
        .chain(content.updated_vulnerability_ids.iter())
    {
        if let Some(parsed) = entry.severity.as_deref().and_then(VulnerabilitySeverity::parse) {
            if !severities.contains(&parsed) {
                severities.push(parsed);
            }
        }
    }

    let ids = |entries: &[VulnerabilityId]| -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    };
    let new_ids = ids(&content.new_vulnerability_ids);
    let updated_ids = ids(&content.updated_vulnerability_ids);
    let deleted_ids = ids(&content.deleted_vulnerability_ids);

    content
        .affected_project_versions
        .iter()
        .map(|affected| {
            DetailedNotificationContent::vulnerability(
                raw,
                affected.project_name.clone(),
                affected.project_version_name.clone(),
                VulnerabilityPayload {
                    component_name: content.component_name.clone(),
                    component_version_name: content.component_version_name.clone(),
                    severities: severities.clone(),
                    new_ids: new_ids.clone(),
                    updated_ids: updated_ids.clone(),
                    deleted_ids: deleted_ids.clone(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetailPayload, NotificationCategory, NotificationType};

    fn vulnerability_raw() -> RawNotification {
        RawNotification::new(
            1,
            10,
            NotificationType::Vulnerability,
            serde_json::json!({
                "componentName": "log4j",
                "componentVersionName": "2.14.0",
                "newVulnerabilityIds": [
                    {"id": "CVE-2021-44228", "severity": "CRITICAL"},
                    {"id": "CVE-2021-45046", "severity": "CRITICAL"}
                ],
                "updatedVulnerabilityIds": [
                    {"id": "CVE-2020-9488", "severity": "LOW"}
                ],
                "deletedVulnerabilityIds": [
                    {"id": "CVE-2017-5645", "severity": "HIGH"}
                ],
                "affectedProjectVersions": [
                    {"projectName": "alpha", "projectVersionName": "1.0.0"},
                    {"projectName": "beta", "projectVersionName": "3.2.1"}
                ]
            }),
        )
    }

    #[test]
    fn test_one_detail_per_affected_version() {
        let details = extract(&vulnerability_raw());

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].project_name, "alpha");
        assert_eq!(details[1].project_name, "beta");
        assert!(details
            .iter()
            .all(|d| d.category == NotificationCategory::Vulnerability));
        // 项目不同 ⇒ 键不同
        assert_ne!(details[0].content_key, details[1].content_key);
    }

    #[test]
    fn test_severities_exclude_deleted() {
        let details = extract(&vulnerability_raw());

        // CRITICAL 去重、LOW 来自更新组；删除组的 HIGH 不计入
        assert_eq!(
            details[0].severities(),
            &[VulnerabilitySeverity::Critical, VulnerabilitySeverity::Low]
        );
    }

    #[test]
    fn test_id_lists_carried_through() {
        let details = extract(&vulnerability_raw());
        match &details[0].payload {
            DetailPayload::Vulnerability(p) => {
                assert_eq!(p.new_ids, vec!["CVE-2021-44228", "CVE-2021-45046"]);
                assert_eq!(p.updated_ids, vec!["CVE-2020-9488"]);
                assert_eq!(p.deleted_ids, vec!["CVE-2017-5645"]);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_no_affected_versions_emits_nothing() {
        let raw = RawNotification::new(
            2,
            10,
            NotificationType::Vulnerability,
            serde_json::json!({
                "componentName": "log4j",
                "newVulnerabilityIds": [],
                "affectedProjectVersions": []
            }),
        );
        assert!(extract(&raw).is_empty());
    }

    #[test]
    fn test_unknown_severity_string_ignored() {
        let raw = RawNotification::new(
            3,
            10,
            NotificationType::Vulnerability,
            serde_json::json!({
                "componentName": "zlib",
                "newVulnerabilityIds": [{"id": "CVE-1", "severity": "BANANAS"}],
                "affectedProjectVersions": [{"projectName": "alpha", "projectVersionName": "1.0.0"}]
            }),
        );

        let details = extract(&raw);
        assert_eq!(details.len(), 1);
        assert!(details[0].severities().is_empty());
    }
}
