//! Plain-text rendering of a message group.
//!
//! Every sender works from the same rendered text; senders that need
//! structure (file channel) serialize the group itself instead.

use crate::model::{
    DetailPayload, DetailedNotificationContent, MessageContentGroup, MessageTopic,
};

/// Render a whole group: header line plus one block per topic.
pub fn render_group(group: &MessageContentGroup) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "[{}] {} finding(s) across {} project version(s)\n",
        group.frequency,
        group.detail_count(),
        group.topics.len()
    ));
    for topic in &group.topics {
        out.push_str(&render_topic(topic));
    }
    out
}

fn render_topic(topic: &MessageTopic) -> String {
    let mut out = String::new();
    match &topic.project_version_name {
        Some(version) => out.push_str(&format!("== {} {} ==\n", topic.project_name, version)),
        None => out.push_str(&format!("== {} ==\n", topic.project_name)),
    }
    for detail in &topic.details {
        out.push_str(&format!("- {}\n", render_detail(detail)));
    }
    out
}

fn render_detail(detail: &DetailedNotificationContent) -> String {
    match &detail.payload {
        DetailPayload::Policy(p) => {
            let component = match &p.component_version_name {
                Some(v) => format!("{} {}", p.component_name, v),
                None => p.component_name.clone(),
            };
            let mut line = format!("policy '{}' {} on {}", p.policy_name, p.status, component);
            if let Some(overrider) = &p.overrider {
                line.push_str(&format!(" (by {})", overrider));
            }
            line
        }
        DetailPayload::Vulnerability(p) => {
            let component = match &p.component_version_name {
                Some(v) => format!("{} {}", p.component_name, v),
                None => p.component_name.clone(),
            };
            let severities: Vec<&str> = p.severities.iter().map(|s| s.as_str()).collect();
            let mut line = format!("vulnerabilities on {}", component);
            if !severities.is_empty() {
                line.push_str(&format!(" [{}]", severities.join(", ")));
            }
            for (label, ids) in [
                ("new", &p.new_ids),
                ("updated", &p.updated_ids),
                ("deleted", &p.deleted_ids),
            ] {
                if !ids.is_empty() {
                    line.push_str(&format!(" {}: {}", label, ids.join(", ")));
                }
            }
            line
        }
        DetailPayload::BomEdit(p) => {
            let component = match &p.component_version_name {
                Some(v) => format!("{} {}", p.component_name, v),
                None => p.component_name.clone(),
            };
            format!("bom edited: {}", component)
        }
        DetailPayload::Other(p) => format!("project version {}", p.operation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DistributionJob, FrequencyType, JobFilterCriteria, NotificationType, PolicyPayload,
        PolicyStatus, RawNotification, VulnerabilityPayload, VulnerabilitySeverity,
    };

    fn group_with(details: Vec<DetailedNotificationContent>) -> MessageContentGroup {
        let job = DistributionJob::new(
            "render test",
            FrequencyType::RealTime,
            "console",
            JobFilterCriteria::for_provider(1),
        );
        crate::processor::assembler::assemble(&job, details).unwrap()
    }

    #[test]
    fn test_policy_line() {
        let raw = RawNotification::new(
            1,
            1,
            NotificationType::PolicyOverride,
            serde_json::Value::Null,
        );
        let detail = DetailedNotificationContent::policy(
            &raw,
            "alpha",
            Some("1.0.0".to_string()),
            PolicyPayload {
                policy_name: "No GPL".to_string(),
                component_name: "openssl".to_string(),
                component_version_name: Some("1.1.1".to_string()),
                status: PolicyStatus::Overridden,
                overrider: Some("Jane Doe".to_string()),
            },
        );

        let text = render_group(&group_with(vec![detail]));

        assert!(text.contains("== alpha 1.0.0 =="));
        assert!(text.contains("policy 'No GPL' overridden on openssl 1.1.1 (by Jane Doe)"));
        assert!(text.starts_with("[real_time] 1 finding(s) across 1 project version(s)"));
    }

    #[test]
    fn test_vulnerability_line() {
        let raw = RawNotification::new(
            2,
            1,
            NotificationType::Vulnerability,
            serde_json::Value::Null,
        );
        let detail = DetailedNotificationContent::vulnerability(
            &raw,
            "alpha",
            None,
            VulnerabilityPayload {
                component_name: "log4j".to_string(),
                component_version_name: Some("2.14.0".to_string()),
                severities: vec![VulnerabilitySeverity::Critical],
                new_ids: vec!["CVE-2021-44228".to_string()],
                updated_ids: vec![],
                deleted_ids: vec!["CVE-2017-5645".to_string()],
            },
        );

        let text = render_group(&group_with(vec![detail]));

        assert!(text.contains("== alpha =="));
        assert!(text.contains(
            "vulnerabilities on log4j 2.14.0 [CRITICAL] new: CVE-2021-44228 deleted: CVE-2017-5645"
        ));
    }

    #[test]
    fn test_topics_render_in_order() {
        let raw = RawNotification::new(3, 1, NotificationType::RuleViolation, serde_json::Value::Null);
        let mk = |project: &str| {
            DetailedNotificationContent::policy(
                &raw,
                project,
                Some("1.0.0".to_string()),
                PolicyPayload {
                    policy_name: "No GPL".to_string(),
                    component_name: "openssl".to_string(),
                    component_version_name: None,
                    status: PolicyStatus::InViolation,
                    overrider: None,
                },
            )
        };

        let text = render_group(&group_with(vec![mk("beta"), mk("alpha")]));
        let beta_pos = text.find("== beta").unwrap();
        let alpha_pos = text.find("== alpha").unwrap();
        assert!(beta_pos < alpha_pos);
    }
}
