//! Job filter matching.
//!
//! A filter is compiled once per job per run, then evaluated as a pure
//! conjunction of sub-predicates over each detail. Matching has no side
//! effects and no ordering between sub-predicates.

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{
    DetailPayload, DetailedNotificationContent, JobFilterCriteria, NotificationCategory,
    NotificationType, VulnerabilitySeverity,
};

/// Compiled form of a job's filter criteria.
///
/// Compilation fails on an invalid project name pattern; the caller
/// treats that as a configuration error and skips the job.
pub struct JobFilterMatcher {
    provider_config_id: i64,
    notification_types: Vec<NotificationType>,
    project_names: Vec<String>,
    project_pattern: Option<Regex>,
    policy_names: Vec<String>,
    vulnerability_severities: Vec<VulnerabilitySeverity>,
}

impl JobFilterMatcher {
    pub fn compile(filter: &JobFilterCriteria) -> Result<Self> {
        let project_pattern = match &filter.project_name_pattern {
            // whole-name match, not substring search
            Some(pattern) => Some(
                Regex::new(&format!("^(?:{})$", pattern))
                    .with_context(|| format!("invalid project name pattern: {}", pattern))?,
            ),
            None => None,
        };

        Ok(Self {
            provider_config_id: filter.provider_config_id,
            notification_types: filter.notification_types.clone(),
            project_names: filter.project_names.clone(),
            project_pattern,
            policy_names: filter.policy_names.clone(),
            vulnerability_severities: filter.vulnerability_severities.clone(),
        })
    }

    /// Evaluate the full conjunction.
    pub fn matches(&self, detail: &DetailedNotificationContent) -> bool {
        self.matches_provider(detail)
            && self.matches_type(detail)
            && self.matches_project(detail)
            && self.matches_policy(detail)
            && self.matches_severity(detail)
    }

    fn matches_provider(&self, detail: &DetailedNotificationContent) -> bool {
        detail.provider_config_id == self.provider_config_id
    }

    fn matches_type(&self, detail: &DetailedNotificationContent) -> bool {
        // empty subscription list matches nothing: jobs opt in explicitly
        self.notification_types.contains(&detail.notification_type)
    }

    fn matches_project(&self, detail: &DetailedNotificationContent) -> bool {
        if self.project_names.is_empty() && self.project_pattern.is_none() {
            return true;
        }
        if self.project_names.iter().any(|n| n == &detail.project_name) {
            return true;
        }
        self.project_pattern
            .as_ref()
            .map_or(false, |p| p.is_match(&detail.project_name))
    }

    fn matches_policy(&self, detail: &DetailedNotificationContent) -> bool {
        if self.policy_names.is_empty() || detail.category != NotificationCategory::Policy {
            return true;
        }
        match &detail.payload {
            DetailPayload::Policy(p) => self.policy_names.contains(&p.policy_name),
            _ => true,
        }
    }

    fn matches_severity(&self, detail: &DetailedNotificationContent) -> bool {
        if self.vulnerability_severities.is_empty()
            || detail.category != NotificationCategory::Vulnerability
        {
            return true;
        }
        detail
            .severities()
            .iter()
            .any(|s| self.vulnerability_severities.contains(s))
    }
}
