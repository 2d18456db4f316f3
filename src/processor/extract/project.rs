//! Project version lifecycle extraction (create/delete operations).

use serde::Deserialize;
use tracing::warn;

use crate::model::{DetailedNotificationContent, OtherPayload, RawNotification};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectVersionContent {
    project_name: String,
    project_version_name: Option<String>,
    operation_type: String,
}

pub fn extract(raw: &RawNotification) -> Vec<DetailedNotificationContent> {
    let content: ProjectVersionContent = match serde_json::from_value(raw.content.clone()) {
        Ok(c) => c,
        Err(e) => {
            warn!(notification_id = raw.id, error = %e, "project version payload unparseable, skipping");
            return Vec::new();
        }
    };

    vec![DetailedNotificationContent::other(
        raw,
        content.project_name,
        content.project_version_name,
        OtherPayload {
            operation: content.operation_type,
        },
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetailPayload, NotificationCategory, NotificationType};

    #[test]
    fn test_operation_lands_in_payload_and_key() {
        let raw = RawNotification::new(
            1,
            10,
            NotificationType::ProjectVersion,
            serde_json::json!({
                "projectName": "alpha",
                "projectVersionName": "1.0.0",
                "operationType": "CREATE"
            }),
        );

        let details = extract(&raw);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].category, NotificationCategory::Other);
        match &details[0].payload {
            DetailPayload::Other(p) => assert_eq!(p.operation, "CREATE"),
            other => panic!("unexpected payload: {:?}", other),
        }
        assert_eq!(details[0].content_key.operation.as_deref(), Some("CREATE"));
    }

    #[test]
    fn test_missing_operation_is_skipped() {
        let raw = RawNotification::new(
            2,
            10,
            NotificationType::ProjectVersion,
            serde_json::json!({"projectName": "alpha"}),
        );
        assert!(extract(&raw).is_empty());
    }
}
