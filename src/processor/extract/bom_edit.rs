//! Bom-edit extraction.
//!
//! The payload names the component but references the project version
//! only by URL; the names come from the resolver cache. An
//! unresolvable reference is a data-quality condition (stale
//! notification after a project deletion), not an error.

use serde::Deserialize;
use tracing::warn;

use crate::model::{BomEditPayload, DetailedNotificationContent, RawNotification};
use crate::provider::ResolverCache;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BomEditContent {
    project_version: String,
    component_name: String,
    component_version_name: Option<String>,
}

pub fn extract(raw: &RawNotification, resolver: &ResolverCache) -> Vec<DetailedNotificationContent> {
    let content: BomEditContent = match serde_json::from_value(raw.content.clone()) {
        Ok(c) => c,
        Err(e) => {
            warn!(notification_id = raw.id, error = %e, "bom edit payload unparseable, skipping");
            return Vec::new();
        }
    };

    let resolved = match resolver.resolve(&content.project_version) {
        Ok(Some(r)) => r,
        Ok(None) => {
            warn!(
                notification_id = raw.id,
                url = %content.project_version,
                "project version reference does not resolve, skipping"
            );
            return Vec::new();
        }
        Err(e) => {
            warn!(
                notification_id = raw.id,
                url = %content.project_version,
                error = %e,
                "project version lookup failed, skipping"
            );
            return Vec::new();
        }
    };

    vec![DetailedNotificationContent::bom_edit(
        raw,
        resolved.project_name,
        Some(resolved.project_version_name),
        BomEditPayload {
            component_name: content.component_name,
            component_version_name: content.component_version_name,
        },
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationCategory, NotificationType};
    use crate::provider::MemoryResolver;
    use std::sync::Arc;

    fn bom_edit_raw(url: &str) -> RawNotification {
        RawNotification::new(
            1,
            10,
            NotificationType::BomEdit,
            serde_json::json!({
                "projectVersion": url,
                "componentName": "openssl",
                "componentVersionName": "1.1.1"
            }),
        )
    }

    #[test]
    fn test_resolved_reference_yields_detail() {
        let resolver = MemoryResolver::new();
        resolver.insert("https://provider/api/versions/42", "alpha", "1.0.0");
        let cache = ResolverCache::new(Arc::new(resolver));

        let details = extract(&bom_edit_raw("https://provider/api/versions/42"), &cache);

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].category, NotificationCategory::BomEdit);
        assert_eq!(details[0].project_name, "alpha");
        assert_eq!(details[0].project_version_name.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_unresolvable_reference_yields_empty() {
        let cache = ResolverCache::new(Arc::new(MemoryResolver::new()));

        let details = extract(&bom_edit_raw("https://provider/api/versions/404"), &cache);
        assert!(details.is_empty());
    }

    #[test]
    fn test_same_url_resolved_once_across_notifications() {
        struct CountingResolver(std::sync::atomic::AtomicUsize);
        impl crate::provider::ProjectVersionResolver for CountingResolver {
            fn resolve(
                &self,
                _url: &str,
            ) -> anyhow::Result<Option<crate::provider::ProjectVersionRef>> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(Some(crate::provider::ProjectVersionRef::new("alpha", "1.0.0")))
            }
        }

        let resolver = Arc::new(CountingResolver(std::sync::atomic::AtomicUsize::new(0)));
        let cache = ResolverCache::new(resolver.clone());

        for _ in 0..3 {
            extract(&bom_edit_raw("https://provider/api/versions/42"), &cache);
        }

        assert_eq!(resolver.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
