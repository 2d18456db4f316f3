//! Map-backed resolver for tests and offline wiring.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::provider::{ProjectVersionRef, ProjectVersionResolver};

/// Resolver that answers from a fixed URL map.
///
/// Unknown URLs are definitive misses (`Ok(None)`), never errors.
#[derive(Default)]
pub struct MemoryResolver {
    entries: Mutex<HashMap<String, ProjectVersionRef>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        url: impl Into<String>,
        project_name: impl Into<String>,
        project_version_name: impl Into<String>,
    ) {
        self.entries.lock().unwrap().insert(
            url.into(),
            ProjectVersionRef::new(project_name, project_version_name),
        );
    }
}

impl ProjectVersionResolver for MemoryResolver {
    fn resolve(&self, url: &str) -> Result<Option<ProjectVersionRef>> {
        Ok(self.entries.lock().unwrap().get(url).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_urls() {
        let resolver = MemoryResolver::new();
        resolver.insert("https://provider/api/versions/1", "alpha", "1.0.0");

        let hit = resolver.resolve("https://provider/api/versions/1").unwrap();
        assert_eq!(hit, Some(ProjectVersionRef::new("alpha", "1.0.0")));

        let miss = resolver.resolve("https://provider/api/versions/2").unwrap();
        assert!(miss.is_none());
    }
}
