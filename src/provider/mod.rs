//! Provider-side project version resolution.
//!
//! Bom-edit payloads reference a project version only by URL; the
//! extractor resolves the URL to names through this seam. The cache
//! wrapper keeps the resolver from being hit more than once per URL
//! within a single pipeline run.

pub mod cache;
pub mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use cache::ResolverCache;
pub use memory::MemoryResolver;

/// Resolved project version names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectVersionRef {
    pub project_name: String,
    pub project_version_name: String,
}

impl ProjectVersionRef {
    pub fn new(project_name: impl Into<String>, project_version_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_version_name: project_version_name.into(),
        }
    }
}

/// Looks up project version names by provider URL.
///
/// `Ok(None)` means the provider answered and the reference does not
/// exist (stale notification); `Err` means the lookup itself failed
/// and may succeed on retry.
pub trait ProjectVersionResolver: Send + Sync {
    fn resolve(&self, url: &str) -> Result<Option<ProjectVersionRef>>;
}
