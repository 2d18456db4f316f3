//! Read-through cache over a [`ProjectVersionResolver`].
//!
//! One instance is created per pipeline run and shared by every job in
//! that run. Hits and definitive misses are both cached; transient
//! errors are not, so the next notification retries the lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::provider::{ProjectVersionRef, ProjectVersionResolver};

pub struct ResolverCache {
    inner: Arc<dyn ProjectVersionResolver>,
    entries: Mutex<HashMap<String, Option<ProjectVersionRef>>>,
}

impl ResolverCache {
    pub fn new(inner: Arc<dyn ProjectVersionResolver>) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve through the cache.
    pub fn resolve(&self, url: &str) -> Result<Option<ProjectVersionRef>> {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(cached) = entries.get(url) {
                return Ok(cached.clone());
            }
        }

        let resolved = self.inner.resolve(url)?;
        self.entries
            .lock()
            .unwrap()
            .insert(url.to_string(), resolved.clone());
        Ok(resolved)
    }
}
