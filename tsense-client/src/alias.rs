//! Alias bindings and the process-local alias cache.

use crate::error::Result;
use crate::metadata::MetadataService;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Binding from a logical name to a physical collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Logical name.
    #[serde(default)]
    pub name: String,
    /// Physical collection the name points to.
    pub collection_name: String,
}

impl Alias {
    /// Create a binding.
    pub fn new(name: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection_name: collection_name.into(),
        }
    }
}

/// Cache of logical to physical collection names.
///
/// Entries are filled on the first successful remote lookup and never
/// expire. A lookup that finds nothing is not cached. Clones share the same
/// entries.
#[derive(Clone)]
pub struct AliasCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
    service: Arc<dyn MetadataService>,
}

impl AliasCache {
    /// Create an empty cache resolving misses through `service`.
    pub fn new(service: Arc<dyn MetadataService>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            service,
        }
    }

    /// Resolve a logical name to its physical collection.
    ///
    /// Returns `Ok(None)` when no alias is bound remotely.
    pub async fn resolve(&self, logical: &str) -> Result<Option<String>> {
        if let Some(physical) = self.get(logical) {
            tsense_log::trace!("Alias cache hit: {} -> {}", logical, physical);
            return Ok(Some(physical));
        }

        // Lookup happens outside the lock; concurrent misses may both fetch.
        let Some(alias) = self.service.get_alias(logical).await? else {
            tsense_log::debug!("Alias not bound: {}", logical);
            return Ok(None);
        };

        self.insert(logical, alias.collection_name.clone());
        Ok(Some(alias.collection_name))
    }

    /// Cached physical name, without any remote call.
    pub fn get(&self, logical: &str) -> Option<String> {
        self.entries.lock().get(logical).cloned()
    }

    /// Record a binding known to be current.
    pub fn insert(&self, logical: impl Into<String>, physical: impl Into<String>) {
        self.entries.lock().insert(logical.into(), physical.into());
    }

    /// Number of cached bindings.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Metadata service used on a miss.
    pub fn service(&self) -> &Arc<dyn MetadataService> {
        &self.service
    }
}

impl std::fmt::Debug for AliasCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMetadataService;

    #[tokio::test]
    async fn test_hit_after_first_resolution_makes_no_remote_call() {
        let service = Arc::new(MemoryMetadataService::new());
        service.put_alias(Alias::new("widgets", "widgets_2024-01-02_a"));
        let cache = AliasCache::new(service.clone());

        let first = cache.resolve("widgets").await.unwrap();
        assert_eq!(first.as_deref(), Some("widgets_2024-01-02_a"));
        assert_eq!(service.alias_lookups(), 1);

        let second = cache.resolve("widgets").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(service.alias_lookups(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let service = Arc::new(MemoryMetadataService::new());
        let cache = AliasCache::new(service.clone());

        assert_eq!(cache.resolve("ghost").await.unwrap(), None);
        assert_eq!(cache.resolve("ghost").await.unwrap(), None);
        assert_eq!(service.alias_lookups(), 2);
        assert!(cache.is_empty());

        service.put_alias(Alias::new("ghost", "ghost_2024-01-02_b"));
        assert_eq!(
            cache.resolve("ghost").await.unwrap().as_deref(),
            Some("ghost_2024-01-02_b")
        );
    }

    #[tokio::test]
    async fn test_cached_entry_survives_remote_rebind() {
        let service = Arc::new(MemoryMetadataService::new());
        service.put_alias(Alias::new("order", "order_v1"));
        let cache = AliasCache::new(service.clone());
        cache.resolve("order").await.unwrap();

        service.put_alias(Alias::new("order", "order_v2"));
        assert_eq!(cache.resolve("order").await.unwrap().as_deref(), Some("order_v1"));
    }

    #[tokio::test]
    async fn test_remote_error_is_returned_and_not_cached() {
        let service = Arc::new(MemoryMetadataService::new());
        service.put_alias(Alias::new("order", "order_v1"));
        service.fail_alias_lookups(503, "unavailable");
        let cache = AliasCache::new(service.clone());

        let err = cache.resolve("order").await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(cache.is_empty());
        assert_eq!(cache.get("order"), None);

        let err = cache.resolve("order").await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(service.alias_lookups(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let service = Arc::new(MemoryMetadataService::new());
        let cache = AliasCache::new(service);
        let other = cache.clone();

        cache.insert("order", "order_v1");
        assert_eq!(other.get("order").as_deref(), Some("order_v1"));
        assert_eq!(other.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolution_agrees() {
        let service = Arc::new(MemoryMetadataService::new());
        service.put_alias(Alias::new("order", "order_v1"));
        let cache = AliasCache::new(service.clone());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.resolve("order").await })
            })
            .collect();

        for handle in handles {
            let resolved = handle.await.unwrap().unwrap();
            assert_eq!(resolved.as_deref(), Some("order_v1"));
        }
        assert_eq!(cache.len(), 1);
        assert!(service.alias_lookups() >= 1);
    }
}
