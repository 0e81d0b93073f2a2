//! In-memory tagged store.
//!
//! Reference implementation of [`TaggedStore`] used by tests and
//! documentation. Entries expire via TTL; a tag index supports bulk
//! invalidation. Production deployments supply their own backend.

use crate::error::CacheResult;
use crate::traits::TaggedStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory tagged cache store with TTL expiry.
pub struct InMemoryTaggedStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// Entries keyed by tag-scoped key
    entries: HashMap<String, StoreEntry>,

    /// Tag to scoped-keys mapping
    tag_index: HashMap<String, HashSet<String>>,

    /// Scoped-key to tags mapping
    key_tags: HashMap<String, HashSet<String>>,
}

struct StoreEntry {
    value: Value,
    expires_at: tokio::time::Instant,
}

/// The same key under a different tag set is a different entry, so the
/// storage key carries the (order-insensitive) tag set.
fn scoped_key(tags: &[String], key: &str) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}::{}", sorted.join(","), key)
}

impl InMemoryTaggedStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

impl Default for InMemoryTaggedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryTaggedStore {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[async_trait]
impl TaggedStore for InMemoryTaggedStore {
    async fn get(&self, tags: &[String], key: &str) -> CacheResult<Option<Value>> {
        let inner = self.inner.read().await;
        let scoped = scoped_key(tags, key);
        if let Some(entry) = inner.entries.get(&scoped) {
            if tokio::time::Instant::now() > entry.expires_at {
                return Ok(None); // Expired
            }
            Ok(Some(entry.value.clone()))
        } else {
            Ok(None)
        }
    }

    async fn put(
        &self,
        tags: &[String],
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> CacheResult<()> {
        let mut inner = self.inner.write().await;
        let scoped = scoped_key(tags, key);
        let entry = StoreEntry {
            value,
            expires_at: tokio::time::Instant::now() + ttl,
        };
        inner.entries.insert(scoped.clone(), entry);
        for tag in tags {
            inner
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(scoped.clone());
        }
        inner
            .key_tags
            .insert(scoped, tags.iter().cloned().collect());
        Ok(())
    }

    async fn forget(&self, tags: &[String], key: &str) -> CacheResult<()> {
        let mut inner = self.inner.write().await;
        let scoped = scoped_key(tags, key);
        inner.entries.remove(&scoped);
        if let Some(tag_set) = inner.key_tags.remove(&scoped) {
            for tag in tag_set {
                let mut emptied = false;
                if let Some(keys) = inner.tag_index.get_mut(&tag) {
                    keys.remove(&scoped);
                    emptied = keys.is_empty();
                }
                if emptied {
                    inner.tag_index.remove(&tag);
                }
            }
        }
        Ok(())
    }

    async fn flush(&self, tags: &[String]) -> CacheResult<()> {
        let mut inner = self.inner.write().await;
        for tag in tags {
            let Some(keys) = inner.tag_index.remove(tag) else {
                continue;
            };
            for scoped in keys {
                inner.entries.remove(&scoped);
                let Some(tag_set) = inner.key_tags.remove(&scoped) else {
                    continue;
                };
                for other in tag_set {
                    if other == *tag {
                        continue;
                    }
                    let mut emptied = false;
                    if let Some(others) = inner.tag_index.get_mut(&other) {
                        others.remove(&scoped);
                        emptied = others.is_empty();
                    }
                    if emptied {
                        inner.tag_index.remove(&other);
                    }
                }
            }
        }
        Ok(())
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.tag_index.clear();
        inner.key_tags.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryTaggedStore::new();
        store
            .put(
                &tags(&["users"]),
                "user_profile|id=1",
                json!({"name": "Alice"}),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let value = store
            .get(&tags(&["users"]), "user_profile|id=1")
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"name": "Alice"})));
    }

    #[tokio::test]
    async fn test_tag_scoping() {
        let store = InMemoryTaggedStore::new();
        store
            .put(
                &tags(&["a"]),
                "key",
                json!("under a"),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        // Same key under a different tag set is a different entry
        let value = store.get(&tags(&["b"]), "key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_flush_removes_tagged_entries() {
        let store = InMemoryTaggedStore::new();
        store
            .put(
                &tags(&["users", "active"]),
                "k1",
                json!(1),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        store
            .put(&tags(&["sessions"]), "k2", json!(2), Duration::from_secs(60))
            .await
            .unwrap();

        store.flush(&tags(&["users"])).await.unwrap();

        let gone = store.get(&tags(&["users", "active"]), "k1").await.unwrap();
        assert_eq!(gone, None);
        let kept = store.get(&tags(&["sessions"]), "k2").await.unwrap();
        assert_eq!(kept, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_forget() {
        let store = InMemoryTaggedStore::new();
        store
            .put(&tags(&["t"]), "k", json!("v"), Duration::from_secs(60))
            .await
            .unwrap();
        store.forget(&tags(&["t"]), "k").await.unwrap();

        assert_eq!(store.get(&tags(&["t"]), "k").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_flush_all() {
        let store = InMemoryTaggedStore::new();
        store
            .put(&tags(&["a"]), "k1", json!(1), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put(&tags(&["b"]), "k2", json!(2), Duration::from_secs(60))
            .await
            .unwrap();

        store.flush_all().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let store = InMemoryTaggedStore::new();
        store
            .put(&tags(&["t"]), "k", json!("v"), Duration::from_secs(1))
            .await
            .unwrap();

        assert!(store.get(&tags(&["t"]), "k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get(&tags(&["t"]), "k").await.unwrap(), None);
    }
}
