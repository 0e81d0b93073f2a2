//! High-level grouped-cache facade.
//!
//! [`GroupedCache`] resolves a dotted group name to its settings, derives
//! the cache key from the group's key template and the call parameters,
//! and delegates to an injected [`TaggedStore`]. No operation propagates a
//! hard failure: disabled caching and unusable groups are silent no-ops,
//! and store faults degrade to empty/false results.

use crate::config::{CacheConfig, CacheGroupsConfig, GroupSettings};
use crate::error::CacheError;
use crate::groups::GroupRegistry;
use crate::key::{CacheParams, build_cache_key};
use crate::traits::{ErrorReporter, Severity, TaggedStore};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Tags supplied by a caller: a bare scalar or a collection.
///
/// An absent, empty, or blank spec falls back to the dotted group name of
/// the operation it was passed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSpec {
    One(String),
    Many(Vec<String>),
}

impl TagSpec {
    /// Normalize to a non-empty tag list, falling back to `fallback`.
    fn normalize(spec: Option<TagSpec>, fallback: &str) -> Vec<String> {
        match spec {
            Some(TagSpec::One(tag)) if !tag.is_empty() => vec![tag],
            Some(TagSpec::Many(tags)) if !tags.is_empty() => tags,
            _ => vec![fallback.to_string()],
        }
    }

    fn into_tags(self) -> Vec<String> {
        match self {
            TagSpec::One(tag) => vec![tag],
            TagSpec::Many(tags) => tags,
        }
    }
}

impl From<&str> for TagSpec {
    fn from(tag: &str) -> Self {
        Self::One(tag.to_string())
    }
}

impl From<String> for TagSpec {
    fn from(tag: String) -> Self {
        Self::One(tag)
    }
}

impl From<Vec<String>> for TagSpec {
    fn from(tags: Vec<String>) -> Self {
        Self::Many(tags)
    }
}

impl From<&[&str]> for TagSpec {
    fn from(tags: &[&str]) -> Self {
        Self::Many(tags.iter().map(|t| t.to_string()).collect())
    }
}

/// Grouped, tag-aware caching facade over an injected store.
pub struct GroupedCache<S: TaggedStore> {
    config: CacheConfig,
    registry: GroupRegistry,
    store: Arc<S>,
    reporter: Option<Arc<dyn ErrorReporter>>,

    /// Per-key locks for read-through miss coalescing
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<S: TaggedStore> GroupedCache<S> {
    /// Create a facade from the nested configuration and a shared store.
    pub fn new(config: CacheGroupsConfig, store: Arc<S>) -> Self {
        let registry = GroupRegistry::from_groups(&config.groups);
        Self {
            config: CacheConfig::from(&config),
            registry,
            store,
            reporter: None,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Attach a best-effort error reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Serialize concurrent [`remember`](Self::remember) misses per cache
    /// key so a single producer runs at a time. Off by default.
    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.config.coalesce_misses = coalesce;
        self
    }

    /// Whether caching is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Settings for a dotted group name.
    pub fn group(&self, name: &str) -> Option<&GroupSettings> {
        self.registry.lookup(name)
    }

    /// The full group registry.
    pub fn groups(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Settings for a group/key pair.
    pub fn group_for(&self, group: &str, key: &str) -> Option<&GroupSettings> {
        self.registry.lookup_in(group, key)
    }

    /// Read-through: return the cached value for the group and parameters,
    /// or run `producer` and store its (non-empty) output.
    ///
    /// The producer's output is returned as-is on a miss, whether or not
    /// the subsequent store write succeeded.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use tagcache::*;
    /// # use serde_json::json;
    /// # async fn example(cache: &GroupedCache<InMemoryTaggedStore>) {
    /// let params = CacheParams::from(vec![("id".to_string(), json!(42))]);
    /// let profile = cache
    ///     .remember("user.profile", &params, None, || async {
    ///         Some(json!({"name": "Alice"}))
    ///     })
    ///     .await;
    /// # }
    /// ```
    pub async fn remember<F, Fut>(
        &self,
        group_key: &str,
        params: &CacheParams,
        tags: Option<TagSpec>,
        producer: F,
    ) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Value>>,
    {
        if let Some(value) = self.get(group_key, params, tags.clone()).await {
            if !is_empty_value(&value) {
                return Some(value);
            }
        }

        if self.config.coalesce_misses && self.config.enabled {
            if let Some(cache_key) = self.usable_cache_key(group_key, params) {
                let lock = self.key_lock(&cache_key).await;
                let guard = lock.lock().await;
                // Another caller may have populated the entry while we waited.
                if let Some(value) = self.get(group_key, params, tags.clone()).await {
                    if !is_empty_value(&value) {
                        drop(guard);
                        self.release_key_lock(&cache_key, &lock).await;
                        return Some(value);
                    }
                }
                let produced = self.produce_and_store(group_key, params, tags, producer).await;
                drop(guard);
                self.release_key_lock(&cache_key, &lock).await;
                return produced;
            }
        }

        self.produce_and_store(group_key, params, tags, producer).await
    }

    /// Fetch a cached value.
    ///
    /// Returns `None` without touching the store when caching is disabled
    /// or the group is missing, inactive, or has no key template. Store
    /// read failures degrade to `None`.
    pub async fn get(
        &self,
        group_key: &str,
        params: &CacheParams,
        tags: Option<TagSpec>,
    ) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }
        let group = self.resolve_group(group_key)?;
        let tags = TagSpec::normalize(tags, group_key);
        let cache_key = build_cache_key(&group.key, params);

        match self.store.get(&tags, &cache_key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %cache_key, %err, "cache read failed");
                None
            }
        }
    }

    /// Store a value.
    ///
    /// TTL is the group's lifetime override when set and non-zero,
    /// otherwise the global default. On a store server fault the whole
    /// cache is wiped as a safety measure, the fault is reported
    /// best-effort, and `false` is returned; no error ever propagates.
    pub async fn put(
        &self,
        group_key: &str,
        params: &CacheParams,
        data: Value,
        tags: Option<TagSpec>,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        let Some(group) = self.resolve_group(group_key) else {
            return false;
        };
        let tags = TagSpec::normalize(tags, group_key);
        let cache_key = build_cache_key(&group.key, params);
        let ttl = group.lifetime_or(self.config.default_lifetime);

        match self.store.put(&tags, &cache_key, data, ttl).await {
            Ok(()) => true,
            Err(err @ CacheError::StoreServer(_)) => {
                warn!(key = %cache_key, %err, "store server fault on write, wiping cache");
                if let Err(wipe_err) = self.store.flush_all().await {
                    warn!(%wipe_err, "cache wipe after store fault failed");
                }
                self.report_store_fault(&err, &tags, &cache_key).await;
                false
            }
            Err(err) => {
                warn!(key = %cache_key, %err, "cache write failed");
                false
            }
        }
    }

    /// Remove a single entry. Same preamble and degradation as
    /// [`get`](Self::get).
    pub async fn forget(
        &self,
        group_key: &str,
        params: &CacheParams,
        tags: Option<TagSpec>,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        let Some(group) = self.resolve_group(group_key) else {
            return false;
        };
        let tags = TagSpec::normalize(tags, group_key);
        let cache_key = build_cache_key(&group.key, params);

        match self.store.forget(&tags, &cache_key).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %cache_key, %err, "cache forget failed");
                false
            }
        }
    }

    /// Flush every entry under the given tags.
    ///
    /// Administrative: runs even when caching is disabled.
    pub async fn flush(&self, tags: impl Into<TagSpec>) -> bool {
        let tags = tags.into().into_tags();
        match self.store.flush(&tags).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "cache flush failed");
                false
            }
        }
    }

    /// Wipe the entire cache.
    ///
    /// Administrative: runs even when caching is disabled.
    pub async fn wipe(&self) -> bool {
        match self.store.flush_all().await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "cache wipe failed");
                false
            }
        }
    }

    /// A group is usable only when it exists, is active, and carries a
    /// key template.
    fn resolve_group(&self, group_key: &str) -> Option<&GroupSettings> {
        self.registry
            .lookup(group_key)
            .filter(|settings| settings.is_usable())
    }

    fn usable_cache_key(&self, group_key: &str, params: &CacheParams) -> Option<String> {
        self.resolve_group(group_key)
            .map(|group| build_cache_key(&group.key, params))
    }

    async fn produce_and_store<F, Fut>(
        &self,
        group_key: &str,
        params: &CacheParams,
        tags: Option<TagSpec>,
        producer: F,
    ) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Value>>,
    {
        let produced = producer().await;
        if let Some(value) = &produced {
            if !is_empty_value(value) {
                self.put(group_key, params, value.clone(), tags).await;
            }
        }
        produced
    }

    async fn report_store_fault(&self, error: &CacheError, tags: &[String], cache_key: &str) {
        let Some(reporter) = &self.reporter else {
            return;
        };
        let context = json!({
            "message": error.to_string(),
            "kind": "cache.store",
            "tags": tags,
            "key": cache_key,
        });
        if let Err(err) = reporter.report(error, context, Severity::Error).await {
            debug!(%err, "error report dropped");
        }
    }

    async fn key_lock(&self, cache_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.in_flight.lock().await;
        locks.entry(cache_key.to_string()).or_default().clone()
    }

    async fn release_key_lock(&self, cache_key: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.in_flight.lock().await;
        // Map's copy plus ours: no other caller is waiting on this key.
        if Arc::strong_count(lock) <= 2 {
            locks.remove(cache_key);
        }
    }
}

/// Emptiness test for hit detection and storage of produced values:
/// JSON `null`, `""`, `[]`, and `{}` count as empty.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
