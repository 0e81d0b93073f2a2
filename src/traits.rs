//! Store and reporter trait definitions.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Tagged cache store trait for pluggable backends.
///
/// Entries are addressed by a cache key scoped to a set of tags; flushing
/// a tag removes every entry stored under it.
#[async_trait]
pub trait TaggedStore: Send + Sync {
    /// Get a value scoped by tags.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(value))` if the entry exists, `Ok(None)` if not
    /// found, or an error if the operation fails.
    async fn get(&self, tags: &[String], key: &str) -> CacheResult<Option<Value>>;

    /// Store a value under tags with the given TTL.
    ///
    /// May fail with [`CacheError::StoreServer`] when the backend reports
    /// a server-side fault.
    async fn put(
        &self,
        tags: &[String],
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> CacheResult<()>;

    /// Remove a single entry.
    async fn forget(&self, tags: &[String], key: &str) -> CacheResult<()>;

    /// Remove every entry stored under any of the tags.
    async fn flush(&self, tags: &[String]) -> CacheResult<()>;

    /// Remove every entry in the store.
    ///
    /// **Warning:** this is destructive and affects all tags.
    async fn flush_all(&self) -> CacheResult<()>;
}

/// Severity attached to an error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Best-effort error-tracking collaborator.
///
/// Reporting is fire-and-forget from the facade's point of view: a
/// failure returned here is logged and discarded, never surfaced to the
/// caller of the cache operation that triggered the report.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// Report an error with a JSON context payload.
    async fn report(
        &self,
        error: &CacheError,
        context: Value,
        severity: Severity,
    ) -> CacheResult<()>;
}
