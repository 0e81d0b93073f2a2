//! Tag-aware grouped caching facade.
//!
//! Groups logical cache entries under named "cache groups" defined in
//! configuration, derives deterministic cache keys from a group's key
//! template plus call parameters, and delegates storage to an injected
//! tagged store.
//!
//! # Features
//!
//! - **Cache groups** - per-group activation flags, key templates, and
//!   lifetime overrides, addressed by dotted `group.key` names
//! - **Deterministic keys** - value-sorted query-string serialization of
//!   call parameters, insensitive to insertion order
//! - **Read-through** - `remember` runs a producer on miss and stores its
//!   output best-effort
//! - **Tag-based invalidation** - flush every entry sharing a tag
//! - **Graceful degradation** - disabled caching, unusable groups, and
//!   store faults never surface as errors
//!
//! # Examples
//!
//! ```no_run
//! use tagcache::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config: CacheGroupsConfig = serde_json::from_value(json!({
//!         "enabled": true,
//!         "lifetime": 3600,
//!         "groups": {
//!             "user": {
//!                 "profile": { "active": true, "key": "user_profile" }
//!             }
//!         }
//!     }))
//!     .unwrap();
//!
//!     let store = Arc::new(InMemoryTaggedStore::new());
//!     let cache = GroupedCache::new(config, store);
//!
//!     let params = CacheParams::from(vec![("id".to_string(), json!(42))]);
//!     let profile = cache
//!         .remember("user.profile", &params, None, || async {
//!             Some(json!({"name": "Alice"}))
//!         })
//!         .await;
//!     assert_eq!(profile, Some(json!({"name": "Alice"})));
//!
//!     // Invalidate everything tagged with the group name
//!     cache.flush("user.profile").await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod groups;
pub mod key;
pub mod memory;
pub mod orchestrator;
pub mod traits;

pub use config::{CacheConfig, CacheGroupsConfig, GroupSettings};
pub use error::{CacheError, CacheResult};
pub use groups::GroupRegistry;
pub use key::{CacheParams, build_cache_key};
pub use memory::InMemoryTaggedStore;
pub use orchestrator::{GroupedCache, TagSpec};
pub use traits::{ErrorReporter, Severity, TaggedStore};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{CacheConfig, CacheGroupsConfig, GroupSettings};
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::groups::GroupRegistry;
    pub use crate::key::{CacheParams, build_cache_key};
    pub use crate::memory::InMemoryTaggedStore;
    pub use crate::orchestrator::{GroupedCache, TagSpec};
    pub use crate::traits::{ErrorReporter, Severity, TaggedStore};
}
