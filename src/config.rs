//! Cache configuration types.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;

/// Settings for a single cache group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    /// Whether the group participates in caching
    pub active: bool,

    /// Key template the cache key is derived from
    pub key: String,

    /// Lifetime override in seconds; zero or absent means the global
    /// default lifetime applies
    pub lifetime: Option<u64>,
}

impl GroupSettings {
    /// Create active settings with the given key template.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            active: true,
            key: key.into(),
            lifetime: None,
        }
    }

    /// Set the lifetime override in seconds.
    pub fn with_lifetime(mut self, secs: u64) -> Self {
        self.lifetime = Some(secs);
        self
    }

    /// A group is usable only when it is active and carries a key template.
    pub fn is_usable(&self) -> bool {
        self.active && !self.key.is_empty()
    }

    /// Effective TTL for entries in this group.
    pub(crate) fn lifetime_or(&self, default: Duration) -> Duration {
        match self.lifetime {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => default,
        }
    }
}

/// Nested cache configuration as supplied by the host application.
///
/// The `groups` map is deliberately loose (`group -> arbitrary JSON`):
/// malformed entries are tolerated and dropped during registry
/// construction instead of failing deserialization of the whole config.
///
/// # Examples
///
/// ```
/// use tagcache::CacheGroupsConfig;
/// use serde_json::json;
///
/// let config: CacheGroupsConfig = serde_json::from_value(json!({
///     "enabled": true,
///     "lifetime": 3600,
///     "groups": {
///         "user": {
///             "profile": { "active": true, "key": "user_profile" }
///         }
///     }
/// })).unwrap();
///
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheGroupsConfig {
    /// Global kill switch for reads and writes
    pub enabled: bool,

    /// Default entry lifetime in seconds
    pub lifetime: u64,

    /// Nested `group -> key -> settings` structure
    pub groups: BTreeMap<String, Value>,
}

impl Default for CacheGroupsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lifetime: 3600,
            groups: BTreeMap::new(),
        }
    }
}

impl CacheGroupsConfig {
    /// Create a configuration with defaults (enabled, one hour lifetime).
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the global kill switch.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the default lifetime in seconds.
    pub fn with_lifetime(mut self, secs: u64) -> Self {
        self.lifetime = secs;
        self
    }

    /// Add a group entry under `group.key`.
    pub fn with_group(mut self, group: &str, key: &str, settings: GroupSettings) -> Self {
        let entry = self
            .groups
            .entry(group.to_string())
            .or_insert_with(|| json!({}));
        if let Some(map) = entry.as_object_mut() {
            map.insert(
                key.to_string(),
                serde_json::to_value(settings).unwrap_or(Value::Null),
            );
        }
        self
    }
}

/// Runtime cache configuration, derived from [`CacheGroupsConfig`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Global kill switch for reads and writes
    pub enabled: bool,

    /// Default entry lifetime
    pub default_lifetime: Duration,

    /// Serialize concurrent read-through misses per cache key
    pub coalesce_misses: bool,
}

impl From<&CacheGroupsConfig> for CacheConfig {
    fn from(raw: &CacheGroupsConfig) -> Self {
        Self {
            enabled: raw.enabled,
            default_lifetime: Duration::from_secs(raw.lifetime),
            coalesce_misses: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheGroupsConfig::new();
        assert!(config.enabled);
        assert_eq!(config.lifetime, 3600);
        assert!(config.groups.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = CacheGroupsConfig::new()
            .with_enabled(false)
            .with_lifetime(120)
            .with_group("user", "profile", GroupSettings::new("user_profile"));

        assert!(!config.enabled);
        assert_eq!(config.lifetime, 120);
        assert!(config.groups.contains_key("user"));
    }

    #[test]
    fn test_deserialize_nested() {
        let config: CacheGroupsConfig = serde_json::from_value(json!({
            "enabled": false,
            "lifetime": 60,
            "groups": {
                "search": {
                    "results": { "active": true, "key": "search_results", "lifetime": 30 }
                }
            }
        }))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.lifetime, 60);
        let nested = config.groups.get("search").unwrap();
        let settings: GroupSettings =
            serde_json::from_value(nested.get("results").cloned().unwrap()).unwrap();
        assert_eq!(settings.key, "search_results");
        assert_eq!(settings.lifetime, Some(30));
    }

    #[test]
    fn test_lifetime_override() {
        let default = Duration::from_secs(3600);

        let with_override = GroupSettings::new("k").with_lifetime(30);
        assert_eq!(with_override.lifetime_or(default), Duration::from_secs(30));

        let zero_override = GroupSettings::new("k").with_lifetime(0);
        assert_eq!(zero_override.lifetime_or(default), default);

        let no_override = GroupSettings::new("k");
        assert_eq!(no_override.lifetime_or(default), default);
    }

    #[test]
    fn test_usable() {
        assert!(GroupSettings::new("k").is_usable());
        assert!(!GroupSettings::default().is_usable());

        let inactive = GroupSettings {
            active: false,
            key: "k".to_string(),
            lifetime: None,
        };
        assert!(!inactive.is_usable());

        let keyless = GroupSettings {
            active: true,
            key: String::new(),
            lifetime: None,
        };
        assert!(!keyless.is_usable());
    }
}
