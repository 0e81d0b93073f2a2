//! Group registry: flattens the nested group configuration into a single
//! lookup table keyed by dotted `"group.key"` names.

use crate::config::GroupSettings;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Flat lookup table of cache group settings.
///
/// Built once from the nested `group -> key -> settings` configuration and
/// read-only afterwards. Malformed entries are dropped, and on name
/// collision the first definition wins; neither case is an error.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, GroupSettings>,
}

impl GroupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a nested configuration map.
    pub fn from_groups(raw: &BTreeMap<String, Value>) -> Self {
        let mut registry = Self::new();
        registry.add_groups(raw);
        registry
    }

    /// Merge a nested configuration map into the registry.
    ///
    /// Group values that are not JSON objects and leaf values that do not
    /// decode into [`GroupSettings`] are skipped. Names already present
    /// keep their existing settings.
    pub fn add_groups(&mut self, raw: &BTreeMap<String, Value>) {
        for (group, entries) in raw {
            let Some(entries) = entries.as_object() else {
                debug!(group = %group, "skipping malformed cache group entry");
                continue;
            };
            for (key, settings) in entries {
                match serde_json::from_value::<GroupSettings>(settings.clone()) {
                    Ok(settings) => self.insert(format!("{group}.{key}"), settings),
                    Err(err) => {
                        debug!(group = %group, key = %key, %err, "skipping malformed cache group settings");
                    }
                }
            }
        }
    }

    /// Insert settings under a dotted name; the first definition wins.
    pub fn insert(&mut self, name: impl Into<String>, settings: GroupSettings) {
        self.groups.entry(name.into()).or_insert(settings);
    }

    /// Look up settings by exact dotted name.
    pub fn lookup(&self, name: &str) -> Option<&GroupSettings> {
        self.groups.get(name)
    }

    /// Look up settings by group and key parts.
    pub fn lookup_in(&self, group: &str, key: &str) -> Option<&GroupSettings> {
        self.lookup(&format!("{group}.{key}"))
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over the registered dotted names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}
