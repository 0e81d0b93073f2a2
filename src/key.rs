//! Deterministic cache-key generation.
//!
//! A cache key is the group's key template joined with a serialized form
//! of the call parameters: `template|serialized`. Structured parameters
//! are serialized in value-sorted order so that insertion order never
//! influences the resulting key.

use serde_json::Value;
use std::borrow::Cow;

/// Parameters a cache key is derived from.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheParams {
    /// Structured key/value pairs, serialized as a query string in
    /// value-sorted order
    Map(Vec<(String, Value)>),

    /// A raw scalar, used verbatim as the serialized form
    Text(String),
}

impl CacheParams {
    /// Empty structured parameters.
    pub fn none() -> Self {
        Self::Map(Vec::new())
    }

    fn serialize(&self) -> String {
        match self {
            Self::Text(raw) => raw.clone(),
            Self::Map(pairs) => {
                let mut ordered: Vec<&(String, Value)> = pairs.iter().collect();
                // Stable sort: pairs whose values tie keep insertion order.
                ordered.sort_by(|a, b| value_text(&a.1).cmp(&value_text(&b.1)));
                ordered
                    .iter()
                    .map(|(key, value)| {
                        format!(
                            "{}={}",
                            urlencoding::encode(key),
                            urlencoding::encode(&value_text(value))
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("&")
            }
        }
    }
}

impl From<&str> for CacheParams {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for CacheParams {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

impl From<Vec<(String, Value)>> for CacheParams {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self::Map(pairs)
    }
}

impl From<serde_json::Map<String, Value>> for CacheParams {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self::Map(map.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for CacheParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().collect())
    }
}

/// String form a parameter value is sorted and serialized by.
fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Build the cache key for a key template and call parameters.
///
/// Pure and deterministic: the same `(template, params)` always yields
/// the same key.
///
/// # Examples
///
/// ```
/// use tagcache::{CacheParams, build_cache_key};
///
/// assert_eq!(build_cache_key("tmpl", &CacheParams::from("raw")), "tmpl|raw");
/// ```
pub fn build_cache_key(template: &str, params: &CacheParams) -> String {
    format!("{}|{}", template, params.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(raw: &[(&str, Value)]) -> CacheParams {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_deterministic() {
        let params = pairs(&[("page", json!(2)), ("query", json!("rust"))]);
        let first = build_cache_key("search_results", &params);
        let second = build_cache_key("search_results", &params);
        assert_eq!(first, second);
    }

    #[test]
    fn test_insertion_order_insensitive() {
        let forward = pairs(&[("a", json!(1)), ("b", json!(2))]);
        let reversed = pairs(&[("b", json!(2)), ("a", json!(1))]);
        assert_eq!(
            build_cache_key("tmpl", &forward),
            build_cache_key("tmpl", &reversed)
        );
    }

    #[test]
    fn test_value_sorted_serialization() {
        let params = pairs(&[("z", json!("apple")), ("a", json!("zebra"))]);
        // "apple" sorts before "zebra", so "z" serializes first.
        assert_eq!(build_cache_key("tmpl", &params), "tmpl|z=apple&a=zebra");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let params = pairs(&[("second", json!("same")), ("first", json!("same"))]);
        assert_eq!(
            build_cache_key("tmpl", &params),
            "tmpl|second=same&first=same"
        );
    }

    #[test]
    fn test_scalar_passthrough() {
        assert_eq!(build_cache_key("tmpl", &"raw".into()), "tmpl|raw");
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(build_cache_key("tmpl", &CacheParams::none()), "tmpl|");
    }

    #[test]
    fn test_values_percent_encoded() {
        let params = pairs(&[("q", json!("a b&c"))]);
        assert_eq!(build_cache_key("tmpl", &params), "tmpl|q=a%20b%26c");
    }

    #[test]
    fn test_non_string_values_use_json_text() {
        let params = pairs(&[("limit", json!(10)), ("strict", json!(true))]);
        // "10" sorts before "true"
        assert_eq!(build_cache_key("tmpl", &params), "tmpl|limit=10&strict=true");
    }
}
