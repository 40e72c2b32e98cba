//! Insertion-ordered label values.
//!
//! Export column identity depends on the order in which keys were first
//! written into a record, so label values live in an [`IndexMap`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapping from label field key to its string value, in insertion order.
///
/// Serialized as a JSON object; key order is preserved in both directions.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelData(IndexMap<String, String>);

impl LabelData {
    /// Creates an empty set of label values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    ///
    /// Overwriting an existing key keeps its original position.
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes `key`, returning its value. Later keys keep their order.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keeps only the entries whose key satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|k, _| keep(k));
    }
}

impl fmt::Debug for LabelData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let mut data = LabelData::new();
        data.insert("zeta", "1");
        data.insert("alpha", "2");
        data.insert("mid", "3");
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut data: LabelData = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(data.insert("a", "9"), Some("1".to_string()));
        assert_eq!(data.iter().collect::<Vec<_>>(), vec![("a", "9"), ("b", "2")]);
    }

    #[test]
    fn test_json_preserves_order() {
        let data: LabelData = [("status", "open"), ("reviewedOn", "19700101"), ("a", "x")]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"status":"open","reviewedOn":"19700101","a":"x"}"#);

        let back: LabelData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["status", "reviewedOn", "a"]);
    }

    #[test]
    fn test_retain_and_remove() {
        let mut data: LabelData = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        data.retain(|k| k != "b");
        assert_eq!(data.remove("c"), Some("3".to_string()));
        assert_eq!(data.len(), 1);
        assert!(data.contains_key("a"));
        assert!(!data.contains_key("b"));
    }

    #[test]
    fn test_remove_keeps_order_of_remaining_keys() {
        let mut data: LabelData = [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]
            .into_iter()
            .collect();
        data.remove("b");
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["a", "c", "d"]);
    }
}
