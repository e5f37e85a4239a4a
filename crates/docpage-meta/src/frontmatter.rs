//! Schema-less author frontmatter.
//!
//! Frontmatter is whatever the page author put in the document header. No key
//! is guaranteed to exist and no value has a guaranteed type, so every accessor
//! returns an `Option`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed map of untyped frontmatter values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(Map<String, Value>);

impl Frontmatter {
    /// Create empty frontmatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for a key, `None` if missing or not a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }

    /// Boolean value for a key, `None` if missing or not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key)?.as_bool()
    }

    /// Integer value for a key, `None` if missing or not an integer.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key)?.as_i64()
    }

    /// List of strings for a key.
    ///
    /// Returns `None` if the key is missing, is not an array, or contains a
    /// non-string element.
    #[must_use]
    pub fn get_str_list(&self, key: &str) -> Option<Vec<&str>> {
        self.0.get(key)?.as_array()?.iter().map(Value::as_str).collect()
    }

    /// Insert or overwrite an entry, returning the previous value.
    ///
    /// Only reachable while metadata is being built; [`PageMetadata`](crate::PageMetadata)
    /// hands out shared references.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Whether the key is present (with any value, including `null`).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Frontmatter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Frontmatter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
