//! Ordered dictionary types.
//!
//! [`Dict`] keeps entries in file order and allows a keyword to repeat only when
//! it is a directive (`#include`, `#includeEtc`, ...). [`FileDict`] is the tree
//! form of a whole file: its keyword entries plus the optional standalone data
//! block.
//!
//! ## Examples
//!
//! ```rust
//! use foamdict::{Dict, Value};
//!
//! let mut dict = Dict::new();
//! dict.insert("solver", Value::from("PCG"));
//! dict.insert("#include", Value::from("\"common\""));
//! dict.insert("#include", Value::from("\"extra\""));
//!
//! assert_eq!(dict.len(), 3);
//! assert_eq!(dict.get_all("#include").count(), 2);
//! assert!(dict.try_insert("solver", Value::from("GAMG")).is_err());
//! ```

use crate::error::{Error, Result};
use crate::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

fn is_directive(key: &str) -> bool {
    key.starts_with('#')
}

/// An ordered keyword-to-value mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict(Vec<(String, Value)>);

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Dict(Vec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Dict(Vec::with_capacity(capacity))
    }

    /// Inserts or replaces a value.
    ///
    /// Directive keys are always appended. For other keys an existing value is
    /// replaced in place and returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if !is_directive(&key) {
            if let Some(slot) = self.get_mut(&key) {
                return Some(std::mem::replace(slot, value));
            }
        }
        self.0.push((key, value));
        None
    }

    /// Appends a value, failing if a non-directive key is already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] for a repeated non-directive key.
    pub fn try_insert(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if !is_directive(&key) && self.contains_key(&key) {
            return Err(Error::duplicate_key(key));
        }
        self.0.push((key, value));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All values stored under `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Follows a chain of nested dictionaries.
    #[must_use]
    pub fn get_path(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let value = self.get(first)?;
        if rest.is_empty() {
            Some(value)
        } else {
            value.as_dict()?.get_path(rest)
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Removes every value under `key`, returning the first.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let mut removed = None;
        let mut kept = Vec::with_capacity(self.0.len());
        for (k, v) in self.0.drain(..) {
            if k == key {
                removed.get_or_insert(v);
            } else {
                kept.push((k, v));
            }
        }
        self.0 = kept;
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value)> {
        self.0.iter_mut().map(|(k, v)| (&*k, v))
    }
}

impl IntoIterator for Dict {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Dict {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut dict = Dict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl Serialize for Dict {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Tree form of a complete file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FileDict {
    pub entries: Dict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standalone: Option<Value>,
}

impl FileDict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `FoamFile` header block, if present.
    #[must_use]
    pub fn header(&self) -> Option<&Dict> {
        self.entries.get("FoamFile").and_then(Value::as_dict)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut dict = Dict::new();
        dict.insert("a", Value::from(1));
        dict.insert("b", Value::from(2));
        assert_eq!(dict.insert("a", Value::from(3)), Some(Value::from(1)));
        let keys: Vec<_> = dict.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(dict.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn test_directives_repeat() {
        let mut dict = Dict::new();
        dict.try_insert("#include", Value::from("\"a\"")).unwrap();
        dict.try_insert("#include", Value::from("\"b\"")).unwrap();
        let all: Vec<_> = dict.get_all("#include").cloned().collect();
        assert_eq!(all, vec![Value::from("\"a\""), Value::from("\"b\"")]);
        assert_eq!(dict.remove("#include"), Some(Value::from("\"a\"")));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_try_insert_rejects_duplicate() {
        let mut dict = Dict::new();
        dict.try_insert("key", Value::from("value1")).unwrap();
        assert!(matches!(
            dict.try_insert("key", Value::from("value2")),
            Err(Error::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_get_path() {
        let mut inner = Dict::new();
        inner.insert("type", Value::from("fixedValue"));
        let mut outer = Dict::new();
        outer.insert("inlet", Value::Dict(inner));
        let path = vec!["inlet".to_string(), "type".to_string()];
        assert_eq!(outer.get_path(&path), Some(&Value::from("fixedValue")));
        assert_eq!(outer.get_path(&[]), None);
    }

    #[test]
    fn test_file_dict_header() {
        let mut file = FileDict::new();
        let mut header = Dict::new();
        header.insert("format", Value::from("ascii"));
        file.entries.insert("FoamFile", Value::Dict(header));
        assert_eq!(
            file.header().and_then(|h| h.get("format")),
            Some(&Value::from("ascii"))
        );
    }
}
