//! Ordered document values.
//!
//! Every export operation speaks one currency: a tree of nulls, booleans,
//! numbers, strings, sequences and mappings. Mappings preserve insertion
//! order and keep keys unique (a keyed write replaces the value in place),
//! so the emitted JSON is byte-stable for a given build sequence.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::Result;

/// An ordered, JSON-serializable value.
///
/// `Null` is the identity for building: pushing into a `Null` turns it into
/// a sequence, keyed assignment turns it into a mapping. Reads never mutate.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Document>),
    Map(Vec<(String, Document)>),
}

impl Document {
    /// An empty mapping.
    pub fn map() -> Self {
        Document::Map(Vec::new())
    }

    /// An empty sequence.
    pub fn seq() -> Self {
        Document::Seq(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    /// Number of entries in a sequence or mapping, 0 otherwise.
    pub fn len(&self) -> usize {
        match self {
            Document::Seq(items) => items.len(),
            Document::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value, coercing `Null` into an empty sequence first.
    ///
    /// Appending to a non-sequence, non-null value is a logic error in the
    /// caller; the value is left untouched.
    pub fn push(&mut self, value: impl Into<Document>) {
        if self.is_null() {
            *self = Document::seq();
        }
        if let Document::Seq(items) = self {
            items.push(value.into());
        }
    }

    /// Keyed assignment, coercing `Null` into an empty mapping first.
    ///
    /// When the key already exists its value is replaced in place, keeping
    /// the original position; otherwise the entry is appended.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Document>) {
        if self.is_null() {
            *self = Document::map();
        }
        if let Document::Map(entries) = self {
            let key = key.into();
            let value = value.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Looks up a mapping entry by key.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Document::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Looks up a sequence entry by index.
    pub fn at(&self, index: usize) -> Option<&Document> {
        match self {
            Document::Seq(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Document::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Document::Float(v) => Some(*v),
            Document::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Serializes to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes to human-readable JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(v) => serializer.serialize_bool(*v),
            Document::Int(v) => serializer.serialize_i64(*v),
            // JSON has no non-finite numbers; degrade to null
            Document::Float(v) if !v.is_finite() => serializer.serialize_unit(),
            Document::Float(v) => serializer.serialize_f64(*v),
            Document::Str(s) => serializer.serialize_str(s),
            Document::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Document {
    fn from(v: bool) -> Self {
        Document::Bool(v)
    }
}

impl From<i32> for Document {
    fn from(v: i32) -> Self {
        Document::Int(v as i64)
    }
}

impl From<i64> for Document {
    fn from(v: i64) -> Self {
        Document::Int(v)
    }
}

impl From<u32> for Document {
    fn from(v: u32) -> Self {
        Document::Int(v as i64)
    }
}

impl From<u64> for Document {
    fn from(v: u64) -> Self {
        Document::Int(v as i64)
    }
}

impl From<usize> for Document {
    fn from(v: usize) -> Self {
        Document::Int(v as i64)
    }
}

impl From<f64> for Document {
    fn from(v: f64) -> Self {
        Document::Float(v)
    }
}

impl From<&str> for Document {
    fn from(v: &str) -> Self {
        Document::Str(v.to_string())
    }
}

impl From<String> for Document {
    fn from(v: String) -> Self {
        Document::Str(v)
    }
}

impl From<Vec<Document>> for Document {
    fn from(items: Vec<Document>) -> Self {
        Document::Seq(items)
    }
}

impl FromIterator<Document> for Document {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Document::Seq(iter.into_iter().collect())
    }
}
