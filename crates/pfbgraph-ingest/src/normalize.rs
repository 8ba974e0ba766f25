//! Union-wrapper removal.
//!
//! Avro's JSON form wraps every optional/union field in a single-key map that
//! names the active branch: `{"string": "abc"}`, `{"float": 1.5}`. The router
//! wants plain values, so records pass through [`Normalizer::normalize`] first.
//!
//! Only mapping values are descended into by default. Array elements are left
//! as decoded, which means a wrapped scalar inside a list stays wrapped; turn on
//! [`Normalizer::descend_sequences`] to normalize those too.

use serde_json::Value;
use std::collections::BTreeSet;

/// Tags unwrapped when no extra configuration is given.
pub const DEFAULT_UNION_TAGS: &[&str] = &["string", "float"];

/// Every Avro primitive branch name that can appear as a union tag.
pub const AVRO_PRIMITIVE_TAGS: &[&str] = &[
    "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// The set of branch names recognized as union wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionTags {
    tags: BTreeSet<String>,
}

impl Default for UnionTags {
    fn default() -> Self {
        Self::new(DEFAULT_UNION_TAGS.iter().copied())
    }
}

impl UnionTags {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn avro_primitives() -> Self {
        Self::new(AVRO_PRIMITIVE_TAGS.iter().copied())
    }

    /// Adds a tag, e.g. the name of an enum type wrapped in a `["null", Enum]` union.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Stateless value normalizer.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    tags: UnionTags,
    descend_sequences: bool,
}

impl Normalizer {
    pub fn new(tags: UnionTags) -> Self {
        Self {
            tags,
            descend_sequences: false,
        }
    }

    pub fn descend_sequences(mut self, descend: bool) -> Self {
        self.descend_sequences = descend;
        self
    }

    pub fn tags(&self) -> &UnionTags {
        &self.tags
    }

    /// Removes union wrappers from `value`.
    ///
    /// A recognized wrapper is replaced by its contained value as-is; the tag
    /// names a terminal scalar, so there is nothing further to descend into.
    pub fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let is_wrapper =
                    map.len() == 1 && map.keys().next().is_some_and(|k| self.tags.contains(k));
                let mut entries = map.into_iter();
                if is_wrapper {
                    if let Some((_, inner)) = entries.next() {
                        return inner;
                    }
                }
                Value::Object(entries.map(|(k, v)| (k, self.normalize(v))).collect())
            }
            Value::Array(items) if self.descend_sequences => {
                Value::Array(items.into_iter().map(|v| self.normalize(v)).collect())
            }
            other => other,
        }
    }
}

/// Normalizes with the default tag set and no sequence descent.
pub fn normalize(value: Value) -> Value {
    Normalizer::default().normalize(value)
}
