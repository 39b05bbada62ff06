//! Ordered, multi-valued header mapping used by aggregated responses.
//!
//! Names compare case-insensitively. The spelling seen on first insertion is
//! kept for output, and values under one name stay in insertion order.

use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};

#[derive(Clone, Debug, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Header name to ordered list of values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiValueHeaders {
    entries: IndexMap<String, HeaderEntry>,
}

impl MultiValueHeaders {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append `value` to the list stored under `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| HeaderEntry {
                name,
                values: Vec::new(),
            })
            .values
            .push(value.into());
    }

    /// First value stored under `name`, if any.
    #[must_use]
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values stored under `name` in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map_or(&[], |entry| entry.values.as_slice())
    }

    /// Whether any value is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.entries.contains_key(&name.to_ascii_lowercase()) }

    /// Iterate names with their values in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether no header has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for MultiValueHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.add(name, value);
        }
        headers
    }
}

impl Serialize for MultiValueHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, values) in self.iter() {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}
