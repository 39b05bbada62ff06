//! Aggregator configuration.
//!
//! An [`AggregatorConfig`] is shared by every aggregator in a process. It
//! carries the binary media type table, the initial body buffer capacity and
//! the text decoding policy. Every field has a default so partial JSON
//! documents deserialise.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    content_type::{BinaryContentTypes, ContentTypeClassifier},
    encoding::TextDecoding,
};

/// Shared settings for response aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AggregatorConfig {
    /// Media types whose bodies are base64 encoded.
    pub binary_content_types: BinaryContentTypes,
    /// Capacity hint for the body buffer allocated on the first body bytes.
    pub initial_buffer_capacity: usize,
    /// Treatment of non-UTF-8 text bodies.
    pub text_decoding: TextDecoding,
}

impl AggregatorConfig {
    /// Default capacity hint for the body buffer.
    pub const DEFAULT_BUFFER_CAPACITY: usize = 8096;

    /// Add a binary media type.
    #[must_use]
    pub fn binary_content_type(mut self, media_type: impl Into<String>) -> Self {
        self.binary_content_types.insert(media_type);
        self
    }

    /// Replace the binary media type table.
    #[must_use]
    pub fn binary_content_types(mut self, table: BinaryContentTypes) -> Self {
        self.binary_content_types = table;
        self
    }

    /// Set the body buffer capacity hint.
    #[must_use]
    pub fn initial_buffer_capacity(mut self, capacity: usize) -> Self {
        self.initial_buffer_capacity = capacity;
        self
    }

    /// Set the text decoding policy.
    #[must_use]
    pub fn text_decoding(mut self, policy: TextDecoding) -> Self {
        self.text_decoding = policy;
        self
    }

    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> { serde_json::from_str(json) }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(std::io::Error::from)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            binary_content_types: BinaryContentTypes::default(),
            initial_buffer_capacity: Self::DEFAULT_BUFFER_CAPACITY,
            text_decoding: TextDecoding::default(),
        }
    }
}

impl ContentTypeClassifier for AggregatorConfig {
    fn is_binary_media_type(&self, media_type: &str) -> bool {
        self.binary_content_types.is_binary_media_type(media_type)
    }
}
