//! Binary versus text classification of response bodies.
//!
//! The aggregator asks a [`ContentTypeClassifier`] whether a base media type
//! is binary. Parameters (everything from the first `;`) are stripped before
//! the lookup, and a missing content type is always treated as text.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Lookup table deciding whether a base media type carries binary content.
///
/// Implementations are injected into the aggregator and must match the
/// media type exactly; no wildcard matching is implied.
pub trait ContentTypeClassifier: Send + Sync {
    /// Whether bodies of `media_type` should be base64 encoded.
    fn is_binary_media_type(&self, media_type: &str) -> bool;
}

impl<F> ContentTypeClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_binary_media_type(&self, media_type: &str) -> bool { self(media_type) }
}

/// Set of media types treated as binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryContentTypes {
    types: BTreeSet<String>,
}

impl BinaryContentTypes {
    /// Media types classified as binary by [`Default`].
    pub const COMMON: &'static [&'static str] = &[
        "application/octet-stream",
        "application/pdf",
        "application/zip",
        "application/gzip",
        "image/png",
        "image/jpeg",
        "image/gif",
        "image/webp",
        "audio/mpeg",
        "video/mp4",
        "font/woff",
        "font/woff2",
    ];

    /// Create a table with no binary media types.
    #[must_use]
    pub fn empty() -> Self { Self { types: BTreeSet::new() } }

    /// Add `media_type` to the table.
    pub fn insert(&mut self, media_type: impl Into<String>) -> bool { self.types.insert(media_type.into()) }

    /// Remove `media_type` from the table.
    pub fn remove(&mut self, media_type: &str) -> bool { self.types.remove(media_type) }

    /// Iterate over the registered media types.
    pub fn iter(&self) -> impl Iterator<Item = &str> { self.types.iter().map(String::as_str) }
}

impl Default for BinaryContentTypes {
    fn default() -> Self { Self::COMMON.iter().copied().collect() }
}

impl<S: Into<String>> FromIterator<S> for BinaryContentTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ContentTypeClassifier for BinaryContentTypes {
    fn is_binary_media_type(&self, media_type: &str) -> bool { self.types.contains(media_type) }
}

/// Strip parameters from a `Content-Type` value.
///
/// ```
/// use lambda_aggregator::content_type::media_type;
/// assert_eq!(media_type("text/html; charset=utf-8"), "text/html");
/// assert_eq!(media_type("image/png"), "image/png");
/// ```
#[must_use]
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(base, _)| base)
}

/// Decide whether a body with `content_type` is binary.
#[must_use]
pub fn is_binary(classifier: &dyn ContentTypeClassifier, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| classifier.is_binary_media_type(media_type(value)))
}
