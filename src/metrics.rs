//! Metric helpers for `lambda_aggregator`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking successfully aggregated responses.
pub const RESPONSES_AGGREGATED: &str = "lambda_aggregator_responses_total";
/// Name of the counter tracking aggregations that resolved with a failure.
pub const AGGREGATION_FAILURES: &str = "lambda_aggregator_failures_total";
/// Name of the counter tracking body bytes buffered across aggregations.
pub const BODY_BYTES: &str = "lambda_aggregator_body_bytes_total";

/// Representation chosen for an aggregated body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyEncoding {
    /// No body bytes were produced.
    Empty,
    /// Body decoded as UTF-8 text.
    Text,
    /// Body encoded as base64.
    Base64,
}

impl BodyEncoding {
    /// Label value used for this encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BodyEncoding::Empty => "empty",
            BodyEncoding::Text => "text",
            BodyEncoding::Base64 => "base64",
        }
    }
}

/// Record a successfully aggregated response.
pub fn inc_responses(encoding: BodyEncoding) {
    #[cfg(feature = "metrics")]
    counter!(RESPONSES_AGGREGATED, "encoding" => encoding.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = encoding;
}

/// Record a failed aggregation.
pub fn inc_failures(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(AGGREGATION_FAILURES, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record body bytes moved into an aggregation buffer.
pub fn add_body_bytes(bytes: u64) {
    #[cfg(feature = "metrics")]
    counter!(BODY_BYTES).increment(bytes);
    #[cfg(not(feature = "metrics"))]
    let _ = bytes;
}
