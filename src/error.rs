//! Canonical error and result types for the crate.
//!
//! A response aggregation resolves with exactly one [`AggregationError`] when
//! it does not produce a response. Every variant is `Clone` so the shared
//! [`ResponseFuture`](crate::ResponseFuture) can hand the same failure to each
//! waiter; I/O sources are therefore held behind an [`Arc`].

use std::{io, sync::Arc};

use thiserror::Error;

/// Failures raised while turning buffered bytes or header values into text.
#[derive(Clone, Debug, Error)]
pub enum EncodingError {
    /// The buffered body is not valid UTF-8 and the text policy is strict.
    #[error("response body is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the longest valid UTF-8 prefix.
        valid_up_to: usize,
    },
    /// A header value could not be represented as visible ASCII/UTF-8 text.
    #[error("header {name} carries a value that is not valid text")]
    InvalidHeaderValue {
        /// Name of the offending header.
        name: String,
    },
    /// Copying an out-of-band byte range into the body buffer failed.
    #[error("failed to copy file region into the body buffer: {0}")]
    RegionTransfer(Arc<io::Error>),
}

impl PartialEq for EncodingError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidUtf8 { valid_up_to: a }, Self::InvalidUtf8 { valid_up_to: b }) => a == b,
            (Self::InvalidHeaderValue { name: a }, Self::InvalidHeaderValue { name: b }) => a == b,
            (Self::RegionTransfer(a), Self::RegionTransfer(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

/// Fragment sequences the aggregator cannot turn into a response.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A terminal fragment arrived before any status fragment.
    #[error("terminal fragment received before a status fragment")]
    MissingStatus,
}

/// Top-level failure observed by the consumer of an aggregation.
#[derive(Clone, Debug, Error)]
pub enum AggregationError {
    /// The body or a header could not be encoded.
    #[error("encoding failure: {0}")]
    Encoding(#[from] EncodingError),
    /// The transport closed before a terminal fragment was observed.
    #[error("connection closed")]
    ConnectionClosed,
    /// The fragment sequence was not a well-formed response.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),
    /// The transport reported an error while producing fragments.
    #[error("transport error: {0}")]
    Io(Arc<io::Error>),
    /// An injected collaborator panicked while a fragment was processed.
    #[error("fragment processing panicked: {0}")]
    Panicked(String),
}

impl AggregationError {
    /// Wrap a transport I/O error.
    #[must_use]
    pub fn from_io(error: io::Error) -> Self { Self::Io(Arc::new(error)) }

    /// Returns true if this failure represents an abnormal connection close.
    #[must_use]
    pub fn is_connection_closed(&self) -> bool { matches!(self, Self::ConnectionClosed) }

    /// Short label used for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "encoding",
            Self::ConnectionClosed => "connection_closed",
            Self::Protocol(_) => "protocol",
            Self::Io(_) => "io",
            Self::Panicked(_) => "panic",
        }
    }
}

impl PartialEq for AggregationError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Encoding(a), Self::Encoding(b)) => a == b,
            (Self::ConnectionClosed, Self::ConnectionClosed) => true,
            (Self::Protocol(a), Self::Protocol(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Panicked(a), Self::Panicked(b)) => a == b,
            _ => false,
        }
    }
}

/// Canonical result alias used by `lambda_aggregator` public APIs.
pub type Result<T> = std::result::Result<T, AggregationError>;
