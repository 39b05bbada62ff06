#![doc(html_root_url = "https://docs.rs/lambda_aggregator/latest")]
//! Public API for the `lambda_aggregator` library.
//!
//! This crate collects a streamed HTTP response, delivered as status, body
//! chunk, file region and terminal fragments, into a single
//! [`AggregatedResponse`] suitable for a serverless invocation result. The
//! body is emitted as UTF-8 text or base64 depending on the response's
//! content type, and the outcome is delivered exactly once through a shared
//! [`ResponseFuture`].

pub mod aggregator;
pub mod completion;
pub mod config;
pub mod content_type;
pub mod encoding;
pub mod error;
pub mod fragment;
pub mod headers;
pub mod metrics;
pub mod panic;
pub mod request;
pub mod response;
pub mod stream;

pub use aggregator::{Phase, ResponseAggregator};
pub use completion::{AggregationOutcome, CloseHandle, ResponseFuture};
pub use config::AggregatorConfig;
pub use content_type::{BinaryContentTypes, ContentTypeClassifier};
pub use encoding::TextDecoding;
/// Result type alias re-exported for convenience.
pub use error::Result;
pub use error::{AggregationError, EncodingError, ProtocolViolation};
pub use fragment::{FileBackedRegion, FileRegion, Fragment, ReleaseGuard, StatusFragment};
pub use headers::MultiValueHeaders;
pub use metrics::{AGGREGATION_FAILURES, BODY_BYTES, BodyEncoding, RESPONSES_AGGREGATED};
pub use request::{RequestContext, RequestSource};
pub use response::{AggregatedResponse, ResponseBody};
pub use stream::aggregate;
