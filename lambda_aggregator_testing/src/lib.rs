//! Utilities for exercising a
//! [`ResponseAggregator`](lambda_aggregator::ResponseAggregator) in tests.
//!
//! The helpers build fragments, provide in-memory file regions that report
//! how they were transferred and released, and capture logs and metrics.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use lambda_aggregator::{AggregatorConfig, Fragment, RequestSource, ResponseAggregator};
//! use lambda_aggregator_testing::{MemoryRegion, text_status};
//!
//! # futures::executor::block_on(async {
//! let region = MemoryRegion::new(&b"hello"[..]);
//! let releases = region.release_counter();
//! let mut aggregator =
//!     ResponseAggregator::new(&RequestSource::Alb, Arc::new(AggregatorConfig::default()));
//! aggregator.consume(text_status(200));
//! aggregator.consume(region.into_fragment());
//! aggregator.consume(Fragment::Terminal);
//!
//! assert_eq!(releases.count(), 1);
//! let response = aggregator.result().await.expect("response aggregated");
//! assert_eq!(response.body().map(|body| body.as_str()), Some("hello"));
//! # });
//! ```

pub mod fragments;
pub mod logging;
pub mod macros;
pub mod metrics;
pub mod region;

pub use fragments::{
    ReleaseCounter,
    binary_status,
    chunk,
    status,
    status_with_type,
    text_status,
    tracked_chunk,
};
pub use logging::{LoggerHandle, logger};
pub use metrics::{counter_value, debugging_recorder_setup};
pub use region::MemoryRegion;
