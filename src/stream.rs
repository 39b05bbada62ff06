//! Drive an aggregator from a fragment stream.
//!
//! Transports that expose their output as a [`Stream`] of fragments can hand
//! it to [`aggregate`] instead of pushing fragments manually. A transport error
//! fails the aggregation; a stream that ends before the terminal fragment is
//! treated as an abnormal close.

use std::io;

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::{
    aggregator::ResponseAggregator,
    completion::AggregationOutcome,
    error::AggregationError,
    fragment::Fragment,
};

/// Feed every item of `fragments` into `aggregator` and await the outcome.
///
/// Items arriving after the result is resolved are still drained so their
/// payloads are released.
///
/// # Errors
///
/// Resolves with [`AggregationError::Io`] when the stream yields an error,
/// with [`AggregationError::ConnectionClosed`] when it ends before the
/// terminal fragment, or with any failure raised while applying a fragment.
pub async fn aggregate<S>(mut aggregator: ResponseAggregator, fragments: S) -> AggregationOutcome
where
    S: Stream<Item = io::Result<Fragment>>,
{
    let result = aggregator.result();
    futures::pin_mut!(fragments);

    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => aggregator.consume(fragment),
            Err(error) => {
                debug!(error = %error, "fragment stream failed");
                aggregator.fail(AggregationError::from_io(error));
            }
        }
    }

    if !aggregator.is_resolved() {
        debug!("fragment stream ended before the terminal fragment");
        aggregator.close_abnormally();
    }
    drop(aggregator);
    result.await
}
