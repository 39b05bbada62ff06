//! Collects a streamed HTTP response into one buffered response.
//!
//! A [`ResponseAggregator`] is created per in-flight request. The transport
//! pushes fragments into [`ResponseAggregator::consume`] in emission order;
//! the invocation harness awaits [`ResponseAggregator::result`]. The result
//! resolves exactly once: with the response when the terminal fragment
//! arrives, or with a failure when processing fails or the connection closes
//! first. Later fragments and close signals are ignored but their payloads are
//! still released.
//!
//! Fragment delivery is assumed to come from a single producer in order.
//! Out-of-order sequences are not reordered; a terminal fragment without a
//! preceding status fragment fails with
//! [`ProtocolViolation::MissingStatus`](crate::ProtocolViolation::MissingStatus).

mod state;

use std::sync::Arc;

use tracing::{debug, trace, warn};

pub use self::state::Phase;
use self::state::ResponseState;
use crate::{
    completion::{self, CloseHandle, Resolver, ResponseFuture},
    config::AggregatorConfig,
    content_type::ContentTypeClassifier,
    error::AggregationError,
    fragment::{Fragment, ReleaseGuard},
    metrics::{self, BodyEncoding},
    panic::catch_panic,
    request::{RequestContext, RequestSource},
    response::{AggregatedResponse, ResponseBody},
};

/// Per-request state machine turning fragments into an [`AggregatedResponse`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::Bytes;
/// use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
/// use lambda_aggregator::{
///     AggregatorConfig,
///     Fragment,
///     RequestSource,
///     ResponseAggregator,
///     StatusFragment,
/// };
///
/// # futures::executor::block_on(async {
/// let mut aggregator =
///     ResponseAggregator::new(&RequestSource::Alb, Arc::new(AggregatorConfig::default()));
/// let result = aggregator.result();
///
/// aggregator.consume(Fragment::Status(
///     StatusFragment::new(StatusCode::OK)
///         .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain")),
/// ));
/// aggregator.consume(Fragment::BodyChunk(Bytes::from_static(b"hello")));
/// aggregator.consume(Fragment::Terminal);
///
/// let response = result.await.expect("response aggregated");
/// assert_eq!(response.status_description(), Some("OK"));
/// assert_eq!(response.body().map(|body| body.as_str()), Some("hello"));
/// # });
/// ```
pub struct ResponseAggregator {
    source: RequestSource,
    config: Arc<AggregatorConfig>,
    classifier: Arc<dyn ContentTypeClassifier>,
    state: ResponseState,
    phase: Phase,
    resolver: Resolver,
    future: ResponseFuture,
}

impl ResponseAggregator {
    /// Create an aggregator for the request described by `request`.
    ///
    /// The configuration's binary media type table classifies bodies unless
    /// [`with_classifier`](Self::with_classifier) injects another table.
    #[must_use]
    pub fn new(request: &impl RequestContext, config: Arc<AggregatorConfig>) -> Self {
        let (resolver, future) = completion::channel();
        Self {
            source: request.request_source(),
            state: ResponseState::new(config.initial_buffer_capacity),
            classifier: config.clone(),
            config,
            phase: Phase::Empty,
            resolver,
            future,
        }
    }

    /// Use `classifier` to decide whether bodies are binary.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ContentTypeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Future resolving with the aggregated response or the failure.
    ///
    /// Every call returns a handle to the same shared future.
    pub fn result(&self) -> ResponseFuture { self.future.clone() }

    /// Handle that can close the aggregation from another task.
    #[must_use]
    pub fn close_handle(&self) -> CloseHandle { CloseHandle::new(self.resolver.clone()) }

    /// Source variant of the originating request.
    #[must_use]
    pub const fn request_source(&self) -> RequestSource { self.source }

    /// Current phase. A close through a [`CloseHandle`] reports
    /// [`Phase::Closed`] immediately.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if !self.phase.is_terminal() && self.resolver.is_resolved() {
            Phase::Closed
        } else {
            self.phase
        }
    }

    /// Whether the result has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool { self.resolver.is_resolved() }

    /// Number of body bytes buffered so far.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.state.buffered_len() }

    /// Apply the next fragment in arrival order.
    ///
    /// The fragment is released when this call returns, whatever the outcome.
    /// Once the result is resolved the fragment is only released.
    pub fn consume(&mut self, fragment: Fragment) {
        let mut fragment = ReleaseGuard::new(fragment);
        if self.is_resolved() {
            trace!(
                kind = fragment.kind(),
                phase = ?self.phase(),
                "fragment ignored after resolution"
            );
            return;
        }

        match catch_panic(|| self.apply(&mut fragment)) {
            Ok(Ok(Some(response))) => self.complete(response),
            Ok(Ok(None)) => {}
            Ok(Err(error)) => {
                self.fail(error);
            }
            Err(panic) => {
                self.fail(AggregationError::Panicked(panic.into_string()));
            }
        }
    }

    /// Resolve with [`AggregationError::ConnectionClosed`] unless already
    /// resolved. Returns whether this call resolved the result.
    pub fn close_abnormally(&mut self) -> bool {
        if !self.resolver.resolve(Err(AggregationError::ConnectionClosed)) {
            trace!(phase = ?self.phase(), "close ignored after resolution");
            return false;
        }
        self.phase = Phase::Closed;
        metrics::inc_failures(AggregationError::ConnectionClosed.kind());
        debug!(
            buffered = self.state.buffered_len(),
            "connection closed before response completed"
        );
        true
    }

    /// Resolve with `error` unless already resolved.
    pub(crate) fn fail(&mut self, error: AggregationError) -> bool {
        let kind = error.kind();
        let closed = error.is_connection_closed();
        let message = error.to_string();
        if !self.resolver.resolve(Err(error)) {
            return false;
        }
        self.phase = if closed { Phase::Closed } else { Phase::Failed };
        metrics::inc_failures(kind);
        warn!(error = %message, kind, "response aggregation failed");
        true
    }

    fn apply(&mut self, fragment: &mut Fragment) -> Result<Option<AggregatedResponse>, AggregationError> {
        match fragment {
            Fragment::Status(status) => {
                self.state.apply_status(status, self.source)?;
                self.phase = Phase::HeadersSet;
                trace!(status = status.status().as_u16(), "status recorded");
            }
            Fragment::BodyChunk(chunk) => {
                self.state.append_chunk(chunk);
                if self.state.has_body() {
                    self.phase = Phase::Accumulating;
                }
                metrics::add_body_bytes(chunk.len() as u64);
            }
            Fragment::FileRegion(region) => {
                let copied = self.state.append_region(region.as_mut())?;
                if self.state.has_body() {
                    self.phase = Phase::Accumulating;
                }
                metrics::add_body_bytes(copied);
                trace!(
                    copied,
                    remaining = region.remaining(),
                    "file region copied"
                );
            }
            Fragment::Terminal => {
                let response = self
                    .state
                    .finish(self.classifier.as_ref(), self.config.text_decoding)?;
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    fn complete(&mut self, response: AggregatedResponse) {
        let encoding = match response.body() {
            None => BodyEncoding::Empty,
            Some(ResponseBody::Text(_)) => BodyEncoding::Text,
            Some(ResponseBody::Base64(_)) => BodyEncoding::Base64,
        };
        let status = response.status_code();
        if !self.resolver.resolve(Ok(response)) {
            return;
        }
        self.phase = Phase::Finalized;
        metrics::inc_responses(encoding);
        debug!(
            status,
            encoding = encoding.as_str(),
            source = %self.source,
            "response aggregated"
        );
    }
}

impl std::fmt::Debug for ResponseAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseAggregator")
            .field("source", &self.source)
            .field("phase", &self.phase())
            .field("buffered", &self.state.buffered_len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
