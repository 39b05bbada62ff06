//! Unit tests for `ResponseAggregator`.

use std::{
    io::{self, Write},
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use rstest::{fixture, rstest};
use tracing_test::traced_test;

use super::{Phase, ResponseAggregator};
use crate::{
    config::AggregatorConfig,
    content_type::ContentTypeClassifier,
    encoding::TextDecoding,
    error::{AggregationError, EncodingError, ProtocolViolation},
    fragment::{FileRegion, Fragment, StatusFragment},
    request::RequestSource,
    response::ResponseBody,
};

// =============================================================================
// Helpers
// =============================================================================

#[fixture]
fn config() -> Arc<AggregatorConfig> { Arc::new(AggregatorConfig::default()) }

#[fixture]
fn aggregator(config: Arc<AggregatorConfig>) -> ResponseAggregator {
    ResponseAggregator::new(&RequestSource::ApiGateway, config)
}

fn status_with_type(content_type: &'static str) -> Fragment {
    Fragment::Status(
        StatusFragment::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static(content_type)),
    )
}

fn chunk(bytes: &[u8]) -> Fragment { Fragment::BodyChunk(Bytes::copy_from_slice(bytes)) }

/// Region over in-memory bytes, shareable between fragments.
///
/// Each transfer moves at most `per_call` bytes, and transfers after the
/// first `stall_after` calls move nothing, imitating a source that is not
/// ready yet.
#[derive(Clone)]
struct SharedRegion {
    inner: Arc<Mutex<RegionInner>>,
}

struct RegionInner {
    data: Vec<u8>,
    transferred: u64,
    per_call: usize,
    calls: usize,
    stall_after: Option<usize>,
    fail: bool,
    released: usize,
}

impl SharedRegion {
    fn new(data: &[u8], per_call: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegionInner {
                data: data.to_vec(),
                transferred: 0,
                per_call,
                calls: 0,
                stall_after: None,
                fail: false,
                released: 0,
            })),
        }
    }

    fn stall_after(self, calls: usize) -> Self {
        self.lock().stall_after = Some(calls);
        self
    }

    fn failing(self) -> Self {
        self.lock().fail = true;
        self
    }

    fn resume(&self) { self.lock().stall_after = None; }

    fn released(&self) -> usize { self.lock().released }

    fn fragment(&self) -> Fragment { Fragment::FileRegion(Box::new(self.clone())) }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegionInner> { self.inner.lock().expect("region lock") }
}

impl FileRegion for SharedRegion {
    fn count(&self) -> u64 { self.lock().data.len() as u64 }

    fn transferred(&self) -> u64 { self.lock().transferred }

    fn transfer_to(&mut self, target: &mut dyn Write, position: u64) -> io::Result<u64> {
        let mut inner = self.lock();
        if inner.fail {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "backing file truncated"));
        }
        inner.calls += 1;
        if inner.stall_after.is_some_and(|limit| inner.calls > limit) {
            return Ok(0);
        }
        let start = usize::try_from(position).expect("position fits usize");
        let end = (start + inner.per_call).min(inner.data.len());
        target.write_all(&inner.data[start..end])?;
        let moved = (end - start) as u64;
        inner.transferred += moved;
        Ok(moved)
    }

    fn release(&mut self) { self.lock().released += 1; }
}

/// Classifier recording every media type it is asked about.
#[derive(Default)]
struct RecordingClassifier {
    seen: Mutex<Vec<String>>,
}

impl ContentTypeClassifier for RecordingClassifier {
    fn is_binary_media_type(&self, media_type: &str) -> bool {
        self.seen.lock().expect("seen lock").push(media_type.to_owned());
        false
    }
}

/// Region that only records whether it was released.
struct ReleaseFlag(Arc<AtomicBool>);

impl FileRegion for ReleaseFlag {
    fn count(&self) -> u64 { 0 }

    fn transferred(&self) -> u64 { 0 }

    fn transfer_to(&mut self, _target: &mut dyn Write, _position: u64) -> io::Result<u64> { Ok(0) }

    fn release(&mut self) { self.0.store(true, Ordering::SeqCst); }
}

// =============================================================================
// Resolution
// =============================================================================

#[rstest]
#[tokio::test]
async fn terminal_resolves_once_and_later_close_is_ignored(mut aggregator: ResponseAggregator) {
    let result = aggregator.result();
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(Fragment::Terminal);

    assert!(aggregator.is_resolved());
    assert_eq!(aggregator.phase(), Phase::Finalized);
    assert!(!aggregator.close_abnormally());
    assert_eq!(aggregator.phase(), Phase::Finalized);

    let response = result.await.expect("response aggregated");
    assert_eq!(response.status_code(), 200);
}

#[rstest]
fn result_returns_handles_to_the_same_future(aggregator: ResponseAggregator) {
    assert!(aggregator.result().ptr_eq(&aggregator.result()));
}

#[rstest]
#[tokio::test]
async fn close_before_terminal_reports_connection_closed(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(chunk(b"partial"));
    assert!(aggregator.close_abnormally());
    assert_eq!(aggregator.phase(), Phase::Closed);

    aggregator.consume(Fragment::Terminal);
    assert_eq!(aggregator.phase(), Phase::Closed);
    assert_eq!(aggregator.result().await, Err(AggregationError::ConnectionClosed));
}

#[rstest]
#[tokio::test]
async fn second_close_is_a_no_op(mut aggregator: ResponseAggregator) {
    assert!(aggregator.close_abnormally());
    assert!(!aggregator.close_abnormally());
    assert_eq!(aggregator.result().await, Err(AggregationError::ConnectionClosed));
}

#[rstest]
#[tokio::test]
async fn close_handle_closes_from_another_task(mut aggregator: ResponseAggregator) {
    let handle = aggregator.close_handle();
    let closed = tokio::spawn(async move { handle.close_abnormally() })
        .await
        .expect("close task");
    assert!(closed);
    assert_eq!(aggregator.phase(), Phase::Closed);

    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(Fragment::Terminal);
    assert_eq!(aggregator.result().await, Err(AggregationError::ConnectionClosed));
}

#[rstest]
#[tokio::test]
async fn dropping_unresolved_aggregator_closes_the_result(aggregator: ResponseAggregator) {
    let result = aggregator.result();
    drop(aggregator);
    assert_eq!(result.await, Err(AggregationError::ConnectionClosed));
}

#[rstest]
#[tokio::test]
async fn terminal_without_status_is_a_protocol_violation(mut aggregator: ResponseAggregator) {
    aggregator.consume(chunk(b"orphan"));
    aggregator.consume(Fragment::Terminal);
    assert_eq!(aggregator.phase(), Phase::Failed);
    assert_eq!(
        aggregator.result().await,
        Err(AggregationError::Protocol(ProtocolViolation::MissingStatus))
    );
}

// =============================================================================
// Status and headers
// =============================================================================

#[rstest]
#[case(RequestSource::Alb, Some("OK"))]
#[case(RequestSource::ApiGateway, None)]
#[tokio::test]
async fn status_description_depends_on_request_source(
    config: Arc<AggregatorConfig>,
    #[case] source: RequestSource,
    #[case] expected: Option<&str>,
) {
    let mut aggregator = ResponseAggregator::new(&source, config);
    aggregator.consume(Fragment::Status(
        StatusFragment::new(StatusCode::OK).with_reason("OK"),
    ));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.status_description(), expected);
}

#[rstest]
#[tokio::test]
async fn alb_without_reason_uses_canonical_phrase(config: Arc<AggregatorConfig>) {
    let mut aggregator = ResponseAggregator::new(&RequestSource::Alb, config);
    aggregator.consume(Fragment::Status(StatusFragment::new(StatusCode::NOT_FOUND)));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.status_description(), Some("Not Found"));
}

#[rstest]
#[tokio::test]
async fn alb_with_unregistered_code_uses_class_phrase(config: Arc<AggregatorConfig>) {
    let mut aggregator = ResponseAggregator::new(&RequestSource::Alb, config);
    aggregator.consume(Fragment::Status(StatusFragment::new(
        StatusCode::from_u16(599).expect("valid status code"),
    )));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.status_code(), 599);
    assert_eq!(response.status_description(), Some("Server Error (599)"));
}

#[rstest]
#[case(RequestSource::Alb)]
#[case(RequestSource::ApiGateway)]
fn request_source_is_taken_from_the_request(config: Arc<AggregatorConfig>, #[case] source: RequestSource) {
    let aggregator = ResponseAggregator::new(&source, config);
    assert_eq!(aggregator.request_source(), source);
}

#[rstest]
#[tokio::test]
async fn repeated_header_values_keep_their_order(mut aggregator: ResponseAggregator) {
    let name: http::HeaderName = "x-test".parse().expect("header name");
    aggregator.consume(Fragment::Status(
        StatusFragment::new(StatusCode::OK)
            .with_header(name.clone(), HeaderValue::from_static("a"))
            .with_header(name.clone(), HeaderValue::from_static("b"))
            .with_header(name, HeaderValue::from_static("c")),
    ));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.multi_value_headers().get_all("X-Test"), ["a", "b", "c"]);
}

#[rstest]
#[tokio::test]
async fn later_status_replaces_headers(mut aggregator: ResponseAggregator) {
    aggregator.consume(Fragment::Status(
        StatusFragment::new(StatusCode::CONTINUE)
            .with_header("x-interim".parse().expect("name"), HeaderValue::from_static("1")),
    ));
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.status_code(), 200);
    assert!(!response.multi_value_headers().contains("x-interim"));
    assert_eq!(
        response.multi_value_headers().get_first("Content-Type"),
        Some("text/plain")
    );
}

#[rstest]
#[tokio::test]
async fn non_utf8_header_value_fails(mut aggregator: ResponseAggregator) {
    let value = HeaderValue::from_bytes(&[0xFF, 0xFE]).expect("opaque header bytes");
    aggregator.consume(Fragment::Status(
        StatusFragment::new(StatusCode::OK).with_header("x-raw".parse().expect("name"), value),
    ));
    assert_eq!(aggregator.phase(), Phase::Failed);
    assert_eq!(
        aggregator.result().await,
        Err(AggregationError::Encoding(EncodingError::InvalidHeaderValue {
            name: "x-raw".into()
        }))
    );
}

// =============================================================================
// Body encoding
// =============================================================================

#[rstest]
#[tokio::test]
async fn missing_body_stays_absent(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("application/octet-stream"));
    aggregator.consume(chunk(b""));
    assert_eq!(aggregator.phase(), Phase::HeadersSet);
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert!(response.body().is_none());
    assert!(!response.is_base64_encoded());
}

#[rstest]
#[tokio::test]
async fn text_body_is_decoded(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(chunk("hello".as_bytes()));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body(), Some(&ResponseBody::Text("hello".into())));
    assert!(!response.is_base64_encoded());
}

#[rstest]
#[tokio::test]
async fn binary_body_is_base64_encoded(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("application/octet-stream"));
    aggregator.consume(chunk(&[0x00, 0xFF, 0x10]));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body(), Some(&ResponseBody::Base64("AP8Q".into())));
    assert!(response.is_base64_encoded());
}

#[rstest]
#[tokio::test]
async fn classification_ignores_content_type_parameters(mut aggregator: ResponseAggregator) {
    let classifier = Arc::new(RecordingClassifier::default());
    aggregator = aggregator.with_classifier(classifier.clone());
    aggregator.consume(status_with_type("text/html; charset=utf-8"));
    aggregator.consume(chunk(b"<p>hi</p>"));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body().map(ResponseBody::as_str), Some("<p>hi</p>"));
    assert_eq!(*classifier.seen.lock().expect("seen lock"), ["text/html"]);
}

#[rstest]
#[tokio::test]
async fn body_without_content_type_is_text(mut aggregator: ResponseAggregator) {
    aggregator.consume(Fragment::Status(StatusFragment::new(StatusCode::OK)));
    aggregator.consume(chunk(b"plain"));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert!(!response.is_base64_encoded());
}

#[rstest]
#[tokio::test]
async fn chunks_concatenate_in_delivery_order(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(chunk(b"hello"));
    aggregator.consume(chunk(b", world"));
    assert_eq!(aggregator.buffered_len(), 12);
    assert_eq!(aggregator.phase(), Phase::Accumulating);
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body().map(ResponseBody::as_str), Some("hello, world"));
}

#[rstest]
#[tokio::test]
async fn body_grows_past_the_capacity_hint(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("application/octet-stream"));
    let block = vec![0x42_u8; AggregatorConfig::DEFAULT_BUFFER_CAPACITY];
    aggregator.consume(chunk(&block));
    aggregator.consume(chunk(&block));
    assert_eq!(aggregator.buffered_len(), block.len() * 2);
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert!(response.is_base64_encoded());
}

#[rstest]
#[tokio::test]
async fn invalid_utf8_fails_under_strict_decoding(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(chunk(&[b'a', 0xC3]));
    aggregator.consume(Fragment::Terminal);

    assert_eq!(
        aggregator.result().await,
        Err(AggregationError::Encoding(EncodingError::InvalidUtf8 { valid_up_to: 1 }))
    );
}

#[tokio::test]
async fn invalid_utf8_is_replaced_under_lossy_decoding() {
    let config = Arc::new(AggregatorConfig::default().text_decoding(TextDecoding::Lossy));
    let mut aggregator = ResponseAggregator::new(&RequestSource::ApiGateway, config);
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(chunk(&[b'a', 0xC3]));
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("lossy decoding succeeds");
    assert_eq!(response.body().map(ResponseBody::as_str), Some("a\u{FFFD}"));
}

// =============================================================================
// File regions
// =============================================================================

#[rstest]
#[tokio::test]
async fn file_region_is_drained_into_the_body(mut aggregator: ResponseAggregator) {
    let region = SharedRegion::new(b"file-backed body", 4);
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(chunk(b">"));
    aggregator.consume(region.fragment());
    aggregator.consume(Fragment::Terminal);

    assert_eq!(region.transferred(), 16);
    assert_eq!(region.released(), 1);
    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body().map(ResponseBody::as_str), Some(">file-backed body"));
}

#[rstest]
#[tokio::test]
async fn stalled_region_resumes_without_recopying(mut aggregator: ResponseAggregator) {
    let region = SharedRegion::new(b"0123456789", 3).stall_after(2);
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(region.fragment());
    assert_eq!(region.transferred(), 6);
    assert_eq!(aggregator.buffered_len(), 6);

    region.resume();
    aggregator.consume(region.fragment());
    assert_eq!(region.transferred(), 10);
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body().map(ResponseBody::as_str), Some("0123456789"));
    assert_eq!(region.released(), 2);
}

#[rstest]
#[tokio::test]
async fn transferred_region_adds_nothing(mut aggregator: ResponseAggregator) {
    let region = SharedRegion::new(b"abc", 8);
    region.clone().transfer_to(&mut Vec::new(), 0).expect("pre-transfer");
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(region.fragment());
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert!(response.body().is_none());
    assert_eq!(region.released(), 1);
}

/// Region that reports progress but never advances its `transferred` counter.
struct StuckCounterRegion;

impl FileRegion for StuckCounterRegion {
    fn count(&self) -> u64 { 8 }

    fn transferred(&self) -> u64 { 0 }

    fn transfer_to(&mut self, target: &mut dyn Write, _position: u64) -> io::Result<u64> {
        target.write_all(b"xyz")?;
        Ok(3)
    }
}

#[rstest]
#[tokio::test]
async fn region_without_counter_progress_stops_at_its_size(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(Fragment::FileRegion(Box::new(StuckCounterRegion)));
    // three calls of three bytes cover the eight pending bytes
    assert_eq!(aggregator.buffered_len(), 9);
    aggregator.consume(Fragment::Terminal);

    let response = aggregator.result().await.expect("response aggregated");
    assert_eq!(response.body().map(ResponseBody::as_str), Some("xyzxyzxyz"));
}

#[rstest]
#[tokio::test]
async fn region_copy_failure_fails_and_releases(mut aggregator: ResponseAggregator) {
    let region = SharedRegion::new(b"abc", 8).failing();
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(region.fragment());

    assert_eq!(aggregator.phase(), Phase::Failed);
    assert_eq!(region.released(), 1);
    let Err(AggregationError::Encoding(EncodingError::RegionTransfer(source))) =
        aggregator.result().await
    else {
        panic!("expected a region transfer failure");
    };
    assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
}

// =============================================================================
// Release and failure paths
// =============================================================================

#[rstest]
fn fragments_after_resolution_are_released(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("text/plain"));
    aggregator.consume(Fragment::Terminal);

    let released = Arc::new(AtomicBool::new(false));
    aggregator.consume(Fragment::FileRegion(Box::new(ReleaseFlag(Arc::clone(&released)))));
    assert!(released.load(Ordering::SeqCst));

    let late = Bytes::from(vec![7_u8; 32]);
    let observer = late.clone();
    aggregator.consume(Fragment::BodyChunk(late));
    assert!(observer.is_unique());
    assert_eq!(aggregator.buffered_len(), 0);
}

#[rstest]
#[tokio::test]
async fn panicking_classifier_fails_the_aggregation(mut aggregator: ResponseAggregator) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    aggregator = aggregator.with_classifier(Arc::new(move |_: &str| -> bool {
        counter.fetch_add(1, Ordering::SeqCst);
        panic!("classification table unavailable")
    }));
    aggregator.consume(status_with_type("image/png"));
    aggregator.consume(chunk(b"png"));
    aggregator.consume(Fragment::Terminal);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(aggregator.phase(), Phase::Failed);
    assert_eq!(
        aggregator.result().await,
        Err(AggregationError::Panicked("classification table unavailable".into()))
    );
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn failure_is_logged_with_its_kind(mut aggregator: ResponseAggregator) {
    aggregator.consume(Fragment::Terminal);
    aggregator.result().await.expect_err("missing status fails");
    assert!(logs_contain("response aggregation failed"));
    assert!(logs_contain("kind=\"protocol\""));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn completion_is_logged(mut aggregator: ResponseAggregator) {
    aggregator.consume(status_with_type("application/octet-stream"));
    aggregator.consume(chunk(&[1, 2, 3]));
    aggregator.consume(Fragment::Terminal);
    aggregator.result().await.expect("response aggregated");
    assert!(logs_contain("response aggregated"));
    assert!(logs_contain("encoding=\"base64\""));
}
