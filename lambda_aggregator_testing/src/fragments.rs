//! Fragment builders for tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;
use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use lambda_aggregator::{Fragment, StatusFragment};

/// Shared count of released payloads.
#[derive(Clone, Debug, Default)]
pub struct ReleaseCounter(Arc<AtomicUsize>);

impl ReleaseCounter {
    /// Number of releases observed so far.
    #[must_use]
    pub fn count(&self) -> usize { self.0.load(Ordering::SeqCst) }

    pub(crate) fn record(&self) { self.0.fetch_add(1, Ordering::SeqCst); }
}

struct TrackedOwner {
    data: Vec<u8>,
    releases: ReleaseCounter,
}

impl AsRef<[u8]> for TrackedOwner {
    fn as_ref(&self) -> &[u8] { &self.data }
}

impl Drop for TrackedOwner {
    fn drop(&mut self) { self.releases.record(); }
}

/// Status fragment without headers.
///
/// # Panics
///
/// Panics if `code` is not a valid status code.
#[must_use]
pub fn status(code: u16) -> Fragment {
    Fragment::Status(StatusFragment::new(
        StatusCode::from_u16(code).expect("valid status code"),
    ))
}

/// Status fragment carrying a `Content-Type` header.
///
/// # Panics
///
/// Panics if `code` or `content_type` is invalid.
#[must_use]
pub fn status_with_type(code: u16, content_type: &str) -> Fragment {
    Fragment::Status(
        StatusFragment::new(StatusCode::from_u16(code).expect("valid status code")).with_header(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type).expect("valid content type"),
        ),
    )
}

/// Status fragment declaring a `text/plain` body.
#[must_use]
pub fn text_status(code: u16) -> Fragment { status_with_type(code, "text/plain") }

/// Status fragment declaring an `application/octet-stream` body.
#[must_use]
pub fn binary_status(code: u16) -> Fragment { status_with_type(code, "application/octet-stream") }

/// Body chunk copying `bytes`.
#[must_use]
pub fn chunk(bytes: &[u8]) -> Fragment { Fragment::BodyChunk(Bytes::copy_from_slice(bytes)) }

/// Body chunk whose backing storage bumps `releases` once freed.
#[must_use]
pub fn tracked_chunk(bytes: &[u8], releases: &ReleaseCounter) -> Fragment {
    Fragment::BodyChunk(Bytes::from_owner(TrackedOwner {
        data: bytes.to_vec(),
        releases: releases.clone(),
    }))
}
