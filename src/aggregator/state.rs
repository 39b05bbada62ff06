//! In-progress response owned by one aggregator.
//!
//! `ResponseState` records the status line, copies headers into a
//! [`MultiValueHeaders`] map and accumulates body bytes into a lazily
//! allocated buffer. [`ResponseState::finish`] turns the state into an
//! [`AggregatedResponse`], choosing base64 or text for the body.

use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use http::StatusCode;

use crate::{
    content_type::{ContentTypeClassifier, is_binary},
    encoding::{TextDecoding, decode_text, encode_mime},
    error::{AggregationError, EncodingError, ProtocolViolation},
    fragment::{FileRegion, StatusFragment},
    headers::MultiValueHeaders,
    request::RequestSource,
    response::{AggregatedResponse, ResponseBody},
};

/// Header consulted to classify the body.
pub(crate) const CONTENT_TYPE: &str = "Content-Type";

/// Observable progress of an aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No fragment has been applied.
    Empty,
    /// Status and headers are recorded.
    HeadersSet,
    /// Body bytes are being buffered.
    Accumulating,
    /// The response was produced.
    Finalized,
    /// Processing a fragment failed.
    Failed,
    /// The connection closed before the response completed.
    Closed,
}

impl Phase {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Failed | Self::Closed)
    }
}

#[derive(Debug)]
pub(crate) struct ResponseState {
    status: Option<StatusCode>,
    status_description: Option<String>,
    headers: MultiValueHeaders,
    body: Option<BytesMut>,
    initial_capacity: usize,
}

impl ResponseState {
    pub(crate) fn new(initial_capacity: usize) -> Self {
        Self {
            status: None,
            status_description: None,
            headers: MultiValueHeaders::new(),
            body: None,
            initial_capacity,
        }
    }

    /// Record the status line and replace the headers with those of `fragment`.
    pub(crate) fn apply_status(
        &mut self,
        fragment: &StatusFragment,
        source: RequestSource,
    ) -> Result<(), EncodingError> {
        let mut headers = MultiValueHeaders::new();
        for (name, value) in fragment.headers() {
            let value = std::str::from_utf8(value.as_bytes()).map_err(|_| {
                EncodingError::InvalidHeaderValue {
                    name: name.as_str().to_owned(),
                }
            })?;
            headers.add(name.as_str(), value);
        }

        self.status = Some(fragment.status());
        self.status_description = if source.includes_status_description() {
            Some(fragment.reason_phrase().into_owned())
        } else {
            None
        };
        self.headers = headers;
        Ok(())
    }

    fn buffer(&mut self) -> &mut BytesMut {
        let capacity = self.initial_capacity;
        self.body
            .get_or_insert_with(|| BytesMut::with_capacity(capacity))
    }

    /// Append a body chunk. Empty chunks never allocate the buffer.
    pub(crate) fn append_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.buffer().extend_from_slice(chunk);
    }

    /// Drain the untransferred part of `region` into the buffer.
    ///
    /// Returns the number of bytes copied by this call. Copying stops once
    /// the region is exhausted, the bytes pending on entry have been copied,
    /// or a transfer makes no progress.
    pub(crate) fn append_region(&mut self, region: &mut dyn FileRegion) -> Result<u64, EncodingError> {
        if region.count() == 0 || region.transferred() >= region.count() {
            return Ok(0);
        }

        let pending = region.remaining();
        let mut sink = self.buffer().writer();
        let mut copied = 0_u64;
        // bounded by the bytes pending on entry so a region that never
        // advances `transferred` cannot loop forever
        while copied < pending && region.transferred() < region.count() {
            let position = region.transferred();
            let moved = region
                .transfer_to(&mut sink, position)
                .map_err(|err| EncodingError::RegionTransfer(Arc::new(err)))?;
            if moved == 0 {
                break;
            }
            copied += moved;
        }
        Ok(copied)
    }

    /// Bytes buffered so far.
    pub(crate) fn buffered_len(&self) -> usize { self.body.as_ref().map_or(0, BytesMut::len) }

    pub(crate) fn has_body(&self) -> bool { self.buffered_len() > 0 }

    /// Produce the final response.
    pub(crate) fn finish(
        &mut self,
        classifier: &dyn ContentTypeClassifier,
        text_decoding: TextDecoding,
    ) -> Result<AggregatedResponse, AggregationError> {
        let status = self.status.ok_or(ProtocolViolation::MissingStatus)?;

        let body = match self.body.take().filter(|bytes| !bytes.is_empty()) {
            None => None,
            Some(bytes) if is_binary(classifier, self.headers.get_first(CONTENT_TYPE)) => {
                Some(ResponseBody::Base64(encode_mime(&bytes)))
            }
            Some(bytes) => Some(ResponseBody::Text(decode_text(&bytes, text_decoding)?)),
        };

        Ok(AggregatedResponse::new(
            status.as_u16(),
            self.status_description.take(),
            std::mem::take(&mut self.headers),
            body,
        ))
    }
}
