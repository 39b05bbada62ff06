//! Response fragments emitted by a streaming HTTP producer.
//!
//! A streamed response arrives as a status line with headers, any number of
//! body chunks or out-of-band file regions, and a terminal marker. This module
//! models those pieces as the [`Fragment`] sum type and collects the helpers
//! that let the aggregator own a fragment only for the duration of one call.

pub mod region;
pub mod release;
pub mod status;

use bytes::Bytes;

pub use region::{FileBackedRegion, FileRegion};
pub use release::ReleaseGuard;
pub use status::StatusFragment;

/// One unit of a streamed response.
pub enum Fragment {
    /// Status line and headers.
    Status(StatusFragment),
    /// Part of the response body. Empty chunks are permitted.
    BodyChunk(Bytes),
    /// Body bytes not yet resident in memory.
    FileRegion(Box<dyn FileRegion>),
    /// End of the response.
    Terminal,
}

impl Fragment {
    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::BodyChunk(_) => "body_chunk",
            Self::FileRegion(_) => "file_region",
            Self::Terminal => "terminal",
        }
    }

    /// Relinquish any pooled or externally owned payload.
    ///
    /// Body chunks drop their buffer handle and file regions are told to
    /// release their backing resource. Calling this more than once is
    /// harmless.
    pub fn release(&mut self) {
        match self {
            Self::BodyChunk(chunk) => drop(std::mem::take(chunk)),
            Self::FileRegion(region) => region.release(),
            Self::Status(_) | Self::Terminal => {}
        }
    }

    /// Split a complete response into status, body and terminal fragments.
    ///
    /// The body chunk is omitted when the body is empty.
    #[must_use]
    pub fn from_response<B: Into<Bytes>>(response: http::Response<B>) -> Vec<Self> {
        let (parts, body) = response.into_parts();
        let body = body.into();
        let mut fragments = Vec::with_capacity(3);
        fragments.push(Self::Status(StatusFragment::from(parts)));
        if !body.is_empty() {
            fragments.push(Self::BodyChunk(body));
        }
        fragments.push(Self::Terminal);
        fragments
    }
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(status) => f.debug_tuple("Status").field(status).finish(),
            Self::BodyChunk(chunk) => f.debug_tuple("BodyChunk").field(&chunk.len()).finish(),
            Self::FileRegion(region) => f
                .debug_struct("FileRegion")
                .field("count", &region.count())
                .field("transferred", &region.transferred())
                .finish(),
            Self::Terminal => f.write_str("Terminal"),
        }
    }
}

impl From<StatusFragment> for Fragment {
    fn from(status: StatusFragment) -> Self { Self::Status(status) }
}

impl From<Bytes> for Fragment {
    fn from(chunk: Bytes) -> Self { Self::BodyChunk(chunk) }
}
