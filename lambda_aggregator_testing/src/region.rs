//! In-memory [`FileRegion`] with scripted transfer behaviour.

use std::io::{self, Write};

use bytes::Bytes;
use lambda_aggregator::{FileRegion, Fragment};

use crate::fragments::ReleaseCounter;

/// File region backed by a byte buffer.
///
/// Transfers can be capped per call, stalled after a number of calls or made
/// to fail, which lets tests exercise partial and failed copies without
/// touching the filesystem.
#[derive(Debug)]
pub struct MemoryRegion {
    data: Bytes,
    transferred: u64,
    per_call: usize,
    stall_after: Option<usize>,
    failure: Option<io::ErrorKind>,
    calls: usize,
    releases: ReleaseCounter,
}

impl MemoryRegion {
    /// Region spanning all of `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            transferred: 0,
            per_call: usize::MAX,
            stall_after: None,
            failure: None,
            calls: 0,
            releases: ReleaseCounter::default(),
        }
    }

    /// Move at most `bytes` per transfer call.
    #[must_use]
    pub fn per_call(mut self, bytes: usize) -> Self {
        self.per_call = bytes.max(1);
        self
    }

    /// Report zero progress once `calls` transfers have happened.
    #[must_use]
    pub fn stall_after(mut self, calls: usize) -> Self {
        self.stall_after = Some(calls);
        self
    }

    /// Fail every transfer with an error of `kind`.
    #[must_use]
    pub fn failing(mut self, kind: io::ErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    /// Mark the first `bytes` as already transferred.
    #[must_use]
    pub fn already_transferred(mut self, bytes: u64) -> Self {
        self.transferred = bytes.min(self.count());
        self
    }

    /// Counter incremented each time this region is released.
    #[must_use]
    pub fn release_counter(&self) -> ReleaseCounter { self.releases.clone() }

    /// Wrap the region in a [`Fragment::FileRegion`].
    #[must_use]
    pub fn into_fragment(self) -> Fragment { Fragment::FileRegion(Box::new(self)) }
}

impl FileRegion for MemoryRegion {
    fn count(&self) -> u64 { self.data.len() as u64 }

    fn transferred(&self) -> u64 { self.transferred }

    fn transfer_to(&mut self, target: &mut dyn Write, position: u64) -> io::Result<u64> {
        if let Some(kind) = self.failure {
            return Err(io::Error::new(kind, "scripted region failure"));
        }
        self.calls += 1;
        if self.stall_after.is_some_and(|limit| self.calls > limit) {
            return Ok(0);
        }
        let start = usize::try_from(position)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position out of range"))?;
        let Some(remaining) = self.data.get(start..) else {
            return Ok(0);
        };
        let slice = &remaining[..remaining.len().min(self.per_call)];
        target.write_all(slice)?;
        let moved = slice.len() as u64;
        self.transferred += moved;
        Ok(moved)
    }

    fn release(&mut self) { self.releases.record(); }
}
