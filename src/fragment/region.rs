//! Out-of-band byte ranges that are copied into the body on demand.
//!
//! A [`FileRegion`] describes `count` bytes that live outside memory (usually
//! in a file) together with a `transferred` counter of bytes already moved.
//! Copying always resumes from the counter, so a region drained across several
//! calls never repeats or skips bytes.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

const COPY_CHUNK: usize = 8 * 1024;

/// A byte range whose contents are transferred lazily.
pub trait FileRegion: Send {
    /// Total number of bytes in the region.
    fn count(&self) -> u64;

    /// Number of bytes already transferred.
    fn transferred(&self) -> u64;

    /// Copy bytes starting `position` bytes into the region to `target`.
    ///
    /// Implementations advance [`transferred`](Self::transferred) by exactly
    /// the number of bytes written to `target`, including when an error cuts
    /// the copy short. Returns the number of bytes written by this call; zero
    /// means no progress can currently be made.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while reading the source or writing to
    /// `target`, including [`io::ErrorKind::UnexpectedEof`] when the source
    /// holds fewer bytes than the region declares.
    fn transfer_to(&mut self, target: &mut dyn Write, position: u64) -> io::Result<u64>;

    /// Release the backing resource. Further transfers may fail.
    fn release(&mut self) {}

    /// Bytes still waiting to be transferred.
    fn remaining(&self) -> u64 { self.count().saturating_sub(self.transferred()) }
}

/// Region backed by a byte range of an open file.
#[derive(Debug)]
pub struct FileBackedRegion {
    file: Option<File>,
    offset: u64,
    count: u64,
    transferred: u64,
}

impl FileBackedRegion {
    /// Region covering `count` bytes of `file` starting at `offset`.
    #[must_use]
    pub fn new(file: File, offset: u64, count: u64) -> Self {
        Self {
            file: Some(file),
            offset,
            count,
            transferred: 0,
        }
    }

    /// Region covering the whole file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its length read.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let count = file.metadata()?.len();
        Ok(Self::new(file, 0, count))
    }

    /// Whether [`release`](FileRegion::release) has closed the file.
    #[must_use]
    pub fn is_released(&self) -> bool { self.file.is_none() }
}

impl FileRegion for FileBackedRegion {
    fn count(&self) -> u64 { self.count }

    fn transferred(&self) -> u64 { self.transferred }

    fn transfer_to(&mut self, target: &mut dyn Write, position: u64) -> io::Result<u64> {
        if position >= self.count {
            return Ok(0);
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("file region already released"))?;
        file.seek(SeekFrom::Start(self.offset + position))?;

        let mut chunk = [0_u8; COPY_CHUNK];
        let mut written = 0_u64;
        let mut left = self.count - position;
        while left > 0 {
            let want = usize::try_from(left).map_or(COPY_CHUNK, |left| left.min(COPY_CHUNK));
            let read = match file.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("file ended {left} bytes before the end of the region"),
                    ));
                }
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            target.write_all(&chunk[..read])?;
            let read = read as u64;
            written += read;
            left -= read;
            self.transferred += read;
        }
        Ok(written)
    }

    fn release(&mut self) { self.file = None; }
}
