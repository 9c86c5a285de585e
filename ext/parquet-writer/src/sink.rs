//! Output destinations
//!
//! The file format is offset addressed, so every sink tracks how many bytes
//! it has accepted. Offsets recorded in the footer are taken from
//! [`Sink::position`] immediately before each page is appended.

use crate::Result;
use bytes::Bytes;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only byte destination
pub trait Sink {
    /// Append all of `bytes`, or fail with `SinkWrite`
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of bytes appended so far
    fn position(&self) -> u64;

    /// Push buffered bytes to the underlying destination
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).append(bytes)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Plain byte vector sink
///
/// `Vec::append` is inherent and shadows [`Sink::append`] in method call
/// syntax, so call it as `Sink::append(&mut vec, bytes)`.
impl Sink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.len() as u64
    }
}

/// Growable in-memory sink
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    buffer: Vec<u8>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Freeze the written bytes into a cheaply clonable buffer
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buffer)
    }
}

impl Sink for BufferSink {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.buffer.len() as u64
    }
}

/// Adapter for any `std::io::Write` destination
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Buffered file destination
#[derive(Debug)]
pub struct FileSink {
    inner: WriteSink<BufWriter<File>>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: File) -> Self {
        Self {
            inner: WriteSink::new(BufWriter::new(file)),
        }
    }

    /// Flush buffered bytes and return the file handle
    pub fn into_file(self) -> Result<File> {
        self.inner
            .into_inner()
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

impl Sink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.append(bytes)
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().get_ref().sync_data()?;
        Ok(())
    }
}
