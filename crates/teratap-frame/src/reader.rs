use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::warn;

use crate::codec::{take_frame, Frame, LENGTH_FIELD_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Default cap on buffered bytes: 2 MiB.
pub const DEFAULT_MAX_BUFFER: usize = 2 * 1024 * 1024;

/// Configuration for the frame reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Cap on buffered bytes before the accumulator is thrown away.
    ///
    /// A healthy stream stays far below this; reaching it means framing has
    /// been lost for good and starting over is the only way back.
    pub max_buffer: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}

/// Counters for everything a reader has seen on one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Complete frames handed to the caller.
    pub frames: u64,
    /// Frames dropped because their length fields disagreed.
    pub corrupt_frames: u64,
    /// Bytes thrown away while re-synchronizing.
    pub bytes_discarded: u64,
    /// Times the accumulator hit the cap and was cleared.
    pub buffer_resets: u64,
}

/// Reads complete frames from any `Read` stream.
///
/// Partial reads are handled internally and corrupt spans are skipped with a
/// warning — callers only ever see whole, well-formed frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: ReaderConfig,
    stats: StreamStats,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stats: StreamStats::default(),
        }
    }

    /// Read the next well-formed frame (blocking).
    ///
    /// Corrupt spans are logged, counted and skipped rather than surfaced.
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            loop {
                match take_frame(&mut self.buf) {
                    Ok(Some(frame)) => {
                        self.stats.frames += 1;
                        return Ok(frame);
                    }
                    Ok(None) => break,
                    Err(FrameError::BadTransportLength { total_len }) => {
                        self.stats.corrupt_frames += 1;
                        self.stats.bytes_discarded += LENGTH_FIELD_SIZE as u64;
                        warn!(total_len, "transport length too short, re-synchronizing");
                    }
                    Err(FrameError::LengthMismatch {
                        total_len,
                        inner_len,
                    }) => {
                        let span = LENGTH_FIELD_SIZE + total_len as usize;
                        self.stats.corrupt_frames += 1;
                        self.stats.bytes_discarded += span as u64;
                        warn!(total_len, inner_len, span, "length fields disagree, dropping span");
                    }
                    Err(other) => return Err(other),
                }
            }

            if self.buf.len() > self.config.max_buffer {
                warn!(
                    buffered = self.buf.len(),
                    cap = self.config.max_buffer,
                    "buffer cap exceeded, clearing accumulator"
                );
                self.stats.bytes_discarded += self.buf.len() as u64;
                self.stats.buffer_resets += 1;
                self.buf.clear();
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Counters accumulated so far on this stream.
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}
