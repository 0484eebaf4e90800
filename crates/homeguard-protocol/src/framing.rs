//! Newline-delimited JSON framing.

use std::io::{self, BufRead, BufReader, Read, Write};

use serde::Serialize;

use super::errors::FrameError;

/// Maximum size of a single frame in bytes, excluding the delimiter.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Reads delimited frames from a byte stream.
///
/// The reader keeps its buffer between calls, so bytes belonging to the next
/// frame are never lost when two frames arrive in one segment.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: BufReader<R>,
    max_size: usize,
}

impl<R: Read> FrameReader<R> {
    /// Wraps a stream using [`MAX_FRAME_BYTES`] as the frame limit.
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_FRAME_BYTES)
    }

    /// Wraps a stream with a custom frame limit.
    pub fn with_limit(inner: R, max_size: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            max_size,
        }
    }

    /// Reads the next frame without its delimiter.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly between
    /// frames. Trailing bytes without a delimiter at end of stream are
    /// returned as a final frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Io`] if the stream fails and
    /// [`FrameError::TooLarge`] if the frame exceeds the limit.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let mut frame = Vec::new();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(FrameError::Io(error)),
            };

            if available.is_empty() {
                return Ok(if frame.is_empty() { None } else { Some(frame) });
            }

            if let Some(newline) = available.iter().position(|byte| *byte == b'\n') {
                let (line, _) = available.split_at(newline);
                frame.extend_from_slice(line);
                self.reader.consume(newline + 1);
                self.enforce_limit(frame.len())?;
                return Ok(Some(frame));
            }

            let consumed = available.len();
            frame.extend_from_slice(available);
            self.reader.consume(consumed);
            self.enforce_limit(frame.len())?;
        }
    }

    /// Returns the wrapped stream.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    fn enforce_limit(&self, size: usize) -> Result<(), FrameError> {
        if size > self.max_size {
            return Err(FrameError::TooLarge {
                size,
                max_size: self.max_size,
            });
        }
        Ok(())
    }
}

/// Writes values as delimited JSON frames.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serializes `value` as one frame and flushes the stream.
    ///
    /// The frame is assembled in memory first so a serialization failure never
    /// leaves a partial line on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Encode`] if serialization fails and
    /// [`FrameError::Io`] if writing fails.
    pub fn write_frame<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), FrameError> {
        let mut line = serde_json::to_vec(value).map_err(FrameError::Encode)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the wrapped stream.
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

/// Trims surrounding ASCII whitespace, including a stray `\r`.
pub(crate) fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(start, |pos| pos + 1);
    bytes.get(start..end).unwrap_or_default()
}
