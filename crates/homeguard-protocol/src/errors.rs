//! Error types for framing and the blocking client.

use std::io;

use thiserror::Error;

/// Errors raised while reading, decoding, or writing frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A frame grew past the configured limit before its delimiter arrived.
    #[error("frame too large: {size} bytes exceeds {max_size} byte limit")]
    TooLarge {
        /// Bytes buffered when the limit was hit.
        size: usize,
        /// Configured frame limit.
        max_size: usize,
    },

    /// The frame was empty after trimming whitespace.
    #[error("empty frame")]
    Empty,

    /// The frame was not valid JSON of the expected shape.
    #[error("malformed frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// A value could not be serialized into a frame.
    #[error("failed to serialize frame: {0}")]
    Encode(#[source] serde_json::Error),
}

impl FrameError {
    /// Whether the error leaves the stream unusable for further frames.
    ///
    /// Decoding failures concern one frame only; the delimiter has been
    /// consumed, so the next frame can still be read.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::TooLarge { .. })
    }
}

/// Errors surfaced by [`crate::Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting to the server failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Address as given by the caller.
        address: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Configuring the connected socket failed.
    #[error("failed to configure connection: {0}")]
    Configure(#[source] io::Error),

    /// Sending or receiving a frame failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The server closed the connection before replying.
    #[error("server closed the connection")]
    Closed,
}
