//! Blocking client for the HomeGuard command server.

use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::errors::{ClientError, FrameError};
use super::framing::{FrameReader, FrameWriter};
use super::message::{ClientMessage, WireValue};
use super::reply::Reply;

/// Persistent connection to the server.
///
/// Requests are answered in order, so [`Client::request`] simply writes one
/// frame and reads the next reply frame.
#[derive(Debug)]
pub struct Client {
    reader: FrameReader<TcpStream>,
    writer: FrameWriter<TcpStream>,
}

impl Client {
    /// Connects to the first address `address` resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] if no address accepts the connection.
    pub fn connect(address: impl ToSocketAddrs + ToString) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(&address).map_err(|source| ClientError::Connect {
            address: address.to_string(),
            source,
        })?;
        Self::from_stream(stream)
    }

    /// Connects with an upper bound on the connection attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] if the attempt fails or times out.
    pub fn connect_timeout(address: SocketAddr, timeout: Duration) -> Result<Self, ClientError> {
        let stream =
            TcpStream::connect_timeout(&address, timeout).map_err(|source| ClientError::Connect {
                address: address.to_string(),
                source,
            })?;
        Self::from_stream(stream)
    }

    fn from_stream(stream: TcpStream) -> Result<Self, ClientError> {
        let read_half = stream.try_clone().map_err(ClientError::Configure)?;
        Ok(Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(stream),
        })
    }

    /// Bounds how long [`Client::read_reply`] may block.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configure`] if the socket rejects the option.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.reader
            .get_ref()
            .set_read_timeout(timeout)
            .map_err(ClientError::Configure)
    }

    /// Local address of the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configure`] if the socket cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        self.writer.get_ref().local_addr().map_err(ClientError::Configure)
    }

    /// Sends a frame without waiting for the reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Frame`] if the frame cannot be written.
    pub fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        self.writer.write_frame(message)?;
        Ok(())
    }

    /// Sends raw bytes followed by a delimiter, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Frame`] if the bytes cannot be written.
    pub fn send_raw(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        use std::io::Write;

        let mut stream = self.writer.get_ref();
        stream.write_all(frame).map_err(FrameError::Io)?;
        stream.write_all(b"\n").map_err(FrameError::Io)?;
        stream.flush().map_err(FrameError::Io)?;
        Ok(())
    }

    /// Reads the next reply frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the server hung up and
    /// [`ClientError::Frame`] if the reply is unreadable.
    pub fn read_reply(&mut self) -> Result<Reply, ClientError> {
        let frame = self.reader.read_frame()?.ok_or(ClientError::Closed)?;
        serde_json::from_slice(&frame)
            .map_err(|error| ClientError::Frame(FrameError::Decode(error)))
    }

    /// Sends a frame and waits for its reply.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Client::send`] and [`Client::read_reply`].
    pub fn request(&mut self, message: &ClientMessage) -> Result<Reply, ClientError> {
        self.send(message)?;
        self.read_reply()
    }

    /// Sends a structured command and waits for its reply.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Client::request`].
    pub fn command<I>(&mut self, name: &str, arguments: I) -> Result<Reply, ClientError>
    where
        I: IntoIterator<Item = WireValue>,
    {
        self.request(&ClientMessage::command(name, arguments))
    }

    /// Sends a legacy device command and waits for its reply.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Client::request`].
    pub fn legacy(&mut self, text: &str) -> Result<Reply, ClientError> {
        self.request(&ClientMessage::legacy(text))
    }

    /// Closes both directions of the connection.
    pub fn disconnect(self) {
        // The peer may already be gone; nothing useful to report.
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
    }
}
