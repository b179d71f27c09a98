//! Serial link over an async byte stream.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::{driver::SerialLink, error::NodeError};

/// [`SerialLink`] over any duplex byte stream.
///
/// Used with TCP in production, `tokio::io::duplex` in tests and turmoil's
/// TCP in simulation. Every byte is flushed as soon as it is sent; the link
/// has no framing of its own.
#[derive(Debug)]
pub struct ByteLink<S> {
    stream: S,
}

impl<S> ByteLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> SerialLink for ByteLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, byte: u8) -> Result<(), NodeError> {
        trace!(byte, "link: send");
        self.stream.write_u8(byte).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<u8, NodeError> {
        match self.stream.read_u8().await {
            Ok(byte) => {
                trace!(byte, "link: receive");
                Ok(byte)
            },
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(NodeError::LinkClosed),
            Err(err) => Err(NodeError::Link(err)),
        }
    }
}
