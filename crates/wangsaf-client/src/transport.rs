//! Transport seam.
//!
//! A [`Connector`] opens the byte stream a session talks over. Production uses
//! [`TcpConnector`]; tests and simulations plug in their own.

use std::{future::Future, io};

use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

/// Bidirectional byte stream a session can own.
pub trait ByteStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> ByteStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Opens transports to a chat server.
pub trait Connector: Clone + Send + Sync + 'static {
    /// Stream produced by a successful connect.
    type Stream: ByteStream;

    /// Open a stream to `host:port`.
    ///
    /// No timeout is applied here; the session bounds the call.
    fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP with Nagle disabled, since records are small and interactive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
