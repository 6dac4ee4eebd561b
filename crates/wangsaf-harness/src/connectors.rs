//! Transport connectors for simulation.

use std::io;

use wangsaf_client::Connector;

/// Connects over turmoil's simulated network.
///
/// `host` is a turmoil host name such as `"server"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimConnector;

impl Connector for SimConnector {
    type Stream = turmoil::net::TcpStream;

    async fn connect(&self, host: &str, port: u16) -> io::Result<turmoil::net::TcpStream> {
        turmoil::net::TcpStream::connect(format!("{host}:{port}")).await
    }
}

/// Connector whose attempts never complete.
///
/// Models a server that silently drops SYN packets, so only the connect
/// timeout ends the attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct StallConnector;

impl Connector for StallConnector {
    type Stream = tokio::io::DuplexStream;

    async fn connect(&self, host: &str, port: u16) -> io::Result<tokio::io::DuplexStream> {
        tracing::debug!(host, port, "stalling connect");
        std::future::pending().await
    }
}
