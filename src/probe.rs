use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    /// Connection refused: nothing listens, safe to bind.
    Free,
    /// Something accepted the connection.
    InUse,
    /// Timed out, unreachable, or any other failure.
    Unknown,
}

impl PortState {
    pub fn is_free(self) -> bool {
        self == PortState::Free
    }
}

/// Connects to `addr` and closes the connection straight away.
pub async fn probe_port(addr: SocketAddr, wait: Duration) -> PortState {
    match timeout(wait, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => PortState::InUse,
        Ok(Err(err)) if err.kind() == ErrorKind::ConnectionRefused => PortState::Free,
        Ok(Err(err)) => {
            tracing::debug!(%addr, error = %err, "port probe failed");
            PortState::Unknown
        }
        Err(_) => {
            tracing::debug!(%addr, ?wait, "port probe timed out");
            PortState::Unknown
        }
    }
}
