//! UDP socket implementation using `tokio::net::UdpSocket`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::{DatagramSocket, TransportError};

/// A bound UDP socket that can be shared between tasks.
///
/// Cloning is cheap and every clone refers to the same OS socket, which
/// is closed when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct UdpChannel {
    socket: Arc<UdpSocket>,
}

impl UdpChannel {
    /// Binds a point-to-point socket. Use port 0 for an ephemeral port.
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        tracing::debug!(local = ?socket.local_addr().ok(), "UDP socket bound");
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Binds a socket for receiving broadcasts and enables `SO_BROADCAST`.
    pub async fn bind_broadcast(addr: SocketAddr) -> Result<Self, TransportError> {
        let channel = Self::bind(addr).await?;
        channel
            .socket
            .set_broadcast(true)
            .map_err(TransportError::SocketOption)?;
        Ok(channel)
    }

    /// The address the OS actually bound, including the chosen port.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(TransportError::SocketOption)
    }

    pub fn is_broadcast(&self) -> bool {
        self.socket.broadcast().unwrap_or(false)
    }
}

impl DatagramSocket for UdpChannel {
    type Error = TransportError;

    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<usize, Self::Error> {
        self.socket
            .send_to(data, target)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Self::Error> {
        self.socket
            .recv_from(buf)
            .await
            .map_err(TransportError::ReceiveFailed)
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        UdpChannel::local_addr(self)
    }
}
