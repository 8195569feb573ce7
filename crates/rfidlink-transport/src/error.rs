use std::net::SocketAddr;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding a socket to a local address failed.
    #[error("bind to {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Setting a socket option (e.g. `SO_BROADCAST`) failed.
    #[error("socket option failed: {0}")]
    SocketOption(#[source] std::io::Error),

    /// Sending a datagram failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a datagram failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The address string is not an IPv4 or IPv6 address.
    #[error("invalid IP address: {0:?}")]
    InvalidAddress(String),

    /// The port is outside 1–65535.
    #[error("invalid port: {0}")]
    InvalidPort(u32),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// `true` for receive errors caused by an unreachable peer.
    ///
    /// On most platforms an ICMP "port unreachable" in answer to an
    /// earlier send surfaces as `ConnectionRefused` or `ConnectionReset`
    /// on the next receive. The socket itself is still usable.
    pub fn is_peer_unreachable(&self) -> bool {
        match self {
            Self::ReceiveFailed(e) | Self::SendFailed(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}
