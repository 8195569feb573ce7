//! Transport layer for rfidlink.
//!
//! Provides the [`DatagramSocket`] trait the client's I/O loops are
//! written against, its UDP implementation [`UdpChannel`], and endpoint
//! validation ([`parse_endpoint`]).
//!
//! Two sockets are used per client:
//!
//! - a **point-to-point** socket on an ephemeral port, for commands and
//!   their replies;
//! - a **discovery** socket on a well-known port with `SO_BROADCAST`,
//!   for device announcements.

#![allow(async_fn_in_trait)]

mod endpoint;
mod error;
mod udp;

pub use endpoint::parse_endpoint;
pub use error::TransportError;
pub use udp::UdpChannel;

use std::net::SocketAddr;

/// A connectionless socket that sends and receives whole datagrams.
pub trait DatagramSocket: Send + Sync + 'static {
    /// The error type for socket operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one datagram to `target`, returning the bytes written.
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<usize, Self::Error>;

    /// Waits for the next datagram, returning its length and sender.
    ///
    /// Datagrams longer than `buf` are truncated.
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Self::Error>;

    /// The local address the socket is bound to.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}
