//! Unified error type for rfidlink.

use rfidlink_protocol::ProtocolError;
use rfidlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RfidlinkError {
    /// A transport-level error (bind, send, receive, bad endpoint).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (framing, parameters, JSON).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}
