//! Client configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::RfidlinkError;

// ---------------------------------------------------------------------------
// DiscoveryFormat
// ---------------------------------------------------------------------------

/// How devices on this network encode their discovery broadcasts.
///
/// Firmware differs between deployments, and the two forms cannot be told
/// apart reliably from a single datagram, so the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryFormat {
    /// The datagram is a bare JSON object.
    #[default]
    Json,
    /// The datagram is a binary Status frame.
    Framed,
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`ReaderClient`](crate::ReaderClient).
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```rust
/// use rfidlink::ClientConfig;
///
/// let config = ClientConfig::from_json(r#"{ "server_ip": "10.1.0.20" }"#).unwrap();
/// assert_eq!(config.server_ip, "10.1.0.20");
/// assert_eq!(config.server_port, 1969);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Device IP address. Validated when the client is built.
    pub server_ip: String,

    /// Device UDP port.
    pub server_port: u16,

    /// Local address for the point-to-point socket. The port is always
    /// ephemeral.
    pub bind_ip: IpAddr,

    /// Local address for the discovery socket.
    pub discovery_ip: IpAddr,

    /// Well-known port devices broadcast to. 0 picks an ephemeral port.
    pub discovery_port: u16,

    pub discovery_format: DiscoveryFormat,

    /// Maximum number of commands waiting to be sent.
    pub queue_capacity: usize,

    /// How long the send loop waits before checking an empty queue again.
    pub dequeue_interval: Duration,

    /// Receive buffer size in bytes. A datagram that fills the whole buffer
    /// may have been cut short by the OS and is dropped.
    pub recv_buffer_size: usize,

    /// RS-485 address written into every outgoing frame.
    pub device_address: u8,

    /// Also deliver device-reported errors to the command callback, so
    /// code waiting for a reply sees the failure.
    pub forward_device_errors: bool,

    /// Drop received frames whose checksum does not sum to zero.
    pub verify_checksum: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_ip: "192.168.1.100".to_string(),
            server_port: 1969,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            discovery_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            discovery_port: 4444,
            discovery_format: DiscoveryFormat::default(),
            queue_capacity: 10,
            dequeue_interval: Duration::from_millis(100),
            recv_buffer_size: 1500,
            device_address: 0x00,
            forward_device_errors: true,
            verify_checksum: false,
        }
    }
}

impl ClientConfig {
    /// Smallest receive buffer that can accept a minimum-size frame
    /// without filling up.
    pub const MIN_RECV_BUFFER: usize = rfidlink_protocol::MIN_FRAME_LEN + 1;
    /// Largest UDP payload.
    pub const MAX_RECV_BUFFER: usize = 65_535;
    pub const MIN_DEQUEUE_INTERVAL: Duration = Duration::from_millis(1);
    pub const MAX_DEQUEUE_INTERVAL: Duration = Duration::from_secs(5);

    /// Parses a JSON config. Missing fields keep their defaults.
    ///
    /// # Errors
    /// [`RfidlinkError::Config`] if the text is not valid JSON or a field
    /// has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, RfidlinkError> {
        serde_json::from_str(text).map_err(|e| RfidlinkError::Config(e.to_string()))
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically when a client is built. Rules:
    /// - `queue_capacity` at least 1.
    /// - `recv_buffer_size` within [`Self::MIN_RECV_BUFFER`]..=[`Self::MAX_RECV_BUFFER`].
    /// - `dequeue_interval` within [`Self::MIN_DEQUEUE_INTERVAL`]..=[`Self::MAX_DEQUEUE_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.queue_capacity == 0 {
            warn!("queue_capacity is 0; using 1");
            self.queue_capacity = 1;
        }
        let buffer = self
            .recv_buffer_size
            .clamp(Self::MIN_RECV_BUFFER, Self::MAX_RECV_BUFFER);
        if buffer != self.recv_buffer_size {
            warn!(
                requested = self.recv_buffer_size,
                used = buffer,
                "recv_buffer_size out of range; clamping"
            );
            self.recv_buffer_size = buffer;
        }
        let interval = self
            .dequeue_interval
            .clamp(Self::MIN_DEQUEUE_INTERVAL, Self::MAX_DEQUEUE_INTERVAL);
        if interval != self.dequeue_interval {
            warn!(
                requested_ms = self.dequeue_interval.as_millis() as u64,
                used_ms = interval.as_millis() as u64,
                "dequeue_interval out of range; clamping"
            );
            self.dequeue_interval = interval;
        }
        self
    }

    /// Local address for the point-to-point socket.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, 0)
    }

    /// Local address for the discovery socket.
    pub fn discovery_addr(&self) -> SocketAddr {
        SocketAddr::new(self.discovery_ip, self.discovery_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server_port, 1969);
        assert_eq!(config.discovery_port, 4444);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.dequeue_interval, Duration::from_millis(100));
        assert_eq!(config.discovery_format, DiscoveryFormat::Json);
        assert!(config.forward_device_errors);
        assert!(!config.verify_checksum);
    }

    #[test]
    fn test_validated_clamps() {
        let config = ClientConfig {
            queue_capacity: 0,
            recv_buffer_size: 2,
            dequeue_interval: Duration::ZERO,
            ..ClientConfig::default()
        }
        .validated();
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.recv_buffer_size, ClientConfig::MIN_RECV_BUFFER);
        assert_eq!(config.dequeue_interval, ClientConfig::MIN_DEQUEUE_INTERVAL);
    }

    #[test]
    fn test_validated_leaves_good_values() {
        let config = ClientConfig::default();
        assert_eq!(config.clone().validated(), config);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ClientConfig::from_json(r#"{ "discovery_format": "framed", "queue_capacity": 3 }"#)
                .unwrap();
        assert_eq!(config.discovery_format, DiscoveryFormat::Framed);
        assert_eq!(config.queue_capacity, 3);
        assert_eq!(config.server_ip, "192.168.1.100");
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        let err = ClientConfig::from_json(r#"{ "server_port": "high" }"#).unwrap_err();
        assert!(matches!(err, RfidlinkError::Config(_)));
    }

    #[test]
    fn test_addresses() {
        let config = ClientConfig {
            discovery_port: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.bind_addr().port(), 0);
        assert_eq!(config.discovery_addr().to_string(), "0.0.0.0:0");
    }
}
