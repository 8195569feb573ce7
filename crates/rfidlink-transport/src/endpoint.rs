//! Validation of user-supplied endpoints.

use std::net::{IpAddr, SocketAddr};

use crate::TransportError;

/// Parses an IP address string and a port into a socket address.
///
/// The port is taken as `u32` so that out-of-range input from a text
/// field or config file is reported rather than silently truncated.
///
/// # Errors
/// - [`TransportError::InvalidAddress`] if `ip` is not an IPv4/IPv6
///   literal (host names are not resolved).
/// - [`TransportError::InvalidPort`] if `port` is 0 or above 65535.
pub fn parse_endpoint(ip: &str, port: u32) -> Result<SocketAddr, TransportError> {
    let addr: IpAddr = ip
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidAddress(ip.to_owned()))?;
    let port = u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or(TransportError::InvalidPort(port))?;
    Ok(SocketAddr::new(addr, port))
}
