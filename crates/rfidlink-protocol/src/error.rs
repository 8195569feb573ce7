//! Error types for the protocol layer.
//!
//! Everything that can go wrong while turning bytes into messages (or
//! messages into bytes) ends up here. Network failures live in
//! `rfidlink-transport`; this crate never touches a socket.

/// Errors that can occur while framing or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The input is shorter than the smallest possible frame.
    #[error("frame too short: {len} bytes (minimum {min})")]
    FrameTooShort {
        /// Number of bytes received.
        len: usize,
        /// Minimum frame length.
        min: usize,
    },

    /// The header byte does not name a known message type.
    #[error("unknown message type byte 0x{0:02X}")]
    UnknownMessageType(u8),

    /// A parameter field ran past the end of the parameter span.
    ///
    /// Raised by fixed-width fields (`u16`, `[u8; 4]`, ...) and by
    /// length-prefixed fields whose prefix promises more than is left.
    #[error("truncated parameters: needed {needed} byte(s), {remaining} remaining")]
    Truncated {
        /// Bytes the field required.
        needed: usize,
        /// Bytes that were left in the span.
        remaining: usize,
    },

    /// Serialization of a JSON payload failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization of a JSON payload failed.
    ///
    /// Common causes: the device sent non-JSON text in a status frame,
    /// or a field carries the wrong JSON type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is well formed but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_too_short_display() {
        let err = ProtocolError::FrameTooShort { len: 3, min: 6 };
        assert_eq!(err.to_string(), "frame too short: 3 bytes (minimum 6)");
    }

    #[test]
    fn test_unknown_message_type_display_is_hex() {
        let err = ProtocolError::UnknownMessageType(0x7A);
        assert!(err.to_string().contains("0x7A"));
    }

    #[test]
    fn test_truncated_display() {
        let err = ProtocolError::Truncated {
            needed: 2,
            remaining: 1,
        };
        assert!(err.to_string().contains("needed 2"));
    }
}
