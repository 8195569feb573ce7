//! Codec trait for payloads that travel as structured text.
//!
//! Most parameters are packed bytes (see [`crate::param`]), but status
//! reports and discovery announcements carry a JSON object instead. The
//! [`Codec`] trait is the seam those payloads go through, so the message
//! types never call `serde_json` directly.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because codecs are held by the long-lived
/// receive loops.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use rfidlink_protocol::{Codec, DeviceAnnouncement, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{"IP":"10.0.0.7","Port":1969,"ID":"R-01"}"#;
/// let announcement: DeviceAnnouncement = codec.decode(bytes).unwrap();
/// assert_eq!(announcement.port, 1969);
/// assert_eq!(announcement.device_type, "");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Beat {
        heartbeat: String,
    }

    #[test]
    fn test_json_roundtrip() {
        let codec = JsonCodec;
        let beat = Beat {
            heartbeat: "alive".into(),
        };
        let bytes = codec.encode(&beat).unwrap();
        assert_eq!(bytes, br#"{"heartbeat":"alive"}"#);
        let back: Beat = codec.decode(&bytes).unwrap();
        assert_eq!(back, beat);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result: Result<Beat, _> = JsonCodec.decode(b"\x01\x02not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
