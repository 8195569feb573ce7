//! Unsolicited status reports.
//!
//! Status frames use the normal binary envelope, but their parameter span
//! is a UTF-8 JSON object. Field names follow the device firmware
//! (`"Ant"`, `"EPC"`, ...). Missing fields decode to their defaults, so a
//! device that omits optional fields still produces a usable report.

use std::any::Any;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::codec::{Codec, JsonCodec};
use crate::message::{KnownMessage, Message, MessageKind};
use crate::types::MessageType;
use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A tag read pushed by the reader in automatic mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCardReading {
    #[serde(rename = "Ant")]
    pub antenna: u8,
    /// Input channels that triggered the read.
    #[serde(rename = "FIN")]
    pub triggered_channels: Vec<u8>,
    /// Pass direction, when the reader has two antennas facing a door.
    #[serde(rename = "Door")]
    pub direction: String,
    #[serde(rename = "IP")]
    pub ip_address: String,
    #[serde(rename = "EPC")]
    pub epc: String,
    #[serde(rename = "TID")]
    pub tid: String,
    #[serde(rename = "USER")]
    pub user_area: String,
    #[serde(rename = "ID")]
    pub device_id: String,
    #[serde(rename = "RSSI")]
    pub rssi: i32,
    #[serde(rename = "TS")]
    pub timestamp: u32,
    #[serde(rename = "TagType")]
    pub tag_type: u8,
    #[serde(rename = "Custom1")]
    pub custom1: String,
    #[serde(rename = "Custom2")]
    pub custom2: String,
    #[serde(rename = "Custom3")]
    pub custom3: String,
    #[serde(rename = "Custom4")]
    pub custom4: String,
    #[serde(rename = "Custom5")]
    pub custom5: String,
    /// Degrees Celsius, for temperature tags.
    #[serde(rename = "Temp")]
    pub temperature: f32,
}

impl AutoCardReading {
    /// The five custom fields in order.
    pub fn custom_fields(&self) -> [&str; 5] {
        [
            &self.custom1,
            &self.custom2,
            &self.custom3,
            &self.custom4,
            &self.custom5,
        ]
    }
}

/// A device announcing itself on the discovery port.
///
/// This is also the payload of [`StatusUdpBroadcast`]; in the default
/// discovery mode the JSON object arrives bare, without a frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceAnnouncement {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(rename = "DeviceType")]
    pub device_type: String,
    #[serde(rename = "ID")]
    pub device_id: String,
    #[serde(rename = "RS485")]
    pub rs485_address: u8,
    #[serde(rename = "RS232Baud")]
    pub rs232_baud: u32,
    #[serde(rename = "RS485Baud")]
    pub rs485_baud: u32,
    /// Internal model number.
    #[serde(rename = "ti")]
    pub internal_model: u32,
}

/// Keep-alive payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heartbeat {
    pub heartbeat: String,
}

// ---------------------------------------------------------------------------
// Status messages
// ---------------------------------------------------------------------------

/// Generates a Status message wrapping a JSON payload.
macro_rules! json_status {
    ($(#[$meta:meta])* $name:ident($payload:ty) = $code:literal, $title:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(pub $payload);

        impl KnownMessage for $name {
            const CMD_CODE: u8 = $code;
            const MESSAGE_TYPE: MessageType = MessageType::Status;
            const NAME: &'static str = $title;
        }

        impl Message for $name {
            fn name(&self) -> &'static str {
                $title
            }

            fn message_type(&self) -> MessageType {
                MessageType::Status
            }

            fn cmd_code(&self) -> u8 {
                $code
            }

            fn serialize_parameters(&self) -> Vec<u8> {
                encode_json(&self.0)
            }

            fn deserialize_parameters(&mut self, params: &[u8]) -> Result<(), ProtocolError> {
                self.0 = decode_json(params)?;
                Ok(())
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl std::ops::Deref for $name {
            type Target = $payload;

            fn deref(&self) -> &$payload {
                &self.0
            }
        }
    };
}

json_status! {
    /// Tag read reported by the reader in automatic mode.
    StatusAutoCardReading(AutoCardReading) = 0x01, "Auto card reading"
}

json_status! {
    /// Framed form of a discovery announcement.
    StatusUdpBroadcast(DeviceAnnouncement) = 0x02, "UDP broadcast"
}

json_status! {
    StatusHeartbeat(Heartbeat) = 0x03, "Heartbeat"
}

/// Descriptors for every status kind.
pub(crate) fn kinds() -> Vec<MessageKind> {
    vec![
        StatusAutoCardReading::kind(),
        StatusUdpBroadcast::kind(),
        StatusHeartbeat::kind(),
    ]
}

fn encode_json<T: Serialize>(value: &T) -> Vec<u8> {
    // Only reachable for non-string map keys, which no payload here has.
    JsonCodec.encode(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "status payload failed to serialize");
        Vec::new()
    })
}

fn decode_json<T: DeserializeOwned + Default>(params: &[u8]) -> Result<T, ProtocolError> {
    if params.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    JsonCodec.decode(params)
}
