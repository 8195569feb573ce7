//! Core protocol types: the message type byte and frame constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Smallest legal frame: header, two length bytes, address, command code
/// and checksum, with no parameters.
pub const MIN_FRAME_LEN: usize = 6;

/// Bytes counted by the length field on top of the parameters
/// (address + command code + checksum).
pub const LENGTH_OVERHEAD: usize = 3;

/// Offset of the first parameter byte inside a frame.
pub const PARAMS_OFFSET: usize = 5;

/// Error code used for every failure detected locally rather than
/// reported by the device.
pub const LOCAL_ERROR_CODE: u8 = 0xFF;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The category of a message, carried in the frame's header byte.
///
/// Together with the command code it forms the registry key: the same
/// command code means different things as a `Command` (host → device)
/// and as a `Return` (device → host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum MessageType {
    /// Placeholder for an instance that has not been filled in yet.
    #[default]
    Unknown,
    /// A request sent from the host to the device.
    Command,
    /// The device's answer to a command.
    Return,
    /// An unsolicited report pushed by the device.
    Status,
    /// The device refused or failed a command.
    Error,
}

impl MessageType {
    /// Returns the header byte for this type.
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Unknown => 0x00,
            Self::Command => 0x40,
            Self::Return => 0xF0,
            Self::Status => 0xF1,
            Self::Error => 0xF4,
        }
    }

    /// Maps a header byte to a type, treating anything unrecognised as
    /// [`MessageType::Unknown`].
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x40 => Self::Command,
            0xF0 => Self::Return,
            0xF1 => Self::Status,
            0xF4 => Self::Error,
            _ => Self::Unknown,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    /// Strict conversion: only the four wire values and `0x00` are accepted.
    fn try_from(byte: u8) -> Result<Self, ProtocolError> {
        match Self::from_byte(byte) {
            Self::Unknown if byte != 0x00 => Err(ProtocolError::UnknownMessageType(byte)),
            ty => Ok(ty),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(ty: MessageType) -> Self {
        ty.as_byte()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Command => write!(f, "Command"),
            Self::Return => write!(f, "Return"),
            Self::Status => write!(f, "Status"),
            Self::Error => write!(f, "Error"),
        }
    }
}
