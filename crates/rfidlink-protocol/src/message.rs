//! The message capability and the generic error message.
//!
//! Every concrete command, reply and status implements [`Message`]. The
//! trait only knows how to turn the *parameters* into bytes and back;
//! wrapping them in a frame is shared by all kinds through the provided
//! [`Message::serialize`] and [`Message::deserialize`] methods.
//!
//! Callers that receive a `dyn Message` from the registry get the
//! concrete type back with [`downcast_ref`](trait.Message.html#method.downcast_ref):
//!
//! ```rust
//! use rfidlink_protocol::{GetOutputPowerReply, Message};
//!
//! let reply: Box<dyn Message> = Box::new(GetOutputPowerReply { power_value: 30 });
//! let power = reply.downcast_ref::<GetOutputPowerReply>().unwrap();
//! assert_eq!(power.power_value, 30);
//! ```

use std::any::Any;
use std::fmt;

use crate::error_codes::error_message;
use crate::frame::{RawFrame, encode_frame};
use crate::types::{LOCAL_ERROR_CODE, MessageType};
use crate::ProtocolError;

/// A typed message that can be framed and unframed.
///
/// `Send + Sync` because decoded messages are shared with callbacks
/// running on the I/O tasks.
pub trait Message: Any + Send + Sync + fmt::Debug {
    /// Human-readable name, e.g. `"Set baud rate"`.
    fn name(&self) -> &'static str;

    fn message_type(&self) -> MessageType;

    fn cmd_code(&self) -> u8;

    /// Packs the parameter fields, without header or checksum.
    fn serialize_parameters(&self) -> Vec<u8>;

    /// Fills the parameter fields from a parameter span.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the span is too short for a
    /// fixed-width field or carries an undecodable JSON payload.
    fn deserialize_parameters(&mut self, params: &[u8]) -> Result<(), ProtocolError>;

    /// Type-erased view used for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Produces the complete wire frame for this message.
    fn serialize(&self, address: u8) -> Vec<u8> {
        encode_frame(
            self.message_type(),
            address,
            self.cmd_code(),
            &self.serialize_parameters(),
        )
    }

    /// Fills this message from a complete wire frame.
    ///
    /// # Errors
    /// [`ProtocolError::FrameTooShort`] for input under six bytes, or
    /// whatever [`Message::deserialize_parameters`] reports.
    fn deserialize(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        let raw = RawFrame::parse(frame)?;
        self.deserialize_parameters(raw.params())
    }
}

impl dyn Message {
    /// Returns `true` if the concrete type is `T`.
    pub fn is<T: Message>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Returns the concrete message if it is a `T`.
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

// ---------------------------------------------------------------------------
// Static descriptors
// ---------------------------------------------------------------------------

/// Constructor stored in the registry: builds an empty message.
pub type MessageFactory = fn() -> Box<dyn Message>;

/// A message kind with its key and name fixed at compile time.
///
/// Implemented by every type in the catalogue. [`KnownMessage::kind`]
/// packages the constants with a factory so the registry can be filled
/// without naming each type twice.
pub trait KnownMessage: Message + Default {
    const CMD_CODE: u8;
    const MESSAGE_TYPE: MessageType;
    const NAME: &'static str;

    /// Registry descriptor for this type.
    fn kind() -> MessageKind {
        MessageKind {
            cmd_code: Self::CMD_CODE,
            message_type: Self::MESSAGE_TYPE,
            name: Self::NAME,
            factory: new_boxed::<Self>,
        }
    }
}

fn new_boxed<M: Message + Default>() -> Box<dyn Message> {
    Box::new(M::default())
}

/// Everything the registry needs to know about one message kind.
#[derive(Clone, Copy)]
pub struct MessageKind {
    pub cmd_code: u8,
    pub message_type: MessageType,
    pub name: &'static str,
    pub factory: MessageFactory,
}

impl fmt::Debug for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageKind")
            .field("cmd_code", &format_args!("0x{:02X}", self.cmd_code))
            .field("message_type", &self.message_type)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ErrorMessage
// ---------------------------------------------------------------------------

/// Where an [`ErrorMessage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorOrigin {
    /// The device sent an Error frame.
    #[default]
    Device,
    /// The host could not make sense of what it received.
    Local,
}

/// The single message type used for every Error frame.
///
/// Error responses are not registered per command: the command code byte
/// of an Error frame holds the error code itself, and the text comes from
/// the static error table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub code: u8,
    pub description: String,
    pub origin: ErrorOrigin,
}

impl ErrorMessage {
    /// An error reported by the device, described from the error table.
    pub fn from_device(code: u8) -> Self {
        Self {
            code,
            description: error_message(code).to_owned(),
            origin: ErrorOrigin::Device,
        }
    }

    /// An error synthesized on this side, always with code `0xFF`.
    pub fn local(description: impl Into<String>) -> Self {
        Self {
            code: LOCAL_ERROR_CODE,
            description: description.into(),
            origin: ErrorOrigin::Local,
        }
    }

    pub fn is_local(&self) -> bool {
        self.origin == ErrorOrigin::Local
    }
}

impl Default for ErrorMessage {
    fn default() -> Self {
        Self::from_device(0x00)
    }
}

impl Message for ErrorMessage {
    fn name(&self) -> &'static str {
        "Error"
    }

    fn message_type(&self) -> MessageType {
        MessageType::Error
    }

    fn cmd_code(&self) -> u8 {
        self.code
    }

    fn serialize_parameters(&self) -> Vec<u8> {
        Vec::new()
    }

    fn deserialize_parameters(&mut self, _params: &[u8]) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn deserialize(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        let raw = RawFrame::parse(frame)?;
        *self = Self::from_device(raw.cmd_code());
        Ok(())
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}: {}", self.code, self.description)
    }
}
