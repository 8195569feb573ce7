//! Wire protocol for rfidlink.
//!
//! This crate defines how the host and an RFID reader talk to each other:
//!
//! - **Frames** ([`encode_frame`], [`RawFrame`], [`checksum`]): the binary
//!   envelope every message travels in.
//! - **Messages** ([`Message`], [`ErrorMessage`]): typed commands,
//!   replies, statuses and errors, plus the full command catalogue.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): JSON payloads used by
//!   status reports and discovery announcements.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between raw datagrams and the application. It
//! never opens a socket and does not know which message kinds are
//! registered; that lookup lives in `rfidlink-registry`.
//!
//! ```text
//! Transport (datagrams) → Protocol (frames, messages) → Registry (lookup)
//! ```

mod codec;
mod commands;
mod error;
mod error_codes;
mod frame;
mod message;
pub mod param;
mod statuses;
mod types;

pub use codec::{Codec, JsonCodec};
pub use commands::*;
pub use error::ProtocolError;
pub use error_codes::{UNKNOWN_ERROR, error_message};
pub use frame::{RawFrame, checksum, encode_frame};
pub use message::{
    ErrorMessage, ErrorOrigin, KnownMessage, Message, MessageFactory, MessageKind,
};
pub use param::{ShortBytes, ShortString};
pub use statuses::{
    AutoCardReading, DeviceAnnouncement, Heartbeat, StatusAutoCardReading, StatusHeartbeat,
    StatusUdpBroadcast,
};
pub use types::{LOCAL_ERROR_CODE, MIN_FRAME_LEN, MessageType};

/// Descriptors for every built-in command, reply and status.
///
/// The registry registers these in order; the generic [`ErrorMessage`]
/// is not part of the list because Error frames bypass the lookup.
pub fn builtin_kinds() -> Vec<MessageKind> {
    let mut kinds = commands::kinds();
    kinds.extend(statuses::kinds());
    kinds
}
