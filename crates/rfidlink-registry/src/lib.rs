//! Message registry for rfidlink.
//!
//! Maps the two bytes that identify a frame, the command code and the
//! message type, to a constructor and a display name, and turns raw
//! frames into typed messages with [`MessageRegistry::create_from_data`].
//!
//! ```rust
//! use rfidlink_protocol::{GetOutputPowerReply, Message};
//! use rfidlink_registry::MessageRegistry;
//!
//! let registry = MessageRegistry::builtin();
//! let frame = GetOutputPowerReply { power_value: 27 }.serialize(0x00);
//!
//! let decoded = registry.create_from_data(&frame);
//! let reply = decoded.downcast_ref::<GetOutputPowerReply>().unwrap();
//! assert_eq!(reply.power_value, 27);
//! ```

mod registry;

pub use registry::{
    INVALID_PACKET_LENGTH, MALFORMED_PARAMETERS, MessageKey, MessageRegistry,
    UNKNOWN_COMMAND_CODE,
};
