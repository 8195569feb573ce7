//! The message registry: `(command code, type)` → factory.
//!
//! Incoming datagrams only say *which* message they are through two
//! bytes, the header (type) and the command code. The registry turns that
//! key back into a typed, fully decoded message.
//!
//! # Registration
//!
//! Registration is first-wins. Registering a key that is already present
//! is ignored, which lets an application install its own kinds before
//! calling [`MessageRegistry::register_builtin`] without the built-ins
//! overriding them.

use std::collections::HashMap;
use std::sync::OnceLock;

use rfidlink_protocol::{
    ErrorMessage, Message, MessageFactory, MessageKind, MessageType, RawFrame, builtin_kinds,
    error_message,
};
use tracing::{debug, trace};

/// Description attached to frames shorter than the minimum.
pub const INVALID_PACKET_LENGTH: &str = "Invalid packet length";
/// Description attached to frames with an unregistered key.
pub const UNKNOWN_COMMAND_CODE: &str = "Unknown Command Code";
/// Description attached to frames whose parameters fail to decode.
pub const MALFORMED_PARAMETERS: &str = "Malformed parameters";

/// Registry key: command code plus message type.
pub type MessageKey = (u8, MessageType);

#[derive(Clone, Copy)]
struct Entry {
    factory: MessageFactory,
    name: &'static str,
}

/// Maps message keys to constructors and display names.
///
/// The registry is filled once at startup and read from the I/O loops
/// afterwards, so it needs no interior locking: share it behind an `Arc`
/// or use [`MessageRegistry::global`].
#[derive(Default)]
pub struct MessageRegistry {
    entries: HashMap<MessageKey, Entry>,
    /// Command-type entries in registration order, for command pickers.
    commands: Vec<(u8, &'static str)>,
}

impl MessageRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the full built-in catalogue.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin();
        registry
    }

    /// Process-wide registry holding the built-in catalogue.
    ///
    /// Initialized on first use.
    pub fn global() -> &'static MessageRegistry {
        static GLOBAL: OnceLock<MessageRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MessageRegistry::builtin)
    }

    /// Registers every built-in kind that is not registered yet.
    pub fn register_builtin(&mut self) {
        for kind in builtin_kinds() {
            self.register_kind(kind);
        }
        debug!(entries = self.entries.len(), "built-in message kinds registered");
    }

    /// Registers a kind from its descriptor.
    pub fn register_kind(&mut self, kind: MessageKind) -> bool {
        self.register(kind.cmd_code, kind.message_type, kind.factory, kind.name)
    }

    /// Adds an entry unless the key is already taken.
    ///
    /// Returns `true` if the entry was inserted. Command-type entries are
    /// also appended to [`MessageRegistry::commands`], once per key.
    pub fn register(
        &mut self,
        cmd_code: u8,
        message_type: MessageType,
        factory: MessageFactory,
        name: &'static str,
    ) -> bool {
        let key = (cmd_code, message_type);
        if self.entries.contains_key(&key) {
            debug!(
                cmd = format_args!("0x{cmd_code:02X}"),
                %message_type,
                name,
                "key already registered; keeping the first entry"
            );
            return false;
        }

        self.entries.insert(key, Entry { factory, name });
        if message_type == MessageType::Command {
            self.commands.push((cmd_code, name));
        }
        true
    }

    /// Builds an empty message for a key, or `None` if it is unknown.
    pub fn create(&self, cmd_code: u8, message_type: MessageType) -> Option<Box<dyn Message>> {
        self.entries
            .get(&(cmd_code, message_type))
            .map(|entry| (entry.factory)())
    }

    /// Decodes a received frame into a typed message.
    ///
    /// This never fails. Anything that cannot be decoded becomes a local
    /// [`ErrorMessage`] with code `0xFF`:
    ///
    /// - fewer than six bytes → "Invalid packet length"
    /// - unregistered key → "Unknown Command Code"
    /// - parameters that do not fit the layout → "Malformed parameters"
    ///
    /// Error frames from the device are not looked up: they always become
    /// an [`ErrorMessage`] whose description comes from the error table.
    pub fn create_from_data(&self, data: &[u8]) -> Box<dyn Message> {
        let raw = match RawFrame::parse(data) {
            Ok(raw) => raw,
            Err(e) => {
                trace!(error = %e, "rejecting short frame");
                return Box::new(ErrorMessage::local(INVALID_PACKET_LENGTH));
            }
        };

        let message_type = raw.message_type();
        let cmd_code = raw.cmd_code();

        if message_type == MessageType::Error {
            return Box::new(ErrorMessage::from_device(cmd_code));
        }

        let Some(mut message) = self.create(cmd_code, message_type) else {
            trace!(
                header = format_args!("0x{:02X}", raw.header()),
                cmd = format_args!("0x{cmd_code:02X}"),
                "no registered kind for frame"
            );
            return Box::new(ErrorMessage::local(UNKNOWN_COMMAND_CODE));
        };

        match message.deserialize(data) {
            Ok(()) => message,
            Err(e) => {
                debug!(
                    name = message.name(),
                    error = %e,
                    "frame parameters did not decode"
                );
                Box::new(ErrorMessage::local(MALFORMED_PARAMETERS))
            }
        }
    }

    /// Display name for a key.
    pub fn name_of(&self, cmd_code: u8, message_type: MessageType) -> Option<&'static str> {
        self.entries
            .get(&(cmd_code, message_type))
            .map(|entry| entry.name)
    }

    pub fn contains(&self, cmd_code: u8, message_type: MessageType) -> bool {
        self.entries.contains_key(&(cmd_code, message_type))
    }

    /// Registered commands as `(command code, name)`, in registration order.
    pub fn commands(&self) -> &[(u8, &'static str)] {
        &self.commands
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Describes a device error code. See [`rfidlink_protocol::error_message`].
    pub fn error_message(&self, code: u8) -> &'static str {
        error_message(code)
    }
}

impl std::fmt::Debug for MessageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRegistry")
            .field("entries", &self.entries.len())
            .field("commands", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rfidlink_protocol::{GetOutputPower, KnownMessage, SetBaudRate};

    use super::*;

    fn baud_rate() -> Box<dyn Message> {
        Box::new(SetBaudRate::default())
    }

    fn output_power() -> Box<dyn Message> {
        Box::new(GetOutputPower::default())
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = MessageRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.commands().is_empty());
        assert!(registry.create(0x01, MessageType::Command).is_none());
    }

    #[test]
    fn test_register_then_create() {
        let mut registry = MessageRegistry::new();
        assert!(registry.register(0x01, MessageType::Command, baud_rate, "Set baud rate"));
        let msg = registry.create(0x01, MessageType::Command).unwrap();
        assert!(msg.is::<SetBaudRate>());
        assert_eq!(registry.name_of(0x01, MessageType::Command), Some("Set baud rate"));
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = MessageRegistry::new();
        assert!(registry.register(0x01, MessageType::Command, baud_rate, "first"));
        assert!(!registry.register(0x01, MessageType::Command, output_power, "second"));

        let msg = registry.create(0x01, MessageType::Command).unwrap();
        assert!(msg.is::<SetBaudRate>());
        assert_eq!(registry.commands(), &[(0x01, "first")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_only_commands_enter_side_table() {
        let mut registry = MessageRegistry::new();
        registry.register(0x10, MessageType::Return, output_power, "Get output power");
        assert!(registry.commands().is_empty());
        registry.register(0x10, MessageType::Command, output_power, "Get output power");
        assert_eq!(registry.commands(), &[(0x10, "Get output power")]);
    }

    #[test]
    fn test_builtin_registers_all_kinds_once() {
        let registry = MessageRegistry::builtin();
        assert_eq!(registry.len(), builtin_kinds().len());
        let expected_commands = builtin_kinds()
            .iter()
            .filter(|k| k.message_type == MessageType::Command)
            .count();
        assert_eq!(registry.commands().len(), expected_commands);
    }

    #[test]
    fn test_register_builtin_twice_does_not_duplicate() {
        let mut registry = MessageRegistry::builtin();
        let before = registry.commands().len();
        registry.register_builtin();
        assert_eq!(registry.commands().len(), before);
    }

    #[test]
    fn test_custom_kind_shadows_builtin() {
        let mut registry = MessageRegistry::new();
        registry.register(
            SetBaudRate::CMD_CODE,
            MessageType::Command,
            output_power,
            "Vendor baud rate",
        );
        registry.register_builtin();
        assert_eq!(
            registry.name_of(SetBaudRate::CMD_CODE, MessageType::Command),
            Some("Vendor baud rate")
        );
    }

    #[test]
    fn test_global_is_shared() {
        let a = MessageRegistry::global();
        let b = MessageRegistry::global();
        assert!(std::ptr::eq(a, b));
        assert!(a.contains(0x05, MessageType::Command));
    }

    #[test]
    fn test_error_message_lookup() {
        let registry = MessageRegistry::new();
        assert!(registry.error_message(0x00).contains("Successful"));
        assert_eq!(registry.error_message(0x07), "Unknown error");
    }
}
