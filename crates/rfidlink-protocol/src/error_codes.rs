//! Device error-code descriptions.
//!
//! An Error frame carries its code in the command byte. This table turns
//! that byte into text for logs and user-facing error reports. Codes the
//! table does not list, including the reserved gaps, read as
//! `"Unknown error"`.

/// Text returned for codes without an entry.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Looks up the English description of a device error code.
pub const fn error_message(code: u8) -> &'static str {
    match code {
        0x00 => "Successful operation",
        0x01 => "Invalid command parameter",
        0x02 => "Command code not supported",
        0x03 => "Parameter length mismatch",
        0x04 => "Checksum error",
        0x05 => "Device busy",
        0x06 => "Operation timed out",
        // 0x07 reserved
        0x08 => "Flash write failed",
        0x09 => "Flash read failed",
        0x0A => "Invalid antenna number",
        0x0B => "Antenna not connected",
        0x0C => "Output power out of range",
        0x0D => "Invalid frequency region",
        0x0E => "Frequency point out of range",
        0x0F => "Invalid baud rate code",
        0x10 => "Invalid RS485 address",
        0x11 => "Invalid relay number",
        0x12 => "Relay operation failed",
        0x13 => "Invalid buzzer state",
        0x14 => "Invalid card reading mode",
        0x15 => "Invalid reader time",
        0x16 => "Real-time clock not available",
        0x17 => "Invalid IP address",
        0x18 => "Invalid subnet mask",
        0x19 => "Invalid gateway address",
        0x1A => "Invalid network port",
        0x1B => "Invalid MAC address",
        0x1C => "Network interface not available",
        0x1D => "Network configuration failed",
        0x1E => "Invalid reader ID",
        0x1F => "Invalid reader name",
        0x20 => "No tag in field",
        0x21 => "Tag read failed",
        0x22 => "Tag write failed",
        0x23 => "Tag lock failed",
        0x24 => "Tag kill failed",
        0x25 => "Tag memory overrun",
        0x26 => "Tag memory locked",
        0x27 => "Tag access password error",
        0x28 => "Tag kill password error",
        0x29 => "Tag insufficient power",
        0x2A => "Tag response CRC error",
        0x2B => "Tag not singulated",
        0x2C => "Multiple tags in field",
        0x2D => "Invalid memory bank",
        0x2E => "Invalid word address",
        0x2F => "Invalid word count",
        0x30 => "Invalid tag filter",
        0x31 => "Tag filter mask too long",
        0x32 => "Invalid tag alarm setting",
        0x33 => "Invalid tag type",
        0x34 => "Tag type not supported",
        0x35 => "Temperature tag read failed",
        0x36 => "ISO18000-6B operation failed",
        0x37 => "ISO18000-6C operation failed",
        0x38 => "Invalid automatic reporting field",
        0x39 => "Invalid automatic reporting content",
        0x3A => "Invalid automatic reporting condition",
        0x3B => "Invalid reporting interface",
        0x3C => "Invalid Wiegand parameter",
        0x3D => "Invalid trigger number",
        0x3E => "Invalid trigger condition",
        0x3F => "Invalid heartbeat parameter",
        0x40 => "Heartbeat data too long",
        0x41 => "Invalid polling antenna list",
        0x42 => "Invalid relay purpose",
        0x43 => "Invalid GPI number",
        0x44 => "Invalid custom field number",
        0x45 => "Custom content too long",
        // 0x46..=0x4F reserved
        0x50 => "WIFI module not present",
        0x51 => "WIFI connection failed",
        0x52 => "Invalid WIFI mode",
        0x53 => "SSID too long",
        0x54 => "WIFI password too long",
        0x55 => "WIFI authentication failed",
        0x56 => "4G module not present",
        0x57 => "4G network registration failed",
        0x58 => "Invalid 4G transmission mode",
        0x59 => "Remote address too long",
        0x5A => "Super network port not available",
        0x5B => "Invalid super network mode",
        0x5C => "Remote server unreachable",
        0x5D => "Remote connection closed",
        // 0x5E..=0x6F reserved
        0x70 => "HF module not present",
        0x71 => "ISO15693 tag not found",
        0x72 => "ISO15693 read failed",
        0x73 => "ISO15693 write failed",
        0x74 => "ISO15693 block locked",
        0x75 => "ISO15693 block out of range",
        0x76 => "ISO14443A tag not found",
        0x77 => "ISO14443A read failed",
        0x78 => "ISO14443A write failed",
        // 0x79..=0xFD reserved
        0xFE => "Command rejected in current mode",
        0xFF => "Invalid packet",
        _ => UNKNOWN_ERROR,
    }
}
