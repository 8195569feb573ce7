//! Binary frame layout and checksum.
//!
//! Every message on the point-to-point socket travels in the same
//! envelope:
//!
//! ```text
//! +--------+-------+-------+---------+-----+-----------+----------+
//! | Header | LenHi | LenLo | Address | Cmd | Params... | Checksum |
//! +--------+-------+-------+---------+-----+-----------+----------+
//!     0        1       2        3       4     5..n-1       n-1
//! ```
//!
//! The length field is big-endian and counts address, command code,
//! parameters and checksum (`3 + params.len()`). The checksum is chosen
//! so that the byte sum of the whole frame is `0 mod 256`.

use bytes::{Buf, BufMut, BytesMut};

use crate::types::{LENGTH_OVERHEAD, MIN_FRAME_LEN, MessageType, PARAMS_OFFSET};
use crate::ProtocolError;

/// Two's-complement negation of the wrapping byte sum of `bytes`.
///
/// Appending the result to `bytes` makes the total sum zero.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

/// Builds a complete frame around `params`.
///
/// Parameter spans longer than `u16::MAX - 3` cannot be described by the
/// length field; the length saturates and the device will reject the
/// frame. Nothing in the catalogue comes close to that size.
pub fn encode_frame(ty: MessageType, address: u8, cmd: u8, params: &[u8]) -> Vec<u8> {
    let length = u16::try_from(params.len() + LENGTH_OVERHEAD).unwrap_or(u16::MAX);
    let mut frame = BytesMut::with_capacity(MIN_FRAME_LEN + params.len());

    frame.put_u8(ty.as_byte());
    frame.put_u16(length);
    frame.put_u8(address);
    frame.put_u8(cmd);
    frame.put_slice(params);
    let sum = checksum(&frame);
    frame.put_u8(sum);

    frame.to_vec()
}

// ---------------------------------------------------------------------------
// RawFrame
// ---------------------------------------------------------------------------

/// A borrowed, validated-for-length view over a received frame.
///
/// Parsing only checks the minimum length. The checksum and the declared
/// length are exposed for callers that want to be strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    bytes: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Wraps `bytes` if it is long enough to hold a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::FrameTooShort`] for input under
    /// [`MIN_FRAME_LEN`] bytes.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(ProtocolError::FrameTooShort {
                len: bytes.len(),
                min: MIN_FRAME_LEN,
            });
        }
        Ok(Self { bytes })
    }

    /// Raw header byte.
    pub fn header(&self) -> u8 {
        self.bytes[0]
    }

    /// Header byte interpreted as a [`MessageType`].
    pub fn message_type(&self) -> MessageType {
        MessageType::from_byte(self.header())
    }

    /// Value of the big-endian length field.
    pub fn declared_length(&self) -> u16 {
        (&self.bytes[1..3]).get_u16()
    }

    /// RS-485 bus address of the sender or recipient.
    pub fn address(&self) -> u8 {
        self.bytes[3]
    }

    pub fn cmd_code(&self) -> u8 {
        self.bytes[4]
    }

    /// Everything between the command code and the checksum.
    pub fn params(&self) -> &'a [u8] {
        &self.bytes[PARAMS_OFFSET..self.bytes.len() - 1]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// `true` when the byte sum of the whole frame is zero.
    pub fn checksum_ok(&self) -> bool {
        checksum(self.bytes) == 0
    }

    /// `true` when the length field matches the actual frame size.
    pub fn length_ok(&self) -> bool {
        usize::from(self.declared_length()) == self.bytes.len() - LENGTH_OVERHEAD
    }

    /// The full frame.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}
