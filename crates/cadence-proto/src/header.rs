//! Fixed-size binary frame header.
//!
//! All multi-byte fields are big-endian. Layout (12 bytes):
//!
//! ```text
//! offset  size  field
//! 0       4     magic        0x43414445 ("CADE")
//! 4       1     version      currently 1
//! 5       1     opcode       see [`Opcode`]
//! 6       2     reserved     must be zero
//! 8       4     payload_len  CBOR payload length in bytes
//! ```

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::errors::FrameError;
use crate::opcodes::Opcode;

/// Wire header preceding every frame's payload.
///
/// The struct is its own wire representation: `zerocopy` verifies at compile
/// time that the layout has no padding, so [`Self::as_bytes`] and
/// [`Self::parse`] are allocation-free.
#[derive(
    FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Clone, Copy, Debug, PartialEq, Eq,
)]
#[repr(C)]
pub struct FrameHeader {
    magic: U32,
    version: u8,
    opcode: u8,
    reserved: [u8; 2],
    payload_len: U32,
}

impl FrameHeader {
    /// Serialized header size in bytes.
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Magic number identifying a Cadence frame ("CADE").
    pub const MAGIC: u32 = 0x4341_4445;

    /// Protocol version this implementation speaks.
    pub const VERSION: u8 = 1;

    /// Build a header for a frame with the given opcode and payload length.
    pub fn new(opcode: Opcode, payload_len: u32) -> Self {
        Self {
            magic: U32::new(Self::MAGIC),
            version: Self::VERSION,
            opcode: opcode.to_u8(),
            reserved: [0; 2],
            payload_len: U32::new(payload_len),
        }
    }

    /// Parse a header from the front of `bytes`, validating magic and
    /// version. The opcode byte is not validated here; callers that need a
    /// known opcode use [`Self::opcode_enum`].
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        let (header, _rest) = Self::read_from_prefix(bytes).map_err(|_| {
            FrameError::TruncatedHeader { expected: Self::SIZE, actual: bytes.len() }
        })?;

        if header.magic.get() != Self::MAGIC {
            return Err(FrameError::BadMagic(header.magic.get()));
        }
        if header.version != Self::VERSION {
            return Err(FrameError::UnsupportedVersion(header.version));
        }

        Ok(header)
    }

    /// Raw opcode byte.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Opcode as an enum, `None` if the byte names no known frame type.
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    /// Declared payload length in bytes.
    pub fn payload_len(&self) -> u32 {
        self.payload_len.get()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use zerocopy::IntoBytes;

    use super::*;

    #[test]
    fn header_size_is_twelve_bytes() {
        assert_eq!(FrameHeader::SIZE, 12);
    }

    #[test]
    fn round_trip_through_bytes() {
        let header = FrameHeader::new(Opcode::Step, 42);
        let parsed = FrameHeader::parse(header.as_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.opcode_enum(), Some(Opcode::Step));
        assert_eq!(parsed.payload_len(), 42);
    }

    #[test]
    fn known_wire_layout() {
        // magic "CADE", version 1, opcode Ack, reserved, payload_len 7
        let bytes = hex!("43414445 01 02 0000 00000007");
        let header = FrameHeader::parse(&bytes).unwrap();
        assert_eq!(header.opcode_enum(), Some(Opcode::Ack));
        assert_eq!(header.payload_len(), 7);
        assert_eq!(header.as_bytes(), bytes);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = hex!("deadbeef 01 01 0000 00000000");
        assert_eq!(FrameHeader::parse(&bytes), Err(FrameError::BadMagic(0xdead_beef)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let bytes = hex!("43414445 09 01 0000 00000000");
        assert_eq!(FrameHeader::parse(&bytes), Err(FrameError::UnsupportedVersion(9)));
    }

    #[test]
    fn rejects_truncated_input() {
        let header = FrameHeader::new(Opcode::Step, 0);
        let bytes = header.as_bytes();
        assert_eq!(
            FrameHeader::parse(&bytes[..5]),
            Err(FrameError::TruncatedHeader { expected: 12, actual: 5 })
        );
    }
}
