//! A complete wire frame: opcode plus raw payload bytes.

use zerocopy::IntoBytes;

use crate::header::FrameHeader;
use crate::opcodes::Opcode;

/// One self-delimited wire message.
///
/// A `Frame` always carries a known opcode; unknown opcode bytes are
/// rejected during decoding, before a `Frame` is ever constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    opcode: Opcode,
    payload: Vec<u8>,
}

impl Frame {
    /// Build a frame from an opcode and its serialized payload.
    pub fn new(opcode: Opcode, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }

    /// The frame's opcode.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// The raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total encoded size: header plus payload.
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }

    /// Append the wire encoding of this frame to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let header = FrameHeader::new(self.opcode, self.payload.len() as u32);
        out.reserve(self.encoded_len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.payload);
    }
}
