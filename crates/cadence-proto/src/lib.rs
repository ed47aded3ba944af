//! Wire format for the Cadence step-validation protocol.
//!
//! Frames consist of a fixed 12-byte header (zero-copy binary) followed by a
//! variable-length CBOR payload. The header carries the frame's opcode and
//! the payload length, which makes frames self-delimiting: a reader can
//! reassemble a frame split across TCP segment boundaries by buffering until
//! `header + payload_len` bytes are available.
//!
//! The header is parsed with compile-time verified layouts via `zerocopy`.
//! Payload lengths are capped at 64 KiB so a malicious length field cannot
//! drive unbounded allocation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod errors;
pub mod frame;
pub mod header;
pub mod opcodes;
pub mod payloads;

pub use codec::FrameCodec;
pub use errors::{FrameError, ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcodes::Opcode;
pub use payloads::{Ack, Payload, Reject, RejectCode, StepRecord};
