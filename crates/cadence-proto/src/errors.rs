//! Error types for wire parsing and payload serialization.

use thiserror::Error;

/// Convenience alias for protocol-level results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Framing failures: the byte stream does not contain a well-formed frame.
///
/// A `FrameError` means the stream is unrecoverable. There is no way to
/// resynchronize to the next frame boundary, so the session must close
/// without producing a validation outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Input shorter than a full header where a header was required.
    #[error("truncated header: got {actual} bytes, need {expected}")]
    TruncatedHeader {
        /// Bytes required for a complete header.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// The magic number did not match [`crate::FrameHeader::MAGIC`].
    #[error("bad magic: {0:#010x}")]
    BadMagic(u32),

    /// The protocol version is not one we speak.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The opcode byte does not name a known frame type.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// The declared payload length exceeds the codec's limit.
    #[error("payload length {len} exceeds limit of {max} bytes")]
    PayloadTooLarge {
        /// Declared payload length.
        len: u32,
        /// Maximum accepted payload length.
        max: u32,
    },
}

/// Protocol errors: framing plus payload (de)serialization failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Framing failure.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// CBOR encoding of a payload failed.
    #[error("payload encode failed: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    /// CBOR decoding of a payload failed.
    #[error("payload decode failed: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
}
