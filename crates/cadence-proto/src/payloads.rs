//! CBOR payload types carried inside frames.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::Result;
use crate::frame::Frame;
use crate::opcodes::Opcode;

/// One client-submitted step.
///
/// `step_id` must be strictly increasing within a session (each accepted
/// record is exactly one greater than the previous; the first record
/// establishes the baseline). `wait_seconds` is the duration the client
/// waited before sending the step and must meet the server's configured
/// threshold, first record included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Sequence identifier, unique within a session.
    pub step_id: u64,

    /// Declared pre-send wait in seconds.
    pub wait_seconds: f64,

    /// Opaque application data, passed through unvalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

/// Server acceptance of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// The accepted step's identifier.
    pub step_id: u64,
}

/// Server rejection. Terminal: the connection closes after this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    /// The offending step's identifier. `None` when the rejection is not
    /// tied to a record, i.e. an idle read timeout.
    pub step_id: Option<u64>,

    /// Why the session was rejected.
    pub code: RejectCode,
}

/// Rejection reason codes.
///
/// Wire values 1 and 2 match the server's historical error numbering
/// (0 was "ok", which is now expressed by the Ack frame type instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RejectCode {
    /// `wait_seconds` below the configured threshold, or no frame arrived
    /// within the read-timeout window.
    Timeout = 1,

    /// `step_id` was not exactly one greater than the last accepted id.
    Sequence = 2,
}

impl std::fmt::Display for RejectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("ERR_TIMEOUT"),
            Self::Sequence => f.write_str("ERR_SEQUENCE"),
        }
    }
}

/// A decoded frame payload, tagged by the frame's opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Step submission.
    Step(StepRecord),
    /// Acceptance response.
    Ack(Ack),
    /// Rejection response.
    Reject(Reject),
}

impl Payload {
    /// Decode a frame's payload according to its opcode.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let payload = match frame.opcode() {
            Opcode::Step => Self::Step(ciborium::from_reader(frame.payload())?),
            Opcode::Ack => Self::Ack(ciborium::from_reader(frame.payload())?),
            Opcode::Reject => Self::Reject(ciborium::from_reader(frame.payload())?),
        };
        Ok(payload)
    }

    /// Serialize this payload into a frame with the matching opcode.
    pub fn into_frame(self) -> Result<Frame> {
        let mut bytes = Vec::new();
        let opcode = match &self {
            Self::Step(record) => {
                ciborium::into_writer(record, &mut bytes)?;
                Opcode::Step
            },
            Self::Ack(ack) => {
                ciborium::into_writer(ack, &mut bytes)?;
                Opcode::Ack
            },
            Self::Reject(reject) => {
                ciborium::into_writer(reject, &mut bytes)?;
                Opcode::Reject
            },
        };
        Ok(Frame::new(opcode, bytes))
    }
}
