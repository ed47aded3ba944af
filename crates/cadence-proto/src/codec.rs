//! Incremental frame decoding over a byte buffer.
//!
//! TCP delivers a byte stream, not messages, so a frame may arrive split
//! across any number of reads. [`FrameCodec::decode`] consumes complete
//! frames from the front of a [`BytesMut`] and leaves partial frames
//! buffered until the remaining bytes arrive.

use bytes::{Buf, BytesMut};

use crate::errors::FrameError;
use crate::frame::Frame;
use crate::header::FrameHeader;

/// Largest payload the codec will accept, in bytes.
///
/// A step record is a few dozen bytes of CBOR; the cap exists so a hostile
/// length field cannot drive unbounded allocation.
pub const MAX_PAYLOAD_LEN: u32 = 64 * 1024;

/// Stateless frame decoder.
///
/// The caller owns the read buffer; the codec only inspects and consumes
/// it. Decoding has no side effects beyond buffer consumption, so a
/// `FrameCodec` can be shared freely across call sites.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_payload_len: u32,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self { max_payload_len: MAX_PAYLOAD_LEN }
    }
}

impl FrameCodec {
    /// Codec with the default payload cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to decode one frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` does not yet hold a complete frame;
    /// the caller should read more bytes and retry. Returns
    /// `Ok(Some(frame))` after consuming exactly one frame's bytes.
    ///
    /// # Errors
    ///
    /// Fails on bad magic, unsupported version, unknown opcode, or a
    /// payload length above the cap. Framing errors are unrecoverable:
    /// the stream cannot be resynchronized and must be closed.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if buf.len() < FrameHeader::SIZE {
            return Ok(None);
        }

        let header = FrameHeader::parse(&buf[..FrameHeader::SIZE])?;

        let payload_len = header.payload_len();
        if payload_len > self.max_payload_len {
            return Err(FrameError::PayloadTooLarge {
                len: payload_len,
                max: self.max_payload_len,
            });
        }

        let opcode = header
            .opcode_enum()
            .ok_or_else(|| FrameError::UnknownOpcode(header.opcode()))?;

        let total = FrameHeader::SIZE + payload_len as usize;
        if buf.len() < total {
            // Partial frame: reserve up front so the pending reads land in
            // one allocation.
            buf.reserve(total - buf.len());
            return Ok(None);
        }

        buf.advance(FrameHeader::SIZE);
        let payload = buf.split_to(payload_len as usize).to_vec();

        Ok(Some(Frame::new(opcode, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::Opcode;
    use crate::payloads::{Payload, StepRecord};

    fn step_frame(step_id: u64, wait_seconds: f64) -> Frame {
        Payload::Step(StepRecord { step_id, wait_seconds, payload: None })
            .into_frame()
            .unwrap()
    }

    #[test]
    fn decodes_complete_frame() {
        let frame = step_frame(1, 5.0);
        let mut encoded = Vec::new();
        frame.encode(&mut encoded);

        let mut buf = BytesMut::from(&encoded[..]);
        let decoded = FrameCodec::new().decode(&mut buf).unwrap();
        assert_eq!(decoded, Some(frame));
        assert!(buf.is_empty());
    }

    #[test]
    fn reassembles_byte_at_a_time() {
        let frame = step_frame(7, 6.5);
        let mut encoded = Vec::new();
        frame.encode(&mut encoded);

        let codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        let (last, rest) = encoded.split_last().unwrap();

        for byte in rest {
            buf.extend_from_slice(&[*byte]);
            assert_eq!(codec.decode(&mut buf).unwrap(), None);
        }

        buf.extend_from_slice(&[*last]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(frame));
    }

    #[test]
    fn decodes_back_to_back_frames() {
        let first = step_frame(0, 5.0);
        let second = step_frame(1, 5.0);
        let mut encoded = Vec::new();
        first.encode(&mut encoded);
        second.encode(&mut encoded);

        let codec = FrameCodec::new();
        let mut buf = BytesMut::from(&encoded[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(second));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\n"[..]);
        assert!(matches!(
            FrameCodec::new().decode(&mut buf),
            Err(FrameError::BadMagic(_))
        ));
    }

    #[test]
    fn rejects_unknown_opcode() {
        let frame = Frame::new(Opcode::Step, Vec::new());
        let mut encoded = Vec::new();
        frame.encode(&mut encoded);
        encoded[5] = 0x7f; // clobber the opcode byte

        let mut buf = BytesMut::from(&encoded[..]);
        assert_eq!(
            FrameCodec::new().decode(&mut buf),
            Err(FrameError::UnknownOpcode(0x7f))
        );
    }

    #[test]
    fn rejects_oversized_payload_before_buffering() {
        let header = crate::FrameHeader::new(Opcode::Step, MAX_PAYLOAD_LEN + 1);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&header));

        assert_eq!(
            FrameCodec::new().decode(&mut buf),
            Err(FrameError::PayloadTooLarge { len: MAX_PAYLOAD_LEN + 1, max: MAX_PAYLOAD_LEN })
        );
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn arb_record() -> impl Strategy<Value = StepRecord> {
            (any::<u64>(), 0.0f64..100_000.0, proptest::option::of(prop::collection::vec(
                any::<u8>(),
                0..256,
            )))
                .prop_map(|(step_id, wait_seconds, payload)| StepRecord {
                    step_id,
                    wait_seconds,
                    payload,
                })
        }

        proptest! {
            // decode(encode(r)) == r for the full frame pipeline
            #[test]
            fn frame_round_trip(record in arb_record()) {
                let frame = Payload::Step(record.clone()).into_frame().unwrap();
                let mut encoded = Vec::new();
                frame.encode(&mut encoded);

                let mut buf = BytesMut::from(&encoded[..]);
                let decoded = FrameCodec::new().decode(&mut buf).unwrap().unwrap();
                prop_assert!(buf.is_empty());

                match Payload::from_frame(&decoded).unwrap() {
                    Payload::Step(out) => prop_assert_eq!(out, record),
                    other => prop_assert!(false, "unexpected payload {:?}", other),
                }
            }

            // arbitrary split points never corrupt or drop a frame
            #[test]
            fn split_reads_reassemble(record in arb_record(), split in 0usize..64) {
                let frame = Payload::Step(record).into_frame().unwrap();
                let mut encoded = Vec::new();
                frame.encode(&mut encoded);
                let split = split.min(encoded.len());

                let codec = FrameCodec::new();
                let mut buf = BytesMut::new();
                buf.extend_from_slice(&encoded[..split]);
                let first = codec.decode(&mut buf).unwrap();
                if split < encoded.len() {
                    prop_assert_eq!(first, None);
                    buf.extend_from_slice(&encoded[split..]);
                    prop_assert_eq!(codec.decode(&mut buf).unwrap(), Some(frame));
                } else {
                    prop_assert_eq!(first, Some(frame));
                }
            }
        }
    }
}
