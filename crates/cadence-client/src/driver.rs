//! Sequential step driver.
//!
//! Opens one connection and replays the fixture in order: pause, send,
//! await the response. The first rejection ends the run - the driver never
//! retries and never sends past a failed step.

use std::time::Duration;

use bytes::BytesMut;
use cadence_proto::{FrameCodec, FrameError, Opcode, Payload, ProtocolError, RejectCode};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::fixture::FixtureStep;

/// Driver failures: the run ended without a protocol verdict.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The server could not be reached.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// Target address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Socket-level failure mid-session.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server's byte stream did not frame correctly.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// A response payload could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server sent a frame type only clients may send.
    #[error("unexpected {0:?} frame from server")]
    UnexpectedFrame(Opcode),

    /// The server closed the connection without responding.
    #[error("server closed the connection before responding")]
    ServerClosed,
}

/// Where and what to replay.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Ordered steps to send.
    pub steps: Vec<FixtureStep>,
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// Every step was acknowledged.
    Completed {
        /// Number of accepted steps.
        steps: usize,
    },

    /// The server rejected the session; the reason code is surfaced
    /// verbatim.
    Rejected {
        /// The offending step id as reported by the server, absent for
        /// idle timeouts.
        step_id: Option<u64>,
        /// Rejection reason.
        code: RejectCode,
    },
}

/// Replay `config.steps` over a single connection.
pub async fn run(config: &DriverConfig) -> Result<DriverOutcome, DriverError> {
    let addr = format!("{}:{}", config.host, config.port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| DriverError::Connect { addr: addr.clone(), source })?;
    tracing::info!(%addr, steps = config.steps.len(), "connected");

    let codec = FrameCodec::new();
    let mut buf = BytesMut::new();
    let mut accepted = 0usize;

    for step in &config.steps {
        let pause =
            Duration::try_from_secs_f64(step.pause_seconds()).unwrap_or(Duration::ZERO);
        tokio::time::sleep(pause).await;

        tracing::info!(step_id = step.step_id, wait_seconds = step.wait_seconds, "sending step");
        let frame = Payload::Step(step.to_record()).into_frame()?;
        let mut out = Vec::with_capacity(frame.encoded_len());
        frame.encode(&mut out);
        stream.write_all(&out).await?;

        match recv_response(&mut stream, &codec, &mut buf).await? {
            Payload::Ack(ack) => {
                tracing::info!(step_id = ack.step_id, "step accepted");
                accepted += 1;
            },
            Payload::Reject(reject) => {
                tracing::warn!(step_id = ?reject.step_id, code = %reject.code, "step rejected");
                return Ok(DriverOutcome::Rejected {
                    step_id: reject.step_id,
                    code: reject.code,
                });
            },
            Payload::Step(_) => return Err(DriverError::UnexpectedFrame(Opcode::Step)),
        }
    }

    Ok(DriverOutcome::Completed { steps: accepted })
}

async fn recv_response(
    stream: &mut TcpStream,
    codec: &FrameCodec,
    buf: &mut BytesMut,
) -> Result<Payload, DriverError> {
    loop {
        if let Some(frame) = codec.decode(buf)? {
            return Ok(Payload::from_frame(&frame)?);
        }
        if stream.read_buf(buf).await? == 0 {
            return Err(DriverError::ServerClosed);
        }
    }
}
