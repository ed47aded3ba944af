//! Per-connection session driver.
//!
//! [`run_session`] is the I/O half of the session layer: it owns one
//! connection's read buffer and write half, and interprets the actions
//! returned by the pure [`Session`] state machine. It is generic over the
//! stream type so tests can drive it over in-memory duplex pipes.

use std::io;

use bytes::BytesMut;
use cadence_core::{Session, SessionAction, SessionConfig};
use cadence_proto::{FrameCodec, FrameError, Opcode, Payload, ProtocolError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Failures that terminate one session.
///
/// Session-local and fatal to that session only; the listener logs them
/// and carries on accepting.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The byte stream did not contain a well-formed frame.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// A frame's payload could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The client sent a frame type only the server may send.
    #[error("unexpected {0:?} frame from client")]
    UnexpectedFrame(Opcode),

    /// Socket-level failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Drive one session over `stream` until it closes.
///
/// Reads are bounded by `config.read_timeout`: if no bytes arrive within
/// the window, the session is closed with a timeout rejection (sent on a
/// best-effort basis - the peer may already be gone). Clean EOF closes the
/// session without error. A framing error or an unexpected client frame
/// closes the connection with no validation response.
pub async fn run_session<S>(stream: S, config: &SessionConfig) -> Result<(), HandlerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let codec = FrameCodec::new();
    let mut session = Session::new(config);
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        // Drain every complete frame already buffered before reading more;
        // one TCP segment may carry several records.
        while let Some(frame) = codec.decode(&mut buf)? {
            let Payload::Step(record) = Payload::from_frame(&frame)? else {
                return Err(HandlerError::UnexpectedFrame(frame.opcode()));
            };

            execute(&mut writer, session.handle_record(&record)).await?;
            if session.is_closed() {
                return Ok(());
            }
        }

        match tokio::time::timeout(config.read_timeout, reader.read_buf(&mut buf)).await {
            Err(_elapsed) => {
                let actions = session.on_idle_timeout();
                if let Err(error) = execute(&mut writer, actions).await {
                    tracing::debug!(%error, "peer gone before idle-timeout notice");
                }
                return Ok(());
            },
            Ok(Ok(0)) => {
                session.on_disconnect();
                return Ok(());
            },
            Ok(Ok(_)) => {},
            Ok(Err(error)) => return Err(HandlerError::Io(error)),
        }
    }
}

/// Execute the state machine's actions against the write half.
async fn execute<W>(writer: &mut W, actions: Vec<SessionAction>) -> Result<(), HandlerError>
where
    W: AsyncWrite + Unpin,
{
    for action in actions {
        match action {
            SessionAction::Send(payload) => {
                let frame = payload.into_frame()?;
                let mut out = Vec::with_capacity(frame.encoded_len());
                frame.encode(&mut out);
                writer.write_all(&out).await?;
            },
            SessionAction::Close { reason } => {
                tracing::info!(%reason, "closing session");
                let _ = writer.shutdown().await;
            },
        }
    }
    Ok(())
}
