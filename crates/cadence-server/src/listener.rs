//! TCP accept loop.
//!
//! The listener is the only shared resource in the process and it performs
//! no mutation after bind: each accepted connection gets its own spawned
//! task with a clone of the read-only config, and no state is shared
//! between sessions.

use std::io;
use std::net::SocketAddr;

use cadence_core::SessionConfig;
use tokio::net::TcpListener;

use crate::handler;

/// Bind the listening socket.
///
/// Returns the bound address alongside the listener so callers binding
/// port 0 (tests) can learn the assigned port.
pub async fn bind(host: &str, port: u16) -> io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

/// Accept connections until process termination.
///
/// Each connection runs on its own task; a failed session is logged and
/// never takes down the listener or any other session.
pub async fn run(listener: TcpListener, config: SessionConfig) -> io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        tracing::info!(%addr, "connection accepted");

        let config = config.clone();
        tokio::spawn(async move {
            match handler::run_session(stream, &config).await {
                Ok(()) => tracing::info!(%addr, "session closed"),
                Err(error) => tracing::warn!(%addr, %error, "session failed"),
            }
        });
    }
}
