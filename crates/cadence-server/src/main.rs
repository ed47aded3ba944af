//! Cadence server binary.

use std::process::ExitCode;
use std::time::Duration;

use cadence_core::SessionConfig;
use cadence_server::listener;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// TCP server validating client step sequences.
#[derive(Parser, Debug)]
#[command(name = "cadence-server", version, about)]
struct Args {
    /// Host to bind.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Minimum acceptable wait_seconds per step.
    #[arg(long, default_value_t = 5.0)]
    timeout: f64,

    /// Seconds to wait for a frame before closing an idle session.
    #[arg(long, default_value_t = 30.0)]
    read_timeout: f64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let read_timeout = match Duration::try_from_secs_f64(args.read_timeout) {
        Ok(duration) => duration,
        Err(error) => {
            tracing::error!(%error, "invalid --read-timeout");
            return ExitCode::FAILURE;
        },
    };
    let config = SessionConfig { timeout_threshold: args.timeout, read_timeout };

    let (listener, addr) = match listener::bind(&args.host, args.port).await {
        Ok(bound) => bound,
        Err(error) => {
            tracing::error!(%error, host = %args.host, port = args.port, "bind failed");
            return ExitCode::FAILURE;
        },
    };

    tracing::info!(
        %addr,
        timeout_threshold = config.timeout_threshold,
        read_timeout_secs = args.read_timeout,
        "server listening"
    );

    if let Err(error) = listener::run(listener, config).await {
        tracing::error!(%error, "accept loop failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
