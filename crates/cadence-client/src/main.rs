//! Cadence client binary.

use std::path::PathBuf;
use std::process::ExitCode;

use cadence_client::driver::{self, DriverConfig, DriverOutcome};
use cadence_client::fixture;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Fixture-driven client exercising a Cadence server.
#[derive(Parser, Debug)]
#[command(name = "cadence-client", version, about)]
struct Args {
    /// Which fixture to replay.
    #[arg(long, value_enum, default_value_t = DataSet::Success)]
    data: DataSet,

    /// Directory holding the fixture documents.
    #[arg(long, default_value = "fixtures")]
    fixture_dir: PathBuf,

    /// Server host.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

/// Named fixture selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum DataSet {
    /// A fully valid step sequence.
    Success,
    /// A sequence the server rejects.
    Failure,
}

impl DataSet {
    fn file_name(self) -> &'static str {
        match self {
            Self::Success => "success.json",
            Self::Failure => "failure.json",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let path = args.fixture_dir.join(args.data.file_name());
    let steps = match fixture::load(&path) {
        Ok(steps) => steps,
        Err(error) => {
            tracing::error!(%error, "fixture load failed");
            return ExitCode::FAILURE;
        },
    };

    let config = DriverConfig { host: args.host, port: args.port, steps };
    match driver::run(&config).await {
        Ok(DriverOutcome::Completed { steps }) => {
            tracing::info!(steps, "all steps accepted");
            ExitCode::SUCCESS
        },
        Ok(DriverOutcome::Rejected { step_id, code }) => {
            tracing::error!(?step_id, %code, "session rejected");
            ExitCode::FAILURE
        },
        Err(error) => {
            tracing::error!(%error, "run failed");
            ExitCode::FAILURE
        },
    }
}
