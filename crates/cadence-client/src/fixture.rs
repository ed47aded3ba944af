//! Fixture loading.
//!
//! Fixture documents are externally owned JSON arrays of step objects.
//! Parsing is statically typed: a missing or malformed field fails the
//! whole load up front with a [`FixtureError`], before any connection is
//! opened. Unknown extra fields are ignored (fixtures may carry data for
//! other tools).

use std::path::Path;

use cadence_proto::StepRecord;
use serde::Deserialize;
use thiserror::Error;

/// Fixture loading failures.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("failed to read fixture {path}: {source}")]
    Io {
        /// Fixture path as given.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The fixture is not a well-formed array of step objects.
    #[error("failed to parse fixture {path}: {source}")]
    Parse {
        /// Fixture path as given.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A duration field is negative, NaN, or infinite.
    #[error("fixture {path}: step {step_id}: {field} must be a non-negative finite number")]
    InvalidDuration {
        /// Fixture path as given.
        path: String,
        /// The offending step.
        step_id: u64,
        /// The offending field.
        field: &'static str,
    },

    /// The fixture parsed but holds no steps.
    #[error("fixture {path} contains no steps")]
    Empty {
        /// Fixture path as given.
        path: String,
    },
}

/// One fixture entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureStep {
    /// Sequence identifier sent to the server.
    pub step_id: u64,

    /// Declared wait carried in the record; also the default inter-step
    /// pause.
    pub wait_seconds: f64,

    /// Optional think-time override for the pause before this step. Lets a
    /// fixture declare one wait on the wire while the driver replays at a
    /// different pace.
    #[serde(default)]
    pub think_seconds: Option<f64>,

    /// Optional opaque payload, forwarded as UTF-8 bytes.
    #[serde(default)]
    pub payload: Option<String>,
}

impl FixtureStep {
    /// The wire record for this step.
    pub fn to_record(&self) -> StepRecord {
        StepRecord {
            step_id: self.step_id,
            wait_seconds: self.wait_seconds,
            payload: self.payload.clone().map(String::into_bytes),
        }
    }

    /// Seconds to pause before sending this step.
    pub fn pause_seconds(&self) -> f64 {
        self.think_seconds.unwrap_or(self.wait_seconds)
    }
}

/// Load and validate an ordered step sequence from `path`.
pub fn load(path: &Path) -> Result<Vec<FixtureStep>, FixtureError> {
    let display = path.display().to_string();

    let contents = std::fs::read_to_string(path)
        .map_err(|source| FixtureError::Io { path: display.clone(), source })?;

    let steps: Vec<FixtureStep> = serde_json::from_str(&contents)
        .map_err(|source| FixtureError::Parse { path: display.clone(), source })?;

    if steps.is_empty() {
        return Err(FixtureError::Empty { path: display });
    }

    for step in &steps {
        if !is_valid_duration(step.wait_seconds) {
            return Err(FixtureError::InvalidDuration {
                path: display,
                step_id: step.step_id,
                field: "wait_seconds",
            });
        }
        if let Some(think) = step.think_seconds {
            if !is_valid_duration(think) {
                return Err(FixtureError::InvalidDuration {
                    path: display,
                    step_id: step.step_id,
                    field: "think_seconds",
                });
            }
        }
    }

    Ok(steps)
}

fn is_valid_duration(seconds: f64) -> bool {
    seconds.is_finite() && seconds >= 0.0
}
