//! Per-record validation.
//!
//! [`validate`] is a pure function: the same `(state, record)` input always
//! yields the same [`Outcome`], and no external state is consulted. The
//! caller owns the state and applies the update on acceptance.

use cadence_proto::{RejectCode, StepRecord};

/// Validation state for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatorState {
    /// Last accepted step id. `None` until the first record is accepted;
    /// the first record is exempt from the sequence check and establishes
    /// the baseline.
    pub last_step_id: Option<u64>,

    /// Minimum acceptable `wait_seconds`, in seconds.
    pub timeout_threshold: f64,
}

impl ValidatorState {
    /// Fresh state with no baseline and the given threshold.
    pub fn new(timeout_threshold: f64) -> Self {
        Self { last_step_id: None, timeout_threshold }
    }
}

/// Result of validating one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Record is valid; the caller updates `last_step_id`.
    Accepted,
    /// Record violates the protocol; the session must close.
    Rejected(RejectCode),
}

/// Check one record against the session state.
///
/// The sequence check runs first: ordering is the primary protocol
/// invariant, so when a record is both out of order and under the wait
/// threshold, the rejection code is [`RejectCode::Sequence`]. The first
/// record of a session (no baseline yet) skips the sequence check but is
/// still held to the wait threshold.
pub fn validate(state: &ValidatorState, record: &StepRecord) -> Outcome {
    if let Some(last) = state.last_step_id {
        if record.step_id != last.wrapping_add(1) {
            return Outcome::Rejected(RejectCode::Sequence);
        }
    }

    if record.wait_seconds < state.timeout_threshold {
        return Outcome::Rejected(RejectCode::Timeout);
    }

    Outcome::Accepted
}
