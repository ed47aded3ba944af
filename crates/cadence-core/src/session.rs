//! Session state machine for the Cadence protocol.
//!
//! This module implements the session layer - one accepted connection's
//! lifecycle from first record to terminal close.
//!
//! # Architecture: Action-Based State Machine
//!
//! This state machine follows the action pattern:
//! - Methods are pure of I/O and return `Vec<SessionAction>`
//! - Driver code executes actions (serialize responses, close the socket)
//!
//! This keeps protocol correctness independent of execution concerns: the
//! same machine runs under the production server and plain unit tests.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  first Ack   ┌────────────┐  Ack
//! │ AwaitingFirst │─────────────>│ Validating │───┐
//! └───────────────┘              └────────────┘<──┘
//!         │                            │
//!         │ Reject/idle timeout        │ Reject/idle timeout/EOF
//!         ↓                            ↓
//!     ┌────────┐                  ┌────────┐
//!     │ Closed │                  │ Closed │
//!     └────────┘                  └────────┘
//! ```
//!
//! `Closed` is terminal and absorbing: once reached, no further records are
//! processed or acknowledged.

use std::time::Duration;

use cadence_proto::{Ack, Payload, Reject, RejectCode, StepRecord};

use crate::validator::{self, Outcome, ValidatorState};

/// Actions returned by the session state machine.
///
/// The driver (production server or test) executes these:
/// - `Send`: serialize the payload into a frame and write it to the peer
/// - `Close`: close the connection, logging the reason
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Send this response to the peer.
    Send(Payload),

    /// Close the connection with this reason.
    Close {
        /// Human-readable termination reason.
        reason: String,
    },
}

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No record received yet; the next record establishes the baseline.
    AwaitingFirst,
    /// Baseline established, validating subsequent records.
    Validating,
    /// Session terminated (rejection, timeout, or disconnect).
    Closed,
}

/// Session configuration.
///
/// Shared read-only across all sessions of one server process.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum acceptable `wait_seconds` per record.
    pub timeout_threshold: f64,
    /// How long the driver waits for a complete frame before the session
    /// is considered idle and closed.
    pub read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { timeout_threshold: 5.0, read_timeout: Duration::from_secs(30) }
    }
}

/// Session state machine.
///
/// Owns one connection's validation state. Nothing here is shared between
/// sessions, so no synchronization is ever required.
#[derive(Debug, Clone)]
pub struct Session {
    phase: SessionPhase,
    state: ValidatorState,
}

impl Session {
    /// Create a session in `AwaitingFirst` with no baseline.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            phase: SessionPhase::AwaitingFirst,
            state: ValidatorState::new(config.timeout_threshold),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Last accepted step id, if any record has been accepted.
    pub fn last_step_id(&self) -> Option<u64> {
        self.state.last_step_id
    }

    /// Whether the session has reached the terminal phase.
    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    /// Process one decoded record.
    ///
    /// Accepted records are acknowledged and advance the baseline. Any
    /// rejection emits the error response followed by a close, and the
    /// session becomes terminal. Records arriving after close are absorbed
    /// without any action.
    pub fn handle_record(&mut self, record: &StepRecord) -> Vec<SessionAction> {
        if self.phase == SessionPhase::Closed {
            tracing::debug!(step_id = record.step_id, "record ignored after close");
            return Vec::new();
        }

        match validator::validate(&self.state, record) {
            Outcome::Accepted => {
                self.state.last_step_id = Some(record.step_id);
                self.phase = SessionPhase::Validating;
                tracing::debug!(step_id = record.step_id, "step accepted");

                vec![SessionAction::Send(Payload::Ack(Ack { step_id: record.step_id }))]
            },
            Outcome::Rejected(code) => {
                self.phase = SessionPhase::Closed;
                tracing::debug!(step_id = record.step_id, %code, "step rejected");

                vec![
                    SessionAction::Send(Payload::Reject(Reject {
                        step_id: Some(record.step_id),
                        code,
                    })),
                    SessionAction::Close {
                        reason: format!("step {} rejected: {code}", record.step_id),
                    },
                ]
            },
        }
    }

    /// No complete frame arrived within the read-timeout window.
    ///
    /// Emits a timeout rejection (not tied to any record) and closes. The
    /// driver sends the response on a best-effort basis; the peer may
    /// already be gone.
    pub fn on_idle_timeout(&mut self) -> Vec<SessionAction> {
        if self.phase == SessionPhase::Closed {
            return Vec::new();
        }

        self.phase = SessionPhase::Closed;
        tracing::debug!("session idle, closing");

        vec![
            SessionAction::Send(Payload::Reject(Reject {
                step_id: None,
                code: RejectCode::Timeout,
            })),
            SessionAction::Close { reason: "idle read timeout".to_string() },
        ]
    }

    /// Peer closed the connection cleanly.
    ///
    /// Not an error: the session is complete up to the last accepted
    /// record.
    pub fn on_disconnect(&mut self) {
        if self.phase != SessionPhase::Closed {
            tracing::debug!(last_step_id = ?self.state.last_step_id, "peer disconnected");
            self.phase = SessionPhase::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step_id: u64, wait_seconds: f64) -> StepRecord {
        StepRecord { step_id, wait_seconds, payload: None }
    }

    fn assert_ack(actions: &[SessionAction], step_id: u64) {
        assert_eq!(actions, &[SessionAction::Send(Payload::Ack(Ack { step_id }))]);
    }

    fn assert_reject(actions: &[SessionAction], step_id: Option<u64>, code: RejectCode) {
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[0],
            SessionAction::Send(Payload::Reject(Reject { step_id, code }))
        );
        assert!(matches!(actions[1], SessionAction::Close { .. }));
    }

    #[test]
    fn successful_session_lifecycle() {
        let mut session = Session::new(&SessionConfig::default());
        assert_eq!(session.phase(), SessionPhase::AwaitingFirst);
        assert_eq!(session.last_step_id(), None);

        assert_ack(&session.handle_record(&record(0, 5.0)), 0);
        assert_eq!(session.phase(), SessionPhase::Validating);
        assert_eq!(session.last_step_id(), Some(0));

        assert_ack(&session.handle_record(&record(1, 6.0)), 1);
        assert_ack(&session.handle_record(&record(2, 5.0)), 2);
        assert_eq!(session.last_step_id(), Some(2));
        assert_eq!(session.phase(), SessionPhase::Validating);
    }

    #[test]
    fn out_of_order_step_closes_session() {
        let mut session = Session::new(&SessionConfig::default());

        assert_ack(&session.handle_record(&record(0, 5.0)), 0);
        let actions = session.handle_record(&record(2, 5.0));
        assert_reject(&actions, Some(2), RejectCode::Sequence);
        assert!(session.is_closed());
    }

    #[test]
    fn under_threshold_step_closes_session() {
        let mut session = Session::new(&SessionConfig::default());

        assert_ack(&session.handle_record(&record(0, 5.0)), 0);
        let actions = session.handle_record(&record(1, 3.0));
        assert_reject(&actions, Some(1), RejectCode::Timeout);
        assert!(session.is_closed());
    }

    #[test]
    fn first_record_held_to_threshold() {
        let mut session = Session::new(&SessionConfig::default());

        let actions = session.handle_record(&record(0, 1.0));
        assert_reject(&actions, Some(0), RejectCode::Timeout);
        assert!(session.is_closed());
    }

    #[test]
    fn sequence_wins_over_timeout_on_same_record() {
        let mut session = Session::new(&SessionConfig::default());

        assert_ack(&session.handle_record(&record(0, 5.0)), 0);
        let actions = session.handle_record(&record(5, 0.5));
        assert_reject(&actions, Some(5), RejectCode::Sequence);
    }

    #[test]
    fn closed_session_absorbs_everything() {
        let mut session = Session::new(&SessionConfig::default());

        session.handle_record(&record(0, 5.0));
        session.handle_record(&record(9, 5.0)); // rejected, session closes
        assert!(session.is_closed());

        // No record is processed or acknowledged after close
        assert!(session.handle_record(&record(1, 5.0)).is_empty());
        assert!(session.on_idle_timeout().is_empty());
        assert_eq!(session.last_step_id(), Some(0));
    }

    #[test]
    fn idle_timeout_rejects_without_step_id() {
        let mut session = Session::new(&SessionConfig::default());

        session.handle_record(&record(0, 5.0));
        let actions = session.on_idle_timeout();
        assert_reject(&actions, None, RejectCode::Timeout);
        assert!(session.is_closed());
    }

    #[test]
    fn clean_disconnect_is_not_an_error() {
        let mut session = Session::new(&SessionConfig::default());

        session.handle_record(&record(0, 5.0));
        session.on_disconnect();
        assert!(session.is_closed());
        assert_eq!(session.last_step_id(), Some(0));
    }

    #[test]
    fn custom_threshold_applies() {
        let config = SessionConfig { timeout_threshold: 1.0, ..Default::default() };
        let mut session = Session::new(&config);

        assert_ack(&session.handle_record(&record(0, 1.0)), 0);
        let actions = session.handle_record(&record(1, 0.9));
        assert_reject(&actions, Some(1), RejectCode::Timeout);
    }
}
