//! Cadence protocol server.
//!
//! The server side is two thin layers over [`cadence_core`]:
//!
//! - [`listener`]: binds the TCP socket and spawns one task per accepted
//!   connection. The listener owns nothing mutable after bind.
//! - [`handler`]: drives one connection - buffers reads, decodes frames,
//!   feeds records to the session state machine, and executes the actions
//!   it returns.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod handler;
pub mod listener;

pub use handler::{HandlerError, run_session};
