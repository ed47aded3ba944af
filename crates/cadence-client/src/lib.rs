//! Cadence client driver.
//!
//! Replays an externally-owned fixture of step records against a server
//! over a single connection, pausing between sends and stopping on the
//! first rejection (fail-fast, no retries).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod fixture;

pub use driver::{DriverConfig, DriverError, DriverOutcome};
pub use fixture::{FixtureError, FixtureStep};
