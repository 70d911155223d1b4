//! Session manager for a single active wallet connector.
//!
//! This crate provides:
//! - `SessionManager`, the owner of the one authoritative session record
//! - Activation with staleness detection across overlapping attempts
//! - Reconciliation of Update/Error/Deactivate events pushed by the attached connector
//! - Explicit FSM-validated phase tracking and a watch channel of snapshots
//!
//! Every committed transition bumps a generation counter. Long-running
//! operations capture the generation when they start and drop their result
//! if it moved by the time they finish.

mod error;
mod machine;
mod manager;
mod reconcile;
mod state;

#[cfg(test)]
mod tests;

pub use connector_core::{Account, ChainId, Connector, ConnectorError, ProviderHandle};
pub use error::{SessionError, SessionResult};
pub use machine::session_machine;
pub use machine::{SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase};
pub use manager::{ActivateOptions, ErrorHandler, SessionManager};
pub use state::{reduce, Action, SessionSnapshot, SessionState};
