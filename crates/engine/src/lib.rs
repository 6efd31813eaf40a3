//! Typed client for the ledger engine.
//!
//! [`EngineClient`] owns the worker lifecycle (boot with retry, readiness,
//! termination) and translates the four engine operations into
//! [`tally_rpc::Transport`] calls. Calls made while the engine is not ready
//! resolve to `Ok(None)` ("skipped") rather than an error.

pub mod boot;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use boot::{BootFailure, BootFailureKind, RetryPolicy};
pub use client::{EngineClient, EngineState};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use types::{
	Amount, Cell, Completion, CompletionKind, Cost, FormatResult, Inventory, Position, QueryResult, Row, ValidationError,
	ValidationResult,
};
