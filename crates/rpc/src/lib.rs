//! Correlated request/response transport for the ledger engine worker.
//!
//! The engine lives behind a message-passing boundary. This crate turns that
//! boundary into awaitable calls:
//! * [`Request`]/[`Reply`]: the wire envelopes crossing the boundary
//! * [`PendingTable`]: outstanding calls keyed by correlation ID
//! * [`Transport`]: `send(method, payload)` plus the inbound reader pump
//! * [`Lifecycle`]: uncorrelated worker signals (`ready`, boot error)

#![warn(missing_docs)]

pub mod error;
pub mod pending;
pub mod protocol;
pub mod transport;

pub use error::{Error, Result};
pub use pending::PendingTable;
pub use protocol::{CounterIdGen, Inbound, Lifecycle, Reply, ReplyKind, Request};
pub use transport::{DEFAULT_REQUEST_TIMEOUT, Transport};
