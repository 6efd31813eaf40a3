//! Dedicated worker context for the ledger engine.
//!
//! The engine is an opaque, synchronous module. It is loaded and driven on
//! its own OS thread and reached only through [`tally_rpc`] envelopes, never
//! through shared memory.
//!
//! * [`LedgerEngine`]/[`EngineLoader`]: the black-box seam
//! * [`Action`]: the four engine operations and their payloads
//! * [`WorkerContext`]: one running worker and its channels
//! * [`WorkerSpawner`]/[`ThreadSpawner`]: how the engine client creates workers

pub mod action;
pub mod engine;
pub mod host;
pub mod spawner;

pub use action::Action;
pub use engine::{EngineLoader, LedgerEngine};
pub use host::{WorkerContext, panic_message};
pub use spawner::{ThreadSpawner, WorkerSpawner};
