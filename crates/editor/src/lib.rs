#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Editor-side control layer of the ledger playground.
//!
//! Turns keystrokes into validated ledger state, query results and editor
//! affordances, on top of a shared [`tally_engine::EngineClient`].
//!
//! # Main Types
//!
//! - [`Playground`] - Orchestrator owning the document, query input and UI state
//! - [`StalenessGuard`] - Drops results of superseded async operations
//! - [`DecorationEngine`] - Account coloring and error-line marks
//! - [`AutocompleteCoordinator`] - Dropdown lifecycle for both completion sources
//! - [`ResultPaginator`] - Slices query results into pages
//!
//! # Data flow
//!
//! ```text
//! edit ─► debounce ─► EngineClient::validate ─► StalenessGuard ─► DecorationEngine
//! run  ──────────────► EngineClient::query    ─► StalenessGuard ─► ResultPaginator
//! ```

pub mod completion;
pub mod config;
pub mod debounce;
pub mod decoration;
pub mod document;
pub mod guard;
pub mod logging;
pub mod notice;
pub mod paginator;
pub mod playground;
pub mod status;

pub use completion::{AutocompleteCoordinator, AutocompleteSession, CompletionEdit, CompletionSource, KeyOutcome, MenuKey};
pub use config::{ConfigError, DecorationConfig, EditorConfig, PlaygroundConfig};
pub use debounce::Debouncer;
pub use decoration::{DecorationEngine, ErrorAnnotationState, Palette, Span, SpanStyle};
pub use document::Document;
pub use guard::{Stamp, StalenessGuard};
pub use notice::{Notice, NoticeQueue};
pub use paginator::{PAGE_SIZE, Page, ResultPaginator};
pub use playground::{Playground, QueryOutput};
pub use status::{EngineStatus, StatusIndicator};
