//! The black-box engine seam.

use serde_json::Value;

use crate::Action;

/// A loaded ledger engine.
///
/// Results are JSON values in the engine's own shape; the engine client
/// decodes them. An `Err` is an exceptional engine failure, not a ledger
/// error. Ledger errors are part of a successful result.
pub trait LedgerEngine: Send {
	/// Engine version string reported in the `ready` signal.
	fn version(&self) -> String;

	/// `validate(source) -> {valid, errors[]}`.
	fn validate(&mut self, source: &str) -> Result<Value, String>;

	/// `format(source) -> {formatted?, errors?}`.
	fn format(&mut self, source: &str) -> Result<Value, String>;

	/// `query(source, q) -> {rows?, columns?, error?}`.
	fn query(&mut self, source: &str, query: &str) -> Result<Value, String>;

	/// `completions(source, pos) -> {completions[]}`.
	fn completions(&mut self, source: &str, position: usize) -> Result<Value, String>;

	/// Runs one decoded action.
	fn execute(&mut self, action: &Action) -> Result<Value, String> {
		match action {
			Action::Validate { source } => self.validate(source),
			Action::Format { source } => self.format(source),
			Action::Query { source, query } => self.query(source, query),
			Action::Completions { source, position } => self.completions(source, *position),
		}
	}
}

/// Builds an engine inside a freshly created worker context.
///
/// Called on the worker thread. The error string is forwarded verbatim as
/// the boot-error signal; the engine client classifies it.
pub trait EngineLoader: Send + Sync + 'static {
	/// Loads the engine.
	fn load(&self) -> Result<Box<dyn LedgerEngine>, String>;
}

impl<F> EngineLoader for F
where
	F: Fn() -> Result<Box<dyn LedgerEngine>, String> + Send + Sync + 'static,
{
	fn load(&self) -> Result<Box<dyn LedgerEngine>, String> {
		self()
	}
}
