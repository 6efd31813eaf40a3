//! Engine operations as they travel across the worker boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_rpc::Request;

/// One engine operation.
///
/// Serializes to the `{action, payload}` half of an outbound envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "lowercase")]
pub enum Action {
	/// Validate a ledger source.
	Validate {
		/// Ledger text.
		source: String,
	},
	/// Pretty-print a ledger source.
	Format {
		/// Ledger text.
		source: String,
	},
	/// Run a BQL query against a ledger source.
	Query {
		/// Ledger text.
		source: String,
		/// Query text.
		query: String,
	},
	/// Completion candidates at a char offset.
	Completions {
		/// Text to complete in.
		source: String,
		/// Cursor offset in chars.
		position: usize,
	},
}

impl Action {
	/// Wire name of the action.
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Validate { .. } => "validate",
			Self::Format { .. } => "format",
			Self::Query { .. } => "query",
			Self::Completions { .. } => "completions",
		}
	}

	/// Splits the action into its wire name and payload.
	///
	/// # Errors
	///
	/// Fails only if the payload cannot be represented as JSON.
	pub fn into_parts(self) -> Result<(&'static str, Value), serde_json::Error> {
		let name = self.name();
		let mut value = serde_json::to_value(self)?;
		let payload = value.get_mut("payload").map(Value::take).unwrap_or(Value::Null);
		Ok((name, payload))
	}

	/// Rebuilds an action from an inbound request on the worker side.
	///
	/// # Errors
	///
	/// Returns a message naming the action when the action is unknown or its
	/// payload does not match.
	pub fn from_request(req: &Request) -> Result<Self, String> {
		let envelope = serde_json::json!({ "action": req.action, "payload": req.payload });
		serde_json::from_value(envelope).map_err(|e| format!("invalid '{}' request: {e}", req.action))
	}
}
