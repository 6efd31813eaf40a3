//! Wire envelopes and inbound classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Simple counter-based correlation ID generator.
///
/// IDs start at 1 so that a zero never shows up in logs as a valid request.
#[derive(Debug, Clone, Copy)]
pub struct CounterIdGen(u64);

impl Default for CounterIdGen {
	fn default() -> Self {
		Self::new()
	}
}

impl CounterIdGen {
	/// Creates a new generator whose first ID is 1.
	#[must_use]
	pub const fn new() -> Self {
		Self(1)
	}

	/// Generates the next unique ID and advances the counter.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> u64 {
		let id = self.0;
		self.0 = self.0.wrapping_add(1);
		id
	}
}

/// Outbound envelope: `{id?, action, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Correlation ID. Always present for calls made through the transport.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<u64>,
	/// Engine action name (`validate`, `format`, `query`, `completions`).
	pub action: String,
	/// Action arguments.
	#[serde(default)]
	pub payload: Value,
}

impl Request {
	/// Creates a correlated request.
	pub fn new(id: u64, action: impl Into<String>, payload: Value) -> Self {
		Self {
			id: Some(id),
			action: action.into(),
			payload,
		}
	}
}

/// Discriminant of an inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
	/// The worker finished booting.
	Ready,
	/// A request completed successfully.
	Result,
	/// A request failed, or (without an ID) the worker failed to boot.
	Error,
}

/// Inbound envelope: `{id?, type, result?, error?, version?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
	/// Correlation ID; absent for lifecycle signals.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<u64>,
	/// Envelope kind.
	#[serde(rename = "type")]
	pub kind: ReplyKind,
	/// Result payload for `result` replies.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error message for `error` replies.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Engine version carried by the `ready` signal.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
}

impl Reply {
	/// Lifecycle signal: the engine is loaded and reports `version`.
	pub fn ready(version: impl Into<String>) -> Self {
		Self {
			id: None,
			kind: ReplyKind::Ready,
			result: None,
			error: None,
			version: Some(version.into()),
		}
	}

	/// Lifecycle signal: the engine failed to load.
	pub fn boot_error(message: impl Into<String>) -> Self {
		Self {
			id: None,
			kind: ReplyKind::Error,
			result: None,
			error: Some(message.into()),
			version: None,
		}
	}

	/// Successful completion of request `id`.
	pub fn result(id: u64, result: Value) -> Self {
		Self {
			id: Some(id),
			kind: ReplyKind::Result,
			result: Some(result),
			error: None,
			version: None,
		}
	}

	/// Failed completion of request `id`.
	pub fn error(id: u64, message: impl Into<String>) -> Self {
		Self {
			id: Some(id),
			kind: ReplyKind::Error,
			result: None,
			error: Some(message.into()),
			version: None,
		}
	}

	/// Classifies the envelope. The absence of an ID marks a lifecycle signal.
	pub fn classify(self) -> Inbound {
		match (self.id, self.kind) {
			(None, ReplyKind::Ready) => Inbound::Lifecycle(Lifecycle::Ready {
				version: self.version.unwrap_or_default(),
			}),
			(None, ReplyKind::Error) => Inbound::Lifecycle(Lifecycle::BootError {
				message: self.error.unwrap_or_else(|| "engine failed to start".to_string()),
			}),
			(Some(id), ReplyKind::Result) => Inbound::Completion {
				id,
				outcome: Ok(self.result.unwrap_or(Value::Null)),
			},
			(Some(id), ReplyKind::Error) => Inbound::Completion {
				id,
				outcome: Err(self.error.unwrap_or_else(|| "unknown worker error".to_string())),
			},
			(id, kind) => Inbound::Malformed { id, kind },
		}
	}
}

/// Worker lifecycle events routed to the engine client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
	/// The engine loaded.
	Ready {
		/// Engine version string.
		version: String,
	},
	/// The engine could not be loaded.
	BootError {
		/// Raw error message from the worker.
		message: String,
	},
}

/// Classification of an inbound envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
	/// An uncorrelated lifecycle signal.
	Lifecycle(Lifecycle),
	/// The completion of a correlated request.
	Completion {
		/// Correlation ID.
		id: u64,
		/// Payload or worker error string.
		outcome: Result<Value, String>,
	},
	/// A combination the protocol does not define, e.g. an uncorrelated `result`.
	Malformed {
		/// Correlation ID, if any.
		id: Option<u64>,
		/// Envelope kind.
		kind: ReplyKind,
	},
}
