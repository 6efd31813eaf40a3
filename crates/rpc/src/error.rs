//! Transport error type.

use std::time::Duration;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible transport failures.
///
/// Domain errors (ledger validation errors, query errors) never appear here;
/// they travel as data inside a successful reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The transport was closed before the request was sent.
	#[error("transport closed")]
	Closed,
	/// The worker was terminated while the request was in flight.
	#[error("worker terminated before replying")]
	Terminated,
	/// The worker side of the channel went away.
	#[error("worker disconnected")]
	WorkerGone,
	/// No reply arrived within the request timeout.
	#[error("request '{method}' timed out after {after:?}")]
	Timeout {
		/// The action that timed out.
		method: String,
		/// The timeout that elapsed.
		after: Duration,
	},
	/// The worker replied with an error string.
	#[error("{0}")]
	Remote(String),
	/// A payload could not be converted to or from its wire form.
	#[error("serialization failed: {0}")]
	Serialize(String),
	/// A correlation ID was registered twice.
	#[error("duplicate correlation id {0}")]
	DuplicateId(u64),
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Self::Serialize(e.to_string())
	}
}
