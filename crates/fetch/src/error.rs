//! Fetch error type.

use reqwest::StatusCode;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fetch failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The request never produced a response (DNS, TLS, connection reset, timeout).
	#[error("request to {url} failed: {message}")]
	Transport { url: String, message: String },
	/// The server answered with a non-success status.
	#[error("{url} returned {status}")]
	Status { url: String, status: StatusCode },
	/// The body did not decode into the expected shape.
	#[error("invalid response body from {url}: {message}")]
	Decode { url: String, message: String },
	/// The HTTP client could not be constructed.
	#[error("failed to build HTTP client: {0}")]
	Client(String),
}

impl Error {
	/// Returns `true` if another attempt may succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport { .. } => true,
			Self::Status { status, .. } => is_retryable_status(*status),
			Self::Decode { .. } | Self::Client(_) => false,
		}
	}
}

/// 5xx and 429 are worth retrying; other statuses are final.
pub fn is_retryable_status(status: StatusCode) -> bool {
	status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
