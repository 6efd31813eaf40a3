//! Boot failure classification and retry backoff.

use std::time::Duration;

/// Fixed explanation shown when the engine cannot run in this environment.
pub const UNSUPPORTED_MESSAGE: &str =
	"The ledger engine cannot run in this environment. Its compiled module failed to load, which usually means the runtime is too old or lacks WebAssembly support.";

/// Markers of a compile or unsupported-runtime failure, matched case-insensitively.
const NON_RETRYABLE_MARKERS: &[&str] = &[
	"compileerror",
	"compile error",
	"linkerror",
	"webassembly",
	"invalid module",
	"unsupported",
	"not supported",
];

/// Whether a boot failure can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootFailureKind {
	/// The engine cannot run here; retrying is pointless.
	Unsupported,
	/// Network hiccup, timeout, or another transient condition.
	Transient,
}

/// A classified boot failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootFailure {
	kind: BootFailureKind,
	detail: String,
}

impl std::fmt::Display for BootFailure {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.user_message())
	}
}

impl std::error::Error for BootFailure {}

impl BootFailure {
	/// Classifies a raw boot-error message from the worker.
	pub fn classify(detail: impl Into<String>) -> Self {
		let detail = detail.into();
		let lower = detail.to_ascii_lowercase();
		let kind = if NON_RETRYABLE_MARKERS.iter().any(|m| lower.contains(m)) {
			BootFailureKind::Unsupported
		} else {
			BootFailureKind::Transient
		};
		Self { kind, detail }
	}

	/// A transient failure with the given detail.
	pub fn transient(detail: impl Into<String>) -> Self {
		Self {
			kind: BootFailureKind::Transient,
			detail: detail.into(),
		}
	}

	/// The engine did not signal readiness in time.
	pub fn timeout(after: Duration) -> Self {
		Self::transient(format!("engine did not become ready within {}s", after.as_secs()))
	}

	/// Failure kind.
	pub const fn kind(&self) -> BootFailureKind {
		self.kind
	}

	/// Raw detail message.
	pub fn detail(&self) -> &str {
		&self.detail
	}

	/// Returns `true` if another attempt may succeed.
	pub const fn is_retryable(&self) -> bool {
		matches!(self.kind, BootFailureKind::Transient)
	}

	/// Human-readable message for the error modal.
	pub fn user_message(&self) -> String {
		match self.kind {
			BootFailureKind::Unsupported => UNSUPPORTED_MESSAGE.to_string(),
			BootFailureKind::Transient => format!("The ledger engine failed to start: {}", self.detail),
		}
	}
}

/// Exponential backoff: `base_delay * 2^attempt`, up to `max_retries` retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Retries after the first attempt.
	pub max_retries: u32,
	/// Delay before the first retry.
	pub base_delay: Duration,
}

impl RetryPolicy {
	/// Delay before retry number `attempt` (0-based). Saturates instead of overflowing.
	pub fn delay(&self, attempt: u32) -> Duration {
		if self.base_delay.is_zero() {
			return Duration::ZERO;
		}
		2u32.checked_pow(attempt)
			.and_then(|factor| self.base_delay.checked_mul(factor))
			.unwrap_or(Duration::MAX)
	}

	/// Returns `true` if retry number `attempt` is still within budget.
	pub const fn allows(&self, attempt: u32) -> bool {
		attempt < self.max_retries
	}
}
