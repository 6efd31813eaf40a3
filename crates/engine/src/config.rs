//! Engine client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::RetryPolicy;

/// Engine lifecycle and transport knobs.
///
/// Deserialized from the `[engine]` table of the playground config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	/// How long to wait for the `ready` signal.
	pub boot_timeout_ms: u64,
	/// Boot retries after the first attempt.
	pub max_boot_retries: u32,
	/// Backoff base delay between boot attempts.
	pub retry_base_delay_ms: u64,
	/// Per-request timeout.
	pub request_timeout_ms: u64,
	/// Worker thread name prefix.
	pub worker_name: String,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			boot_timeout_ms: 30_000,
			max_boot_retries: 3,
			retry_base_delay_ms: 1_000,
			request_timeout_ms: tally_rpc::DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
			worker_name: "tally-engine".to_string(),
		}
	}
}

impl EngineConfig {
	/// How long a boot attempt waits for the `ready` signal.
	pub fn boot_timeout(&self) -> Duration {
		Duration::from_millis(self.boot_timeout_ms)
	}

	/// Per-call timeout applied by the transport.
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	/// Boot backoff built from `max_boot_retries` and `retry_base_delay_ms`.
	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy {
			max_retries: self.max_boot_retries,
			base_delay: Duration::from_millis(self.retry_base_delay_ms),
		}
	}
}
