//! Retry with exponential backoff, deferring to server rate-limit hints.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, warn};

use crate::error::{Error, Result, is_retryable_status};
use crate::http::{FetchRequest, FetchResponse, HttpFetch};

/// Epoch-seconds reset header sent by rate-limited APIs.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Backoff settings for [`fetch_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Retries after the first attempt.
	pub max_retries: u32,
	/// Delay before the first retry; doubles for each later one.
	pub base_delay: Duration,
	/// Upper bound on any single wait, including server-requested ones.
	pub max_delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 3,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(60),
		}
	}
}

impl RetryPolicy {
	/// Backoff before retry `attempt` (0-based): `base_delay * 2^attempt`.
	pub fn backoff(&self, attempt: u32) -> Duration {
		2u32.checked_pow(attempt)
			.and_then(|factor| self.base_delay.checked_mul(factor))
			.unwrap_or(self.max_delay)
			.min(self.max_delay)
	}
}

/// Server-requested wait from `Retry-After` (seconds) or `X-RateLimit-Reset`
/// (epoch seconds, relative to `now`). `Retry-After` wins when both are set.
pub fn server_delay(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
	if let Some(secs) = header_secs(headers, RETRY_AFTER.as_str()) {
		return Some(Duration::from_secs(secs));
	}
	let reset = header_secs(headers, RATE_LIMIT_RESET)?;
	let now = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
	Some(Duration::from_secs(reset.saturating_sub(now)))
}

fn header_secs(headers: &HeaderMap, name: &str) -> Option<u64> {
	headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// GETs `request`, retrying transport errors, 5xx and 429.
///
/// Other statuses are returned as [`Error::Status`] without retrying. After
/// `policy.max_retries` retries the last failure is returned.
pub async fn fetch_with_retry<F>(fetcher: &F, request: &FetchRequest, policy: &RetryPolicy) -> Result<FetchResponse>
where
	F: HttpFetch + ?Sized,
{
	let mut attempt = 0;
	loop {
		let (error, hint) = match fetcher.get(request).await {
			Ok(response) if response.status.is_success() => return Ok(response),
			Ok(response) => {
				let error = Error::Status {
					url: request.url.clone(),
					status: response.status,
				};
				if !is_retryable_status(response.status) {
					debug!(url = %request.url, status = %response.status, "fetch.failed");
					return Err(error);
				}
				(error, server_delay(&response.headers, SystemTime::now()))
			}
			Err(error) if error.is_retryable() => (error, None),
			Err(error) => return Err(error),
		};

		if attempt >= policy.max_retries {
			warn!(url = %request.url, attempts = attempt + 1, %error, "fetch.exhausted");
			return Err(error);
		}

		let delay = hint.map_or_else(|| policy.backoff(attempt), |d| d.min(policy.max_delay));
		debug!(url = %request.url, attempt, ?delay, %error, "fetch.retry");
		tokio::time::sleep(delay).await;
		attempt += 1;
	}
}

#[cfg(test)]
mod tests;
