use std::collections::VecDeque;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use tokio::time::Instant;

use super::*;
use crate::http::FetchFuture;

/// Replays scripted outcomes and records when each call happened.
struct Scripted {
	outcomes: Mutex<VecDeque<Result<FetchResponse>>>,
	calls: Mutex<Vec<Instant>>,
}

impl Scripted {
	fn new(outcomes: impl IntoIterator<Item = Result<FetchResponse>>) -> Self {
		Self {
			outcomes: Mutex::new(outcomes.into_iter().collect()),
			calls: Mutex::new(Vec::new()),
		}
	}

	fn gaps(&self) -> Vec<Duration> {
		self.calls.lock().windows(2).map(|w| w[1] - w[0]).collect()
	}

	fn count(&self) -> usize {
		self.calls.lock().len()
	}
}

impl HttpFetch for Scripted {
	fn get<'a>(&'a self, _request: &'a FetchRequest) -> FetchFuture<'a> {
		self.calls.lock().push(Instant::now());
		let outcome = self
			.outcomes
			.lock()
			.pop_front()
			.unwrap_or_else(|| Ok(FetchResponse::new(StatusCode::OK, "")));
		Box::pin(async move { outcome })
	}
}

fn status(code: u16) -> Result<FetchResponse> {
	Ok(FetchResponse::new(StatusCode::from_u16(code).unwrap(), ""))
}

fn transport() -> Result<FetchResponse> {
	Err(Error::Transport {
		url: "https://example.test".into(),
		message: "connection reset".into(),
	})
}

fn request() -> FetchRequest {
	FetchRequest::get("https://example.test/releases/latest")
}

fn policy() -> RetryPolicy {
	RetryPolicy {
		max_retries: 3,
		base_delay: Duration::from_millis(100),
		max_delay: Duration::from_secs(30),
	}
}

#[tokio::test(start_paused = true)]
async fn server_error_then_success_retries_once() {
	let fetcher = Scripted::new([status(500), Ok(FetchResponse::new(StatusCode::OK, "{\"tag\":\"v1\"}"))]);

	let response = fetch_with_retry(&fetcher, &request(), &policy()).await.unwrap();

	assert_eq!(response.body, "{\"tag\":\"v1\"}");
	assert_eq!(fetcher.count(), 2);
	assert_eq!(fetcher.gaps(), vec![Duration::from_millis(100)]);
}

#[tokio::test(start_paused = true)]
async fn backoff_doubles_per_attempt() {
	let fetcher = Scripted::new([status(503), transport(), status(429), status(200)]);

	fetch_with_retry(&fetcher, &request(), &policy()).await.unwrap();

	assert_eq!(
		fetcher.gaps(),
		vec![Duration::from_millis(100), Duration::from_millis(200), Duration::from_millis(400)]
	);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
	let fetcher = Scripted::new([status(404)]);

	let err = fetch_with_retry(&fetcher, &request(), &policy()).await.unwrap_err();

	assert_eq!(fetcher.count(), 1);
	assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::NOT_FOUND));
	assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_return_last_failure() {
	let fetcher = Scripted::new([status(500), status(502), status(503), status(504), status(200)]);

	let err = fetch_with_retry(&fetcher, &request(), &policy()).await.unwrap_err();

	assert_eq!(fetcher.count(), 4);
	assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::GATEWAY_TIMEOUT));
}

#[tokio::test(start_paused = true)]
async fn retry_after_overrides_backoff() {
	let limited = FetchResponse::new(StatusCode::TOO_MANY_REQUESTS, "").with_header("Retry-After", "7");
	let fetcher = Scripted::new([Ok(limited), status(200)]);

	fetch_with_retry(&fetcher, &request(), &policy()).await.unwrap();

	assert_eq!(fetcher.gaps(), vec![Duration::from_secs(7)]);
}

#[tokio::test(start_paused = true)]
async fn server_delay_is_capped() {
	let limited = FetchResponse::new(StatusCode::SERVICE_UNAVAILABLE, "").with_header("Retry-After", "3600");
	let fetcher = Scripted::new([Ok(limited), status(200)]);

	fetch_with_retry(&fetcher, &request(), &policy()).await.unwrap();

	assert_eq!(fetcher.gaps(), vec![Duration::from_secs(30)]);
}

#[tokio::test(start_paused = true)]
async fn decode_errors_are_final() {
	let fetcher = Scripted::new([Err(Error::Decode {
		url: "u".into(),
		message: "eof".into(),
	})]);

	assert!(fetch_with_retry(&fetcher, &request(), &policy()).await.is_err());
	assert_eq!(fetcher.count(), 1);
}

#[test]
fn rate_limit_reset_is_relative_to_now() {
	let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
	let headers = FetchResponse::new(StatusCode::FORBIDDEN, "")
		.with_header("X-RateLimit-Reset", "1700000042")
		.headers;
	assert_eq!(server_delay(&headers, now), Some(Duration::from_secs(42)));

	let past = FetchResponse::new(StatusCode::FORBIDDEN, "")
		.with_header("x-ratelimit-reset", "1600000000")
		.headers;
	assert_eq!(server_delay(&past, now), Some(Duration::ZERO));
}

#[test]
fn retry_after_wins_over_reset() {
	let headers = FetchResponse::new(StatusCode::TOO_MANY_REQUESTS, "")
		.with_header("retry-after", "5")
		.with_header("x-ratelimit-reset", "99999999999")
		.headers;
	assert_eq!(server_delay(&headers, SystemTime::now()), Some(Duration::from_secs(5)));
}

#[test]
fn unparseable_hints_are_ignored() {
	let headers = FetchResponse::new(StatusCode::TOO_MANY_REQUESTS, "")
		.with_header("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT")
		.headers;
	assert_eq!(server_delay(&headers, SystemTime::now()), None);
}

#[test]
fn backoff_saturates_at_max_delay() {
	let policy = policy();
	assert_eq!(policy.backoff(0), Duration::from_millis(100));
	assert_eq!(policy.backoff(3), Duration::from_millis(800));
	assert_eq!(policy.backoff(40), Duration::from_secs(30));
}
