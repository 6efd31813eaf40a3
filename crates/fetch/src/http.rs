//! HTTP seam: request/response values and the `reqwest` implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future returned by [`HttpFetch::get`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchResponse>> + Send + 'a>>;

/// A GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub timeout: Duration,
}

impl FetchRequest {
	pub fn get(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			headers: Vec::new(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

/// A response of any status. Non-success statuses are data here; the retry
/// layer decides what they mean.
#[derive(Debug, Clone)]
pub struct FetchResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: String,
}

impl FetchResponse {
	pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: body.into(),
		}
	}

	/// Adds a header, ignoring names or values that are not valid HTTP.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Decodes the body as JSON.
	pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
		serde_json::from_str(&self.body).map_err(|e| Error::Decode {
			url: url.to_string(),
			message: e.to_string(),
		})
	}
}

/// Issues one HTTP GET. Implementations do not retry.
pub trait HttpFetch: Send + Sync {
	fn get<'a>(&'a self, request: &'a FetchRequest) -> FetchFuture<'a>;
}

/// [`HttpFetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
	client: Client,
}

impl ReqwestFetcher {
	pub fn new() -> Result<Self> {
		let client = Client::builder()
			.timeout(DEFAULT_TIMEOUT)
			.build()
			.map_err(|e| Error::Client(e.to_string()))?;
		Ok(Self { client })
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

impl HttpFetch for ReqwestFetcher {
	fn get<'a>(&'a self, request: &'a FetchRequest) -> FetchFuture<'a> {
		Box::pin(async move {
			let transport = |e: reqwest::Error| Error::Transport {
				url: request.url.clone(),
				message: e.to_string(),
			};

			let mut builder = self
				.client
				.get(&request.url)
				.header(USER_AGENT, concat!("tally/", env!("CARGO_PKG_VERSION")))
				.timeout(request.timeout);
			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.send().await.map_err(transport)?;
			let status = response.status();
			let headers = response.headers().clone();
			let body = response.text().await.map_err(transport)?;
			Ok(FetchResponse { status, headers, body })
		})
	}
}
