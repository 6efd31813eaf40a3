//! Auxiliary HTTP fetches for the playground chrome.
//!
//! Release and repository metadata is nice to have, never required: callers
//! use [`fetch_with_retry`] and fall back to a placeholder when it fails.
//! * [`HttpFetch`]: the seam between retry logic and the network
//! * [`ReqwestFetcher`]: the production [`HttpFetch`]
//! * [`MetadataCache`]: TTL-bounded LRU for decoded results

#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod cache;
pub mod error;
pub mod http;
pub mod retry;

pub use cache::MetadataCache;
pub use error::{Error, Result};
pub use http::{FetchRequest, FetchResponse, HttpFetch, ReqwestFetcher};
pub use retry::{RetryPolicy, fetch_with_retry, server_delay};
