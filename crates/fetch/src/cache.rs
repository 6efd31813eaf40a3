//! Ephemeral metadata cache.
//!
//! Entries expire after a fixed TTL and the least recently used entry is
//! evicted at capacity. Nothing is persisted.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::error::Result;

#[derive(Debug)]
struct Entry<V> {
	value: V,
	expires_at: Instant,
}

/// TTL-bounded LRU keyed by string (usually the request URL).
#[derive(Debug)]
pub struct MetadataCache<V> {
	entries: Mutex<LruCache<String, Entry<V>>>,
	ttl: Duration,
}

impl<V: Clone> MetadataCache<V> {
	/// A capacity of zero is treated as one.
	pub fn new(capacity: usize, ttl: Duration) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		Self {
			entries: Mutex::new(LruCache::new(capacity)),
			ttl,
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns a live entry, dropping it if it has expired.
	pub fn get(&self, key: &str) -> Option<V> {
		let mut entries = self.entries.lock();
		let expired = entries.get(key).map(|entry| entry.expires_at <= Instant::now())?;
		if expired {
			trace!(key, "fetch.cache.expired");
			entries.pop(key);
			return None;
		}
		entries.get(key).map(|entry| entry.value.clone())
	}

	pub fn insert(&self, key: impl Into<String>, value: V) {
		let entry = Entry {
			value,
			expires_at: Instant::now() + self.ttl,
		};
		self.entries.lock().put(key.into(), entry);
	}

	/// Returns the cached value or runs `fetch` and caches its success.
	///
	/// Failures are not cached, so the next call tries again.
	pub async fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<V>
	where
		F: Future<Output = Result<V>>,
	{
		if let Some(value) = self.get(key) {
			return Ok(value);
		}
		let value = fetch.await?;
		self.insert(key, value.clone());
		Ok(value)
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}
}
