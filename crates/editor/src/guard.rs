//! Generation-stamped staleness guards.
//!
//! Each asynchronous operation family (validation, query, query-input
//! completions) owns one [`StalenessGuard`]. Starting an operation bumps the
//! family counter and captures a [`Stamp`]; when the operation resolves, its
//! result is applied only if the stamp still equals the counter. In-flight
//! work is never aborted, its result is simply dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Captured family counter value for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp(u64);

impl Stamp {
	pub const fn get(self) -> u64 {
		self.0
	}
}

/// Per-family monotonic counter. Clones share the counter.
#[derive(Debug, Clone)]
pub struct StalenessGuard {
	family: &'static str,
	counter: Arc<AtomicU64>,
}

impl StalenessGuard {
	pub fn new(family: &'static str) -> Self {
		Self {
			family,
			counter: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Family name used in log events.
	pub const fn family(&self) -> &'static str {
		self.family
	}

	/// Starts a new invocation, superseding every earlier stamp.
	pub fn begin(&self) -> Stamp {
		Stamp(self.counter.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
	}

	/// Returns `true` if no newer invocation has started since `stamp`.
	pub fn is_current(&self, stamp: Stamp) -> bool {
		self.counter.load(Ordering::Acquire) == stamp.0
	}

	/// Supersedes all outstanding stamps without starting new work.
	pub fn invalidate(&self) {
		self.counter.fetch_add(1, Ordering::AcqRel);
	}

	/// Passes `value` through if `stamp` is still current.
	pub fn accept<T>(&self, stamp: Stamp, value: T) -> Option<T> {
		if self.is_current(stamp) {
			return Some(value);
		}
		debug!(
			family = self.family,
			stamp = stamp.0,
			current = self.counter.load(Ordering::Relaxed),
			"guard.stale"
		);
		None
	}

	/// Runs `fut` under a fresh stamp and returns its output only if no newer
	/// invocation started while it was pending.
	pub async fn dispatch<F: Future>(&self, fut: F) -> Option<F::Output> {
		let stamp = self.begin();
		let output = fut.await;
		self.accept(stamp, output)
	}
}
