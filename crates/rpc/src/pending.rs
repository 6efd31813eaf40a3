//! Outstanding request table.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::protocol::CounterIdGen;
use crate::{Error, Result};

type Responder = oneshot::Sender<Result<Value>>;

#[derive(Debug, Default)]
struct TableState {
	ids: CounterIdGen,
	entries: HashMap<u64, Responder>,
	closed: bool,
}

/// Outstanding calls keyed by correlation ID.
///
/// ID allocation, insertion and teardown share one lock, so a [`fail_all`]
/// racing a [`register`] either sees the new entry and rejects it, or the
/// registration observes the closed flag and fails immediately. No entry can
/// be left behind unresolved.
///
/// [`fail_all`]: PendingTable::fail_all
/// [`register`]: PendingTable::register
#[derive(Debug, Default)]
pub struct PendingTable {
	state: Mutex<TableState>,
}

impl PendingTable {
	/// Creates an empty, open table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocates a fresh correlation ID and registers a responder for it.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] once the table has been torn down.
	pub fn register(&self) -> Result<(u64, oneshot::Receiver<Result<Value>>)> {
		let mut state = self.state.lock();
		if state.closed {
			return Err(Error::Closed);
		}
		let id = state.ids.next();
		let (tx, rx) = oneshot::channel();
		if state.entries.insert(id, tx).is_some() {
			return Err(Error::DuplicateId(id));
		}
		Ok((id, rx))
	}

	/// Removes the entry for `id` and delivers `outcome` to its waiter.
	///
	/// Returns `false` when no entry matched (already completed, timed out,
	/// or drained by teardown).
	pub fn complete(&self, id: u64, outcome: Result<Value>) -> bool {
		let Some(tx) = self.state.lock().entries.remove(&id) else {
			return false;
		};
		// The waiter may have been dropped.
		let _ = tx.send(outcome);
		true
	}

	/// Drops the entry for `id` without resolving it.
	pub fn remove(&self, id: u64) -> bool {
		self.state.lock().entries.remove(&id).is_some()
	}

	/// Rejects every outstanding entry with `error` and closes the table.
	///
	/// Returns the number of entries rejected.
	pub fn fail_all(&self, error: Error) -> usize {
		let drained: Vec<_> = {
			let mut state = self.state.lock();
			state.closed = true;
			state.entries.drain().collect()
		};
		let count = drained.len();
		for (_, tx) in drained {
			let _ = tx.send(Err(error.clone()));
		}
		count
	}

	/// Number of outstanding entries.
	pub fn len(&self) -> usize {
		self.state.lock().entries.len()
	}

	/// Returns `true` when nothing is outstanding.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns `true` once [`fail_all`](Self::fail_all) has run.
	pub fn is_closed(&self) -> bool {
		self.state.lock().closed
	}
}
