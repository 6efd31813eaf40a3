//! Request/response channel over the worker message boundary.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::pending::PendingTable;
use crate::protocol::{Inbound, Lifecycle, Reply, Request};
use crate::{Error, Result};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

struct Shared {
	pending: PendingTable,
	outbound: mpsc::UnboundedSender<Request>,
	timeout: Duration,
}

/// Correlated request/response channel to one worker.
///
/// Cloning is cheap; all clones share one pending table. Outbound envelopes
/// go to the worker through `outbound`; inbound envelopes are fed back either
/// by [`Transport::spawn_pump`] or directly through [`Transport::dispatch`].
#[derive(Clone)]
pub struct Transport {
	shared: Arc<Shared>,
}

impl std::fmt::Debug for Transport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Transport")
			.field("pending", &self.shared.pending.len())
			.field("closed", &self.shared.pending.is_closed())
			.field("timeout", &self.shared.timeout)
			.finish()
	}
}

impl Transport {
	/// Creates a transport writing envelopes to `outbound`.
	pub fn new(outbound: mpsc::UnboundedSender<Request>, timeout: Duration) -> Self {
		Self {
			shared: Arc::new(Shared {
				pending: PendingTable::new(),
				outbound,
				timeout,
			}),
		}
	}

	/// Sends `method` with `payload` and waits for the correlated reply.
	///
	/// # Errors
	///
	/// - [`Error::Closed`] if the transport was already closed.
	/// - [`Error::WorkerGone`] if the worker side dropped its receiver.
	/// - [`Error::Terminated`] if the transport closed while waiting.
	/// - [`Error::Timeout`] if no reply arrived in time.
	/// - [`Error::Remote`] if the worker replied with an error.
	pub async fn send(&self, method: &str, payload: Value) -> Result<Value> {
		let (id, rx) = self.shared.pending.register()?;
		trace!(id, method, "rpc.send");

		if self.shared.outbound.send(Request::new(id, method, payload)).is_err() {
			self.shared.pending.remove(id);
			return Err(Error::WorkerGone);
		}

		match tokio::time::timeout(self.shared.timeout, rx).await {
			Ok(Ok(outcome)) => outcome,
			// Responder dropped without an answer: only teardown does that.
			Ok(Err(_)) => Err(Error::Terminated),
			Err(_) => {
				self.shared.pending.remove(id);
				warn!(id, method, timeout_ms = self.shared.timeout.as_millis() as u64, "rpc.timeout");
				Err(Error::Timeout {
					method: method.to_string(),
					after: self.shared.timeout,
				})
			}
		}
	}

	/// Routes one inbound envelope.
	///
	/// Completions resolve their pending entry; entries that no longer exist
	/// are dropped. Lifecycle signals are returned to the caller.
	pub fn dispatch(&self, reply: Reply) -> Option<Lifecycle> {
		match reply.classify() {
			Inbound::Lifecycle(signal) => Some(signal),
			Inbound::Completion { id, outcome } => {
				let outcome = outcome.map_err(Error::Remote);
				if !self.shared.pending.complete(id, outcome) {
					trace!(id, "rpc.reply.unmatched");
				}
				None
			}
			Inbound::Malformed { id, kind } => {
				warn!(?id, ?kind, "rpc.reply.malformed");
				None
			}
		}
	}

	/// Spawns the reader pump.
	///
	/// The pump feeds every envelope from `inbound` through
	/// [`dispatch`](Self::dispatch) and forwards lifecycle signals to
	/// `lifecycle`. When `inbound` closes, all outstanding requests are
	/// rejected with [`Error::WorkerGone`].
	pub fn spawn_pump(&self, mut inbound: mpsc::UnboundedReceiver<Reply>, lifecycle: mpsc::UnboundedSender<Lifecycle>) -> JoinHandle<()> {
		let this = self.clone();
		tokio::spawn(async move {
			while let Some(reply) = inbound.recv().await {
				if let Some(signal) = this.dispatch(reply) {
					// The engine client may have stopped listening.
					let _ = lifecycle.send(signal);
				}
			}
			let rejected = this.shared.pending.fail_all(Error::WorkerGone);
			debug!(rejected, "rpc.pump.closed");
		})
	}

	/// Closes the transport, rejecting outstanding requests with
	/// [`Error::Terminated`].
	///
	/// Returns the number of requests rejected.
	pub fn close(&self) -> usize {
		let rejected = self.shared.pending.fail_all(Error::Terminated);
		debug!(rejected, "rpc.close");
		rejected
	}

	/// Returns `true` once the transport has been closed.
	pub fn is_closed(&self) -> bool {
		self.shared.pending.is_closed()
	}

	/// Number of requests awaiting a reply.
	pub fn pending(&self) -> usize {
		self.shared.pending.len()
	}

	/// Returns `true` if both handles share one pending table.
	pub fn same_channel(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}
}
