//! Engine client: worker lifecycle plus typed engine calls.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tally_rpc::{Lifecycle, Transport};
use tally_worker::{Action, WorkerContext, WorkerSpawner};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::types::CompletionList;
use crate::{BootFailure, Completion, EngineConfig, Error, FormatResult, QueryResult, Result, ValidationResult};

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	/// Never booted, or terminated.
	Uninitialized,
	/// A boot is in progress (including retry backoff).
	Booting,
	/// The engine accepts calls.
	Ready,
	/// The last boot failed for good, or the worker was lost.
	Failed,
}

struct Connection {
	worker: WorkerContext,
	transport: Transport,
	pump: JoinHandle<()>,
}

impl Connection {
	fn shutdown(mut self) -> usize {
		let rejected = self.transport.close();
		self.worker.terminate();
		self.pump.abort();
		rejected
	}
}

/// Typed, lifecycle-managed handle to the ledger engine.
///
/// Construct one per playground and share it by `Arc`. At most one worker
/// exists per client at a time.
pub struct EngineClient {
	config: EngineConfig,
	spawner: Arc<dyn WorkerSpawner>,
	connection: Mutex<Option<Connection>>,
	version: Mutex<Option<String>>,
	/// Serialises `boot` calls.
	lifecycle: tokio::sync::Mutex<()>,
	state: watch::Sender<EngineState>,
	/// Bumped by every `terminate`; a boot that sees it move abandons itself.
	epoch: watch::Sender<u64>,
}

impl std::fmt::Debug for EngineClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EngineClient")
			.field("state", &self.state())
			.field("version", &*self.version.lock())
			.finish_non_exhaustive()
	}
}

impl EngineClient {
	/// Creates an unbooted client.
	pub fn new(config: EngineConfig, spawner: Arc<dyn WorkerSpawner>) -> Self {
		let (state, _) = watch::channel(EngineState::Uninitialized);
		let (epoch, _) = watch::channel(0);
		Self {
			config,
			spawner,
			connection: Mutex::new(None),
			version: Mutex::new(None),
			lifecycle: tokio::sync::Mutex::new(()),
			state,
			epoch,
		}
	}

	/// Current lifecycle state.
	pub fn state(&self) -> EngineState {
		*self.state.borrow()
	}

	/// Subscribes to lifecycle changes.
	pub fn subscribe(&self) -> watch::Receiver<EngineState> {
		self.state.subscribe()
	}

	/// Returns `true` when calls will reach the engine.
	pub fn is_ready(&self) -> bool {
		self.state() == EngineState::Ready
	}

	/// Version string from the last `ready` signal.
	pub fn version(&self) -> Option<String> {
		self.version.lock().clone()
	}

	/// Lifecycle and transport settings this client was built with.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Boots the engine, retrying transient failures with exponential backoff.
	///
	/// Returns the engine version. Booting an already ready engine is a no-op;
	/// concurrent boots wait for the one in progress.
	///
	/// # Errors
	///
	/// Returns [`Error::Boot`] for a non-retryable failure, or for the last
	/// transient failure once the retry budget is spent. A [`terminate`]
	/// issued while booting abandons the boot with
	/// [`tally_rpc::Error::Terminated`] and leaves the engine uninitialized.
	///
	/// [`terminate`]: Self::terminate
	pub async fn boot(&self) -> Result<String> {
		let _lifecycle = self.lifecycle.lock().await;
		if self.is_ready()
			&& let Some(version) = self.version()
		{
			return Ok(version);
		}

		let mut terminated = self.epoch.subscribe();
		let epoch = *terminated.borrow_and_update();
		self.state.send_replace(EngineState::Booting);
		let policy = self.config.retry_policy();
		let mut attempt = 0u32;

		loop {
			let outcome = self.boot_once(&mut terminated).await;
			if self.terminated_since(epoch) {
				if let Ok((connection, _)) = outcome {
					connection.shutdown();
				}
				return Err(self.boot_abandoned(attempt));
			}

			match outcome {
				Ok((connection, version)) => {
					let mut slot = self.connection.lock();
					// Checked under the lock so a concurrent terminate cannot slip in.
					if self.terminated_since(epoch) {
						drop(slot);
						connection.shutdown();
						return Err(self.boot_abandoned(attempt));
					}
					if let Some(stale) = slot.replace(connection) {
						stale.shutdown();
					}
					*self.version.lock() = Some(version.clone());
					self.state.send_replace(EngineState::Ready);
					drop(slot);
					info!(%version, attempt, "engine.ready");
					return Ok(version);
				}
				Err(failure) if failure.is_retryable() && policy.allows(attempt) => {
					let delay = policy.delay(attempt);
					warn!(attempt, delay_ms = delay.as_millis() as u64, error = failure.detail(), "engine.boot.retry");
					tokio::select! {
						_ = tokio::time::sleep(delay) => {}
						_ = terminated.changed() => {}
					}
					if self.terminated_since(epoch) {
						return Err(self.boot_abandoned(attempt));
					}
					attempt += 1;
				}
				Err(failure) => {
					error!(attempt, retryable = failure.is_retryable(), error = failure.detail(), "engine.boot.failed");
					self.state.send_replace(EngineState::Failed);
					return Err(Error::Boot(failure));
				}
			}
		}
	}

	fn terminated_since(&self, epoch: u64) -> bool {
		*self.epoch.borrow() != epoch
	}

	fn boot_abandoned(&self, attempt: u32) -> Error {
		info!(attempt, "engine.boot.abandoned");
		Error::Transport(tally_rpc::Error::Terminated)
	}

	/// One boot attempt on a brand-new worker context.
	///
	/// Gives up early, tearing the context down, when `terminated` changes.
	async fn boot_once(&self, terminated: &mut watch::Receiver<u64>) -> Result<(Connection, String), BootFailure> {
		let mut worker = self
			.spawner
			.spawn()
			.map_err(|e| BootFailure::transient(format!("failed to create worker: {e}")))?;
		let Some(replies) = worker.take_replies() else {
			worker.terminate();
			return Err(BootFailure::transient("worker reply channel unavailable"));
		};

		let transport = Transport::new(worker.requests(), self.config.request_timeout());
		let (lifecycle_tx, mut lifecycle_rx) = mpsc::unbounded_channel();
		let pump = transport.spawn_pump(replies, lifecycle_tx);
		let connection = Connection { worker, transport, pump };

		let timeout = self.config.boot_timeout();
		let signal = tokio::select! {
			signal = tokio::time::timeout(timeout, lifecycle_rx.recv()) => signal,
			_ = terminated.changed() => {
				connection.shutdown();
				return Err(BootFailure::transient("terminated while booting"));
			}
		};
		let outcome = match signal {
			Ok(Some(Lifecycle::Ready { version })) => Ok(version),
			Ok(Some(Lifecycle::BootError { message })) => Err(BootFailure::classify(message)),
			Ok(None) => Err(BootFailure::transient("worker exited before signalling readiness")),
			Err(_) => Err(BootFailure::timeout(timeout)),
		};

		match outcome {
			Ok(version) => Ok((connection, version)),
			Err(failure) => {
				debug!(generation = connection.worker.generation(), error = failure.detail(), "engine.boot.attempt_failed");
				connection.shutdown();
				Err(failure)
			}
		}
	}

	/// Destroys the worker and marks the engine not ready.
	///
	/// Outstanding calls are rejected with [`tally_rpc::Error::Terminated`];
	/// later calls are skipped until the next successful [`boot`](Self::boot).
	/// A boot in progress is abandoned.
	pub fn terminate(&self) {
		self.epoch.send_modify(|epoch| *epoch += 1);
		let mut slot = self.connection.lock();
		if let Some(connection) = slot.take() {
			let rejected = connection.shutdown();
			info!(rejected, "engine.terminate");
		}
		*self.version.lock() = None;
		self.state.send_replace(EngineState::Uninitialized);
	}

	fn transport(&self) -> Option<Transport> {
		if !self.is_ready() {
			return None;
		}
		self.connection.lock().as_ref().map(|c| c.transport.clone())
	}

	/// Runs one engine action.
	///
	/// Returns `Ok(None)` without contacting the worker when the engine is
	/// not ready.
	///
	/// # Errors
	///
	/// Transport failures and undecodable responses.
	pub async fn call<T: DeserializeOwned>(&self, action: Action) -> Result<Option<T>> {
		let Some(transport) = self.transport() else {
			trace!(action = action.name(), "engine.call.skipped");
			return Ok(None);
		};

		let (name, payload) = action.into_parts().map_err(tally_rpc::Error::from)?;
		let value = match transport.send(name, payload).await {
			Ok(value) => value,
			Err(e) => {
				if e == tally_rpc::Error::WorkerGone {
					self.worker_lost(&transport);
				}
				return Err(e.into());
			}
		};

		serde_json::from_value(value).map(Some).map_err(|e| Error::Decode {
			action: name.to_string(),
			reason: e.to_string(),
		})
	}

	/// Drops the connection if `transport` still belongs to it.
	fn worker_lost(&self, transport: &Transport) {
		let mut guard = self.connection.lock();
		if !guard.as_ref().is_some_and(|c| c.transport.same_channel(transport)) {
			return;
		}
		let connection = guard.take();
		drop(guard);
		if let Some(connection) = connection {
			connection.shutdown();
			*self.version.lock() = None;
			self.state.send_replace(EngineState::Failed);
			warn!("engine.worker_lost");
		}
	}

	/// `validate(source)`.
	pub async fn validate(&self, source: &str) -> Result<Option<ValidationResult>> {
		self.call(Action::Validate { source: source.to_string() }).await
	}

	/// `format(source)`.
	pub async fn format(&self, source: &str) -> Result<Option<FormatResult>> {
		self.call(Action::Format { source: source.to_string() }).await
	}

	/// `query(source, q)`.
	pub async fn query(&self, source: &str, query: &str) -> Result<Option<QueryResult>> {
		self.call(Action::Query {
			source: source.to_string(),
			query: query.to_string(),
		})
		.await
	}

	/// `completions(source, pos)`.
	pub async fn completions(&self, source: &str, position: usize) -> Result<Option<Vec<Completion>>> {
		let list: Option<CompletionList> = self
			.call(Action::Completions {
				source: source.to_string(),
				position,
			})
			.await?;
		Ok(list.map(|l| l.completions))
	}
}

impl Drop for EngineClient {
	fn drop(&mut self) {
		if let Some(connection) = self.connection.get_mut().take() {
			connection.shutdown();
		}
	}
}
