//! The worker thread and its handle.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tally_rpc::{Reply, Request};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Action, EngineLoader, LedgerEngine};

/// One running worker context.
///
/// Owns the request sender, the (takeable) reply receiver and the
/// cancellation token of a single worker. Terminating or dropping the
/// context cancels the worker; a call already executing inside the engine
/// runs to completion but its reply is never sent.
#[derive(Debug)]
pub struct WorkerContext {
	generation: u64,
	requests: mpsc::UnboundedSender<Request>,
	replies: Option<mpsc::UnboundedReceiver<Reply>>,
	cancel: CancellationToken,
	thread: Option<std::thread::JoinHandle<()>>,
}

impl WorkerContext {
	/// Spawns a dedicated thread that loads the engine and serves requests.
	///
	/// The thread posts exactly one lifecycle signal (`ready` or a boot
	/// error) before serving anything.
	///
	/// # Errors
	///
	/// Returns the OS error if the thread cannot be created.
	pub fn spawn_thread(generation: u64, name: &str, loader: Arc<dyn EngineLoader>) -> std::io::Result<Self> {
		let (req_tx, req_rx) = mpsc::unbounded_channel();
		let (reply_tx, reply_rx) = mpsc::unbounded_channel();
		let cancel = CancellationToken::new();
		let thread_cancel = cancel.clone();

		let thread = std::thread::Builder::new()
			.name(format!("{name}-{generation}"))
			.spawn(move || run_worker(generation, loader.as_ref(), req_rx, reply_tx, thread_cancel))?;
		debug!(generation, "worker.spawn");

		Ok(Self {
			generation,
			requests: req_tx,
			replies: Some(reply_rx),
			cancel,
			thread: Some(thread),
		})
	}

	/// Wraps externally driven channels as a worker context.
	///
	/// Used for workers that do not run on a thread owned by this crate,
	/// such as scripted workers in tests.
	pub fn from_channels(generation: u64, requests: mpsc::UnboundedSender<Request>, replies: mpsc::UnboundedReceiver<Reply>, cancel: CancellationToken) -> Self {
		Self {
			generation,
			requests,
			replies: Some(replies),
			cancel,
			thread: None,
		}
	}

	/// Spawn generation of this context.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Sender for outbound envelopes.
	pub fn requests(&self) -> mpsc::UnboundedSender<Request> {
		self.requests.clone()
	}

	/// Takes the inbound envelope receiver. Returns `None` after the first call.
	pub fn take_replies(&mut self) -> Option<mpsc::UnboundedReceiver<Reply>> {
		self.replies.take()
	}

	/// Returns `true` once the context was terminated.
	pub fn is_terminated(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Cancels the worker. The thread is detached, not joined.
	pub fn terminate(&mut self) {
		if !self.cancel.is_cancelled() {
			debug!(generation = self.generation, "worker.terminate");
		}
		self.cancel.cancel();
		self.thread.take();
	}
}

impl Drop for WorkerContext {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

fn run_worker(
	generation: u64,
	loader: &dyn EngineLoader,
	mut requests: mpsc::UnboundedReceiver<Request>,
	replies: mpsc::UnboundedSender<Reply>,
	cancel: CancellationToken,
) {
	let runtime = match tokio::runtime::Builder::new_current_thread().build() {
		Ok(rt) => rt,
		Err(e) => {
			let _ = replies.send(Reply::boot_error(format!("failed to start worker runtime: {e}")));
			return;
		}
	};

	let mut engine = match catch_unwind(AssertUnwindSafe(|| loader.load())) {
		Ok(Ok(engine)) => engine,
		Ok(Err(message)) => {
			warn!(generation, error = %message, "worker.boot_failed");
			let _ = replies.send(Reply::boot_error(message));
			return;
		}
		Err(payload) => {
			let message = format!("engine panicked while loading: {}", panic_message(payload.as_ref()));
			warn!(generation, error = %message, "worker.boot_failed");
			let _ = replies.send(Reply::boot_error(message));
			return;
		}
	};

	if cancel.is_cancelled() {
		return;
	}
	let version = engine.version();
	info!(generation, %version, "worker.ready");
	if replies.send(Reply::ready(version)).is_err() {
		return;
	}

	runtime.block_on(async {
		loop {
			let req = tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				req = requests.recv() => match req {
					Some(req) => req,
					None => break,
				},
			};
			let Some(reply) = handle_request(engine.as_mut(), &req) else {
				continue;
			};
			if cancel.is_cancelled() || replies.send(reply).is_err() {
				break;
			}
		}
	});
	debug!(generation, "worker.exit");
}

fn handle_request(engine: &mut dyn LedgerEngine, req: &Request) -> Option<Reply> {
	let Some(id) = req.id else {
		warn!(action = %req.action, "worker.request.uncorrelated");
		return None;
	};

	let outcome = Action::from_request(req).and_then(|action| match catch_unwind(AssertUnwindSafe(|| engine.execute(&action))) {
		Ok(result) => result,
		Err(payload) => Err(format!("engine panicked: {}", panic_message(payload.as_ref()))),
	});

	Some(match outcome {
		Ok(value) => Reply::result(id, value),
		Err(message) => Reply::error(id, message),
	})
}

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&'static str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
