//! Shared fixtures: an in-runtime fake worker and playground builders.
//!
//! The fake worker runs as a tokio task rather than an OS thread so tests can
//! use paused virtual time for debounces and engine latency.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tally_editor::{Playground, PlaygroundConfig};
use tally_engine::EngineClient;
use tally_rpc::{Reply, Request};
use tally_worker::{Action, LedgerEngine, WorkerContext, WorkerSpawner};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Deterministic stand-in for the ledger engine.
///
/// * `validate`: every line containing `ERR` is an error on that line;
///   `ERR@N` reports line `N` instead.
/// * `format`: trims trailing whitespace; `BROKEN` yields a format error.
/// * `query`: `rows N` returns `N` rows; `fail` returns a query error.
/// * `completions`: a fixed keyword list.
pub struct FakeLedger;

impl LedgerEngine for FakeLedger {
	fn version(&self) -> String {
		"fake-1.0".to_string()
	}

	fn validate(&mut self, source: &str) -> Result<Value, String> {
		let errors: Vec<Value> = source
			.lines()
			.enumerate()
			.filter_map(|(i, line)| {
				let at = line.find("ERR")?;
				let explicit = line[at + 3..]
					.strip_prefix('@')
					.and_then(|rest| rest.split_whitespace().next())
					.and_then(|n| n.parse::<i64>().ok());
				let n = explicit.unwrap_or(i as i64 + 1);
				Some(json!({ "line": n.max(0), "message": format!("error on line {n}") }))
			})
			.collect();
		Ok(json!({ "valid": errors.is_empty(), "errors": errors }))
	}

	fn format(&mut self, source: &str) -> Result<Value, String> {
		if source.contains("BROKEN") {
			return Ok(json!({ "errors": [{ "line": 1, "message": "cannot format" }] }));
		}
		let formatted: Vec<&str> = source.lines().map(str::trim_end).collect();
		Ok(json!({ "formatted": formatted.join("\n") }))
	}

	fn query(&mut self, _source: &str, query: &str) -> Result<Value, String> {
		if query.contains("fail") {
			return Ok(json!({ "rows": [], "error": "syntax error near 'fail'" }));
		}
		let n: usize = query
			.split_whitespace()
			.skip_while(|w| *w != "rows")
			.nth(1)
			.and_then(|n| n.parse().ok())
			.unwrap_or(0);
		let rows: Vec<Value> = (1..=n)
			.map(|i| json!([i, format!("tag:{query}"), { "number": "1.00", "currency": "USD" }]))
			.collect();
		Ok(json!({ "columns": ["n", "query", "amount"], "rows": rows }))
	}

	fn completions(&mut self, _source: &str, _position: usize) -> Result<Value, String> {
		Ok(json!({
			"completions": [
				{ "label": "SELECT", "type": "keyword" },
				{ "label": "sum", "type": "function", "insertText": "sum(" },
				{ "label": "sort", "type": "keyword" },
				{ "label": "account", "type": "column" },
			]
		}))
	}
}

/// Artificial latency: `slow:N` anywhere in the payload delays by `N` ms.
fn latency(payload: &Value) -> Duration {
	let text = payload.to_string();
	text.find("slow:")
		.and_then(|at| {
			let digits: String = text[at + 5..].chars().take_while(char::is_ascii_digit).collect();
			digits.parse().ok()
		})
		.map_or(Duration::ZERO, Duration::from_millis)
}

/// Spawns fake workers as tokio tasks.
#[derive(Default)]
pub struct FakeSpawner {
	boots: Mutex<VecDeque<Result<(), String>>>,
	generations: AtomicU64,
	/// Requests served across all workers.
	pub served: Arc<AtomicUsize>,
}

impl FakeSpawner {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Boot outcomes for the next spawns, in order; later spawns succeed.
	pub fn with_boots(boots: impl IntoIterator<Item = Result<(), String>>) -> Arc<Self> {
		Arc::new(Self {
			boots: Mutex::new(boots.into_iter().collect()),
			..Self::default()
		})
	}

	pub fn spawned(&self) -> u64 {
		self.generations.load(Ordering::SeqCst)
	}
}

impl WorkerSpawner for FakeSpawner {
	fn spawn(&self) -> std::io::Result<WorkerContext> {
		let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
		let boot = self.boots.lock().pop_front().unwrap_or(Ok(()));
		let (req_tx, req_rx) = mpsc::unbounded_channel();
		let (reply_tx, reply_rx) = mpsc::unbounded_channel();
		let cancel = CancellationToken::new();
		tokio::spawn(serve(boot, req_rx, reply_tx, cancel.clone(), Arc::clone(&self.served)));
		Ok(WorkerContext::from_channels(generation, req_tx, reply_rx, cancel))
	}
}

async fn serve(
	boot: Result<(), String>,
	mut requests: mpsc::UnboundedReceiver<Request>,
	replies: mpsc::UnboundedSender<Reply>,
	cancel: CancellationToken,
	served: Arc<AtomicUsize>,
) {
	let mut engine = FakeLedger;
	match boot {
		Ok(()) => {
			let _ = replies.send(Reply::ready(engine.version()));
		}
		Err(message) => {
			let _ = replies.send(Reply::boot_error(message));
			return;
		}
	}

	loop {
		let req = tokio::select! {
			_ = cancel.cancelled() => return,
			req = requests.recv() => match req {
				Some(req) => req,
				None => return,
			},
		};
		let Some(id) = req.id else { continue };
		tokio::select! {
			_ = cancel.cancelled() => return,
			_ = tokio::time::sleep(latency(&req.payload)) => {}
		}
		let reply = match Action::from_request(&req).and_then(|action| engine.execute(&action)) {
			Ok(value) => Reply::result(id, value),
			Err(message) => Reply::error(id, message),
		};
		served.fetch_add(1, Ordering::SeqCst);
		if replies.send(reply).is_err() {
			return;
		}
	}
}

pub fn config() -> PlaygroundConfig {
	PlaygroundConfig::default()
}

/// A playground over a fresh fake engine, not yet started.
pub fn playground(spawner: &Arc<FakeSpawner>, source: &str) -> Arc<Playground> {
	let config = config();
	let engine = Arc::new(EngineClient::new(config.engine.clone(), Arc::clone(spawner) as Arc<dyn WorkerSpawner>));
	Playground::new(engine, &config, source)
}

/// A started playground; the initial validation has been applied.
pub async fn started(source: &str) -> (Arc<Playground>, Arc<FakeSpawner>) {
	let spawner = FakeSpawner::new();
	let pg = playground(&spawner, source);
	pg.start().await;
	(pg, spawner)
}

/// Lets spawned tasks and timers run for `ms` of virtual time.
pub async fn advance(ms: u64) {
	tokio::time::sleep(Duration::from_millis(ms)).await;
}
