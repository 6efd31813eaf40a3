//! Worker creation seam used by the engine client.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{EngineLoader, WorkerContext};

/// Creates fresh worker contexts.
///
/// The engine client calls this once per boot attempt; every attempt gets a
/// brand-new context.
pub trait WorkerSpawner: Send + Sync + 'static {
	/// Creates and starts one worker context.
	///
	/// # Errors
	///
	/// Returns the OS error when no worker can be created at all.
	fn spawn(&self) -> std::io::Result<WorkerContext>;
}

/// Spawns each worker on its own named OS thread.
pub struct ThreadSpawner {
	name: String,
	loader: Arc<dyn EngineLoader>,
	generations: AtomicU64,
}

impl std::fmt::Debug for ThreadSpawner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ThreadSpawner")
			.field("name", &self.name)
			.field("generations", &self.generations.load(Ordering::Relaxed))
			.finish_non_exhaustive()
	}
}

impl ThreadSpawner {
	/// Creates a spawner whose threads are named `{name}-{generation}`.
	pub fn new(name: impl Into<String>, loader: impl EngineLoader) -> Self {
		Self {
			name: name.into(),
			loader: Arc::new(loader),
			generations: AtomicU64::new(0),
		}
	}
}

impl WorkerSpawner for ThreadSpawner {
	fn spawn(&self) -> std::io::Result<WorkerContext> {
		let generation = self.generations.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
		WorkerContext::spawn_thread(generation, &self.name, Arc::clone(&self.loader))
	}
}
