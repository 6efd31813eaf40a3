//! Engine status indicator.

use tokio::sync::watch;

/// What the status badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineStatus {
	#[default]
	Loading,
	Ready,
	/// A validation is in flight.
	Checking,
	Error,
	UpdateAvailable,
}

impl EngineStatus {
	pub const fn label(self) -> &'static str {
		match self {
			Self::Loading => "loading",
			Self::Ready => "ready",
			Self::Checking => "checking",
			Self::Error => "error",
			Self::UpdateAvailable => "update-available",
		}
	}
}

impl std::fmt::Display for EngineStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.label())
	}
}

/// Broadcasts [`EngineStatus`] changes to any number of observers.
#[derive(Debug)]
pub struct StatusIndicator {
	tx: watch::Sender<EngineStatus>,
}

impl Default for StatusIndicator {
	fn default() -> Self {
		Self::new()
	}
}

impl StatusIndicator {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(EngineStatus::Loading);
		Self { tx }
	}

	pub fn get(&self) -> EngineStatus {
		*self.tx.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
		self.tx.subscribe()
	}

	/// Sets the status. `UpdateAvailable` is sticky: only a reload clears it.
	pub fn set(&self, status: EngineStatus) {
		self.tx.send_if_modified(|current| {
			if *current == status || *current == EngineStatus::UpdateAvailable {
				return false;
			}
			*current = status;
			true
		});
	}

	pub fn mark_update_available(&self) {
		self.tx.send_replace(EngineStatus::UpdateAvailable);
	}
}
