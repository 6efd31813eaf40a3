//! Resettable debounce timers.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

/// Runs a job once input has been quiet for `delay`.
///
/// Each [`schedule`](Self::schedule) aborts the previously scheduled timer,
/// so only the last job of a burst fires. Once the timer elapses the job is
/// detached onto its own task; later schedules no longer affect it.
#[derive(Debug)]
pub struct Debouncer {
	name: &'static str,
	delay: Duration,
	timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
	pub fn new(name: &'static str, delay: Duration) -> Self {
		Self {
			name,
			delay,
			timer: Mutex::new(None),
		}
	}

	pub const fn delay(&self) -> Duration {
		self.delay
	}

	/// Resets the timer and arms it with `job`.
	pub fn schedule<F>(&self, job: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let delay = self.delay;
		let name = self.name;
		let timer = tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			trace!(debouncer = name, "debounce.fire");
			tokio::spawn(job);
		});
		if let Some(previous) = self.timer.lock().replace(timer) {
			previous.abort();
		}
	}

	/// Disarms the pending timer, if any.
	pub fn cancel(&self) {
		if let Some(timer) = self.timer.lock().take() {
			timer.abort();
		}
	}

	/// Returns `true` while a timer is armed and has not fired.
	pub fn is_pending(&self) -> bool {
		self.timer.lock().as_ref().is_some_and(|t| !t.is_finished())
	}
}

impl Drop for Debouncer {
	fn drop(&mut self) {
		self.cancel();
	}
}
