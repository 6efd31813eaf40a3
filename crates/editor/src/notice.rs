//! User-facing notices: the blocking error modal and transient toasts.

use std::collections::VecDeque;

use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
	/// Blocking modal for fatal engine failures.
	Modal { title: String, message: String },
	/// Transient confirmation ("Copied", "Formatted").
	Toast { message: String },
}

impl Notice {
	pub fn modal(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Modal {
			title: title.into(),
			message: message.into(),
		}
	}

	pub fn toast(message: impl Into<String>) -> Self {
		Self::Toast { message: message.into() }
	}
}

/// FIFO of notices waiting to be shown.
#[derive(Debug, Default)]
pub struct NoticeQueue {
	queue: Mutex<VecDeque<Notice>>,
}

impl NoticeQueue {
	pub fn push(&self, notice: Notice) {
		self.queue.lock().push_back(notice);
	}

	/// Takes every queued notice, oldest first.
	pub fn drain(&self) -> Vec<Notice> {
		self.queue.lock().drain(..).collect()
	}

	pub fn len(&self) -> usize {
		self.queue.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.queue.lock().is_empty()
	}
}
