//! Hover tooltip for error lines.

use std::time::{Duration, Instant};

/// Visibility phase of the tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipPhase {
	Hidden,
	/// Pointer is over an error line.
	Shown,
	/// Pointer left; the tooltip stays fully visible until `fade_at`.
	Holding { fade_at: Instant },
	/// Fading out; gone at `hidden_at`.
	Fading { hidden_at: Instant },
}

/// Tooltip state machine driven by explicit instants.
///
/// Entering shows the message at once and cancels any pending fade. Leaving
/// holds the tooltip, then fades it rather than removing it instantly.
#[derive(Debug, Clone)]
pub struct Tooltip {
	message: Option<String>,
	phase: TooltipPhase,
	hold: Duration,
	fade: Duration,
}

impl Tooltip {
	pub fn new(hold: Duration, fade: Duration) -> Self {
		Self {
			message: None,
			phase: TooltipPhase::Hidden,
			hold,
			fade,
		}
	}

	pub const fn phase(&self) -> TooltipPhase {
		self.phase
	}

	/// Message currently on screen, including while holding or fading.
	pub fn message(&self) -> Option<&str> {
		match self.phase {
			TooltipPhase::Hidden => None,
			_ => self.message.as_deref(),
		}
	}

	/// Pointer entered a line with `message`.
	///
	/// Returns `true` if the displayed text changed.
	pub fn hover_enter(&mut self, message: &str, _now: Instant) -> bool {
		let changed = self.message() != Some(message);
		if changed {
			self.message = Some(message.to_string());
		}
		self.phase = TooltipPhase::Shown;
		changed
	}

	/// Pointer left the error line.
	pub fn hover_exit(&mut self, now: Instant) {
		if self.phase == TooltipPhase::Shown {
			self.phase = TooltipPhase::Holding { fade_at: now + self.hold };
		}
	}

	/// Advances hold and fade timers.
	pub fn tick(&mut self, now: Instant) {
		if let TooltipPhase::Holding { fade_at } = self.phase
			&& now >= fade_at
		{
			self.phase = TooltipPhase::Fading {
				hidden_at: fade_at + self.fade,
			};
		}
		if let TooltipPhase::Fading { hidden_at } = self.phase
			&& now >= hidden_at
		{
			self.phase = TooltipPhase::Hidden;
			self.message = None;
		}
	}

	/// Opacity in `0.0..=1.0` at `now`.
	pub fn opacity(&self, now: Instant) -> f32 {
		match self.phase {
			TooltipPhase::Hidden => 0.0,
			TooltipPhase::Shown | TooltipPhase::Holding { .. } => 1.0,
			TooltipPhase::Fading { hidden_at } => {
				if self.fade.is_zero() {
					return 0.0;
				}
				let left = hidden_at.saturating_duration_since(now);
				(left.as_secs_f32() / self.fade.as_secs_f32()).clamp(0.0, 1.0)
			}
		}
	}
}
