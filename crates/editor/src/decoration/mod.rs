//! Visual annotations over the ledger source.
//!
//! Two families share one [`DecorationEngine`]:
//!
//! * account-hierarchy coloring, derived from text alone ([`accounts`])
//! * error-line marks and their hover tooltip, derived from the last accepted
//!   validation result ([`errors`], [`tooltip`])
//!
//! Pointer movement never recomputes spans; only document changes and an
//! explicit errors-updated signal do.

use std::ops::Range;
use std::time::Instant;

pub mod accounts;
pub mod errors;
pub mod tooltip;

pub use accounts::{AccountDecorator, harvest_accounts};
pub use errors::ErrorAnnotationState;
pub use tooltip::{Tooltip, TooltipPhase};

use crate::config::{DecorationConfig, EditorConfig};
use crate::document::Document;

/// Palette used when no configuration overrides it.
pub const DEFAULT_PALETTE: [&str; 5] = ["#4e79a7", "#59a14f", "#f28e2b", "#b07aa1", "#76b7b2"];

/// Muted color for `:` separators.
pub const DEFAULT_SEPARATOR: &str = "#8a8f98";

/// How one decorated range is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStyle {
	/// Account segment at `depth` (0 for the root).
	Segment { depth: usize, color: String },
	/// `:` between two account segments.
	Separator { color: String },
	/// Whole line carrying at least one validation error (1-based).
	ErrorLine { line: u32 },
}

/// A decorated char range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
	pub range: Range<usize>,
	pub style: SpanStyle,
}

/// Depth-indexed segment colors plus the separator color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	colors: Vec<String>,
	separator: String,
}

impl Default for Palette {
	fn default() -> Self {
		Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(), DEFAULT_SEPARATOR)
	}
}

impl Palette {
	pub fn new(colors: Vec<String>, separator: impl Into<String>) -> Self {
		Self {
			colors,
			separator: separator.into(),
		}
	}

	/// Color for a segment at `depth`, saturating at the last entry.
	pub fn segment(&self, depth: usize) -> &str {
		self.colors
			.get(depth)
			.or_else(|| self.colors.last())
			.map_or(self.separator.as_str(), String::as_str)
	}

	pub fn separator(&self) -> &str {
		&self.separator
	}
}

impl From<&DecorationConfig> for Palette {
	fn from(config: &DecorationConfig) -> Self {
		Self::new(config.palette.clone(), config.separator.clone())
	}
}

/// Owns both decoration families for one document.
#[derive(Debug)]
pub struct DecorationEngine {
	accounts: AccountDecorator,
	errors: ErrorAnnotationState,
	error_spans: Vec<Span>,
	tooltip: Tooltip,
	hovered: Option<u32>,
}

impl DecorationEngine {
	pub fn new(palette: Palette, editor: &EditorConfig) -> Self {
		Self {
			accounts: AccountDecorator::new(palette),
			errors: ErrorAnnotationState::default(),
			error_spans: Vec::new(),
			tooltip: Tooltip::new(editor.tooltip_hold(), editor.tooltip_fade()),
			hovered: None,
		}
	}

	/// Account spans for `visible`, served from cache when unchanged.
	pub fn account_spans(&mut self, doc: &Document, visible: Range<usize>) -> &[Span] {
		self.accounts.decorate(doc, visible)
	}

	/// Replaces the error annotations wholesale ("errors updated").
	///
	/// A tooltip over the hovered line follows the new annotations: it picks
	/// up a changed message, or starts fading if the line is now clean.
	pub fn set_errors(&mut self, errors: ErrorAnnotationState, doc: &Document, now: Instant) {
		self.errors = errors;
		self.error_spans = self.errors.spans(doc);
		let Some(line) = self.hovered else {
			return;
		};
		match self.errors.message(line) {
			Some(message) => {
				self.tooltip.hover_enter(message, now);
			}
			None => {
				self.hovered = None;
				self.tooltip.hover_exit(now);
			}
		}
	}

	/// Recomputes line spans after an edit. Lines that fell off the end of
	/// the document lose their mark.
	pub fn on_document_change(&mut self, doc: &Document) {
		self.error_spans = self.errors.spans(doc);
	}

	pub fn errors(&self) -> &ErrorAnnotationState {
		&self.errors
	}

	pub fn error_spans(&self) -> &[Span] {
		&self.error_spans
	}

	/// Pointer entered 1-based `line`. Lines without errors count as an exit.
	pub fn hover_line(&mut self, line: u32, now: Instant) {
		match self.errors.message(line) {
			Some(message) => {
				self.hovered = Some(line);
				self.tooltip.hover_enter(message, now);
			}
			None => self.hover_exit(now),
		}
	}

	pub fn hover_exit(&mut self, now: Instant) {
		if self.hovered.take().is_some() {
			self.tooltip.hover_exit(now);
		}
	}

	/// Advances the tooltip fade.
	pub fn tick(&mut self, now: Instant) {
		self.tooltip.tick(now);
	}

	pub fn tooltip(&self) -> &Tooltip {
		&self.tooltip
	}
}
