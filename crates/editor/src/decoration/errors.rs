//! Error-line annotations derived from validation results.

use std::collections::{BTreeMap, BTreeSet};

use tally_engine::ValidationResult;
use tracing::debug;

use super::{Span, SpanStyle};
use crate::document::Document;

/// Lines carrying validation errors and their tooltip text.
///
/// Built wholesale from one accepted [`ValidationResult`]; never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAnnotationState {
	lines: BTreeSet<u32>,
	messages: BTreeMap<u32, String>,
}

impl ErrorAnnotationState {
	/// Keeps errors whose 1-based line exists in `doc`.
	///
	/// Several messages on one line are joined with newlines. Errors without
	/// a line, or with a line outside the document, are skipped.
	pub fn from_validation(result: &ValidationResult, doc: &Document) -> Self {
		let mut state = Self::default();
		for error in &result.errors {
			let Some(line) = error.line else {
				continue;
			};
			if !doc.contains_line(line) {
				debug!(line, line_count = doc.line_count(), "decoration.error_line.out_of_range");
				continue;
			}
			state.lines.insert(line);
			state
				.messages
				.entry(line)
				.and_modify(|m| {
					m.push('\n');
					m.push_str(&error.message);
				})
				.or_insert_with(|| error.message.clone());
		}
		state
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	/// Marked lines in ascending order.
	pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
		self.lines.iter().copied()
	}

	/// Tooltip text for `line`.
	pub fn message(&self, line: u32) -> Option<&str> {
		self.messages.get(&line).map(String::as_str)
	}

	/// One span per marked line still present in `doc`.
	pub fn spans(&self, doc: &Document) -> Vec<Span> {
		self.lines
			.iter()
			.filter_map(|&line| {
				doc.line_range(line).map(|range| Span {
					range,
					style: SpanStyle::ErrorLine { line },
				})
			})
			.collect()
	}
}
