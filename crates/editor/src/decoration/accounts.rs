//! Account-hierarchy coloring.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::{Palette, Span, SpanStyle};
use crate::document::Document;

/// `Capitalized(:Segment)+`, e.g. `Assets:Bank:Checking`.
static ACCOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b[A-Z][A-Za-z0-9-]*(?::[A-Za-z0-9][A-Za-z0-9-]*)+").expect("account pattern must compile")
});

/// One account path found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMatch<'a> {
	/// Char offset of the first character.
	pub start: usize,
	pub path: &'a str,
}

/// Finds every account path in `text`, with char offsets.
pub fn scan_accounts(text: &str) -> Vec<AccountMatch<'_>> {
	let mut out = Vec::new();
	let mut byte_cursor = 0;
	let mut char_cursor = 0;
	for m in ACCOUNT_PATTERN.find_iter(text) {
		char_cursor += text[byte_cursor..m.start()].chars().count();
		byte_cursor = m.start();
		out.push(AccountMatch {
			start: char_cursor,
			path: m.as_str(),
		});
	}
	out
}

/// Collects the distinct account paths in `text`.
pub fn harvest_accounts(text: &str) -> BTreeSet<String> {
	ACCOUNT_PATTERN.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Segment and separator spans for one account path starting at `start`.
fn account_path_spans(start: usize, path: &str, palette: &Palette, out: &mut Vec<Span>) {
	// The pattern is ASCII-only, so byte and char offsets agree inside a match.
	let mut offset = start;
	for (depth, segment) in path.split(':').enumerate() {
		if depth > 0 {
			out.push(Span {
				range: offset..offset + 1,
				style: SpanStyle::Separator {
					color: palette.separator().to_string(),
				},
			});
			offset += 1;
		}
		out.push(Span {
			range: offset..offset + segment.len(),
			style: SpanStyle::Segment {
				depth,
				color: palette.segment(depth).to_string(),
			},
		});
		offset += segment.len();
	}
}

/// Spans for every account in `text`, offset by `base`.
pub fn account_spans(text: &str, base: usize, palette: &Palette) -> Vec<Span> {
	let mut spans = Vec::new();
	for m in scan_accounts(text) {
		account_path_spans(base + m.start, m.path, palette, &mut spans);
	}
	spans
}

#[derive(Debug)]
struct CacheEntry {
	version: u64,
	visible: Range<usize>,
	spans: Vec<Span>,
}

/// Account coloring for the visible part of a document.
///
/// Results are cached by `(document version, visible range)`.
#[derive(Debug)]
pub struct AccountDecorator {
	palette: Palette,
	cache: Option<CacheEntry>,
}

impl AccountDecorator {
	pub fn new(palette: Palette) -> Self {
		Self { palette, cache: None }
	}

	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	/// Spans for `visible`, widened to whole lines so paths are never cut.
	pub fn decorate(&mut self, doc: &Document, visible: Range<usize>) -> &[Span] {
		let hit = self
			.cache
			.as_ref()
			.is_some_and(|c| c.version == doc.version() && c.visible == visible);
		if !hit {
			let scanned = line_aligned(doc, visible.clone());
			let spans = account_spans(&doc.slice(scanned.clone()), scanned.start, &self.palette);
			trace!(version = doc.version(), spans = spans.len(), "decoration.accounts.recompute");
			self.cache = Some(CacheEntry {
				version: doc.version(),
				visible,
				spans,
			});
		}
		match &self.cache {
			Some(entry) => &entry.spans,
			None => &[],
		}
	}

	pub fn invalidate(&mut self) {
		self.cache = None;
	}
}

fn line_aligned(doc: &Document, range: Range<usize>) -> Range<usize> {
	let rope = doc.rope();
	let len = rope.len_chars();
	let end = range.end.min(len);
	let start = range.start.min(end);
	let first = rope.char_to_line(start);
	let last = rope.char_to_line(end);
	let aligned_end = if last + 1 < rope.len_lines() {
		rope.line_to_char(last + 1)
	} else {
		len
	};
	rope.line_to_char(first)..aligned_end
}
