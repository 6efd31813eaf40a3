//! The ledger source being edited.

use std::ops::Range;

use ropey::Rope;

/// Ledger text plus a monotonically increasing edit version and a cursor.
///
/// All offsets are char offsets. Line numbers handed to and from the engine
/// are 1-based.
#[derive(Debug, Clone, Default)]
pub struct Document {
	text: Rope,
	version: u64,
	cursor: usize,
}

impl Document {
	pub fn new(text: &str) -> Self {
		Self {
			text: Rope::from_str(text),
			version: 0,
			cursor: 0,
		}
	}

	pub fn rope(&self) -> &Rope {
		&self.text
	}

	/// Full source as an owned string, as sent to the engine.
	pub fn contents(&self) -> String {
		self.text.to_string()
	}

	pub const fn version(&self) -> u64 {
		self.version
	}

	pub const fn cursor(&self) -> usize {
		self.cursor
	}

	pub fn len_chars(&self) -> usize {
		self.text.len_chars()
	}

	/// Number of lines, counting the empty line after a trailing newline.
	pub fn line_count(&self) -> usize {
		self.text.len_lines()
	}

	/// Returns `true` if 1-based `line` exists in the document.
	pub fn contains_line(&self, line: u32) -> bool {
		line >= 1 && (line as usize) <= self.line_count()
	}

	/// Char range of 1-based `line`, without its line terminator.
	pub fn line_range(&self, line: u32) -> Option<Range<usize>> {
		if !self.contains_line(line) {
			return None;
		}
		let idx = line as usize - 1;
		let start = self.text.line_to_char(idx);
		let slice = self.text.line(idx);
		let mut len = slice.len_chars();
		while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
			len -= 1;
		}
		Some(start..start + len)
	}

	/// Text of the given char range, clamped to the document.
	pub fn slice(&self, range: Range<usize>) -> String {
		let range = self.clamp(range);
		self.text.slice(range).to_string()
	}

	pub fn set_cursor(&mut self, cursor: usize) {
		self.cursor = cursor.min(self.len_chars());
	}

	/// Replaces `range` with `text` and bumps the version.
	///
	/// The range is clamped to the document. The cursor is shifted to stay on
	/// the same character where possible and is returned.
	pub fn replace(&mut self, range: Range<usize>, text: &str) -> usize {
		let range = self.clamp(range);
		let inserted = text.chars().count();
		self.text.remove(range.clone());
		self.text.insert(range.start, text);
		self.version += 1;

		self.cursor = if self.cursor >= range.end {
			self.cursor - range.len() + inserted
		} else if self.cursor > range.start {
			range.start + inserted
		} else {
			self.cursor
		};
		self.cursor
	}

	/// Replaces the whole text, keeping the cursor in bounds.
	pub fn set_text(&mut self, text: &str) {
		self.text = Rope::from_str(text);
		self.version += 1;
		self.cursor = self.cursor.min(self.len_chars());
	}

	fn clamp(&self, range: Range<usize>) -> Range<usize> {
		let len = self.len_chars();
		let end = range.end.min(len);
		range.start.min(end)..end
	}
}
