//! Token boundary detection around the cursor.

use std::ops::Range;

use ropey::Rope;

/// Which word rules apply when locating the token under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRules {
	/// Query keywords, functions and columns.
	Structural,
	/// Colon-separated account paths.
	Account,
}

impl TokenRules {
	/// Returns `true` if `ch` belongs to a token under these rules.
	pub fn is_word_char(self, ch: char) -> bool {
		match self {
			Self::Structural => !ch.is_whitespace() && !matches!(ch, '(' | ')' | ',' | ';' | '=' | '<' | '>' | '!' | '\'' | '"'),
			Self::Account => ch.is_alphanumeric() || matches!(ch, ':' | '-'),
		}
	}
}

/// Char range of the token touching `cursor`.
///
/// Scans backward and forward from the cursor until a boundary character.
/// The range is empty when the cursor sits between two boundaries.
pub fn token_range(text: &Rope, cursor: usize, rules: TokenRules) -> Range<usize> {
	let cursor = cursor.min(text.len_chars());
	let mut start = cursor;
	while start > 0 && rules.is_word_char(text.char(start - 1)) {
		start -= 1;
	}
	let mut end = cursor;
	while end < text.len_chars() && rules.is_word_char(text.char(end)) {
		end += 1;
	}
	start..end
}

/// Text typed so far: from the token start up to the cursor.
pub fn typed_prefix(text: &Rope, token: &Range<usize>, cursor: usize) -> String {
	let end = cursor.clamp(token.start, token.end);
	text.slice(token.start..end).to_string()
}

/// Returns `true` if `word` looks like the start of an account path.
///
/// It must begin with an uppercase letter and contain only account word
/// characters; a colon is allowed but not required.
pub fn looks_like_account(word: &str) -> bool {
	let mut chars = word.chars();
	chars.next().is_some_and(|c| c.is_uppercase()) && chars.all(|c| TokenRules::Account.is_word_char(c))
}
