//! Autocomplete coordinator.
//!
//! One dropdown, two sources: structural candidates from the engine for the
//! query input, and account paths matched locally against the accounts
//! already present in the ledger. At most one [`AutocompleteSession`] is open
//! at a time.

use std::collections::BTreeSet;
use std::ops::Range;
use std::time::{Duration, Instant};

use ropey::Rope;
use tally_engine::Completion;
use tracing::trace;

pub mod filter;
pub mod token;

pub use filter::{filter_accounts, filter_candidates};
pub use token::{TokenRules, looks_like_account, token_range, typed_prefix};

/// Where the open candidates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
	/// Engine candidates for the query input.
	Structural,
	/// Known account paths for the ledger source.
	Accounts,
}

impl CompletionSource {
	const fn rules(self) -> TokenRules {
		match self {
			Self::Structural => TokenRules::Structural,
			Self::Accounts => TokenRules::Account,
		}
	}
}

/// Keys the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
	Up,
	Down,
	Enter,
	Tab,
	Escape,
}

/// Text edit produced by accepting a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEdit {
	pub source: CompletionSource,
	/// Token range remembered when the candidates were filtered.
	pub range: Range<usize>,
	pub text: String,
	/// Cursor position right after the inserted text.
	pub cursor: usize,
}

/// Outcome of a key press while the dropdown is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
	/// No dropdown; the key belongs to the editor.
	Ignored,
	Moved(usize),
	Accepted(CompletionEdit),
	Closed,
}

/// An open dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteSession {
	pub items: Vec<Completion>,
	pub selected: usize,
	pub token: Range<usize>,
	pub source: CompletionSource,
}

impl AutocompleteSession {
	pub fn selected_item(&self) -> Option<&Completion> {
		self.items.get(self.selected)
	}
}

/// Dropdown lifecycle and selection state.
#[derive(Debug)]
pub struct AutocompleteCoordinator {
	session: Option<AutocompleteSession>,
	blur_deadline: Option<Instant>,
	blur_grace: Duration,
}

impl AutocompleteCoordinator {
	pub fn new(blur_grace: Duration) -> Self {
		Self {
			session: None,
			blur_deadline: None,
			blur_grace,
		}
	}

	pub fn session(&self) -> Option<&AutocompleteSession> {
		self.session.as_ref()
	}

	pub fn is_open(&self) -> bool {
		self.session.is_some()
	}

	/// Filters engine `candidates` against the structural token at `cursor`.
	///
	/// Opens (or re-filters) the dropdown when anything matches, closes it
	/// otherwise. Returns `true` if the dropdown is open afterwards.
	pub fn offer(&mut self, candidates: &[Completion], text: &Rope, cursor: usize) -> bool {
		let token = token_range(text, cursor, TokenRules::Structural);
		let query = typed_prefix(text, &token, cursor);
		let items = filter_candidates(candidates, &query);
		self.open_with(CompletionSource::Structural, items, token)
	}

	/// Matches the account token at `cursor` against `known` accounts.
	///
	/// Only words that look like an account path trigger the dropdown.
	pub fn offer_accounts(&mut self, known: &BTreeSet<String>, text: &Rope, cursor: usize) -> bool {
		let token = token_range(text, cursor, TokenRules::Account);
		let word = typed_prefix(text, &token, cursor);
		if !looks_like_account(&word) {
			self.close();
			return false;
		}
		let items = filter_accounts(known, &word);
		self.open_with(CompletionSource::Accounts, items, token)
	}

	fn open_with(&mut self, source: CompletionSource, items: Vec<Completion>, token: Range<usize>) -> bool {
		self.blur_deadline = None;
		if items.is_empty() {
			self.close();
			return false;
		}
		trace!(?source, items = items.len(), ?token, "completion.open");
		self.session = Some(AutocompleteSession {
			items,
			selected: 0,
			token,
			source,
		});
		true
	}

	/// Moves the selection by `delta`, wrapping around both ends.
	pub fn move_selection(&mut self, delta: isize) -> Option<usize> {
		let session = self.session.as_mut()?;
		let len = session.items.len() as isize;
		session.selected = (session.selected as isize + delta).rem_euclid(len) as usize;
		Some(session.selected)
	}

	pub fn handle_key(&mut self, key: MenuKey) -> KeyOutcome {
		if self.session.is_none() {
			return KeyOutcome::Ignored;
		}
		match key {
			MenuKey::Up => self.move_selection(-1).map_or(KeyOutcome::Ignored, KeyOutcome::Moved),
			MenuKey::Down => self.move_selection(1).map_or(KeyOutcome::Ignored, KeyOutcome::Moved),
			MenuKey::Enter | MenuKey::Tab => self.accept().map_or(KeyOutcome::Closed, KeyOutcome::Accepted),
			MenuKey::Escape => {
				self.close();
				KeyOutcome::Closed
			}
		}
	}

	/// Accepts the selected candidate and closes the dropdown.
	pub fn accept(&mut self) -> Option<CompletionEdit> {
		let selected = self.session.as_ref()?.selected;
		self.select(selected)
	}

	/// Accepts candidate `index` (a click) and closes the dropdown.
	///
	/// Works during the blur grace period, which is what lets a click on the
	/// dropdown land after the editor lost focus.
	pub fn select(&mut self, index: usize) -> Option<CompletionEdit> {
		let session = self.session.take()?;
		self.blur_deadline = None;
		let item = session.items.get(index)?;
		let text = item.text_to_insert().to_string();
		let cursor = session.token.start + text.chars().count();
		Some(CompletionEdit {
			source: session.source,
			range: session.token,
			text,
			cursor,
		})
	}

	/// Input lost focus. The dropdown closes once the grace period expires.
	pub fn blur(&mut self, now: Instant) {
		if self.session.is_some() {
			self.blur_deadline = Some(now + self.blur_grace);
		}
	}

	/// Input regained focus before the grace period expired.
	pub fn focus(&mut self) {
		self.blur_deadline = None;
	}

	/// Closes the dropdown if a blur grace period has expired.
	///
	/// Returns `true` if this call closed it.
	pub fn tick(&mut self, now: Instant) -> bool {
		match self.blur_deadline {
			Some(deadline) if now >= deadline => {
				self.close();
				true
			}
			_ => false,
		}
	}

	pub fn close(&mut self) {
		if self.session.take().is_some() {
			trace!("completion.close");
		}
		self.blur_deadline = None;
	}
}
