//! The playground orchestrator.
//!
//! Owns the ledger document, the query input and every piece of editor-side
//! state, and wires them to a shared [`EngineClient`]. This is where engine
//! transport and boot failures are caught: they are logged and turned into a
//! status change or a notice, never propagated to the caller.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tally_engine::{Completion, EngineClient, EngineState, Error as EngineError, QueryResult, ValidationResult};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::completion::{AutocompleteCoordinator, CompletionEdit, CompletionSource, KeyOutcome, MenuKey};
use crate::config::{EditorConfig, PlaygroundConfig};
use crate::debounce::Debouncer;
use crate::decoration::{DecorationEngine, ErrorAnnotationState, Palette, Span, harvest_accounts};
use crate::document::Document;
use crate::guard::StalenessGuard;
use crate::notice::{Notice, NoticeQueue};
use crate::paginator::{Page, ResultPaginator};
use crate::status::{EngineStatus, StatusIndicator};

/// Title of the modal shown when the engine cannot start.
pub const BOOT_FAILURE_TITLE: &str = "Ledger engine unavailable";

/// What the query output panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
	/// No query has produced output yet.
	Idle,
	/// Current page of the last successful query.
	Table(Page),
	/// The engine rejected the query; shown inline.
	Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryView {
	Idle,
	Table,
	Error(String),
}

#[derive(Debug)]
struct State {
	document: Document,
	query_input: Document,
	decorations: DecorationEngine,
	autocomplete: AutocompleteCoordinator,
	known_accounts: BTreeSet<String>,
	paginator: ResultPaginator,
	view: QueryView,
}

impl State {
	fn document_changed(&mut self) {
		self.known_accounts = harvest_accounts(&self.document.contents());
		self.decorations.on_document_change(&self.document);
	}
}

/// Editor-side control layer for one playground.
///
/// Methods that schedule background work take `self: &Arc<Self>`.
#[derive(Debug)]
pub struct Playground {
	engine: Arc<EngineClient>,
	state: Mutex<State>,
	validation: StalenessGuard,
	query: StalenessGuard,
	query_completions: StalenessGuard,
	validate_debounce: Debouncer,
	query_debounce: Debouncer,
	status: StatusIndicator,
	notices: NoticeQueue,
}

impl Playground {
	/// Builds an idle playground over `source`; call [`start`](Self::start) to boot.
	pub fn new(engine: Arc<EngineClient>, config: &PlaygroundConfig, source: &str) -> Arc<Self> {
		let editor: &EditorConfig = &config.editor;
		let document = Document::new(source);
		let mut state = State {
			known_accounts: BTreeSet::new(),
			document,
			query_input: Document::default(),
			decorations: DecorationEngine::new(Palette::from(&config.decorations), editor),
			autocomplete: AutocompleteCoordinator::new(editor.blur_grace()),
			paginator: ResultPaginator::new(editor.page_size),
			view: QueryView::Idle,
		};
		state.document_changed();

		Arc::new(Self {
			engine,
			state: Mutex::new(state),
			validation: StalenessGuard::new("validation"),
			query: StalenessGuard::new("query"),
			query_completions: StalenessGuard::new("query-completions"),
			validate_debounce: Debouncer::new("validate", editor.validate_debounce()),
			query_debounce: Debouncer::new("query-input", editor.query_debounce()),
			status: StatusIndicator::new(),
			notices: NoticeQueue::default(),
		})
	}

	/// Shared engine client.
	pub fn engine(&self) -> &Arc<EngineClient> {
		&self.engine
	}

	/// Boots the engine and runs the first validation.
	///
	/// A boot failure moves the status to `Error` and queues a modal.
	pub async fn start(&self) {
		self.status.set(EngineStatus::Loading);
		match self.engine.boot().await {
			Ok(version) => {
				info!(%version, "playground.engine_ready");
				self.status.set(EngineStatus::Ready);
				self.validate_now().await;
			}
			Err(EngineError::Boot(failure)) => {
				self.status.set(EngineStatus::Error);
				self.notices.push(Notice::modal(BOOT_FAILURE_TITLE, failure.user_message()));
			}
			Err(e) => {
				// Boot abandoned by a shutdown.
				warn!(error = %e, "playground.boot.failed");
				self.settle_status();
			}
		}
	}

	/// Destroys the engine worker and drops scheduled work.
	pub fn shutdown(&self) {
		self.validate_debounce.cancel();
		self.query_debounce.cancel();
		self.validation.invalidate();
		self.query.invalidate();
		self.query_completions.invalidate();
		self.engine.terminate();
		// Discarded in-flight calls never get to settle the indicator.
		self.settle_status();
	}

	// Ledger source

	/// Current ledger source text.
	pub fn source(&self) -> String {
		self.state.lock().document.contents()
	}

	/// Edit version of the ledger document; bumps on every change.
	pub fn document_version(&self) -> u64 {
		self.state.lock().document.version()
	}

	/// Cursor position in the ledger source, in chars.
	pub fn cursor(&self) -> usize {
		self.state.lock().document.cursor()
	}

	/// Moves the ledger cursor, clamped to the text.
	pub fn set_cursor(&self, cursor: usize) {
		self.state.lock().document.set_cursor(cursor);
	}

	/// Applies a keystroke-level edit to the ledger source.
	///
	/// Re-filters the account dropdown at the new cursor and schedules a
	/// debounced validation.
	pub fn edit(self: &Arc<Self>, range: Range<usize>, text: &str) {
		{
			let mut state = self.state.lock();
			let state = &mut *state;
			let cursor = state.document.replace(range, text);
			state.document_changed();
			state.autocomplete.offer_accounts(&state.known_accounts, state.document.rope(), cursor);
		}
		self.validation.invalidate();
		self.schedule_validation();
	}

	/// Replaces the whole source (example loader, reset button).
	pub fn set_source(self: &Arc<Self>, source: &str) {
		{
			let mut state = self.state.lock();
			state.document.set_text(source);
			state.document_changed();
			state.autocomplete.close();
		}
		self.validation.invalidate();
		self.schedule_validation();
	}

	/// Known accounts harvested from the current source.
	pub fn known_accounts(&self) -> BTreeSet<String> {
		self.state.lock().known_accounts.clone()
	}

	fn schedule_validation(self: &Arc<Self>) {
		let this = Arc::clone(self);
		self.validate_debounce.schedule(async move {
			this.validate_now().await;
		});
	}

	/// Validates the current source. Returns `true` if the result was applied.
	pub async fn validate_now(&self) -> bool {
		let source = self.source();
		let stamp = self.validation.begin();
		if self.engine.is_ready() {
			self.status.set(EngineStatus::Checking);
		}

		let outcome = self.engine.validate(&source).await;
		let Some(outcome) = self.validation.accept(stamp, outcome) else {
			return false;
		};

		match outcome {
			Ok(Some(result)) => {
				self.apply_validation(&result);
				self.status.set(EngineStatus::Ready);
				true
			}
			Ok(None) => {
				debug!("playground.validate.skipped");
				self.settle_status();
				false
			}
			Err(e) => {
				warn!(error = %e, "playground.validate.failed");
				self.settle_status();
				false
			}
		}
	}

	fn apply_validation(&self, result: &ValidationResult) {
		let mut state = self.state.lock();
		let state = &mut *state;
		let errors = ErrorAnnotationState::from_validation(result, &state.document);
		debug!(valid = result.valid, marked = errors.len(), reported = result.errors.len(), "playground.validate.applied");
		state.decorations.set_errors(errors, &state.document, Instant::now());
	}

	/// Restores the status after a failed call from the engine's state.
	fn settle_status(&self) {
		match self.engine.state() {
			EngineState::Ready => self.status.set(EngineStatus::Ready),
			EngineState::Failed => self.status.set(EngineStatus::Error),
			EngineState::Booting | EngineState::Uninitialized => self.status.set(EngineStatus::Loading),
		}
	}

	/// Pretty-prints the source through the engine.
	///
	/// The result is dropped if the source changed while formatting. Returns
	/// `true` if the document was replaced.
	pub async fn format(self: &Arc<Self>) -> bool {
		let (source, version) = {
			let state = self.state.lock();
			(state.document.contents(), state.document.version())
		};

		let result = match self.engine.format(&source).await {
			Ok(Some(result)) => result,
			Ok(None) => return false,
			Err(e) => {
				warn!(error = %e, "playground.format.failed");
				return false;
			}
		};

		if !result.errors.is_empty() {
			if self.document_version() == version {
				// Supersede any validation of the same text still in flight.
				self.validation.invalidate();
				self.apply_validation(&ValidationResult {
					valid: false,
					errors: result.errors,
				});
			}
			return false;
		}

		let Some(formatted) = result.formatted else {
			return false;
		};
		{
			let mut state = self.state.lock();
			if state.document.version() != version {
				debug!("playground.format.stale");
				return false;
			}
			if formatted == source {
				return false;
			}
			state.document.set_text(&formatted);
			state.document_changed();
		}
		self.validation.invalidate();
		self.notices.push(Notice::toast("Formatted"));
		self.schedule_validation();
		true
	}

	// Query input

	/// Current query input text.
	pub fn query_text(&self) -> String {
		self.state.lock().query_input.contents()
	}

	/// Edits the query input and schedules a debounced completion refresh.
	pub fn edit_query(self: &Arc<Self>, range: Range<usize>, text: &str) {
		self.state.lock().query_input.replace(range, text);
		let this = Arc::clone(self);
		self.query_debounce.schedule(async move {
			this.refresh_query_completions().await;
		});
	}

	/// Replaces the whole query input without triggering completions.
	pub fn set_query(&self, query: &str) {
		let mut state = self.state.lock();
		state.query_input.set_text(query);
		let end = state.query_input.len_chars();
		state.query_input.set_cursor(end);
	}

	/// Fetches structural candidates for the query input and offers them.
	///
	/// Returns `true` if the dropdown is open afterwards.
	pub async fn refresh_query_completions(&self) -> bool {
		let (query, cursor) = {
			let state = self.state.lock();
			(state.query_input.contents(), state.query_input.cursor())
		};
		let stamp = self.query_completions.begin();
		let outcome = self.engine.completions(&query, cursor).await;
		let Some(outcome) = self.query_completions.accept(stamp, outcome) else {
			return false;
		};
		let candidates: Vec<Completion> = match outcome {
			Ok(Some(items)) => items,
			Ok(None) => return false,
			Err(e) => {
				warn!(error = %e, "playground.completions.failed");
				return false;
			}
		};

		let mut state = self.state.lock();
		let state = &mut *state;
		// The input may have moved on while the engine was working.
		let cursor = state.query_input.cursor();
		state.autocomplete.offer(&candidates, state.query_input.rope(), cursor)
	}

	/// Runs the query input against the source.
	///
	/// Only the most recently started query may update the output panel.
	pub async fn run_query(&self) -> bool {
		let (source, query) = {
			let state = self.state.lock();
			(state.document.contents(), state.query_input.contents())
		};
		let stamp = self.query.begin();
		let outcome = self.engine.query(&source, &query).await;
		let Some(outcome) = self.query.accept(stamp, outcome) else {
			return false;
		};

		match outcome {
			Ok(Some(result)) => {
				self.apply_query(result);
				true
			}
			Ok(None) => {
				debug!("playground.query.skipped");
				false
			}
			Err(e) => {
				warn!(error = %e, "playground.query.failed");
				false
			}
		}
	}

	fn apply_query(&self, result: QueryResult) {
		let mut state = self.state.lock();
		if let Some(message) = result.error {
			state.paginator.clear();
			state.view = QueryView::Error(message);
			return;
		}
		debug!(rows = result.rows.len(), "playground.query.applied");
		state.paginator.set_query_result(result);
		state.view = QueryView::Table;
	}

	/// What the output panel shows now.
	pub fn query_output(&self) -> QueryOutput {
		let state = self.state.lock();
		match &state.view {
			QueryView::Idle => QueryOutput::Idle,
			QueryView::Table => QueryOutput::Table(state.paginator.current()),
			QueryView::Error(message) => QueryOutput::Error(message.clone()),
		}
	}

	/// Switches the result page. Out-of-bounds pages are ignored.
	pub fn go_to_page(&self, page: usize) -> bool {
		self.state.lock().paginator.go_to(page)
	}

	/// Moves `delta` pages from the current one. Steps out of range are ignored.
	pub fn step_page(&self, delta: isize) -> bool {
		self.state.lock().paginator.step(delta)
	}

	// Autocomplete

	/// Candidates in the open dropdown; empty when closed.
	pub fn completion_items(&self) -> Vec<Completion> {
		self.state
			.lock()
			.autocomplete
			.session()
			.map(|s| s.items.clone())
			.unwrap_or_default()
	}

	/// Highlighted candidate index, if the dropdown is open.
	pub fn completion_selected(&self) -> Option<usize> {
		self.state.lock().autocomplete.session().map(|s| s.selected)
	}

	/// Which input the open dropdown belongs to.
	pub fn completion_source(&self) -> Option<CompletionSource> {
		self.state.lock().autocomplete.session().map(|s| s.source)
	}

	/// Routes a dropdown key. Accepted candidates are applied immediately.
	pub fn handle_key(self: &Arc<Self>, key: MenuKey) -> KeyOutcome {
		let outcome = self.state.lock().autocomplete.handle_key(key);
		if let KeyOutcome::Accepted(edit) = &outcome {
			self.apply_completion(edit.clone());
		}
		outcome
	}

	/// A candidate was clicked.
	pub fn click_completion(self: &Arc<Self>, index: usize) -> Option<CompletionEdit> {
		let edit = self.state.lock().autocomplete.select(index)?;
		self.apply_completion(edit.clone());
		Some(edit)
	}

	fn apply_completion(self: &Arc<Self>, edit: CompletionEdit) {
		match edit.source {
			CompletionSource::Accounts => {
				{
					let mut state = self.state.lock();
					state.document.replace(edit.range, &edit.text);
					state.document.set_cursor(edit.cursor);
					state.document_changed();
				}
				self.validation.invalidate();
				self.validate_debounce.cancel();
				let this = Arc::clone(self);
				tokio::spawn(async move {
					this.validate_now().await;
				});
			}
			CompletionSource::Structural => {
				let mut state = self.state.lock();
				state.query_input.replace(edit.range, &edit.text);
				state.query_input.set_cursor(edit.cursor);
				drop(state);
				// A candidate list still in flight must not reopen the dropdown.
				self.query_debounce.cancel();
				self.query_completions.invalidate();
			}
		}
	}

	/// The focused input lost focus; the dropdown closes after the grace period.
	pub fn blur(&self, now: Instant) {
		self.state.lock().autocomplete.blur(now);
	}

	/// Focus returned before the grace period ran out.
	pub fn focus(&self) {
		self.state.lock().autocomplete.focus();
	}

	/// Advances time-driven UI state: blur grace and tooltip fade.
	pub fn tick(&self, now: Instant) {
		let mut state = self.state.lock();
		state.autocomplete.tick(now);
		state.decorations.tick(now);
	}

	// Decorations

	/// Account coloring for the visible char range.
	pub fn account_spans(&self, visible: Range<usize>) -> Vec<Span> {
		let mut state = self.state.lock();
		let state = &mut *state;
		state.decorations.account_spans(&state.document, visible).to_vec()
	}

	/// Marked error lines as char spans.
	pub fn error_spans(&self) -> Vec<Span> {
		self.state.lock().decorations.error_spans().to_vec()
	}

	/// 1-based lines marked by the last accepted validation.
	pub fn error_lines(&self) -> Vec<u32> {
		self.state.lock().decorations.errors().lines().collect()
	}

	/// Message for an error line, joined if the line has several.
	pub fn error_message(&self, line: u32) -> Option<String> {
		self.state.lock().decorations.errors().message(line).map(str::to_string)
	}

	/// Pointer moved onto 1-based `line`.
	pub fn hover_line(&self, line: u32, now: Instant) {
		self.state.lock().decorations.hover_line(line, now);
	}

	/// Pointer left the editor gutter or text.
	pub fn hover_exit(&self, now: Instant) {
		self.state.lock().decorations.hover_exit(now);
	}

	/// Tooltip text while it is visible, holding or fading.
	pub fn tooltip_message(&self) -> Option<String> {
		self.state.lock().decorations.tooltip().message().map(str::to_string)
	}

	// Status and notices

	/// Current status indicator value.
	pub fn status(&self) -> EngineStatus {
		self.status.get()
	}

	/// Subscribes to status indicator changes.
	pub fn subscribe_status(&self) -> watch::Receiver<EngineStatus> {
		self.status.subscribe()
	}

	/// Flags a newer release; sticks over later status changes.
	pub fn mark_update_available(&self) {
		self.status.mark_update_available();
	}

	/// Takes queued notices, oldest first.
	pub fn take_notices(&self) -> Vec<Notice> {
		self.notices.drain()
	}
}
