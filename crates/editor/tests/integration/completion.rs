use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tally_editor::{CompletionSource, KeyOutcome, MenuKey};

use crate::common::{advance, started};

const LEDGER: &str = "2024-01-01 open Assets:Bank:Checking\n2024-01-01 open Assets:Cash\n2024-01-01 open Expenses:Food\n";

#[tokio::test(start_paused = true)]
async fn query_input_completions_are_debounced() {
	let (pg, spawner) = started("").await;
	let before = spawner.served.load(Ordering::SeqCst);

	pg.edit_query(0..0, "s");
	advance(50).await;
	pg.edit_query(1..1, "o");
	advance(100).await;
	assert!(pg.completion_items().is_empty());

	advance(100).await;
	assert_eq!(spawner.served.load(Ordering::SeqCst), before + 1);
	assert_eq!(pg.completion_source(), Some(CompletionSource::Structural));
	let labels: Vec<_> = pg.completion_items().into_iter().map(|c| c.label).collect();
	assert_eq!(labels, vec!["sort"]);
}

#[tokio::test(start_paused = true)]
async fn arrow_and_enter_insert_candidate() {
	let (pg, _) = started("").await;
	pg.edit_query(0..0, "s");
	advance(200).await;
	assert_eq!(pg.completion_items().len(), 3);

	assert_eq!(pg.handle_key(MenuKey::Down), KeyOutcome::Moved(1));
	let KeyOutcome::Accepted(edit) = pg.handle_key(MenuKey::Enter) else {
		panic!("expected an accepted edit");
	};
	assert_eq!(edit.text, "sum(");
	assert_eq!(pg.query_text(), "sum(");
	assert_eq!(edit.cursor, 4);
	assert_eq!(pg.completion_source(), None);

	// The closed dropdown stays closed.
	advance(500).await;
	assert_eq!(pg.completion_source(), None);
}

#[tokio::test(start_paused = true)]
async fn escape_and_blur_close_the_dropdown() {
	let (pg, _) = started("").await;
	pg.edit_query(0..0, "s");
	advance(200).await;
	assert_eq!(pg.handle_key(MenuKey::Escape), KeyOutcome::Closed);
	assert_eq!(pg.handle_key(MenuKey::Down), KeyOutcome::Ignored);

	pg.edit_query(1..1, "u");
	advance(200).await;
	assert_eq!(pg.completion_items().len(), 1);
	let t0 = Instant::now();
	pg.blur(t0);
	pg.tick(t0 + Duration::from_millis(100));
	assert!(pg.completion_source().is_some());
	pg.tick(t0 + Duration::from_millis(150));
	assert!(pg.completion_source().is_none());
}

#[tokio::test(start_paused = true)]
async fn account_completion_replaces_token_and_revalidates() {
	let (pg, spawner) = started(LEDGER).await;
	assert!(pg.known_accounts().contains("Assets:Cash"));
	let before = spawner.served.load(Ordering::SeqCst);

	let end = LEDGER.chars().count();
	pg.set_cursor(end);
	pg.edit(end..end, "  Ass");
	assert_eq!(pg.completion_source(), Some(CompletionSource::Accounts));
	assert_eq!(pg.completion_items().len(), 2);

	let KeyOutcome::Accepted(edit) = pg.handle_key(MenuKey::Tab) else {
		panic!("expected an accepted edit");
	};
	assert_eq!(edit.range, end + 2..end + 5);
	assert!(pg.source().ends_with("  Assets:Bank:Checking"));
	assert_eq!(pg.cursor(), end + 2 + "Assets:Bank:Checking".len());

	// Re-validation runs right away rather than after the edit debounce.
	advance(1).await;
	assert_eq!(spawner.served.load(Ordering::SeqCst), before + 1);
}

#[tokio::test(start_paused = true)]
async fn lowercase_words_do_not_open_account_dropdown() {
	let (pg, _) = started(LEDGER).await;
	let end = LEDGER.chars().count();
	pg.set_cursor(end);
	pg.edit(end..end, "  ass");
	assert_eq!(pg.completion_source(), None);
}

#[tokio::test(start_paused = true)]
async fn click_during_blur_grace_is_applied() {
	let (pg, _) = started(LEDGER).await;
	let end = LEDGER.chars().count();
	pg.set_cursor(end);
	pg.edit(end..end, "Exp");

	let t0 = Instant::now();
	pg.blur(t0);
	let edit = pg.click_completion(0).unwrap();
	assert_eq!(edit.text, "Expenses:Food");
	pg.tick(t0 + Duration::from_millis(200));
	assert!(pg.source().ends_with("Expenses:Food"));
}
