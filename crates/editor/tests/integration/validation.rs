use std::sync::atomic::Ordering;
use std::time::Instant;

use pretty_assertions::assert_eq;
use tally_editor::{EngineStatus, Notice, SpanStyle};

use crate::common::{advance, started};

#[tokio::test(start_paused = true)]
async fn initial_validation_marks_reported_lines() {
	let (pg, _) = started("l1\nERR\nl3\nl4\nERR\nERR@0\nERR@99").await;

	assert_eq!(pg.status(), EngineStatus::Ready);
	assert_eq!(pg.error_lines(), vec![2, 5]);
	assert_eq!(pg.error_message(2).as_deref(), Some("error on line 2"));
	assert_eq!(pg.error_message(5).as_deref(), Some("error on line 5"));
	assert_eq!(pg.error_message(99), None);

	let spans = pg.error_spans();
	assert_eq!(spans.len(), 2);
	assert_eq!(spans[0].range, 3..6);
	assert_eq!(spans[1].style, SpanStyle::ErrorLine { line: 5 });
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_validate_only_the_last_text() {
	let (pg, spawner) = started("a\n").await;
	assert!(pg.error_lines().is_empty());
	let served_after_boot = spawner.served.load(Ordering::SeqCst);

	pg.set_cursor(2);
	pg.edit(2..2, "ERR\n");
	advance(50).await;
	pg.edit(2..6, "b\n");
	advance(50).await;
	pg.edit(4..4, "c ERR\n");
	advance(100).await;
	assert_eq!(spawner.served.load(Ordering::SeqCst), served_after_boot);

	advance(300).await;
	assert_eq!(pg.source(), "a\nb\nc ERR\n");
	assert_eq!(pg.error_lines(), vec![3]);
	assert_eq!(spawner.served.load(Ordering::SeqCst), served_after_boot + 1);
}

#[tokio::test(start_paused = true)]
async fn slow_stale_validation_is_discarded() {
	let (pg, _) = started("ok").await;

	pg.set_source("slow:500\nERR");
	advance(310).await;
	assert_eq!(pg.status(), EngineStatus::Checking);

	pg.set_source("ERR");
	advance(495).await;
	assert_ne!(pg.error_lines(), vec![2]);

	advance(200).await;
	assert_eq!(pg.error_lines(), vec![1]);
	assert_eq!(pg.status(), EngineStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn validation_of_replaced_text_is_never_rendered() {
	let (pg, _) = started("ok").await;

	// Debounce fires at 300ms; the engine answers at ~800ms.
	pg.set_source("slow:500\nERR");
	advance(700).await;
	pg.set_source("fine\nclean");
	advance(150).await;

	assert_eq!(pg.source(), "fine\nclean");
	assert!(pg.error_lines().is_empty());

	advance(300).await;
	assert!(pg.error_lines().is_empty());
	assert_eq!(pg.status(), EngineStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn clean_source_clears_marks() {
	let (pg, _) = started("ERR").await;
	assert_eq!(pg.error_lines(), vec![1]);

	pg.set_source("fine");
	advance(400).await;
	assert!(pg.error_lines().is_empty());
	assert!(pg.error_spans().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tooltip_follows_error_lines() {
	let (pg, _) = started("x\nERR").await;
	let t0 = Instant::now();

	pg.hover_line(2, t0);
	assert_eq!(pg.tooltip_message().as_deref(), Some("error on line 2"));

	pg.hover_exit(t0);
	pg.tick(t0 + std::time::Duration::from_millis(900));
	assert!(pg.tooltip_message().is_some());
	pg.tick(t0 + std::time::Duration::from_millis(1_400));
	assert_eq!(pg.tooltip_message(), None);
}

#[tokio::test(start_paused = true)]
async fn tooltip_fades_once_hovered_error_is_fixed() {
	let (pg, _) = started("x\nERR").await;
	let t0 = Instant::now();
	pg.hover_line(2, t0);

	pg.set_source("x\nfine");
	advance(400).await;
	assert!(pg.error_lines().is_empty());

	pg.hover_exit(t0 + std::time::Duration::from_secs(1));
	pg.tick(t0 + std::time::Duration::from_secs(60));
	assert_eq!(pg.tooltip_message(), None);
}

#[tokio::test(start_paused = true)]
async fn format_rewrites_source_and_revalidates() {
	let (pg, _) = started("a   \nERR  ").await;
	assert!(pg.format().await);
	assert_eq!(pg.source(), "a\nERR");
	assert_eq!(pg.take_notices(), vec![Notice::toast("Formatted")]);

	advance(400).await;
	assert_eq!(pg.error_lines(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn format_errors_become_annotations() {
	let (pg, _) = started("BROKEN").await;
	assert!(!pg.format().await);
	assert_eq!(pg.source(), "BROKEN");
	assert_eq!(pg.error_lines(), vec![1]);
	assert_eq!(pg.error_message(1).as_deref(), Some("cannot format"));
}

#[tokio::test(start_paused = true)]
async fn account_spans_cover_visible_accounts() {
	let (pg, _) = started("2024-01-01 open Assets:Bank:Checking\n").await;
	let spans = pg.account_spans(0..10);
	assert_eq!(spans.len(), 5);
	assert_eq!(spans[0].range, 16..22);
}
