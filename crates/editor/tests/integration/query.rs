use std::sync::Arc;

use pretty_assertions::assert_eq;
use tally_editor::QueryOutput;

use crate::common::{FakeSpawner, advance, playground, started};

fn table(output: QueryOutput) -> tally_editor::Page {
	match output {
		QueryOutput::Table(page) => page,
		other => panic!("expected a table, got {other:?}"),
	}
}

#[tokio::test(start_paused = true)]
async fn large_result_is_paged_locally() {
	let (pg, spawner) = started("").await;
	pg.set_query("rows 250");
	assert!(pg.run_query().await);
	let served = spawner.served.load(std::sync::atomic::Ordering::SeqCst);

	let page = table(pg.query_output());
	assert_eq!(page.total_pages, 3);
	assert_eq!((page.first_row, page.last_row), (1, 100));
	assert_eq!(page.headers, vec!["n", "query", "amount"]);
	assert_eq!(page.rows[0], vec!["1", "tag:rows 250", "1.00 USD"]);

	assert!(pg.go_to_page(2));
	let page = table(pg.query_output());
	assert_eq!((page.first_row, page.last_row), (201, 250));
	assert_eq!(page.range_label(), "rows 201\u{2013}250 of 250");

	assert!(!pg.go_to_page(3));
	assert!(!pg.step_page(1));
	assert_eq!(table(pg.query_output()).page, 2);

	// Paging never goes back to the engine.
	assert_eq!(spawner.served.load(std::sync::atomic::Ordering::SeqCst), served);
}

#[tokio::test(start_paused = true)]
async fn overlapping_queries_render_only_the_second() {
	let (pg, _) = started("").await;

	pg.set_query("slow:500 rows 5");
	let first = tokio::spawn({
		let pg = Arc::clone(&pg);
		async move { pg.run_query().await }
	});
	advance(10).await;

	pg.set_query("rows 2");
	let second = pg.run_query().await;

	assert!(!first.await.unwrap());
	assert!(second);
	let page = table(pg.query_output());
	assert_eq!(page.total_rows, 2);
	assert_eq!(page.rows[1][1], "tag:rows 2");
}

#[tokio::test(start_paused = true)]
async fn new_query_resets_to_first_page() {
	let (pg, _) = started("").await;
	pg.set_query("rows 250");
	pg.run_query().await;
	pg.go_to_page(1);

	pg.set_query("rows 120");
	pg.run_query().await;
	let page = table(pg.query_output());
	assert_eq!(page.page, 0);
	assert_eq!(page.total_pages, 2);
}

#[tokio::test(start_paused = true)]
async fn query_errors_are_shown_inline() {
	let (pg, _) = started("").await;
	pg.set_query("rows 3");
	pg.run_query().await;

	pg.set_query("fail");
	assert!(pg.run_query().await);
	assert_eq!(pg.query_output(), QueryOutput::Error("syntax error near 'fail'".into()));
}

#[tokio::test(start_paused = true)]
async fn query_before_boot_is_skipped() {
	let spawner = FakeSpawner::new();
	let pg = playground(&spawner, "");
	pg.set_query("rows 1");

	assert!(!pg.run_query().await);
	assert_eq!(pg.query_output(), QueryOutput::Idle);
	assert_eq!(spawner.spawned(), 0);
}
