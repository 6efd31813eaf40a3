use std::sync::Arc;

use pretty_assertions::assert_eq;
use tally_editor::playground::BOOT_FAILURE_TITLE;
use tally_editor::{EngineStatus, Notice};
use tally_engine::{EngineState, Error as EngineError, boot::UNSUPPORTED_MESSAGE};

use crate::common::{FakeSpawner, advance, playground, started};

#[tokio::test(start_paused = true)]
async fn unsupported_runtime_shows_modal_without_retrying() {
	let spawner = FakeSpawner::with_boots([Err("CompileError: WebAssembly.instantiate(): invalid magic".to_string())]);
	let pg = playground(&spawner, "ERR");
	pg.start().await;

	assert_eq!(pg.status(), EngineStatus::Error);
	assert_eq!(pg.engine().state(), EngineState::Failed);
	assert_eq!(spawner.spawned(), 1);
	assert_eq!(pg.take_notices(), vec![Notice::modal(BOOT_FAILURE_TITLE, UNSUPPORTED_MESSAGE)]);
	assert!(pg.error_lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transient_boot_failures_are_retried() {
	let spawner = FakeSpawner::with_boots([Err("network error".to_string()), Err("fetch aborted".to_string())]);
	let pg = playground(&spawner, "ERR");
	let started_at = tokio::time::Instant::now();
	pg.start().await;

	assert_eq!(spawner.spawned(), 3);
	assert!(started_at.elapsed() >= std::time::Duration::from_secs(3));
	assert_eq!(pg.status(), EngineStatus::Ready);
	assert_eq!(pg.error_lines(), vec![1]);
	assert!(pg.take_notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn terminate_rejects_pending_calls() {
	let (pg, _) = started("").await;

	let pending = tokio::spawn({
		let pg = Arc::clone(&pg);
		async move { pg.engine().query("", "slow:1000 rows 1").await }
	});
	advance(10).await;
	pg.engine().terminate();

	assert_eq!(pending.await.unwrap(), Err(EngineError::Transport(tally_rpc::Error::Terminated)));
	assert_eq!(pg.engine().state(), EngineState::Uninitialized);
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_in_flight_query() {
	let (pg, _) = started("").await;
	pg.set_query("slow:1000 rows 3");

	let running = tokio::spawn({
		let pg = Arc::clone(&pg);
		async move { pg.run_query().await }
	});
	advance(10).await;
	pg.shutdown();

	assert!(!running.await.unwrap());
	assert_eq!(pg.query_output(), tally_editor::QueryOutput::Idle);
	assert!(!pg.validate_now().await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_validation_does_not_leave_checking() {
	let (pg, _) = started("ok").await;
	pg.set_source("slow:500\nERR");
	advance(310).await;
	assert_eq!(pg.status(), EngineStatus::Checking);

	pg.shutdown();
	advance(600).await;
	assert_eq!(pg.status(), EngineStatus::Loading);
	assert!(pg.error_lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_booting_keeps_engine_down() {
	let spawner = FakeSpawner::with_boots([Err("network error".to_string())]);
	let pg = playground(&spawner, "ERR");
	let starting = tokio::spawn({
		let pg = Arc::clone(&pg);
		async move { pg.start().await }
	});
	advance(100).await;
	pg.shutdown();
	starting.await.unwrap();

	advance(5_000).await;
	assert_eq!(pg.engine().state(), EngineState::Uninitialized);
	assert_eq!(spawner.spawned(), 1);
	assert!(!pg.validate_now().await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_scheduled_validation() {
	let (pg, spawner) = started("").await;
	let served = spawner.served.load(std::sync::atomic::Ordering::SeqCst);

	pg.set_source("ERR");
	pg.shutdown();
	advance(1_000).await;

	assert_eq!(spawner.served.load(std::sync::atomic::Ordering::SeqCst), served);
	assert!(pg.error_lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn restart_after_shutdown_spawns_new_worker() {
	let (pg, spawner) = started("").await;
	pg.shutdown();
	pg.start().await;

	assert_eq!(spawner.spawned(), 2);
	assert_eq!(pg.status(), EngineStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn update_available_is_sticky() {
	let (pg, _) = started("ok").await;
	let mut status = pg.subscribe_status();
	pg.mark_update_available();
	assert!(status.has_changed().unwrap());

	pg.set_source("ERR");
	advance(400).await;
	assert_eq!(pg.error_lines(), vec![1]);
	assert_eq!(pg.status(), EngineStatus::UpdateAvailable);
}
