//! Tracing subscriber setup for hosts embedding the playground.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

/// Filter directive variable.
pub const LOG_ENV: &str = "TALLY_LOG";

/// Directory for per-process log files.
pub const LOG_DIR_ENV: &str = "TALLY_LOG_DIR";

fn filter(verbose: bool) -> EnvFilter {
	EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("tally=trace,debug")
		} else {
			EnvFilter::new("tally=info,warn")
		}
	})
}

/// Installs the global subscriber.
///
/// With `TALLY_LOG_DIR` set, events go to `tally.<pid>.log` in that
/// directory; otherwise to stderr. Calling it twice is harmless: the second
/// install is ignored.
pub fn init(verbose: bool) {
	if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("tally.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);
			if tracing_subscriber::registry()
				.with(filter(verbose))
				.with(file_layer)
				.try_init()
				.is_ok()
			{
				tracing::info!(path = ?log_path, "logging.init");
			}
			return;
		}
	}

	let _ = tracing_subscriber::registry()
		.with(filter(verbose))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.try_init();
}
