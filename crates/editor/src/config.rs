//! Playground configuration.
//!
//! Read from TOML with three tables, all optional:
//!
//! ```toml
//! [engine]
//! boot_timeout_ms = 30000
//! max_boot_retries = 3
//!
//! [editor]
//! validate_debounce_ms = 300
//!
//! [decorations]
//! palette = ["#4e79a7", "#59a14f"]
//! separator = "#8a8f98"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tally_engine::EngineConfig;
use thiserror::Error;

use crate::decoration::{DEFAULT_PALETTE, DEFAULT_SEPARATOR};
use crate::paginator::PAGE_SIZE;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Malformed TOML or an unknown key.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A color value is not `#rrggbb`.
	#[error("invalid color format: {0}")]
	InvalidColor(String),

	/// The palette has no colors.
	#[error("decoration palette must not be empty")]
	EmptyPalette,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Editor timing and layout knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
	/// Quiet period before re-validating the ledger after an edit.
	pub validate_debounce_ms: u64,
	/// Quiet period before refreshing query-input completions.
	pub query_debounce_ms: u64,
	/// Rows per result page.
	pub page_size: usize,
	/// How long the error tooltip stays after the pointer leaves.
	pub tooltip_hold_ms: u64,
	/// Tooltip fade-out duration.
	pub tooltip_fade_ms: u64,
	/// Delay before a blurred dropdown closes.
	pub blur_grace_ms: u64,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			validate_debounce_ms: 300,
			query_debounce_ms: 150,
			page_size: PAGE_SIZE,
			tooltip_hold_ms: 1_000,
			tooltip_fade_ms: 300,
			blur_grace_ms: 150,
		}
	}
}

impl EditorConfig {
	pub fn validate_debounce(&self) -> Duration {
		Duration::from_millis(self.validate_debounce_ms)
	}

	pub fn query_debounce(&self) -> Duration {
		Duration::from_millis(self.query_debounce_ms)
	}

	pub fn tooltip_hold(&self) -> Duration {
		Duration::from_millis(self.tooltip_hold_ms)
	}

	pub fn tooltip_fade(&self) -> Duration {
		Duration::from_millis(self.tooltip_fade_ms)
	}

	pub fn blur_grace(&self) -> Duration {
		Duration::from_millis(self.blur_grace_ms)
	}
}

/// Account coloring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecorationConfig {
	/// Segment colors by depth; deeper segments reuse the last entry.
	pub palette: Vec<String>,
	/// Color of `:` separators.
	pub separator: String,
}

impl Default for DecorationConfig {
	fn default() -> Self {
		Self {
			palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
			separator: DEFAULT_SEPARATOR.to_string(),
		}
	}
}

/// Complete playground configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaygroundConfig {
	pub engine: EngineConfig,
	pub editor: EditorConfig,
	pub decorations: DecorationConfig,
}

impl PlaygroundConfig {
	/// Parses and validates TOML text.
	pub fn from_toml(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml(&text)
	}

	fn validate(&self) -> Result<()> {
		if self.decorations.palette.is_empty() {
			return Err(ConfigError::EmptyPalette);
		}
		for color in self.decorations.palette.iter().chain(std::iter::once(&self.decorations.separator)) {
			if !is_hex_color(color) {
				return Err(ConfigError::InvalidColor(color.clone()));
			}
		}
		Ok(())
	}
}

fn is_hex_color(s: &str) -> bool {
	s.strip_prefix('#')
		.is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
