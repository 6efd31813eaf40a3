//! Engine result types.
//!
//! These mirror the JSON the engine returns. Ledger and query errors are
//! ordinary fields here: they are data to display, never Rust errors.

use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One ledger error. `line` is 1-based when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
	#[serde(default)]
	pub line: Option<u32>,
	pub message: String,
}

/// `validate(source)` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
	pub valid: bool,
	#[serde(default)]
	pub errors: Vec<ValidationError>,
}

/// `format(source)` result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatResult {
	#[serde(default)]
	pub formatted: Option<String>,
	#[serde(default)]
	pub errors: Vec<ValidationError>,
}

/// `query(source, q)` result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
	#[serde(default)]
	pub rows: Vec<Row>,
	#[serde(default)]
	pub columns: Option<Vec<String>>,
	#[serde(default)]
	pub error: Option<String>,
}

impl QueryResult {
	/// Column headers: the engine's `columns` when present, otherwise the keys
	/// of the first named row, otherwise `col1..colN` for positional rows.
	pub fn headers(&self) -> Vec<String> {
		if let Some(columns) = &self.columns {
			return columns.clone();
		}
		match self.rows.first() {
			Some(Row::Named(map)) => map.keys().cloned().collect(),
			Some(Row::Positional(cells)) => (1..=cells.len()).map(|i| format!("col{i}")).collect(),
			None => Vec::new(),
		}
	}
}

/// A result row: positional cells or a named mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Row {
	Positional(Vec<Cell>),
	Named(IndexMap<String, Cell>),
}

impl Row {
	/// Cell display strings in header order.
	///
	/// Positional rows are read by index, named rows by header name; missing
	/// cells render empty.
	pub fn display_cells(&self, headers: &[String]) -> Vec<String> {
		match self {
			Self::Positional(cells) => {
				let width = headers.len().max(cells.len());
				(0..width).map(|i| cells.get(i).map(Cell::to_string).unwrap_or_default()).collect()
			}
			Self::Named(map) => headers.iter().map(|h| map.get(h).map(Cell::to_string).unwrap_or_default()).collect(),
		}
	}
}

/// One result cell.
///
/// Variant order matters for untagged decoding: the most specific shapes
/// come first and anything unrecognised falls through to [`Cell::Scalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
	Inventory(Inventory),
	Position(Position),
	Amount(Amount),
	Scalar(Value),
}

/// `{number, currency}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
	#[serde(deserialize_with = "decimal")]
	pub number: String,
	pub currency: String,
}

/// Lot cost attached to a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
	#[serde(deserialize_with = "decimal")]
	pub number: String,
	pub currency: String,
	#[serde(default)]
	pub date: Option<String>,
	#[serde(default)]
	pub label: Option<String>,
}

/// `{units, cost?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
	pub units: Amount,
	#[serde(default)]
	pub cost: Option<Cost>,
}

/// `{positions: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
	pub positions: Vec<Position>,
}

fn decimal<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	match Value::deserialize(de)? {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		other => Err(serde::de::Error::custom(format!("expected a decimal, got {other}"))),
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.number, self.currency)
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.units)?;
		if let Some(cost) = &self.cost {
			write!(f, " {{{} {}}}", cost.number, cost.currency)?;
		}
		Ok(())
	}
}

impl fmt::Display for Inventory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, position) in self.positions.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{position}")?;
		}
		Ok(())
	}
}

impl fmt::Display for Cell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Inventory(inv) => fmt::Display::fmt(inv, f),
			Self::Position(pos) => fmt::Display::fmt(pos, f),
			Self::Amount(amount) => fmt::Display::fmt(amount, f),
			Self::Scalar(Value::Null) => Ok(()),
			Self::Scalar(Value::String(s)) => f.write_str(s),
			Self::Scalar(other) => write!(f, "{other}"),
		}
	}
}

/// Completion kinds the engine reports.
///
/// Unknown kinds are kept verbatim in [`CompletionKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompletionKind {
	Keyword,
	Function,
	Column,
	Table,
	Account,
	Currency,
	Directive,
	Operator,
	#[default]
	Unknown,
	Other(String),
}

impl From<String> for CompletionKind {
	fn from(s: String) -> Self {
		match s.to_ascii_lowercase().as_str() {
			"keyword" => Self::Keyword,
			"function" => Self::Function,
			"column" => Self::Column,
			"table" => Self::Table,
			"account" => Self::Account,
			"currency" | "commodity" => Self::Currency,
			"directive" => Self::Directive,
			"operator" => Self::Operator,
			"" => Self::Unknown,
			_ => Self::Other(s),
		}
	}
}

impl From<CompletionKind> for String {
	fn from(kind: CompletionKind) -> Self {
		kind.as_str().to_string()
	}
}

impl CompletionKind {
	/// Wire name of the kind, as the engine reports it.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Keyword => "keyword",
			Self::Function => "function",
			Self::Column => "column",
			Self::Table => "table",
			Self::Account => "account",
			Self::Currency => "currency",
			Self::Directive => "directive",
			Self::Operator => "operator",
			Self::Unknown => "",
			Self::Other(s) => s,
		}
	}

	/// Single-glyph badge for the dropdown.
	pub const fn glyph(&self) -> char {
		match self {
			Self::Keyword => 'K',
			Self::Function => 'ƒ',
			Self::Column => 'C',
			Self::Table => 'T',
			Self::Account => 'A',
			Self::Currency => '$',
			Self::Directive => 'D',
			Self::Operator => '±',
			Self::Unknown | Self::Other(_) => '·',
		}
	}
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
	pub label: String,
	#[serde(default, alias = "insertText")]
	pub insert_text: Option<String>,
	#[serde(default, alias = "type")]
	pub kind: CompletionKind,
	#[serde(default)]
	pub detail: Option<String>,
}

impl Completion {
	/// A candidate whose insert text is its label.
	pub fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
		Self {
			label: label.into(),
			insert_text: None,
			kind,
			detail: None,
		}
	}

	/// Text inserted on selection.
	pub fn text_to_insert(&self) -> &str {
		self.insert_text.as_deref().unwrap_or(&self.label)
	}
}

/// `completions(source, pos)` wire shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CompletionList {
	#[serde(default)]
	pub completions: Vec<Completion>,
}
