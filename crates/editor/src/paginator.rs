//! Client-side pagination of query results.

use tally_engine::{QueryResult, Row};

/// Rows per page.
pub const PAGE_SIZE: usize = 100;

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
	/// 0-based page index.
	pub page: usize,
	pub total_pages: usize,
	pub headers: Vec<String>,
	/// Display strings, one inner vector per row.
	pub rows: Vec<Vec<String>>,
	/// 1-based number of the first row shown, 0 when there are no rows.
	pub first_row: usize,
	/// 1-based number of the last row shown, 0 when there are no rows.
	pub last_row: usize,
	pub total_rows: usize,
}

impl Page {
	/// "rows 1-100 of 250" style label.
	pub fn range_label(&self) -> String {
		format!("rows {}\u{2013}{} of {}", self.first_row, self.last_row, self.total_rows)
	}
}

/// Holds one query result and slices it into pages on demand.
///
/// The rows are never re-fetched; rendering only formats the requested
/// slice. Replacing the result resets to page 0.
#[derive(Debug, Clone)]
pub struct ResultPaginator {
	headers: Vec<String>,
	rows: Vec<Row>,
	page: usize,
	page_size: usize,
}

impl Default for ResultPaginator {
	fn default() -> Self {
		Self::new(PAGE_SIZE)
	}
}

impl ResultPaginator {
	/// A paginator with `page_size` rows per page (at least 1).
	pub fn new(page_size: usize) -> Self {
		Self {
			headers: Vec::new(),
			rows: Vec::new(),
			page: 0,
			page_size: page_size.max(1),
		}
	}

	/// Replaces the result and resets to page 0.
	pub fn set_result(&mut self, rows: Vec<Row>, headers: Vec<String>) {
		self.rows = rows;
		self.headers = headers;
		self.page = 0;
	}

	/// Takes the rows of `result`, deriving headers when the engine sent none.
	pub fn set_query_result(&mut self, result: QueryResult) {
		let headers = result.headers();
		self.set_result(result.rows, headers);
	}

	pub fn clear(&mut self) {
		self.set_result(Vec::new(), Vec::new());
	}

	pub const fn page(&self) -> usize {
		self.page
	}

	pub fn total_rows(&self) -> usize {
		self.rows.len()
	}

	pub fn total_pages(&self) -> usize {
		self.rows.len().div_ceil(self.page_size)
	}

	pub fn headers(&self) -> &[String] {
		&self.headers
	}

	/// Renders page `n`. Out-of-bounds pages render as `None`, except that
	/// page 0 of an empty result renders as an empty page.
	pub fn render_page(&self, n: usize) -> Option<Page> {
		let total_pages = self.total_pages();
		if n >= total_pages && !(n == 0 && total_pages == 0) {
			return None;
		}
		let start = n * self.page_size;
		let end = (start + self.page_size).min(self.rows.len());
		let rows: Vec<_> = self.rows[start..end].iter().map(|r| r.display_cells(&self.headers)).collect();
		let (first_row, last_row) = if rows.is_empty() { (0, 0) } else { (start + 1, end) };
		Some(Page {
			page: n,
			total_pages,
			headers: self.headers.clone(),
			rows,
			first_row,
			last_row,
			total_rows: self.rows.len(),
		})
	}

	/// The page currently displayed.
	pub fn current(&self) -> Page {
		self.render_page(self.page).unwrap_or_else(|| Page {
			page: 0,
			total_pages: 0,
			headers: self.headers.clone(),
			rows: Vec::new(),
			first_row: 0,
			last_row: 0,
			total_rows: 0,
		})
	}

	/// Switches to page `n`. Out-of-bounds pages leave the display unchanged.
	///
	/// Returns `true` if the page changed.
	pub fn go_to(&mut self, n: usize) -> bool {
		if n >= self.total_pages() || n == self.page {
			return false;
		}
		self.page = n;
		true
	}

	/// Moves by `delta` pages (previous/next buttons). Moving before the
	/// first page or past the last is a no-op.
	pub fn step(&mut self, delta: isize) -> bool {
		self.page.checked_add_signed(delta).is_some_and(|n| self.go_to(n))
	}
}
