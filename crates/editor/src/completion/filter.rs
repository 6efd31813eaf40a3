//! Client-side candidate filtering.

use std::collections::BTreeSet;

use tally_engine::{Completion, CompletionKind};

/// Case-insensitive prefix filter over engine candidates, keeping order.
pub fn filter_candidates(items: &[Completion], query: &str) -> Vec<Completion> {
	let query = query.to_lowercase();
	items
		.iter()
		.filter(|item| item.label.to_lowercase().starts_with(&query))
		.cloned()
		.collect()
}

/// Known accounts starting with `prefix`, case-insensitively.
///
/// An account equal to `prefix` is left out; offering what is already typed
/// would only get in the way of Enter.
pub fn filter_accounts(known: &BTreeSet<String>, prefix: &str) -> Vec<Completion> {
	let needle = prefix.to_lowercase();
	known
		.iter()
		.filter(|account| account.as_str() != prefix && account.to_lowercase().starts_with(&needle))
		.map(|account| Completion::new(account.clone(), CompletionKind::Account))
		.collect()
}
