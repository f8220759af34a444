/// Result Reducer
///
/// Derives the two views from one store result:
/// - the table: the full match set, untouched (the store decides matching)
/// - the suggestions: the first few records in store order, only while a
///   search term is active
///
/// Column derivation uses the union of keys across all returned records:
/// `brand`, `model`, `type` first, then every other non-internal key in
/// alphabetical order.

use crate::state::data::Record;
use std::collections::BTreeSet;

/// Columns every table starts with
pub const LEADING_COLUMNS: [&str; 3] = ["brand", "model", "type"];

/// How the suggestion list is cut from the match set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionPolicy {
    pub limit: usize,
    /// Collapse repeated model names to their first occurrence
    pub dedupe: bool,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            limit: 5,
            dedupe: true,
        }
    }
}

/// Everything the UI renders from a query result
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub table: Vec<Record>,
    pub suggestions: Vec<Record>,
    pub columns: Vec<String>,
}

impl Default for ResultView {
    fn default() -> Self {
        Self {
            table: Vec::new(),
            suggestions: Vec::new(),
            columns: columns(&[]),
        }
    }
}

impl ResultView {
    /// Nothing matched; the UI shows the "not found" placeholder
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn close_suggestions(&mut self) {
        self.suggestions.clear();
    }
}

pub fn reduce(records: Vec<Record>, term: &str, policy: SuggestionPolicy) -> ResultView {
    let suggestions = suggestions(&records, term, policy);
    let columns = columns(&records);
    ResultView {
        table: records,
        suggestions,
        columns,
    }
}

/// First `policy.limit` records of the match set, in store order.
pub fn suggestions(records: &[Record], term: &str, policy: SuggestionPolicy) -> Vec<Record> {
    if term.is_empty() {
        return Vec::new();
    }

    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter(|record| !policy.dedupe || seen.insert(record.model.as_str()))
        .take(policy.limit)
        .cloned()
        .collect()
}

/// Union of displayable keys across `records`.
pub fn columns(records: &[Record]) -> Vec<String> {
    let extra: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.fields.keys())
        .map(String::as_str)
        .filter(|key| !Record::is_internal_field(key) && !LEADING_COLUMNS.contains(key))
        .collect();

    LEADING_COLUMNS
        .iter()
        .copied()
        .chain(extra)
        .map(str::to_string)
        .collect()
}
