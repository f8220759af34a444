/// Selection Resolver
///
/// Picking a suggestion is an unconditional override: the chosen model
/// becomes the search term and the brand/type dropdowns are cleared, so
/// the next query searches the whole catalog.

use super::filter::QueryState;

/// New authoritative query state after the user picks `model`.
///
/// The sequence number carries over; the caller issues the next dispatch.
pub fn select_suggestion(current: &QueryState, model: &str) -> QueryState {
    QueryState {
        brand: None,
        kind: None,
        term: model.to_string(),
        kind_implied: false,
        seq: current.seq,
    }
}
