/// Search engine module
///
/// The incremental-query core: everything between a keystroke and the
/// rendered table/suggestion list, free of I/O.
///
/// - Query Builder (filter.rs): raw inputs -> normalized `Filter`
/// - Debounced Dispatcher (dispatcher.rs): settling timer + staleness guard
/// - Result Reducer (reducer.rs): store result -> table, suggestions, columns
/// - Selection Resolver (selection.rs): suggestion pick -> new query state
/// - Search Session (session.rs): owns the state and sequences the above

pub mod dispatcher;
pub mod filter;
pub mod reducer;
pub mod selection;
pub mod session;
