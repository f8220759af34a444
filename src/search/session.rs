/// Search Session
///
/// Owns the live query state, the dispatcher and the derived result view.
/// Every user event and every async completion is one method; methods that
/// need the outside world return an `Effect` for the shell to run. The
/// session itself never sleeps or touches the store.
///
/// Transitions:
/// ```text
/// IDLE --(text edit)--> PENDING --(timer fires)--> IDLE (dispatch issued)
/// IDLE/PENDING --(dropdown change)--> IDLE (immediate dispatch, term cleared)
/// IDLE/PENDING --(suggestion click)--> IDLE (immediate dispatch, term=model, filters cleared)
/// ```

use super::dispatcher::{Completion, DebounceState, DispatchOrigin, Dispatcher, Ticket};
use super::filter::QueryState;
use super::reducer::{reduce, ResultView, SuggestionPolicy};
use super::selection;
use crate::config::{BrandTypeMap, SearchConfig};
use crate::error::CatalogError;
use crate::state::data::Record;
use std::time::Duration;

/// Work the shell must perform on the session's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Call `debounce_elapsed(token)` after `delay`
    Schedule { token: u64, delay: Duration },
    /// Run the query and report back through `query_finished(ticket.seq, ..)`
    Dispatch(Ticket),
}

/// What happened to a completed query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Stale,
    Failed,
}

#[derive(Debug)]
pub struct SearchSession {
    query: QueryState,
    dispatcher: Dispatcher,
    view: ResultView,
    policy: SuggestionPolicy,
    debounce: Duration,
    brand_types: BrandTypeMap,
    diagnostic: Option<String>,
}

impl SearchSession {
    /// Mount: empty filter, immediate unfiltered dispatch.
    pub fn new(config: &SearchConfig) -> (Self, Effect) {
        let mut session = Self {
            query: QueryState::default(),
            dispatcher: Dispatcher::new(),
            view: ResultView::default(),
            policy: SuggestionPolicy {
                limit: config.suggestion_limit,
                dedupe: config.dedupe_suggestions,
            },
            debounce: config.debounce(),
            brand_types: config.brand_types.clone(),
            diagnostic: None,
        };
        let effect = session.dispatch(DispatchOrigin::Mount);
        (session, effect)
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn view(&self) -> &ResultView {
        &self.view
    }

    /// Last store failure, cleared by the next applied result
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.dispatcher.state()
    }

    /// A query is pending or in flight
    pub fn is_searching(&self) -> bool {
        self.dispatcher.is_waiting() || self.dispatcher.state() != DebounceState::Idle
    }

    /// Text input changed.
    pub fn edit_term(&mut self, text: String) -> Effect {
        self.query.term = text;
        if self.query.term.is_empty() {
            self.view.close_suggestions();
        }

        let token = self.dispatcher.schedule();
        Effect::Schedule {
            token,
            delay: self.debounce,
        }
    }

    /// Debounce timer fired. Dispatches the filter as it is *now*.
    pub fn debounce_elapsed(&mut self, token: u64) -> Effect {
        if !self.dispatcher.fire(token) {
            tracing::trace!(token, "superseded debounce timer ignored");
            return Effect::None;
        }
        self.dispatch(DispatchOrigin::Typing)
    }

    /// Brand dropdown changed (None = all brands).
    ///
    /// A mapped brand implies its type. An implied type goes away with the
    /// brand that implied it; a type the user picked stays.
    pub fn select_brand(&mut self, brand: Option<String>) -> Effect {
        match brand
            .as_deref()
            .and_then(|brand| self.brand_types.implied_type(brand))
        {
            Some(kind) => {
                self.query.kind = Some(kind.to_string());
                self.query.kind_implied = true;
            }
            None if self.query.kind_implied => {
                self.query.kind = None;
                self.query.kind_implied = false;
            }
            None => {}
        }
        self.query.brand = brand;
        self.leave_typing();
        self.dispatch(DispatchOrigin::Facet)
    }

    /// Type dropdown changed (None = all types).
    pub fn select_type(&mut self, kind: Option<String>) -> Effect {
        self.query.kind = kind;
        self.query.kind_implied = false;
        self.leave_typing();
        self.dispatch(DispatchOrigin::Facet)
    }

    /// A suggestion was picked.
    pub fn select_suggestion(&mut self, model: &str) -> Effect {
        self.query = selection::select_suggestion(&self.query, model);
        self.view.close_suggestions();
        self.dispatcher.reset();
        self.dispatch(DispatchOrigin::Selection)
    }

    /// Re-run the current filter (catalog contents changed).
    pub fn refresh(&mut self) -> Effect {
        self.dispatch(DispatchOrigin::Refresh)
    }

    /// A dispatched query completed.
    pub fn query_finished(
        &mut self,
        seq: u64,
        result: Result<Vec<Record>, CatalogError>,
    ) -> Outcome {
        let origin = match self.dispatcher.complete(&self.query, seq) {
            Completion::Current(origin) => origin,
            Completion::Stale => {
                tracing::debug!(seq, latest = self.query.seq, "discarding stale result");
                return Outcome::Stale;
            }
        };

        match result {
            Ok(records) => {
                // Suggestions only follow typing; picks and dropdowns keep the list closed.
                let term = match origin {
                    DispatchOrigin::Typing => self.query.term.as_str(),
                    _ => "",
                };
                self.view = reduce(records, term, self.policy);
                self.diagnostic = None;
                tracing::debug!(
                    seq,
                    rows = self.view.table.len(),
                    suggestions = self.view.suggestions.len(),
                    "query applied"
                );
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!(seq, "query failed, keeping previous results: {err}");
                self.diagnostic = Some(err.to_string());
                Outcome::Failed
            }
        }
    }

    fn leave_typing(&mut self) {
        self.query.term.clear();
        self.view.close_suggestions();
        self.dispatcher.reset();
    }

    fn dispatch(&mut self, origin: DispatchOrigin) -> Effect {
        let ticket = self.dispatcher.issue(&mut self.query, origin);
        tracing::debug!(seq = ticket.seq, ?origin, filter = ?ticket.filter, "dispatching query");
        Effect::Dispatch(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::Library;

    fn mount() -> (SearchSession, Ticket) {
        let (session, effect) = SearchSession::new(&SearchConfig::default());
        (session, expect_dispatch(effect))
    }

    fn expect_dispatch(effect: Effect) -> Ticket {
        match effect {
            Effect::Dispatch(ticket) => ticket,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    fn expect_schedule(effect: Effect) -> u64 {
        match effect {
            Effect::Schedule { token, delay } => {
                assert_eq!(delay, Duration::from_millis(300));
                token
            }
            other => panic!("expected schedule, got {other:?}"),
        }
    }

    fn records(models: &[&str]) -> Vec<Record> {
        models.iter().map(|m| Record::new("MRF", *m)).collect()
    }

    fn scenario_library() -> Library {
        let library = Library::open_in_memory().unwrap();
        library
            .insert_record(
                &Record::new("MRF", "ZLX")
                    .with_field("dp", 100)
                    .with_field("mrp", 150),
            )
            .unwrap();
        library
            .insert_record(
                &Record::new("CEAT", "ZLX2")
                    .with_field("dp", 90)
                    .with_field("mrp", 140),
            )
            .unwrap();
        library
    }

    #[test]
    fn test_mount_dispatches_unfiltered() {
        let (session, ticket) = mount();
        assert!(ticket.filter.is_unconstrained());
        assert_eq!(ticket.origin, DispatchOrigin::Mount);
        assert!(session.is_searching());
    }

    #[test]
    fn test_burst_of_edits_dispatches_final_filter_once() {
        let (mut session, mount) = mount();
        session.query_finished(mount.seq, Ok(Vec::new()));

        let tokens: Vec<u64> = ["z", "zl", "zlx"]
            .iter()
            .map(|text| expect_schedule(session.edit_term(text.to_string())))
            .collect();

        let dispatches: Vec<Ticket> = tokens
            .iter()
            .filter_map(|token| match session.debounce_elapsed(*token) {
                Effect::Dispatch(ticket) => Some(ticket),
                _ => None,
            })
            .collect();

        assert_eq!(dispatches.len(), 1);
        assert_eq!(dispatches[0].filter.search.as_deref(), Some("zlx"));
        assert_eq!(session.debounce_state(), DebounceState::Idle);
    }

    #[test]
    fn test_timer_reads_state_at_fire_time() {
        let (mut session, _) = mount();
        session.select_brand(Some("MRF".to_string()));
        let token = expect_schedule(session.edit_term("zl".to_string()));

        let ticket = expect_dispatch(session.debounce_elapsed(token));
        assert_eq!(ticket.filter.brand.as_deref(), Some("MRF"));
        assert_eq!(ticket.filter.search.as_deref(), Some("zl"));
    }

    #[test]
    fn test_stale_result_never_overwrites_newer() {
        let (mut session, _) = mount();
        let token = expect_schedule(session.edit_term("zl".to_string()));
        let a = expect_dispatch(session.debounce_elapsed(token));
        let b = expect_dispatch(session.select_type(Some("RADIAL".to_string())));

        assert_eq!(session.query_finished(b.seq, Ok(records(&["B"]))), Outcome::Applied);
        assert_eq!(session.query_finished(a.seq, Ok(records(&["A"]))), Outcome::Stale);

        assert_eq!(session.view().table, records(&["B"]));
    }

    #[test]
    fn test_typing_result_opens_suggestions() {
        let (mut session, _) = mount();
        let token = expect_schedule(session.edit_term("zlx".to_string()));
        let ticket = expect_dispatch(session.debounce_elapsed(token));

        let matches = records(&["ZLX1", "ZLX2", "ZLX3", "ZLX4", "ZLX5", "ZLX6", "ZLX7"]);
        session.query_finished(ticket.seq, Ok(matches));

        assert_eq!(session.view().table.len(), 7);
        assert_eq!(session.view().suggestions.len(), 5);
    }

    #[test]
    fn test_clearing_text_closes_suggestions_immediately() {
        let (mut session, _) = mount();
        let token = expect_schedule(session.edit_term("zlx".to_string()));
        let ticket = expect_dispatch(session.debounce_elapsed(token));
        session.query_finished(ticket.seq, Ok(records(&["ZLX"])));
        assert!(!session.view().suggestions.is_empty());

        expect_schedule(session.edit_term(String::new()));
        assert!(session.view().suggestions.is_empty());
    }

    #[test]
    fn test_dropdown_bypasses_debounce_and_clears_term() {
        let (mut session, _) = mount();
        let token = expect_schedule(session.edit_term("zlx".to_string()));

        let ticket = expect_dispatch(session.select_brand(Some("CEAT".to_string())));

        assert_eq!(ticket.origin, DispatchOrigin::Facet);
        assert_eq!(ticket.filter.brand.as_deref(), Some("CEAT"));
        assert!(ticket.filter.search.is_none());
        assert!(session.query().term.is_empty());
        assert_eq!(session.debounce_state(), DebounceState::Idle);
        // The abandoned timer must not dispatch later
        assert_eq!(session.debounce_elapsed(token), Effect::None);
    }

    #[test]
    fn test_brand_type_mapping_applies_on_selection() {
        let config = SearchConfig {
            brand_types: BrandTypeMap::new([("Havells".to_string(), "ELECTRICAL".to_string())]),
            ..SearchConfig::default()
        };
        let (mut session, _) = SearchSession::new(&config);

        let ticket = expect_dispatch(session.select_brand(Some("HAVELLS".to_string())));
        assert_eq!(ticket.filter.kind.as_deref(), Some("ELECTRICAL"));

        let ticket = expect_dispatch(session.select_brand(Some("MRF".to_string())));
        assert!(ticket.filter.kind.is_none());
        assert_eq!(ticket.filter.brand.as_deref(), Some("MRF"));
    }

    #[test]
    fn test_implied_type_is_dropped_with_its_brand() {
        let config = SearchConfig {
            brand_types: BrandTypeMap::new([("Havells".to_string(), "ELECTRICAL".to_string())]),
            ..SearchConfig::default()
        };
        let library = scenario_library();
        let (mut session, _) = SearchSession::new(&config);

        session.select_brand(Some("Havells".to_string()));
        let ticket = expect_dispatch(session.select_brand(Some("MRF".to_string())));
        session.query_finished(ticket.seq, library.find(&ticket.filter));
        assert_eq!(session.view().table.len(), 1);

        session.select_brand(Some("Havells".to_string()));
        let ticket = expect_dispatch(session.select_brand(None));
        assert!(ticket.filter.is_unconstrained());
        session.query_finished(ticket.seq, library.find(&ticket.filter));
        assert_eq!(session.view().table.len(), 2);
    }

    #[test]
    fn test_user_picked_type_survives_brand_change() {
        let config = SearchConfig {
            brand_types: BrandTypeMap::new([("Havells".to_string(), "ELECTRICAL".to_string())]),
            ..SearchConfig::default()
        };
        let (mut session, _) = SearchSession::new(&config);

        session.select_type(Some("RADIAL".to_string()));
        let ticket = expect_dispatch(session.select_brand(Some("MRF".to_string())));
        assert_eq!(ticket.filter.kind.as_deref(), Some("RADIAL"));

        // Picking the implied type by hand makes it the user's own
        session.select_brand(Some("Havells".to_string()));
        session.select_type(Some("ELECTRICAL".to_string()));
        let ticket = expect_dispatch(session.select_brand(None));
        assert_eq!(ticket.filter.kind.as_deref(), Some("ELECTRICAL"));
    }

    #[test]
    fn test_suggestion_pick_overrides_filters() {
        let (mut session, _) = mount();
        session.select_brand(Some("MRF".to_string()));
        session.select_type(Some("RADIAL".to_string()));
        let token = expect_schedule(session.edit_term("Mod".to_string()));

        let ticket = expect_dispatch(session.select_suggestion("ModelX"));

        assert_eq!(ticket.origin, DispatchOrigin::Selection);
        assert!(ticket.filter.brand.is_none());
        assert!(ticket.filter.kind.is_none());
        assert_eq!(ticket.filter.search.as_deref(), Some("ModelX"));
        assert_eq!(session.debounce_state(), DebounceState::Idle);
        assert_eq!(session.debounce_elapsed(token), Effect::None);

        session.query_finished(ticket.seq, Ok(records(&["ModelX"])));
        assert!(session.view().suggestions.is_empty());
        assert_eq!(session.view().table.len(), 1);
    }

    #[test]
    fn test_failure_keeps_previous_view() {
        let (mut session, mount) = mount();
        session.query_finished(mount.seq, Ok(records(&["ZLX"])));
        let before = session.view().clone();

        let token = expect_schedule(session.edit_term("z".to_string()));
        let ticket = expect_dispatch(session.debounce_elapsed(token));
        let outcome = session.query_finished(
            ticket.seq,
            Err(CatalogError::Transport("database is locked".to_string())),
        );

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(session.view(), &before);
        assert!(session.diagnostic().unwrap().contains("database is locked"));
        assert!(!session.is_searching());

        // Still usable afterwards
        let token = expect_schedule(session.edit_term("zl".to_string()));
        let ticket = expect_dispatch(session.debounce_elapsed(token));
        assert_eq!(session.query_finished(ticket.seq, Ok(Vec::new())), Outcome::Applied);
        assert!(session.diagnostic().is_none());
    }

    #[test]
    fn test_refresh_keeps_term() {
        let (mut session, _) = mount();
        session.edit_term("zlx".to_string());

        let ticket = expect_dispatch(session.refresh());
        assert_eq!(ticket.origin, DispatchOrigin::Refresh);
        assert_eq!(ticket.filter.search.as_deref(), Some("zlx"));
    }

    #[test]
    fn test_search_scenario_against_catalog() {
        let library = scenario_library();
        let (mut session, mount) = mount();
        session.query_finished(mount.seq, library.find(&mount.filter));
        assert_eq!(session.view().table.len(), 2);

        let token = expect_schedule(session.edit_term("zlx".to_string()));
        let ticket = expect_dispatch(session.debounce_elapsed(token));
        session.query_finished(ticket.seq, library.find(&ticket.filter));
        assert_eq!(session.view().table.len(), 2);
        assert_eq!(session.view().suggestions.len(), 2);
        assert_eq!(
            session.view().columns,
            vec!["brand", "model", "type", "dp", "mrp"]
        );

        let ticket = expect_dispatch(session.select_brand(Some("mrf".to_string())));
        session.query_finished(ticket.seq, library.find(&ticket.filter));
        assert_eq!(session.view().table.len(), 1);
        assert_eq!(session.view().table[0].brand, "MRF");
    }

    #[test]
    fn test_no_match_scenario() {
        let library = scenario_library();
        let (mut session, _) = mount();
        session.select_brand(Some("MRF".to_string()));
        let ticket = expect_dispatch(session.select_type(Some("RADIAL".to_string())));

        session.query_finished(ticket.seq, library.find(&ticket.filter));

        assert!(session.view().is_empty());
        assert!(session.view().suggestions.is_empty());
    }

    #[test]
    fn test_same_filter_twice_is_idempotent() {
        let library = scenario_library();
        let (mut session, _) = mount();

        let first = expect_dispatch(session.select_brand(Some("CEAT".to_string())));
        session.query_finished(first.seq, library.find(&first.filter));
        let table = session.view().table.clone();

        let second = expect_dispatch(session.refresh());
        assert_eq!(first.filter, second.filter);
        session.query_finished(second.seq, library.find(&second.filter));
        assert_eq!(session.view().table, table);
    }
}
