/// Debounced Dispatcher
///
/// Two independent guards:
/// - the debounce machine (`Idle` / `Pending(token)`) coalesces rapid text
///   edits into one dispatch per settling period; a newer token replaces
///   (cancels) the pending one
/// - the sequence number stamps every dispatch; only a result carrying the
///   latest issued number may be applied
///
/// The dispatcher never touches a timer or the store itself. It hands out
/// tokens and tickets; the shell turns them into runtime tasks.

use super::filter::{Filter, QueryState};

/// Debounce timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { token: u64 },
}

/// What caused a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOrigin {
    /// Initial unfiltered load
    Mount,
    /// Debounced text input
    Typing,
    /// Brand or type dropdown
    Facet,
    /// Suggestion picked
    Selection,
    /// Catalog changed underneath (import)
    Refresh,
}

/// A dispatched query: sequence number plus the filter sent to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub origin: DispatchOrigin,
    pub filter: Filter,
}

/// Verdict on a completed dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Latest dispatch; its result may be applied
    Current(DispatchOrigin),
    /// Superseded by a later dispatch; discard
    Stale,
}

#[derive(Debug)]
pub struct Dispatcher {
    state: DebounceState,
    last_token: u64,
    awaiting: Option<(u64, DispatchOrigin)>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            state: DebounceState::Idle,
            last_token: 0,
            awaiting: None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// A dispatch was issued and its result has not arrived yet
    pub fn is_waiting(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Text edit: start a new settling period, replacing any pending one.
    pub fn schedule(&mut self) -> u64 {
        self.last_token += 1;
        self.state = DebounceState::Pending {
            token: self.last_token,
        };
        self.last_token
    }

    /// Timer fired. Returns true when `token` is still the pending one,
    /// in which case the machine is back to `Idle` and the caller dispatches.
    pub fn fire(&mut self, token: u64) -> bool {
        match self.state {
            DebounceState::Pending { token: pending } if pending == token => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending timer (immediate dispatch paths).
    pub fn reset(&mut self) {
        self.state = DebounceState::Idle;
    }

    /// Stamp a new dispatch for the current query state.
    pub fn issue(&mut self, query: &mut QueryState, origin: DispatchOrigin) -> Ticket {
        query.seq += 1;
        self.awaiting = Some((query.seq, origin));
        Ticket {
            seq: query.seq,
            origin,
            filter: query.filter(),
        }
    }

    /// Classify a completed dispatch against the latest issued sequence number.
    pub fn complete(&mut self, query: &QueryState, seq: u64) -> Completion {
        match self.awaiting {
            Some((latest, origin)) if latest == seq && query.seq == seq => {
                self.awaiting = None;
                Completion::Current(origin)
            }
            _ => Completion::Stale,
        }
    }
}
