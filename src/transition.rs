//! The deterministic transition table and the quadruple form used to run transitions backwards.

use std::collections::HashMap;

use crate::types::{Direction, Transition};

/// Deterministic mapping from `(state, symbol)` to the transition taken there.
///
/// A miss is not an error: `lookup` returns the `Direction::None` sentinel instead.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    rules: HashMap<String, HashMap<char, Transition>>,
    undefined: Transition,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionTable {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
            undefined: Transition::undefined(),
        }
    }

    /// Inserts the rule for `(state, read_symbol)`, silently replacing any previous one.
    pub fn add(
        &mut self,
        state: &str,
        read_symbol: char,
        next_state: &str,
        write_symbol: char,
        direction: Direction,
    ) {
        self.rules.entry(state.to_string()).or_default().insert(
            read_symbol,
            Transition {
                next_state: next_state.to_string(),
                write_symbol,
                direction,
            },
        );
    }

    /// Returns the stored transition, or the undefined sentinel when there is none.
    pub fn lookup(&self, state: &str, symbol: char) -> &Transition {
        self.rules
            .get(state)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .unwrap_or(&self.undefined)
    }

    /// Returns the number of stored rules.
    pub fn len(&self) -> usize {
        self.rules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One half of a quintuple in Bennett's quadruple form.
///
/// A quintuple `(q, s) -> (q', w, d)` splits into a `Write` quadruple that replaces `s` with
/// `w` and a `Shift` quadruple that moves the head by `d`. Both halves have exact inverses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quadruple {
    /// In `state` reading `read`: write `write` and enter `next`.
    Write {
        state: String,
        read: char,
        write: char,
        next: String,
    },
    /// In `state`: move the head by `direction` and enter `next`.
    Shift {
        state: String,
        direction: Direction,
        next: String,
    },
}

impl Quadruple {
    /// Splits a transition taken from `(state, read)` into its two quadruples, in execution order.
    pub fn split(state: &str, read: char, transition: &Transition) -> [Quadruple; 2] {
        [
            Quadruple::Write {
                state: state.to_string(),
                read,
                write: transition.write_symbol,
                next: transition.next_state.clone(),
            },
            Quadruple::Shift {
                state: transition.next_state.clone(),
                direction: transition.direction,
                next: transition.next_state.clone(),
            },
        ]
    }

    /// Splits a transition into the quadruples that undo it, in execution order.
    pub fn split_inverse(state: &str, read: char, transition: &Transition) -> [Quadruple; 2] {
        let [write, shift] = Self::split(state, read, transition);
        [shift.inverse(), write.inverse()]
    }

    /// Returns the quadruple that undoes this one.
    pub fn inverse(&self) -> Quadruple {
        match self {
            Quadruple::Write {
                state,
                read,
                write,
                next,
            } => Quadruple::Write {
                state: next.clone(),
                read: *write,
                write: *read,
                next: state.clone(),
            },
            Quadruple::Shift {
                state,
                direction,
                next,
            } => Quadruple::Shift {
                state: next.clone(),
                direction: direction.opposite(),
                next: state.clone(),
            },
        }
    }

    /// The state this quadruple must be applied from.
    pub fn state(&self) -> &str {
        match self {
            Quadruple::Write { state, .. } | Quadruple::Shift { state, .. } => state,
        }
    }

    /// The state entered after applying this quadruple.
    pub fn next(&self) -> &str {
        match self {
            Quadruple::Write { next, .. } | Quadruple::Shift { next, .. } => next,
        }
    }
}
