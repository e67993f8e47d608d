//! This module defines the core data structures and types used throughout the reversible
//! Turing Machine simulator, including machine descriptions, transitions, execution outcomes,
//! and the crate-wide error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::tape::TapeKind;
use crate::transition::TransitionTable;
use crate::Rule;

/// The default blank symbol used on every tape.
pub const DEFAULT_BLANK_SYMBOL: char = 'B';
/// The default number of cells allocated for each tape.
pub const DEFAULT_TAPE_CAPACITY: usize = 4096;
/// The maximum allowed size for a machine description in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The step ceiling front-ends apply when the user does not choose one.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// A machine description as produced by the loader.
///
/// The first declared state is the start state and the last one is the accept state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Machine {
    /// Declared states, in declaration order.
    pub states: Vec<String>,
    /// Symbols allowed in the input string.
    pub input_alphabet: Vec<char>,
    /// Symbols allowed anywhere on the tape.
    pub tape_alphabet: Vec<char>,
    /// The state the machine starts in.
    pub start_state: String,
    /// The terminal state that ends Stage 1.
    pub accept_state: String,
    /// Transition rules in declaration order.
    pub rules: Vec<Quintuple>,
    /// The initial content of the input tape.
    pub input: String,
}

impl Machine {
    /// Builds the transition table from the machine's rules.
    ///
    /// Later rules overwrite earlier ones that share a `(state, symbol)` key.
    pub fn table(&self) -> TransitionTable {
        let mut table = TransitionTable::new();
        for rule in &self.rules {
            table.add(
                &rule.state,
                rule.read,
                &rule.next_state,
                rule.write,
                rule.direction,
            );
        }
        table
    }
}

/// A five-tuple rule: in `state` reading `read`, write `write`, move, and enter `next_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quintuple {
    pub state: String,
    pub read: char,
    pub next_state: String,
    pub write: char,
    pub direction: Direction,
}

/// The action stored in the transition table for one `(state, symbol)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The next state the machine transitions to.
    pub next_state: String,
    /// The symbol written over the one that was read.
    pub write_symbol: char,
    /// Where the input head moves afterwards. `Direction::None` marks a missing transition.
    pub direction: Direction,
}

impl Transition {
    /// The sentinel returned by table lookups that miss.
    pub fn undefined() -> Self {
        Self {
            next_state: String::new(),
            write_symbol: DEFAULT_BLANK_SYMBOL,
            direction: Direction::None,
        }
    }

    /// Returns `true` unless this is the lookup-miss sentinel.
    pub fn is_defined(&self) -> bool {
        self.direction != Direction::None
    }
}

/// Represents the possible directions a tape head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// No movement. Only ever appears on the "no transition" sentinel.
    None,
}

impl Direction {
    /// Returns the direction that undoes this one.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::None => 'N',
        };
        write!(f, "{c}")
    }
}

/// The phase of the three-stage reversible execution protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Forward execution is open; `step` may be called.
    Stage1Running,
    /// Forward execution has halted (accepted or stuck).
    Stage1Done,
    /// The result has been copied onto the output tape.
    Stage2Done,
    /// The recorded history has been replayed backwards.
    Stage3Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Stage1Running => "stage 1 (running)",
            Stage::Stage1Done => "stage 1 (done)",
            Stage::Stage2Done => "stage 2 (done)",
            Stage::Stage3Done => "stage 3 (done)",
        };
        f.write_str(name)
    }
}

/// Represents the outcome of a forward step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a step and can continue.
    Continue,
    /// Stage 1 is over.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// The accept state was reached.
    Accept,
    /// The machine got stuck; carries the `UndefinedTransition` that stopped it.
    Err(RtmError),
}

/// Represents the errors that can occur while loading or running a reversible machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RtmError {
    /// No rule exists for the current state and the symbol under the head.
    #[error("No transition defined for state {state} and symbol '{symbol}'")]
    UndefinedTransition { state: String, symbol: char },
    /// A head would leave its tape's allocated buffer.
    #[error("Head of the {tape} tape would move out of bounds to position {position}")]
    HeadOutOfBounds { tape: TapeKind, position: isize },
    /// `undo` was called with no recorded steps.
    #[error("Nothing to undo")]
    EmptyUndo,
    /// An operation was called while the engine was in the wrong stage.
    #[error("Cannot {operation} during {stage}")]
    StageMisuse {
        operation: &'static str,
        stage: Stage,
    },
    /// The configured step ceiling was reached.
    #[error("Step limit of {0} reached")]
    StepLimitExceeded(usize),
    /// A history entry cannot be replayed against the current configuration.
    #[error("History entry ({state}, '{symbol}') does not match the machine")]
    InconsistentHistory { state: String, symbol: char },
    /// The input string does not fit on the tape.
    #[error("Input of length {length} does not fit a tape of {capacity} cells")]
    InputTooLong { length: usize, capacity: usize },
    /// Indicates an error during the parsing of a machine description.
    #[error("Machine parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a structural or logical problem in a machine description.
    #[error("Machine validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates an invalid engine configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn test_undefined_transition_sentinel() {
        let undefined = Transition::undefined();
        assert!(!undefined.is_defined());
        assert_eq!(undefined.direction, Direction::None);

        let defined = Transition {
            next_state: "1".to_string(),
            write_symbol: '1',
            direction: Direction::Right,
        };
        assert!(defined.is_defined());
    }

    #[test]
    fn test_machine_table_last_rule_wins() {
        let machine = Machine {
            states: vec!["0".into(), "1".into()],
            input_alphabet: vec!['0'],
            tape_alphabet: vec!['0', '1', 'B'],
            start_state: "0".into(),
            accept_state: "1".into(),
            rules: vec![
                Quintuple {
                    state: "0".into(),
                    read: '0',
                    next_state: "1".into(),
                    write: '0',
                    direction: Direction::Left,
                },
                Quintuple {
                    state: "0".into(),
                    read: '0',
                    next_state: "1".into(),
                    write: '1',
                    direction: Direction::Right,
                },
            ],
            input: "0".into(),
        };

        let table = machine.table();
        let transition = table.lookup("0", '0');
        assert_eq!(transition.write_symbol, '1');
        assert_eq!(transition.direction, Direction::Right);
    }

    #[test]
    fn test_error_display() {
        let error = RtmError::UndefinedTransition {
            state: "q0".to_string(),
            symbol: '1',
        };
        let msg = error.to_string();
        assert!(msg.contains("q0"));
        assert!(msg.contains("'1'"));

        let misuse = RtmError::StageMisuse {
            operation: "run stage 2",
            stage: Stage::Stage1Running,
        };
        assert_eq!(misuse.to_string(), "Cannot run stage 2 during stage 1 (running)");
    }
}
