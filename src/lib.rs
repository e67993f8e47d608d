//! This crate provides a reversible Turing Machine simulator.
//! The engine runs a machine forward while recording its history, copies the result to an
//! output tape, and then replays the history backwards to restore the start configuration.
//! It also includes a parser and loader for machine descriptions, a static analyzer, and a
//! small library of built-in machines.

pub mod analyzer;
pub mod config;
pub mod loader;
pub mod machine;
pub mod notifier;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod transition;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the engine configuration.
pub use config::EngineConfig;
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the engine and its serializable view from the machine module.
pub use machine::{EngineView, RtmEngine, TapeView};
/// Re-exports the notifier trait and its stock implementations.
pub use notifier::{MessageLog, Notifier, Silent, TracingNotifier};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the built-in machine library.
pub use programs::{MachineInfo, MachineLibrary, MACHINES};
/// Re-exports the tape types.
pub use tape::{HistoryCell, Tape, TapeKind};
/// Re-exports the transition table and quadruple form.
pub use transition::{Quadruple, TransitionTable};
/// Re-exports the machine description, outcome and error types from the types module.
pub use types::{
    Direction, Halt, Machine, Quintuple, RtmError, Stage, Step, Transition, MAX_EXECUTION_STEPS,
    MAX_PROGRAM_SIZE,
};
