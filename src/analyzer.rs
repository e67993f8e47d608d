//! This module provides functions for analyzing machine descriptions to detect common errors
//! and inconsistencies before execution. This includes checks for duplicated declarations,
//! undeclared states and symbols, conflicting rules, and an unreachable accept state.

use crate::types::{Machine, RtmError};
use std::collections::{HashMap, HashSet};

/// Represents the errors that can be found during the analysis of a machine description.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Indicates problems with the overall shape of the description (no states, etc.).
    StructuralError(String),
    /// Indicates states declared more than once.
    DuplicateStates(Vec<String>),
    /// Indicates symbols declared more than once in the same alphabet.
    DuplicateSymbols(Vec<char>),
    /// Indicates states used by rules but missing from the state list.
    UndeclaredStates(Vec<String>),
    /// Indicates symbols used by rules or the input alphabet but missing from the tape alphabet.
    UnknownSymbols(Vec<char>),
    /// Indicates input symbols that are not part of the input alphabet.
    InvalidInputSymbols(Vec<char>),
    /// Indicates `(state, symbol)` keys with more than one distinct action.
    NondeterministicRules(Vec<String>),
    /// Indicates that no sequence of rules leads from the start state to the accept state.
    UnreachableAccept(String),
}

impl From<AnalysisError> for RtmError {
    /// Converts an `AnalysisError` into a `RtmError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::StructuralError(msg) => RtmError::ValidationError(msg),
            AnalysisError::DuplicateStates(states) => {
                RtmError::ValidationError(format!("States declared more than once: {:?}", states))
            }
            AnalysisError::DuplicateSymbols(symbols) => RtmError::ValidationError(format!(
                "Symbols declared more than once: {:?}",
                symbols
            )),
            AnalysisError::UndeclaredStates(states) => RtmError::ValidationError(format!(
                "Rules reference undeclared states: {:?}",
                states
            )),
            AnalysisError::UnknownSymbols(symbols) => RtmError::ValidationError(format!(
                "Symbols missing from the tape alphabet: {:?}",
                symbols
            )),
            AnalysisError::InvalidInputSymbols(symbols) => RtmError::ValidationError(format!(
                "Input contains symbols outside the input alphabet: {:?}",
                symbols
            )),
            AnalysisError::NondeterministicRules(keys) => RtmError::ValidationError(format!(
                "Conflicting rules for: {}",
                keys.join(", ")
            )),
            AnalysisError::UnreachableAccept(state) => RtmError::ValidationError(format!(
                "Accept state {} is unreachable from the start state",
                state
            )),
        }
    }
}

/// Analyzes a `Machine` for structural and logical errors.
///
/// # Arguments
///
/// * `machine` - A reference to the `Machine` to be analyzed.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(RtmError::ValidationError)` describing the first problem found.
pub fn analyze(machine: &Machine) -> Result<(), RtmError> {
    let errors = [
        check_structure,
        check_declarations,
        check_rule_states,
        check_symbols,
        check_input,
        check_determinism,
        check_accept_reachable,
    ]
    .iter()
    .filter_map(|f| f(machine).err())
    .collect::<Vec<_>>();

    match errors.into_iter().next() {
        Some(first_error) => Err(first_error.into()),
        None => Ok(()),
    }
}

/// Checks that states exist and that the start and accept states are among them.
fn check_structure(machine: &Machine) -> Result<(), AnalysisError> {
    if machine.states.is_empty() {
        return Err(AnalysisError::StructuralError(
            "No states declared".to_string(),
        ));
    }

    for (role, state) in [
        ("start", &machine.start_state),
        ("accept", &machine.accept_state),
    ] {
        if !machine.states.contains(state) {
            return Err(AnalysisError::StructuralError(format!(
                "The {} state {} is not declared",
                role, state
            )));
        }
    }

    Ok(())
}

/// Checks that no state or symbol is declared twice.
fn check_declarations(machine: &Machine) -> Result<(), AnalysisError> {
    let duplicate_states = duplicates(&machine.states);
    if !duplicate_states.is_empty() {
        return Err(AnalysisError::DuplicateStates(duplicate_states));
    }

    let mut duplicate_symbols = duplicates(&machine.input_alphabet);
    duplicate_symbols.extend(duplicates(&machine.tape_alphabet));
    if !duplicate_symbols.is_empty() {
        duplicate_symbols.sort();
        duplicate_symbols.dedup();
        return Err(AnalysisError::DuplicateSymbols(duplicate_symbols));
    }

    Ok(())
}

/// Checks that every rule starts from and leads to a declared state.
fn check_rule_states(machine: &Machine) -> Result<(), AnalysisError> {
    let declared: HashSet<&String> = machine.states.iter().collect();

    let mut undeclared: Vec<String> = machine
        .rules
        .iter()
        .flat_map(|rule| [&rule.state, &rule.next_state])
        .filter(|state| !declared.contains(state))
        .cloned()
        .collect();

    if !undeclared.is_empty() {
        undeclared.sort();
        undeclared.dedup();
        return Err(AnalysisError::UndeclaredStates(undeclared));
    }

    Ok(())
}

/// Checks that the input alphabet and every symbol read or written by a rule belong to the
/// tape alphabet.
fn check_symbols(machine: &Machine) -> Result<(), AnalysisError> {
    let tape: HashSet<char> = machine.tape_alphabet.iter().copied().collect();

    let mut unknown: Vec<char> = machine
        .input_alphabet
        .iter()
        .copied()
        .chain(machine.rules.iter().flat_map(|rule| [rule.read, rule.write]))
        .filter(|symbol| !tape.contains(symbol))
        .collect();

    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(AnalysisError::UnknownSymbols(unknown));
    }

    Ok(())
}

/// Checks that the input string only uses input symbols.
fn check_input(machine: &Machine) -> Result<(), AnalysisError> {
    let alphabet: HashSet<char> = machine.input_alphabet.iter().copied().collect();

    let mut invalid: Vec<char> = machine
        .input
        .chars()
        .filter(|symbol| !alphabet.contains(symbol))
        .collect();

    if !invalid.is_empty() {
        invalid.sort();
        invalid.dedup();
        return Err(AnalysisError::InvalidInputSymbols(invalid));
    }

    Ok(())
}

/// Checks that no `(state, symbol)` key is given two different actions.
///
/// Repeating an identical rule is harmless and accepted.
fn check_determinism(machine: &Machine) -> Result<(), AnalysisError> {
    let mut actions = HashMap::new();
    let mut conflicts = Vec::new();

    for rule in &machine.rules {
        let key = (rule.state.as_str(), rule.read);
        let action = (rule.next_state.as_str(), rule.write, rule.direction);

        match actions.insert(key, action) {
            Some(previous) if previous != action => {
                conflicts.push(format!("({},{})", rule.state, rule.read));
            }
            _ => {}
        }
    }

    if !conflicts.is_empty() {
        conflicts.sort();
        conflicts.dedup();
        return Err(AnalysisError::NondeterministicRules(conflicts));
    }

    Ok(())
}

/// Checks that the accept state can be reached from the start state by following rules.
fn check_accept_reachable(machine: &Machine) -> Result<(), AnalysisError> {
    let mut visited = HashSet::new();
    let mut queue = vec![machine.start_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for rule in machine.rules.iter().filter(|rule| rule.state == state) {
            if !visited.contains(rule.next_state.as_str()) {
                queue.push(&rule.next_state);
            }
        }
    }

    if !visited.contains(machine.accept_state.as_str()) {
        return Err(AnalysisError::UnreachableAccept(
            machine.accept_state.clone(),
        ));
    }

    Ok(())
}

/// Returns the items that appear more than once, sorted.
fn duplicates<T: Clone + Ord + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut repeated: Vec<T> = items
        .iter()
        .filter(|item| !seen.insert(*item))
        .cloned()
        .collect();
    repeated.sort();
    repeated.dedup();
    repeated
}
