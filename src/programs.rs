//! Built-in machine descriptions, embedded at compile time and parsed on first use.

use crate::types::{Machine, RtmError};

// Embedded machines, as (name, description) pairs.
const MACHINE_TEXTS: [(&str, &str); 4] = [
    ("flip", include_str!("../machines/flip.rtm")),
    (
        "unary-successor",
        include_str!("../machines/unary-successor.rtm"),
    ),
    (
        "binary-complement",
        include_str!("../machines/binary-complement.rtm"),
    ),
    ("even-ones", include_str!("../machines/even-ones.rtm")),
];

/// A parsed built-in machine.
#[derive(Debug, Clone)]
pub struct BuiltinMachine {
    pub name: &'static str,
    pub text: &'static str,
    pub machine: Machine,
}

lazy_static::lazy_static! {
    pub static ref MACHINES: Vec<BuiltinMachine> = MACHINE_TEXTS
        .iter()
        .filter_map(|&(name, text)| match crate::parser::parse(text) {
            Ok(machine) => Some(BuiltinMachine { name, text, machine }),
            Err(e) => {
                tracing::warn!(name, error = %e, "failed to parse built-in machine");
                None
            }
        })
        .collect();
}

/// Summary of a built-in machine, for listings.
#[derive(Debug, Clone)]
pub struct MachineInfo {
    pub index: usize,
    pub name: String,
    pub start_state: String,
    pub accept_state: String,
    pub input: String,
    pub state_count: usize,
    pub rule_count: usize,
}

pub struct MachineLibrary;

impl MachineLibrary {
    /// Get the number of available machines
    pub fn count() -> usize {
        MACHINES.len()
    }

    /// Get a machine by its index
    pub fn get_by_index(index: usize) -> Result<Machine, RtmError> {
        MACHINES
            .get(index)
            .map(|builtin| builtin.machine.clone())
            .ok_or_else(|| RtmError::ValidationError(format!("Machine index {} out of range", index)))
    }

    /// Get a machine by its name
    pub fn get_by_name(name: &str) -> Result<Machine, RtmError> {
        MACHINES
            .iter()
            .find(|builtin| builtin.name == name)
            .map(|builtin| builtin.machine.clone())
            .ok_or_else(|| RtmError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// List all machine names
    pub fn names() -> Vec<&'static str> {
        MACHINES.iter().map(|builtin| builtin.name).collect()
    }

    /// Get the description text of a machine by its index
    pub fn text_by_index(index: usize) -> Result<&'static str, RtmError> {
        MACHINES
            .get(index)
            .map(|builtin| builtin.text)
            .ok_or_else(|| {
                RtmError::ValidationError(format!("Machine text index {} out of range", index))
            })
    }

    /// Get information about a machine by its index
    pub fn info(index: usize) -> Result<MachineInfo, RtmError> {
        let builtin = MACHINES.get(index).ok_or_else(|| {
            RtmError::ValidationError(format!("Machine index {} out of range", index))
        })?;
        let machine = &builtin.machine;

        Ok(MachineInfo {
            index,
            name: builtin.name.to_string(),
            start_state: machine.start_state.clone(),
            accept_state: machine.accept_state.clone(),
            input: machine.input.clone(),
            state_count: machine.states.len(),
            rule_count: machine.rules.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::machine::RtmEngine;
    use crate::notifier::Silent;
    use crate::types::{Halt, RtmError, Stage};

    #[test]
    fn test_all_machines_parse() {
        assert_eq!(MachineLibrary::count(), MACHINE_TEXTS.len());
    }

    #[test]
    fn test_names() {
        let names = MachineLibrary::names();
        assert_eq!(
            names,
            vec!["flip", "unary-successor", "binary-complement", "even-ones"]
        );
    }

    #[test]
    fn test_get_by_index_and_name() {
        assert!(MachineLibrary::get_by_index(0).is_ok());
        assert!(MachineLibrary::get_by_index(999).is_err());

        let machine = MachineLibrary::get_by_name("binary-complement").unwrap();
        assert_eq!(machine.input, "1011");
        assert!(MachineLibrary::get_by_name("nonexistent").is_err());
    }

    #[test]
    fn test_text_and_info() {
        let text = MachineLibrary::text_by_index(0).unwrap();
        assert!(text.starts_with("2 2 3 1"));
        assert!(MachineLibrary::text_by_index(999).is_err());

        let info = MachineLibrary::info(3).unwrap();
        assert_eq!(info.name, "even-ones");
        assert_eq!(info.start_state, "even");
        assert_eq!(info.accept_state, "accept");
        assert_eq!(info.state_count, 3);
        assert_eq!(info.rule_count, 5);
        assert!(MachineLibrary::info(999).is_err());
    }

    #[test]
    fn test_all_machines_run_and_reverse() {
        for builtin in MACHINES.iter() {
            let mut engine =
                RtmEngine::from_machine(&builtin.machine, EngineConfig::default(), Silent)
                    .unwrap();

            assert_eq!(
                engine.run_all(),
                Ok(Halt::Accept),
                "machine '{}' did not accept",
                builtin.name
            );
            assert_eq!(engine.stage(), Stage::Stage3Done);
            assert_eq!(engine.state(), builtin.machine.start_state);
            assert_eq!(engine.input_tape().text(), builtin.machine.input);
            assert!(engine.history_tape().is_blank());
        }
    }

    #[test]
    fn test_builtin_outputs() {
        let expected = [
            ("flip", "1"),
            ("unary-successor", "1111"),
            ("binary-complement", "0100"),
            ("even-ones", "1001"),
        ];

        for (name, output) in expected {
            let machine = MachineLibrary::get_by_name(name).unwrap();
            let mut engine =
                RtmEngine::from_machine(&machine, EngineConfig::default(), Silent).unwrap();
            engine.run_all().unwrap();
            assert_eq!(engine.output_tape().text(), output, "machine '{}'", name);
        }
    }

    #[test]
    fn test_even_ones_rejects_odd_input() {
        let machine = MachineLibrary::get_by_name("even-ones").unwrap();
        let mut engine =
            RtmEngine::from_machine(&machine, EngineConfig::default(), Silent).unwrap();
        engine.load_input("1011").unwrap();

        let halt = engine.stage1().unwrap();
        assert_eq!(
            halt,
            Halt::Err(RtmError::UndefinedTransition {
                state: "odd".into(),
                symbol: 'B'
            })
        );
    }
}
