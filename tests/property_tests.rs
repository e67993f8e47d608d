//! Property-based tests for the reversible engine.
//!
//! These tests use proptest to check that forward steps, undo and the
//! three-stage protocol behave the same for arbitrary binary inputs.

use proptest::prelude::*;
use rtm::{EngineConfig, Halt, MachineLibrary, RtmEngine, RtmError, Silent, Stage, Step};

fn engine_for(name: &str, input: &str) -> RtmEngine {
    let machine = MachineLibrary::get_by_name(name).unwrap();
    let mut engine = RtmEngine::from_machine(&machine, EngineConfig::default(), Silent).unwrap();
    engine.load_input(input).unwrap();
    engine
}

prop_compose! {
    fn binary_input()(input in "[01]{1,24}") -> String {
        input
    }
}

prop_compose! {
    fn input_and_steps()(input in binary_input())(steps in 0..=input.len(), input in Just(input.clone())) -> (String, usize) {
        (input, steps)
    }
}

proptest! {
    #[test]
    fn undo_inverts_forward_steps((input, steps) in input_and_steps()) {
        let mut engine = engine_for("binary-complement", &input);
        let start = engine.view();

        for _ in 0..steps {
            prop_assert_eq!(engine.step(), Ok(Step::Continue));
        }
        for _ in 0..steps {
            prop_assert!(engine.undo().is_ok());
        }

        prop_assert_eq!(engine.view(), start);
        prop_assert_eq!(engine.undo(), Err(RtmError::EmptyUndo));
    }

    #[test]
    fn history_grows_two_cells_per_step((input, steps) in input_and_steps()) {
        let mut engine = engine_for("binary-complement", &input);

        for _ in 0..steps {
            engine.step().unwrap();
        }

        prop_assert_eq!(engine.step_count(), steps);
        prop_assert_eq!(engine.history_tape().head(), 2 * steps);
        prop_assert_eq!(engine.history_tape().used().len(), 2 * steps);
    }

    #[test]
    fn complement_reverses_to_start(input in binary_input()) {
        let mut engine = engine_for("binary-complement", &input);
        let expected: String = input
            .chars()
            .map(|c| if c == '0' { '1' } else { '0' })
            .collect();

        prop_assert_eq!(engine.run_all(), Ok(Halt::Accept));
        prop_assert_eq!(engine.stage(), Stage::Stage3Done);
        prop_assert_eq!(engine.output_tape().text(), expected);
        prop_assert_eq!(engine.input_tape().text(), input);
        prop_assert_eq!(engine.input_tape().head(), 0);
        prop_assert_eq!(engine.state(), engine.start_state());
        prop_assert!(engine.history_tape().is_blank());
    }

    #[test]
    fn even_ones_decides_parity_and_reverses(input in binary_input()) {
        let mut engine = engine_for("even-ones", &input);
        let ones = input.chars().filter(|&c| c == '1').count();

        let halt = engine.run_all().unwrap();
        if ones % 2 == 0 {
            prop_assert_eq!(halt, Halt::Accept);
        } else {
            prop_assert_eq!(
                halt,
                Halt::Err(RtmError::UndefinedTransition { state: "odd".into(), symbol: 'B' })
            );
        }

        prop_assert_eq!(engine.output_tape().text(), input.clone());
        prop_assert_eq!(engine.input_tape().text(), input);
        prop_assert_eq!(engine.state(), "even");
        prop_assert!(engine.history_tape().is_blank());
    }
}
