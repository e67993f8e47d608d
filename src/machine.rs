//! This module defines `RtmEngine`, the three-tape reversible Turing Machine.
//!
//! Execution happens in three stages. Stage 1 runs the machine forward on the input tape while
//! recording every `(state, symbol)` pair it consumed on the history tape. Stage 2 copies the
//! result onto the output tape. Stage 3 replays the history backwards, restoring the input tape
//! and the start state and erasing the history. Independently of the stages, every forward step
//! pushes an undo snapshot so it can be reverted exactly.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::notifier::{Notifier, Silent};
use crate::tape::{HistoryCell, Tape, TapeKind};
use crate::transition::{Quadruple, TransitionTable};
use crate::types::{Direction, Halt, Machine, RtmError, Stage, Step};

/// Everything needed to revert one forward step.
#[derive(Debug, Clone, PartialEq)]
struct UndoEntry {
    state: String,
    head: usize,
    symbol: char,
    output: Vec<char>,
}

/// The configuration captured when Stage 3 starts, so that undo still works after reversal.
#[derive(Debug, Clone, PartialEq)]
struct ReversalCheckpoint {
    history: Vec<HistoryCell>,
    history_head: usize,
    input: Vec<char>,
    input_head: usize,
    state: String,
}

/// A rendered tape, for front-ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapeView {
    pub content: String,
    pub head: usize,
}

/// A serializable summary of the engine's observable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineView {
    pub state: String,
    pub stage: Stage,
    pub steps: usize,
    pub input: TapeView,
    pub history: TapeView,
    pub output: TapeView,
}

/// A reversible Turing Machine with input, history and output tapes.
pub struct RtmEngine<N: Notifier = Silent> {
    start_state: String,
    accept_state: String,
    state: String,
    table: TransitionTable,
    input_tape: Tape<char>,
    history_tape: Tape<HistoryCell>,
    output_tape: Tape<char>,
    stage: Stage,
    undo_log: Vec<UndoEntry>,
    checkpoint: Option<ReversalCheckpoint>,
    input: String,
    config: EngineConfig,
    notifier: N,
}

impl<N: Notifier> RtmEngine<N> {
    /// Creates an engine with blank tapes, sitting in `start_state` at the beginning of Stage 1.
    ///
    /// # Arguments
    ///
    /// * `start_state` - The state the machine starts (and, after Stage 3, ends) in.
    /// * `accept_state` - The state that ends Stage 1.
    /// * `table` - The transition table. It is never modified by the engine.
    /// * `config` - Blank symbol, tape capacity and optional step ceiling.
    /// * `notifier` - Receives human-readable progress and error messages.
    pub fn new(
        start_state: &str,
        accept_state: &str,
        table: TransitionTable,
        config: EngineConfig,
        notifier: N,
    ) -> Self {
        let capacity = config.tape_capacity;
        Self {
            start_state: start_state.to_string(),
            accept_state: accept_state.to_string(),
            state: start_state.to_string(),
            table,
            input_tape: Tape::new(TapeKind::Input, capacity, config.blank),
            history_tape: Tape::new(TapeKind::History, capacity, HistoryCell::Blank),
            output_tape: Tape::new(TapeKind::Output, capacity, config.blank),
            stage: Stage::Stage1Running,
            undo_log: Vec::new(),
            checkpoint: None,
            input: String::new(),
            config,
            notifier,
        }
    }

    /// Creates an engine from a loaded machine description and seeds it with the machine's input.
    pub fn from_machine(
        machine: &Machine,
        config: EngineConfig,
        notifier: N,
    ) -> Result<Self, RtmError> {
        config.validate()?;
        if !machine.tape_alphabet.contains(&config.blank) {
            return Err(RtmError::ConfigError(format!(
                "Blank symbol '{}' is not in the machine's tape alphabet",
                config.blank
            )));
        }

        let mut engine = Self::new(
            &machine.start_state,
            &machine.accept_state,
            machine.table(),
            config,
            notifier,
        );
        engine.load_input(&machine.input)?;
        Ok(engine)
    }

    /// Seeds the input tape from position 0 and resets every other part of the engine.
    pub fn load_input(&mut self, input: &str) -> Result<(), RtmError> {
        let length = input.chars().count();
        if length > self.input_tape.capacity() {
            let error = RtmError::InputTooLong {
                length,
                capacity: self.input_tape.capacity(),
            };
            self.report(&error);
            return Err(error);
        }

        self.input = input.to_string();
        self.reset();
        Ok(())
    }

    /// Returns the engine to the beginning of Stage 1 with the last loaded input.
    pub fn reset(&mut self) {
        self.input_tape.clear();
        self.history_tape.clear();
        self.output_tape.clear();
        // Length was checked when the input was loaded.
        let _ = self.input_tape.load(&self.input);

        self.state = self.start_state.clone();
        self.stage = Stage::Stage1Running;
        self.undo_log.clear();
        self.checkpoint = None;

        tracing::debug!(input = %self.input, "engine reset");
    }

    /// Executes a single forward step of Stage 1.
    ///
    /// The step records an undo snapshot and a `(state, symbol)` history entry, writes the
    /// transition's symbol, moves the input head and enters the next state. Nothing is mutated
    /// when the step is rejected.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if the step was taken and Stage 1 is still open.
    /// * `Ok(Step::Halt(Halt::Accept))` if the accept state has been reached.
    /// * `Ok(Step::Halt(Halt::Err(_)))` if no transition exists; Stage 1 ends as a rejection.
    /// * `Err(RtmError::StageMisuse)` if Stage 1 is already over.
    /// * `Err(RtmError::HeadOutOfBounds)` if the step would leave a tape's buffer.
    /// * `Err(RtmError::StepLimitExceeded)` if the configured step ceiling was reached.
    pub fn step(&mut self) -> Result<Step, RtmError> {
        if self.stage != Stage::Stage1Running {
            self.notifier.notify("Cannot execute more steps.");
            return Err(RtmError::StageMisuse {
                operation: "step",
                stage: self.stage,
            });
        }

        if self.state == self.accept_state {
            self.finish_stage1();
            return Ok(Step::Halt(Halt::Accept));
        }

        if let Some(limit) = self.config.max_steps {
            if self.undo_log.len() >= limit {
                let error = RtmError::StepLimitExceeded(limit);
                self.report(&error);
                return Err(error);
            }
        }

        let symbol = *self.input_tape.read();
        let transition = self.table.lookup(&self.state, symbol).clone();

        if !transition.is_defined() {
            let error = RtmError::UndefinedTransition {
                state: self.state.clone(),
                symbol,
            };
            self.report(&error);
            self.stage = Stage::Stage1Done;
            return Ok(Step::Halt(Halt::Err(error)));
        }

        if let Err(error) = self.check_room(transition.direction) {
            self.report(&error);
            return Err(error);
        }

        self.undo_log.push(UndoEntry {
            state: self.state.clone(),
            head: self.input_tape.head(),
            symbol,
            output: self.output_tape.snapshot(),
        });
        self.record(symbol)?;

        for quad in Quadruple::split(&self.state, symbol, &transition) {
            self.apply(&quad)?;
        }

        tracing::debug!(
            from = %self.undo_log.last().map_or("", |entry| entry.state.as_str()),
            read = %symbol,
            write = %transition.write_symbol,
            direction = %transition.direction,
            to = %self.state,
            "forward step"
        );
        self.notifier
            .notify(&format!("Current state: {}", self.state));

        if self.state == self.accept_state {
            self.finish_stage1();
            return Ok(Step::Halt(Halt::Accept));
        }

        Ok(Step::Continue)
    }

    /// Runs Stage 1 to completion.
    ///
    /// Steps until the accept state is reached or no transition is defined, and reports how
    /// Stage 1 ended. Errors from `step` stop the loop and leave Stage 1 open.
    pub fn stage1(&mut self) -> Result<Halt, RtmError> {
        if self.stage != Stage::Stage1Running {
            return Err(self.misuse("run stage 1"));
        }

        let halt = loop {
            let symbol = *self.input_tape.read();
            self.notifier.notify(&format!(
                "Current state: {}, symbol read: {}",
                self.state, symbol
            ));

            match self.step() {
                Ok(Step::Continue) => continue,
                Ok(Step::Halt(halt)) => break halt,
                Err(error) => {
                    self.notifier
                        .notify("Error while applying the transition.");
                    return Err(error);
                }
            }
        };

        self.notifier.notify(&format!(
            "End of stage 1. Final state: {}",
            self.state
        ));
        tracing::info!(state = %self.state, steps = self.undo_log.len(), "stage 1 finished");
        Ok(halt)
    }

    /// Stage 2: copies the input tape's content onto the output tape.
    pub fn stage2(&mut self) -> Result<(), RtmError> {
        if self.stage != Stage::Stage1Done {
            return Err(self.misuse("run stage 2"));
        }

        self.output_tape.restore(self.input_tape.snapshot());
        self.stage = Stage::Stage2Done;

        self.notifier
            .notify("End of stage 2. Output copied to the output tape.");
        tracing::info!(output = %self.output_tape.text(), "stage 2 finished");
        Ok(())
    }

    /// Stage 3: walks the history tape backwards, undoing each recorded transition.
    ///
    /// For every entry the forward transition is looked up again and its two quadruples are
    /// applied inverted and in reverse order: the head moves back, the symbol that was read is
    /// written back, and the machine re-enters the state it left. Consumed history cells are
    /// blanked. The configuration at the start of this stage is kept so that `undo` can still
    /// revert steps afterwards.
    pub fn stage3(&mut self) -> Result<(), RtmError> {
        if self.stage != Stage::Stage2Done {
            return Err(self.misuse("run stage 3"));
        }

        self.notifier.notify("Stage 3: reversing the transitions.");

        // A retry after a failed reversal keeps the configuration from the end of Stage 1.
        if self.checkpoint.is_none() {
            self.checkpoint = Some(ReversalCheckpoint {
                history: self.history_tape.snapshot(),
                history_head: self.history_tape.head(),
                input: self.input_tape.snapshot(),
                input_head: self.input_tape.head(),
                state: self.state.clone(),
            });
        }

        let recorded = self.history_tape.head();
        for i in (0..recorded).step_by(2).rev() {
            let (from_state, read_symbol) = self.history_entry(i)?;
            let transition = self.table.lookup(&from_state, read_symbol).clone();
            if !transition.is_defined() {
                let error = RtmError::InconsistentHistory {
                    state: from_state,
                    symbol: read_symbol,
                };
                self.report(&error);
                return Err(error);
            }

            self.notifier.notify(&format!(
                "Current state: {}, previous state: {}",
                self.state, from_state
            ));

            for quad in Quadruple::split_inverse(&from_state, read_symbol, &transition) {
                if let Err(error) = self.apply(&quad) {
                    self.report(&error);
                    return Err(error);
                }
            }

            self.history_tape.set_head(i)?;
            self.history_tape.write(HistoryCell::Blank);
            self.history_tape.set_head(i + 1)?;
            self.history_tape.write(HistoryCell::Blank);
            self.history_tape.set_head(i)?;

            tracing::debug!(state = %self.state, read = %read_symbol, "reversed step");
            self.notifier
                .notify(&format!("Symbol written: {}", self.input_tape.read()));
        }

        self.stage = Stage::Stage3Done;
        tracing::info!(state = %self.state, "stage 3 finished");
        Ok(())
    }

    /// Runs Stage 1, Stage 2 and Stage 3 in sequence.
    ///
    /// Refuses to run once Stage 1 has finished. Returns how Stage 1 ended.
    pub fn run_all(&mut self) -> Result<Halt, RtmError> {
        if self.stage != Stage::Stage1Running {
            self.notifier.notify("All steps have already been executed.");
            return Err(RtmError::StageMisuse {
                operation: "run all stages",
                stage: self.stage,
            });
        }

        let halt = self.stage1()?;
        self.stage2()?;
        self.stage3()?;
        Ok(halt)
    }

    /// Reverts the most recent forward step and reopens Stage 1.
    ///
    /// If Stage 3 has run (and erased the history), the configuration saved when it started is
    /// restored first. Any Stage 2 or Stage 3 progress is discarded.
    pub fn undo(&mut self) -> Result<(), RtmError> {
        let Some(entry) = self.undo_log.pop() else {
            self.notifier.notify("Nothing to undo.");
            return Err(RtmError::EmptyUndo);
        };

        // Stage 3 consumed the history; rewind to where it started.
        if let Some(checkpoint) = self.checkpoint.take() {
            self.history_tape.restore(checkpoint.history);
            self.history_tape.set_head(checkpoint.history_head)?;
            self.input_tape.restore(checkpoint.input);
            self.input_tape.set_head(checkpoint.input_head)?;
            self.state = checkpoint.state;
            tracing::debug!("history restored from the stage 3 checkpoint");
        }

        self.input_tape.set_head(entry.head)?;
        self.input_tape.write(entry.symbol);
        self.output_tape.restore(entry.output);
        self.state = entry.state;

        let entry_start = self.history_tape.head().saturating_sub(2);
        self.history_tape.set_head(entry_start + 1)?;
        self.history_tape.write(HistoryCell::Blank);
        self.history_tape.set_head(entry_start)?;
        self.history_tape.write(HistoryCell::Blank);

        self.stage = Stage::Stage1Running;

        tracing::debug!(state = %self.state, head = entry.head, "step undone");
        self.notifier.notify("Step undone.");
        Ok(())
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn accept_state(&self) -> &str {
        &self.accept_state
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the number of forward steps that can currently be undone.
    pub fn step_count(&self) -> usize {
        self.undo_log.len()
    }

    pub fn input_tape(&self) -> &Tape<char> {
        &self.input_tape
    }

    pub fn history_tape(&self) -> &Tape<HistoryCell> {
        &self.history_tape
    }

    pub fn output_tape(&self) -> &Tape<char> {
        &self.output_tape
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns `true` once Stage 1 has finished, whatever stage followed.
    pub fn is_halted(&self) -> bool {
        self.stage != Stage::Stage1Running
    }

    /// Captures the observable state for display or serialization.
    pub fn view(&self) -> EngineView {
        EngineView {
            state: self.state.clone(),
            stage: self.stage,
            steps: self.undo_log.len(),
            input: TapeView {
                content: self.input_tape.text(),
                head: self.input_tape.head(),
            },
            history: TapeView {
                content: self.history_tape.render(self.config.blank),
                head: self.history_tape.head(),
            },
            output: TapeView {
                content: self.output_tape.text(),
                head: self.output_tape.head(),
            },
        }
    }

    /// Checks that a forward step fits on both the input and the history tape.
    fn check_room(&self, direction: Direction) -> Result<(), RtmError> {
        self.input_tape.target(direction)?;
        if !self.history_tape.has_room(2) {
            return Err(RtmError::HeadOutOfBounds {
                tape: TapeKind::History,
                position: self.history_tape.head() as isize + 2,
            });
        }
        Ok(())
    }

    /// Appends the `(state, symbol)` pair of the step about to be taken to the history tape.
    fn record(&mut self, symbol: char) -> Result<(), RtmError> {
        self.history_tape
            .write(HistoryCell::State(self.state.clone()));
        self.history_tape.move_head(Direction::Right)?;
        self.history_tape.write(HistoryCell::Symbol(symbol));
        self.history_tape.move_head(Direction::Right)
    }

    /// Reads the history entry starting at cell `i`.
    fn history_entry(&self, i: usize) -> Result<(String, char), RtmError> {
        let cells = self.history_tape.cells();
        match (cells.get(i), cells.get(i + 1)) {
            (Some(HistoryCell::State(state)), Some(HistoryCell::Symbol(symbol))) => {
                Ok((state.clone(), *symbol))
            }
            _ => Err(RtmError::InconsistentHistory {
                state: self.state.clone(),
                symbol: *self.input_tape.read(),
            }),
        }
    }

    /// Applies one quadruple to the input tape after checking that it applies here.
    fn apply(&mut self, quad: &Quadruple) -> Result<(), RtmError> {
        if quad.state() != self.state {
            return Err(RtmError::InconsistentHistory {
                state: quad.state().to_string(),
                symbol: *self.input_tape.read(),
            });
        }

        match quad {
            Quadruple::Write {
                read, write, next, ..
            } => {
                if self.input_tape.read() != read {
                    return Err(RtmError::InconsistentHistory {
                        state: self.state.clone(),
                        symbol: *read,
                    });
                }
                self.input_tape.write(*write);
                self.state = next.clone();
            }
            Quadruple::Shift {
                direction, next, ..
            } => {
                self.input_tape.move_head(*direction)?;
                self.state = next.clone();
            }
        }
        Ok(())
    }

    fn finish_stage1(&mut self) {
        self.stage = Stage::Stage1Done;
        self.notifier.notify("Stage 1 finished.");
    }

    fn misuse(&mut self, operation: &'static str) -> RtmError {
        let error = RtmError::StageMisuse {
            operation,
            stage: self.stage,
        };
        self.report(&error);
        error
    }

    fn report(&mut self, error: &RtmError) {
        tracing::warn!(%error, stage = %self.stage, "engine error");
        self.notifier.notify(&format!("Error: {error}"));
    }
}
