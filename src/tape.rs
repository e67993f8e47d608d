//! Fixed-capacity, head-addressable tapes.
//!
//! Every tape is allocated once, filled with its blank value, and never resized. Head moves are
//! checked against the buffer before they happen, so a rejected move leaves the tape untouched.

use std::fmt;

use crate::types::{Direction, RtmError};

/// Identifies which of the engine's three tapes a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeKind {
    Input,
    History,
    Output,
}

impl fmt::Display for TapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TapeKind::Input => "input",
            TapeKind::History => "history",
            TapeKind::Output => "output",
        };
        f.write_str(name)
    }
}

/// One cell of the history tape.
///
/// Each forward step records two cells: the state it left and the symbol it read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCell {
    Blank,
    State(String),
    Symbol(char),
}

impl HistoryCell {
    /// Renders the cell, drawing `Blank` as the machine's blank symbol.
    pub fn render(&self, blank: char) -> String {
        match self {
            HistoryCell::Blank => blank.to_string(),
            HistoryCell::State(state) => state.clone(),
            HistoryCell::Symbol(symbol) => symbol.to_string(),
        }
    }
}

/// A tape of `capacity` cells with a single read/write head.
#[derive(Debug, Clone, PartialEq)]
pub struct Tape<T> {
    kind: TapeKind,
    cells: Vec<T>,
    head: usize,
    blank: T,
}

impl<T: Clone + PartialEq> Tape<T> {
    /// Creates a blank tape with the head on cell 0. A capacity of zero is raised to one cell.
    pub fn new(kind: TapeKind, capacity: usize, blank: T) -> Self {
        Self {
            kind,
            cells: vec![blank.clone(); capacity.max(1)],
            head: 0,
            blank,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> &T {
        &self.cells[self.head]
    }

    /// Overwrites the cell under the head.
    pub fn write(&mut self, symbol: T) {
        self.cells[self.head] = symbol;
    }

    /// Computes where the head would land after moving in `direction`, without moving it.
    pub fn target(&self, direction: Direction) -> Result<usize, RtmError> {
        let position = match direction {
            Direction::Left => self.head as isize - 1,
            Direction::Right => self.head as isize + 1,
            Direction::None => self.head as isize,
        };

        if position < 0 || position as usize >= self.cells.len() {
            return Err(RtmError::HeadOutOfBounds {
                tape: self.kind,
                position,
            });
        }

        Ok(position as usize)
    }

    /// Moves the head one cell. The head is left in place when the move is rejected.
    pub fn move_head(&mut self, direction: Direction) -> Result<(), RtmError> {
        self.head = self.target(direction)?;
        Ok(())
    }

    /// Places the head on an absolute position.
    pub fn set_head(&mut self, position: usize) -> Result<(), RtmError> {
        if position >= self.cells.len() {
            return Err(RtmError::HeadOutOfBounds {
                tape: self.kind,
                position: position as isize,
            });
        }
        self.head = position;
        Ok(())
    }

    /// Returns `true` when `cells` more moves to the right stay inside the buffer.
    pub fn has_room(&self, cells: usize) -> bool {
        self.head + cells < self.cells.len()
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Returns the cells up to and including the last non-blank one.
    pub fn used(&self) -> &[T] {
        let end = self
            .cells
            .iter()
            .rposition(|cell| *cell != self.blank)
            .map_or(0, |last| last + 1);
        &self.cells[..end]
    }

    /// Returns an owned copy of the tape content.
    pub fn snapshot(&self) -> Vec<T> {
        self.cells.clone()
    }

    /// Replaces the tape content with a snapshot, keeping the head where it is.
    ///
    /// Snapshots shorter than the tape are padded with blanks and longer ones are truncated,
    /// so the capacity never changes.
    pub fn restore(&mut self, mut cells: Vec<T>) {
        cells.resize(self.cells.len(), self.blank.clone());
        self.cells = cells;
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| *cell == self.blank)
    }

    /// Blanks every cell and returns the head to cell 0.
    pub fn clear(&mut self) {
        self.cells.fill(self.blank.clone());
        self.head = 0;
    }
}

impl Tape<char> {
    /// Writes `content` from cell 0 onwards. The head is not moved.
    pub fn load(&mut self, content: &str) -> Result<(), RtmError> {
        let length = content.chars().count();
        if length > self.cells.len() {
            return Err(RtmError::InputTooLong {
                length,
                capacity: self.cells.len(),
            });
        }

        for (cell, symbol) in self.cells.iter_mut().zip(content.chars()) {
            *cell = symbol;
        }
        Ok(())
    }

    /// Renders the used part of the tape as a string.
    pub fn text(&self) -> String {
        self.used().iter().collect()
    }
}

impl Tape<HistoryCell> {
    /// Renders the used part of the history tape, drawing blank cells as `blank`.
    pub fn render(&self, blank: char) -> String {
        self.used().iter().map(|cell| cell.render(blank)).collect()
    }
}
