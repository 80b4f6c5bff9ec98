//! Board representation and the pure rules of play.
//!
//! This module contains:
//! - `Symbol`, `SlideDirection` and `GameResult`, the basic value types
//! - `Board`, a 3×3 grid stored row-major as nine cells
//! - The three board operations: placing a mark, sliding every mark toward
//!   one edge, and evaluating the result
//!
//! Nothing here knows about players or turns. Every operation takes a board
//! and returns a new one, which lets the AI simulate freely.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of cells on the board
pub const CELL_COUNT: usize = 9;

/// Width (and height) of the board
pub const SIDE: usize = 3;

/// The eight winning triples: rows top-to-bottom, columns left-to-right,
/// then the two diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Contents of a cell, or the mark a player places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Symbol {
    /// Empty cell
    #[default]
    None,
    X,
    O,
}

impl Symbol {
    /// The other player's symbol. `None` stays `None`.
    pub fn opponent(self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
            Symbol::None => Symbol::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Symbol::None
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::None => write!(f, "."),
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// Edge toward which a slide compacts the marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlideDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    /// All directions in evaluation order
    pub const ALL: [SlideDirection; 4] = [
        SlideDirection::Up,
        SlideDirection::Down,
        SlideDirection::Left,
        SlideDirection::Right,
    ];

    /// The three lines a slide moves along, each listed starting from the
    /// edge the marks are pushed against.
    fn lines(self) -> [[usize; 3]; 3] {
        match self {
            SlideDirection::Up => [[0, 3, 6], [1, 4, 7], [2, 5, 8]],
            SlideDirection::Down => [[6, 3, 0], [7, 4, 1], [8, 5, 2]],
            SlideDirection::Left => [[0, 1, 2], [3, 4, 5], [6, 7, 8]],
            SlideDirection::Right => [[2, 1, 0], [5, 4, 3], [8, 7, 6]],
        }
    }
}

impl fmt::Display for SlideDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlideDirection::Up => "up",
            SlideDirection::Down => "down",
            SlideDirection::Left => "left",
            SlideDirection::Right => "right",
        };
        f.write_str(name)
    }
}

/// Outcome of a match. Terminal once it leaves `Ongoing`, until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameResult {
    #[default]
    Ongoing,
    XWins,
    OWins,
    Draw,
}

impl GameResult {
    pub fn is_over(self) -> bool {
        self != GameResult::Ongoing
    }

    /// The winning symbol, if any
    pub fn winner(self) -> Option<Symbol> {
        match self {
            GameResult::XWins => Some(Symbol::X),
            GameResult::OWins => Some(Symbol::O),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }

    fn win_for(symbol: Symbol) -> GameResult {
        match symbol {
            Symbol::X => GameResult::XWins,
            Symbol::O => GameResult::OWins,
            Symbol::None => GameResult::Ongoing,
        }
    }
}

/// Errors from board operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("Cell {0} is off the board")]
    CellOutOfRange(usize),

    #[error("Cell {0} is already occupied")]
    CellOccupied(usize),
}

/// A 3×3 grid indexed 0..9 in row-major order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Symbol; CELL_COUNT],
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board from explicit cell contents
    pub const fn from_cells(cells: [Symbol; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// Row and column of a cell index
    pub const fn position(index: usize) -> (usize, usize) {
        (index / SIDE, index % SIDE)
    }

    pub fn cells(&self) -> &[Symbol; CELL_COUNT] {
        &self.cells
    }

    /// Contents of a cell, `None` for indices off the board
    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.cells.get(index).copied()
    }

    pub fn is_empty_cell(&self, index: usize) -> bool {
        self.get(index) == Some(Symbol::None)
    }

    /// Indices of all empty cells in ascending order
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|s| !s.is_none())
    }

    /// How many cells hold the given symbol
    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells.iter().filter(|&&s| s == symbol).count()
    }

    /// Place `symbol` at `index`, returning the new board.
    pub fn apply_move(&self, index: usize, symbol: Symbol) -> Result<Board, BoardError> {
        match self.get(index) {
            None => Err(BoardError::CellOutOfRange(index)),
            Some(Symbol::None) => {
                let mut next = *self;
                next.cells[index] = symbol;
                Ok(next)
            }
            Some(_) => Err(BoardError::CellOccupied(index)),
        }
    }

    /// Compact every row (Left/Right) or column (Up/Down) toward the named
    /// edge. Marks keep their relative order within a line.
    pub fn apply_slide(&self, direction: SlideDirection) -> Board {
        let mut next = Board::new();
        for line in direction.lines() {
            let mut target = line.iter();
            for &idx in &line {
                let symbol = self.cells[idx];
                if symbol.is_none() {
                    continue;
                }
                if let Some(&dest) = target.next() {
                    next.cells[dest] = symbol;
                }
            }
        }
        next
    }

    /// Check the eight triples for a winner, then fall back to draw or
    /// ongoing.
    pub fn evaluate_result(&self) -> GameResult {
        for [a, b, c] in LINES {
            let s = self.cells[a];
            if !s.is_none() && s == self.cells[b] && s == self.cells[c] {
                return GameResult::win_for(s);
            }
        }

        if self.is_full() {
            GameResult::Draw
        } else {
            GameResult::Ongoing
        }
    }

    /// Whether `symbol` holds any complete triple
    pub fn has_line(&self, symbol: Symbol) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&i| self.cells[i] == symbol))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(SIDE) {
            writeln!(f, "{}{}{}", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}
