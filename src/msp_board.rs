// Board geometry: positions, neighbourhoods and the three board presets

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::msp_error::{GameError, Result};

/// A cell coordinate, row first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// The up-to-8 surrounding positions, clipped to a `rows` x `cols` grid
    pub fn neighbors(self, rows: usize, cols: usize) -> impl Iterator<Item = Position> {
        let row_lo = self.row.saturating_sub(1);
        let row_hi = (self.row + 1).min(rows.saturating_sub(1));
        let col_lo = self.col.saturating_sub(1);
        let col_hi = (self.col + 1).min(cols.saturating_sub(1));
        (row_lo..=row_hi)
            .flat_map(move |row| (col_lo..=col_hi).map(move |col| Position { row, col }))
            .filter(move |p| *p != self && p.row < rows && p.col < cols)
    }
}

/// Fixed board dimensions for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        match rows.checked_mul(cols) {
            Some(n) if n > 0 => Ok(Grid { rows, cols }),
            _ => Err(GameError::InvalidDimensions { rows, cols }),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn validate(&self, pos: Position) -> Result<Position> {
        if self.contains(pos) {
            Ok(pos)
        } else {
            Err(GameError::InvalidPosition {
                row: pos.row,
                col: pos.col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Row-major index into per-cell vectors; `pos` must already be validated
    pub fn index(&self, pos: Position) -> usize {
        pos.row * self.cols + pos.col
    }

    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> {
        pos.neighbors(self.rows, self.cols)
    }

    /// Every position in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let cols = self.cols;
        (0..self.len()).map(move |i| Position::new(i / cols, i % cols))
    }
}

/// Board presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Difficulty {
    #[default]
    Beginner,     // 9x9, 10 mines
    Intermediate, // 16x16, 40 mines
    Expert,       // 16x30, 99 mines
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Expert,
    ];

    /// (rows, cols, mines)
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            Difficulty::Beginner => (9, 9, 10),
            Difficulty::Intermediate => (16, 16, 40),
            Difficulty::Expert => (16, 30, 99),
        }
    }

    pub fn grid(&self) -> Grid {
        let (rows, cols, _) = self.params();
        Grid { rows, cols }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Expert => "Expert",
        }
    }

    /// Menu label, e.g. "Expert (16×30, 99 mines)"
    pub fn label(&self) -> String {
        let (rows, cols, mines) = self.params();
        format!("{} ({}×{}, {} mines)", self.name(), rows, cols, mines)
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Expert => 2,
        }
    }

    pub fn from_index(i: usize) -> Difficulty {
        match i {
            0 => Difficulty::Beginner,
            1 => Difficulty::Intermediate,
            _ => Difficulty::Expert,
        }
    }
}
