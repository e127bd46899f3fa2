// Grid model: mine layout, adjacency counts, labels and revealed state
// A grid is created once per round and replaced wholesale on reset

use rand::Rng;
use serde::Deserialize;
use std::error::Error;
use std::fmt;

/// Board edge length (cells per row and per column)
pub const GRID_SIZE: usize = 6;
/// Mines placed on every fresh board
pub const MINES_COUNT: usize = 2;

/// Glyph shown on every safe cell under the constant label policy
const CONSTANT_LABEL: char = '1';
/// Glyph for a safe cell with nothing to show
pub const BLANK_LABEL: char = ' ';

/// What a cell holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content {
    Safe,
    Mine,
}

/// How safe cells are labeled when the grid is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// Every safe cell shows "1" whatever its neighborhood (historical behavior)
    #[default]
    Constant,
    /// Safe cells show their adjacent mine count, blank for zero
    Adjacent,
}

/// A single cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub content: Content,
    pub label: char, // Glyph drawn when revealed (unused for mines)
}

/// Fatal board misconfiguration, detected before any mine is placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    EmptyGrid,
    TooManyMines { size: usize, mines: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::EmptyGrid => write!(f, "grid size must be at least 1"),
            GridError::TooManyMines { size, mines } => write!(
                f,
                "{} mines do not fit a {}x{} grid (at most {} allowed)",
                mines,
                size,
                size,
                (size * size).saturating_sub(1)
            ),
        }
    }
}

impl Error for GridError {}

/// Board shape and labeling rules for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub size: usize,
    pub mines: usize,
    pub label_policy: LabelPolicy,
}

impl Rules {
    pub fn new(size: usize, mines: usize, label_policy: LabelPolicy) -> Self {
        Rules { size, mines, label_policy }
    }

    /// Check the placement precondition: at least one cell and at least one safe cell.
    /// Rejection sampling would never terminate otherwise.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.size == 0 {
            return Err(GridError::EmptyGrid);
        }
        if self.mines >= self.size * self.size {
            return Err(GridError::TooManyMines { size: self.size, mines: self.mines });
        }
        Ok(())
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::new(GRID_SIZE, MINES_COUNT, LabelPolicy::default())
    }
}

/// Square minefield, stored row-major
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a fresh grid with `rules.mines` mines drawn from `rng`.
    ///
    /// Mines are chosen by rejection sampling: draw a coordinate pair, keep it if that
    /// cell is not already a mine, repeat until enough are placed. Labels are assigned
    /// afterwards according to `rules.label_policy`.
    pub fn create<R: Rng>(rules: &Rules, rng: &mut R) -> Result<Self, GridError> {
        rules.validate()?;
        let mut grid = Grid::blank(rules.size);
        let mut placed = 0;
        while placed < rules.mines {
            let x = rng.gen_range(0..rules.size);
            let y = rng.gen_range(0..rules.size);
            let idx = grid.index(x, y);
            if grid.cells[idx].content == Content::Safe {
                grid.cells[idx].content = Content::Mine;
                placed += 1;
            }
        }
        grid.assign_labels(rules.label_policy);
        Ok(grid)
    }

    /// Build a grid with mines at fixed positions
    #[cfg(test)]
    pub(crate) fn with_mines(size: usize, mines: &[(usize, usize)], policy: LabelPolicy) -> Self {
        let mut grid = Grid::blank(size);
        for &(x, y) in mines {
            let idx = grid.index(x, y);
            grid.cells[idx].content = Content::Mine;
        }
        grid.assign_labels(policy);
        grid
    }

    fn blank(size: usize) -> Self {
        Grid {
            size,
            cells: vec![
                Cell {
                    content: Content::Safe,
                    label: BLANK_LABEL
                };
                size * size
            ],
        }
    }

    fn assign_labels(&mut self, policy: LabelPolicy) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = self.index(x, y);
                if self.cells[idx].content == Content::Mine {
                    continue;
                }
                let count = self.count_adjacent_mines(x, y);
                self.cells[idx].label = match policy {
                    LabelPolicy::Constant => CONSTANT_LABEL,
                    LabelPolicy::Adjacent => match count {
                        0 => BLANK_LABEL,
                        n => char::from_digit(n as u32, 10).unwrap_or(BLANK_LABEL),
                    },
                };
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Convert (x, y) coordinates to flat array index
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn content(&self, x: usize, y: usize) -> Content {
        self.cells[self.index(x, y)].content
    }

    pub fn is_mine(&self, x: usize, y: usize) -> bool {
        self.content(x, y) == Content::Mine
    }

    /// Count mines among the up-to-8 neighbors of (x, y); neighbors past the edge are skipped
    pub fn count_adjacent_mines(&self, x: usize, y: usize) -> u8 {
        let mut adj = 0u8;
        for oy in y.saturating_sub(1)..=(y + 1).min(self.size - 1) {
            for ox in x.saturating_sub(1)..=(x + 1).min(self.size - 1) {
                if ox == x && oy == y {
                    continue;
                }
                if self.is_mine(ox, oy) {
                    adj += 1;
                }
            }
        }
        adj
    }

    /// The glyph stored for (x, y) at creation
    pub fn label_of(&self, x: usize, y: usize) -> char {
        self.cells[self.index(x, y)].label
    }

    /// Mine coordinates in row-major order
    pub fn mine_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.content == Content::Mine)
            .map(|(i, _)| (i % self.size, i / self.size))
    }

    pub fn mine_count(&self) -> usize {
        self.mine_positions().count()
    }
}

/// Which cells the player has uncovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedState {
    size: usize,
    cells: Vec<bool>,
}

impl RevealedState {
    pub fn new(size: usize) -> Self {
        RevealedState {
            size,
            cells: vec![false; size * size],
        }
    }

    pub fn is_revealed(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.size + x]
    }

    /// Mark (x, y) revealed; returns false if it already was
    pub fn reveal(&mut self, x: usize, y: usize) -> bool {
        let idx = y * self.size + x;
        let changed = !self.cells[idx];
        self.cells[idx] = true;
        changed
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|r| **r).count()
    }
}
