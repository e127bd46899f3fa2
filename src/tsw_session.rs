// Game session: owns the current grid, revealed cells and game-over flag
// Implements the Playing / GameOver state machine driven by the UI loop

use rand::Rng;
use tracing::{debug, info};

use crate::tsw_grid::{Grid, GridError, RevealedState, Rules};

/// Where the session is in its round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    GameOver,
}

/// Result of a click on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,   // Out of range or game already over
    Unchanged, // Cell was already revealed
    Revealed,  // Safe cell uncovered
    Detonated, // Mine uncovered, round lost
}

/// One player's game, with its own random source
pub struct Session<R: Rng> {
    rules: Rules,
    rng: R,
    grid: Grid,
    revealed: RevealedState,
    game_over: bool,
}

impl<R: Rng> Session<R> {
    /// Start a session with a freshly generated board
    pub fn new(rules: Rules, mut rng: R) -> Result<Self, GridError> {
        let grid = Grid::create(&rules, &mut rng)?;
        info!(size = rules.size, mines = grid.mine_count(), policy = ?rules.label_policy, "session started");
        Ok(Session {
            revealed: RevealedState::new(rules.size),
            rules,
            rng,
            grid,
            game_over: false,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn revealed(&self) -> &RevealedState {
        &self.revealed
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn phase(&self) -> Phase {
        if self.game_over { Phase::GameOver } else { Phase::Playing }
    }

    /// Reveal the cell at (x, y).
    /// Clicks are ignored once the game is over or when (x, y) is off the board.
    pub fn click(&mut self, x: usize, y: usize) -> Outcome {
        if self.game_over || !self.grid.contains(x, y) {
            return Outcome::Ignored;
        }
        if !self.revealed.reveal(x, y) {
            return Outcome::Unchanged;
        }
        if self.grid.is_mine(x, y) {
            self.game_over = true;
            info!(x, y, "mine hit");
            Outcome::Detonated
        } else {
            debug!(x, y, revealed = self.revealed.count(), "cell revealed");
            Outcome::Revealed
        }
    }

    /// Throw away the board and start over from any phase
    pub fn reset(&mut self) {
        self.grid = Grid::create(&self.rules, &mut self.rng).expect("rules validated in Session::new");
        self.revealed = RevealedState::new(self.rules.size);
        self.game_over = false;
        info!("board reset");
    }
}
