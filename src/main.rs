// Entry point for the tiny Minesweeper TUI
// Loads settings, builds the first board, and hands the terminal to the UI loop

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::fs::OpenOptions;
use std::sync::Mutex;

// Module declarations
mod tsw_board;   // Cell geometry and board widgets
mod tsw_color;   // Palette and terminal color fitting
mod tsw_config;  // Startup settings
mod tsw_grid;    // Mine layout and revealed cells
mod tsw_session; // Game state machine
mod tsw_ui;      // Terminal lifecycle and event loop

use tsw_color::{Depth, Palette};
use tsw_config::load_settings;
use tsw_grid::{GRID_SIZE, MINES_COUNT, Rules};
use tsw_session::Session;
use tsw_ui::run as run_ui;

/// Send tracing output to the file named by TINYSWEEP_LOG, if set.
/// The terminal belongs to the UI, so there is no console logging.
fn init_logging() {
    let Some(path) = env::var_os("TINYSWEEP_LOG") else {
        return;
    };
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => eprintln!("cannot open log file {}: {}", path.to_string_lossy(), e),
    }
}

fn main() -> Result<()> {
    init_logging();

    let settings = load_settings();
    let rules = Rules::new(GRID_SIZE, MINES_COUNT, settings.label_policy);
    let session = Session::new(rules, StdRng::from_entropy()).context("invalid board configuration")?;
    let palette = Palette::resolve(&settings.palette, Depth::detect());

    run_ui(&settings, palette, session)
}
