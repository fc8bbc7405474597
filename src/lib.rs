//! Terminal Minesweeper with a safe first click.
//!
//! [`msp_game::Game`] is the engine: pure state, no I/O. [`msp_ui::run`] drives it
//! from a full-screen terminal interface.

pub mod msp_board;  // Positions, grid bounds and presets
pub mod msp_color;  // Palette tones mapped to the terminal's colour depth
pub mod msp_config; // Persisted preferences
pub mod msp_error;  // Engine error type
pub mod msp_game;   // Game engine
pub mod msp_render; // Cell appearance
pub mod msp_ui;     // Terminal UI rendering and event handling

pub use msp_board::{Difficulty, Grid, Position};
pub use msp_error::{GameError, Result};
pub use msp_game::{CellState, Game, GameState};
