// Core game engine
// Owns mine placement, per-cell state, adjacency counts and the
// Ready -> Playing -> Won/Lost state machine. No I/O.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::iter;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::msp_board::{Difficulty, Grid, Position};
use crate::msp_error::Result;

/// Session state. Strictly forward until `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub fn is_over(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }
}

/// Player-visible state of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Hidden,
    Revealed,
    Flagged,
    Questioned, // only reachable through `cycle_mark`
}

#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    total_mines: usize,      // requested mine count
    state: GameState,
    cells: Vec<CellState>,
    mines: Vec<bool>,
    mine_count: usize,       // mines actually placed
    adjacent: Vec<u8>,       // empty until mines are placed
    revealed_count: usize,
    flagged_count: usize,
    detonated: Option<Position>,
    start_time: Option<Instant>,
    elapsed: Duration,
    rng: StdRng,
}

impl Game {
    /// Create a game with custom dimensions. Mines are placed on the first reveal.
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self> {
        Ok(Game::with_grid(Grid::new(rows, cols)?, mines))
    }

    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let (_, _, mines) = difficulty.params();
        Game::with_grid(difficulty.grid(), mines)
    }

    /// Replace the engine's random source with a seeded one
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn with_grid(grid: Grid, total_mines: usize) -> Self {
        let n = grid.len();
        Game {
            grid,
            total_mines,
            state: GameState::Ready,
            cells: vec![CellState::Hidden; n],
            mines: vec![false; n],
            mine_count: 0,
            adjacent: Vec::new(),
            revealed_count: 0,
            flagged_count: 0,
            detonated: None,
            start_time: None,
            elapsed: Duration::ZERO,
            rng: StdRng::from_entropy(),
        }
    }

    /// Clear the session and return to Ready. Dimensions and random source are kept.
    pub fn reset(&mut self) {
        let n = self.grid.len();
        self.state = GameState::Ready;
        self.cells = vec![CellState::Hidden; n];
        self.mines = vec![false; n];
        self.mine_count = 0;
        self.adjacent.clear();
        self.revealed_count = 0;
        self.flagged_count = 0;
        self.detonated = None;
        self.start_time = None;
        self.elapsed = Duration::ZERO;
        debug!(rows = self.grid.rows(), cols = self.grid.cols(), "game reset");
    }

    /// Place mines outside the closed neighbourhood of `first_click` and start the clock.
    /// Returns `false` without touching the board if mines were already placed this session.
    pub fn initialize_mines<R: Rng + ?Sized>(
        &mut self,
        first_click: Position,
        rng: &mut R,
    ) -> Result<bool> {
        let first_click = self.grid.validate(first_click)?;
        if self.state != GameState::Ready {
            debug!(?first_click, state = ?self.state, "mines already placed");
            return Ok(false);
        }

        let grid = self.grid;
        let safe_zone: Vec<Position> = iter::once(first_click)
            .chain(grid.neighbors(first_click))
            .collect();
        let available: Vec<Position> = grid
            .positions()
            .filter(|p| !safe_zone.contains(p))
            .collect();
        let count = self.total_mines.min(available.len());
        if count < self.total_mines {
            warn!(
                requested = self.total_mines,
                placed = count,
                "board too small for requested mines outside the safe zone"
            );
        }
        let chosen: Vec<Position> = available.choose_multiple(rng, count).copied().collect();
        self.place_mines(&chosen);

        self.state = GameState::Playing;
        self.start_time = Some(Instant::now());
        info!(?first_click, mines = self.mine_count, "mines placed, game started");
        Ok(true)
    }

    fn place_mines(&mut self, positions: &[Position]) {
        let grid = self.grid;
        self.mines = vec![false; grid.len()];
        for &pos in positions {
            self.mines[grid.index(pos)] = true;
        }
        self.mine_count = self.mines.iter().filter(|m| **m).count();
        self.adjacent = grid
            .positions()
            .map(|p| {
                grid.neighbors(p)
                    .filter(|n| self.mines[grid.index(*n)])
                    .count() as u8
            })
            .collect();
    }

    /// Reveal a cell, flood-filling through zero-count cells.
    /// Returns `false` when nothing was revealed, including when a mine was hit.
    pub fn reveal_cell(&mut self, pos: Position) -> Result<bool> {
        let pos = self.grid.validate(pos)?;
        if self.state == GameState::Ready {
            let mut rng = self.rng.clone();
            self.initialize_mines(pos, &mut rng)?;
            self.rng = rng;
        }

        let idx = self.grid.index(pos);
        if self.state != GameState::Playing
            || matches!(self.cells[idx], CellState::Revealed | CellState::Flagged)
        {
            return Ok(false);
        }

        if self.mines[idx] {
            self.detonated = Some(pos);
            self.finish(GameState::Lost);
            return Ok(false);
        }

        self.flood_reveal(pos);

        if self.revealed_count + self.mine_count == self.grid.len() {
            self.finish(GameState::Won);
            // cosmetic: every mine ends up flagged
            for i in 0..self.cells.len() {
                if self.mines[i] {
                    self.cells[i] = CellState::Flagged;
                }
            }
            self.flagged_count = self.mine_count;
        }
        Ok(true)
    }

    fn flood_reveal(&mut self, start: Position) {
        let grid = self.grid;
        let mut pending = vec![start];
        while let Some(pos) = pending.pop() {
            let idx = grid.index(pos);
            if self.cells[idx] == CellState::Revealed {
                continue;
            }
            self.cells[idx] = CellState::Revealed;
            self.revealed_count += 1;

            if self.adjacent[idx] == 0 {
                pending.extend(grid.neighbors(pos).filter(|n| {
                    matches!(
                        self.cells[grid.index(*n)],
                        CellState::Hidden | CellState::Questioned
                    )
                }));
            }
        }
    }

    fn finish(&mut self, state: GameState) {
        self.state = state;
        if let Some(t0) = self.start_time {
            self.elapsed = t0.elapsed();
        }
        info!(?state, elapsed = ?self.elapsed, revealed = self.revealed_count, "game over");
    }

    /// Flip the flag on a hidden cell. Ignored on revealed cells or outside Playing.
    pub fn toggle_flag(&mut self, pos: Position) -> Result<()> {
        let pos = self.grid.validate(pos)?;
        if self.state != GameState::Playing {
            return Ok(());
        }
        let idx = self.grid.index(pos);
        self.cells[idx] = match self.cells[idx] {
            CellState::Revealed => return Ok(()),
            CellState::Flagged => {
                self.flagged_count -= 1;
                CellState::Hidden
            }
            CellState::Hidden | CellState::Questioned => {
                self.flagged_count += 1;
                CellState::Flagged
            }
        };
        Ok(())
    }

    /// Three-state marking: none -> flag -> question mark -> none
    pub fn cycle_mark(&mut self, pos: Position) -> Result<()> {
        let pos = self.grid.validate(pos)?;
        if self.state != GameState::Playing {
            return Ok(());
        }
        let idx = self.grid.index(pos);
        self.cells[idx] = match self.cells[idx] {
            CellState::Revealed => return Ok(()),
            CellState::Hidden => {
                self.flagged_count += 1;
                CellState::Flagged
            }
            CellState::Flagged => {
                self.flagged_count -= 1;
                CellState::Questioned
            }
            CellState::Questioned => CellState::Hidden,
        };
        Ok(())
    }

    /// Chord: when the flags around a revealed cell match its count, reveal the
    /// rest of its neighbours. Returns `false` if the counts differ or a mine was hit.
    pub fn auto_reveal_neighbors(&mut self, pos: Position) -> Result<bool> {
        let pos = self.grid.validate(pos)?;
        let idx = self.grid.index(pos);
        if self.state != GameState::Playing || self.cells[idx] != CellState::Revealed {
            return Ok(false);
        }

        let neighbors: Vec<Position> = self.grid.neighbors(pos).collect();
        let flagged = neighbors
            .iter()
            .filter(|n| self.cells[self.grid.index(**n)] == CellState::Flagged)
            .count();
        if flagged != self.adjacent[idx] as usize {
            return Ok(false);
        }

        for n in neighbors {
            // an earlier neighbour's flood fill may already have opened this one
            if matches!(
                self.cells[self.grid.index(n)],
                CellState::Revealed | CellState::Flagged
            ) {
                continue;
            }
            if !self.reveal_cell(n)? {
                debug!(?pos, hit = ?n, "chord detonated a mine");
                return Ok(false);
            }
            if self.state == GameState::Won {
                break;
            }
        }
        Ok(true)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    /// Mines actually placed; zero until the first reveal
    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged_count
    }

    /// Mine counter display value, never negative
    pub fn remaining_mines(&self) -> usize {
        self.total_mines.saturating_sub(self.flagged_count)
    }

    pub fn cell_state(&self, pos: Position) -> Result<CellState> {
        let pos = self.grid.validate(pos)?;
        Ok(self.cells[self.grid.index(pos)])
    }

    pub fn is_mine(&self, pos: Position) -> Result<bool> {
        let pos = self.grid.validate(pos)?;
        Ok(self.mines[self.grid.index(pos)])
    }

    /// Cached count of neighbouring mines; zero before mines are placed
    pub fn adjacent_mines(&self, pos: Position) -> Result<u8> {
        let pos = self.grid.validate(pos)?;
        Ok(self
            .adjacent
            .get(self.grid.index(pos))
            .copied()
            .unwrap_or(0))
    }

    pub fn revealed(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_where(|g, i| g.cells[i] == CellState::Revealed)
    }

    pub fn flagged(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_where(|g, i| g.cells[i] == CellState::Flagged)
    }

    pub fn mines(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_where(|g, i| g.mines[i])
    }

    /// Flags that sit on safe cells
    pub fn wrong_flags(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_where(|g, i| g.cells[i] == CellState::Flagged && !g.mines[i])
    }

    fn positions_where<F>(&self, keep: F) -> impl Iterator<Item = Position> + '_
    where
        F: Fn(&Game, usize) -> bool + 'static,
    {
        self.grid
            .positions()
            .enumerate()
            .filter(move |(i, _)| keep(self, *i))
            .map(|(_, p)| p)
    }

    /// The mine that ended a lost game
    pub fn detonated(&self) -> Option<Position> {
        self.detonated
    }

    /// Live while playing, frozen once the game ends
    pub fn elapsed(&self) -> Duration {
        match (self.state, self.start_time) {
            (GameState::Playing, Some(t0)) => t0.elapsed(),
            _ => self.elapsed,
        }
    }

    /// Start a session from a fixed mine layout
    #[cfg(test)]
    pub(crate) fn from_mine_positions(rows: usize, cols: usize, mines: &[Position]) -> Self {
        let mut game = Game::with_grid(Grid::new(rows, cols).unwrap(), mines.len());
        game.place_mines(mines);
        game.state = GameState::Playing;
        game.start_time = Some(Instant::now());
        game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msp_error::GameError;
    use std::thread;

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn closed_neighborhood(pos: Position, rows: usize, cols: usize) -> Vec<Position> {
        iter::once(pos).chain(pos.neighbors(rows, cols)).collect()
    }

    #[test]
    fn test_first_click_scenario_beginner_center() {
        let mut game = Game::for_difficulty(Difficulty::Beginner);
        let mut rng = StdRng::seed_from_u64(42);

        assert!(game.initialize_mines(p(4, 4), &mut rng).unwrap());

        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.mine_count(), 10);
        assert_eq!(game.mines().count(), 10);
        assert_eq!(game.adjacent.len(), 81);
        for mine in game.mines() {
            assert!(
                mine.row.abs_diff(4) > 1 || mine.col.abs_diff(4) > 1,
                "Mine {:?} inside the safe block",
                mine
            );
        }
    }

    #[test]
    fn test_mine_count_matches_presets_for_any_click() {
        for difficulty in Difficulty::ALL {
            let (rows, cols, mines) = difficulty.params();
            for (seed, click) in [(1, p(0, 0)), (2, p(rows / 2, cols / 2)), (3, p(rows - 1, 0))] {
                let mut game = Game::for_difficulty(difficulty);
                let mut rng = StdRng::seed_from_u64(seed);
                game.initialize_mines(click, &mut rng).unwrap();

                let safe = closed_neighborhood(click, rows, cols).len();
                assert_eq!(game.mine_count(), mines.min(rows * cols - safe));
            }
        }
    }

    #[test]
    fn test_safe_zone_never_mined() {
        for seed in 0..200 {
            let mut game = Game::for_difficulty(Difficulty::Expert);
            let mut rng = StdRng::seed_from_u64(seed);
            let click = p((seed as usize) % 16, (seed as usize * 7) % 30);
            game.initialize_mines(click, &mut rng).unwrap();

            for pos in closed_neighborhood(click, 16, 30) {
                assert!(!game.is_mine(pos).unwrap(), "seed {} mined {:?}", seed, pos);
            }
        }
    }

    #[test]
    fn test_placement_is_reproducible_with_seed() {
        let mut a = Game::for_difficulty(Difficulty::Intermediate).with_seed(7);
        let mut b = Game::for_difficulty(Difficulty::Intermediate).with_seed(7);
        a.reveal_cell(p(3, 3)).unwrap();
        b.reveal_cell(p(3, 3)).unwrap();
        assert_eq!(a.mines().collect::<Vec<_>>(), b.mines().collect::<Vec<_>>());
    }

    #[test]
    fn test_mines_capped_by_available_cells() {
        let mut game = Game::new(3, 3, 10).unwrap();

        assert!(game.reveal_cell(p(1, 1)).unwrap());

        assert_eq!(game.mine_count(), 0);
        assert_eq!(game.revealed_count(), 9);
        assert_eq!(game.state(), GameState::Won);
    }

    #[test]
    fn test_initialize_mines_runs_once_per_session() {
        let mut game = Game::for_difficulty(Difficulty::Beginner);
        let mut rng = StdRng::seed_from_u64(5);
        game.initialize_mines(p(0, 0), &mut rng).unwrap();
        let before: Vec<_> = game.mines().collect();

        assert!(!game.initialize_mines(p(8, 8), &mut rng).unwrap());
        assert_eq!(game.mines().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_first_reveal_places_mines_and_starts() {
        let mut game = Game::for_difficulty(Difficulty::Beginner).with_seed(99);
        assert_eq!(game.state(), GameState::Ready);

        assert!(game.reveal_cell(p(4, 4)).unwrap());

        assert_eq!(game.mine_count(), 10);
        assert_eq!(game.cell_state(p(4, 4)).unwrap(), CellState::Revealed);
        // the first cell is always a zero, so the fill opened at least its block
        assert!(game.revealed_count() >= 9);
        assert_ne!(game.state(), GameState::Ready);
    }

    #[test]
    fn test_flood_fill_stops_at_numbered_border() {
        // 3x4, mines in the right column top and bottom
        let mut game = Game::from_mine_positions(3, 4, &[p(0, 3), p(2, 3)]);

        assert!(game.reveal_cell(p(1, 0)).unwrap());

        assert_eq!(game.revealed_count(), 9);
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(game.cell_state(p(row, col)).unwrap(), CellState::Revealed);
            }
        }
        assert_eq!(game.cell_state(p(1, 3)).unwrap(), CellState::Hidden);
        assert_eq!(game.adjacent_mines(p(1, 2)).unwrap(), 2);
        assert_eq!(game.state(), GameState::Playing);

        assert!(game.reveal_cell(p(1, 3)).unwrap());
        assert_eq!(game.state(), GameState::Won);
        assert_eq!(game.flagged().collect::<Vec<_>>(), vec![p(0, 3), p(2, 3)]);
    }

    #[test]
    fn test_flood_fill_region_is_closed() {
        for seed in 0..20 {
            let mut game = Game::for_difficulty(Difficulty::Expert).with_seed(seed);
            game.reveal_cell(p(8, 15)).unwrap();
            let revealed: Vec<_> = game.revealed().collect();
            assert_eq!(revealed.len(), game.revealed_count());

            for pos in &revealed {
                assert!(!game.is_mine(*pos).unwrap());
                if game.adjacent_mines(*pos).unwrap() == 0 {
                    for n in pos.neighbors(16, 30) {
                        assert_eq!(game.cell_state(n).unwrap(), CellState::Revealed);
                    }
                } else if *pos != p(8, 15) {
                    // numbered cells are only opened as the border of a zero
                    assert!(pos.neighbors(16, 30).any(|n| {
                        game.cell_state(n).unwrap() == CellState::Revealed
                            && game.adjacent_mines(n).unwrap() == 0
                    }));
                }
            }
        }
    }

    #[test]
    fn test_flood_fill_skips_flags() {
        let mut game = Game::from_mine_positions(3, 3, &[p(2, 2)]);
        game.toggle_flag(p(0, 2)).unwrap();

        game.reveal_cell(p(0, 0)).unwrap();

        assert_eq!(game.cell_state(p(0, 2)).unwrap(), CellState::Flagged);
        assert_eq!(game.revealed_count(), 7);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_win_requires_all_safe_cells_beginner() {
        let mines: Vec<_> = (0..9).map(|c| p(0, c)).chain([p(1, 0)]).collect();
        let mut game = Game::from_mine_positions(9, 9, &mines);

        // hold one safe cell back behind a flag
        let held = p(1, 1);
        game.toggle_flag(held).unwrap();
        let safe: Vec<_> = game.grid().positions().filter(|q| !mines.contains(q)).collect();
        for pos in &safe {
            game.reveal_cell(*pos).unwrap();
        }
        assert_eq!(game.revealed_count(), 70);
        assert_eq!(game.state(), GameState::Playing);

        game.toggle_flag(held).unwrap();
        assert!(game.reveal_cell(held).unwrap());

        assert_eq!(game.state(), GameState::Won);
        assert_eq!(game.revealed_count(), 71);
        assert_eq!(game.flagged_count(), 10);
        assert_eq!(game.remaining_mines(), 0);
    }

    #[test]
    fn test_hitting_mine_loses_and_freezes_clock() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);

        assert!(!game.reveal_cell(p(0, 0)).unwrap());

        assert_eq!(game.state(), GameState::Lost);
        assert_eq!(game.detonated(), Some(p(0, 0)));
        assert_eq!(game.revealed_count(), 0);
        let frozen = game.elapsed();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(game.elapsed(), frozen);
        assert!(!game.reveal_cell(p(2, 2)).unwrap());
        assert_eq!(game.revealed_count(), 0);
    }

    #[test]
    fn test_reveal_noops() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        game.toggle_flag(p(2, 2)).unwrap();

        assert!(!game.reveal_cell(p(2, 2)).unwrap());
        assert!(game.reveal_cell(p(1, 1)).unwrap());
        assert!(!game.reveal_cell(p(1, 1)).unwrap());
        assert_eq!(game.revealed_count(), 1);
    }

    #[test]
    fn test_toggle_flag_is_own_inverse() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);

        game.toggle_flag(p(2, 2)).unwrap();
        assert_eq!(game.cell_state(p(2, 2)).unwrap(), CellState::Flagged);
        assert_eq!(game.flagged_count(), 1);

        game.toggle_flag(p(2, 2)).unwrap();
        assert_eq!(game.cell_state(p(2, 2)).unwrap(), CellState::Hidden);
        assert_eq!(game.flagged_count(), 0);
    }

    #[test]
    fn test_toggle_flag_ignored_when_not_playing_or_revealed() {
        let mut game = Game::for_difficulty(Difficulty::Beginner);
        game.toggle_flag(p(0, 0)).unwrap();
        assert_eq!(game.flagged_count(), 0);

        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        game.reveal_cell(p(1, 1)).unwrap();
        game.toggle_flag(p(1, 1)).unwrap();
        assert_eq!(game.cell_state(p(1, 1)).unwrap(), CellState::Revealed);
        assert_eq!(game.flagged_count(), 0);
    }

    #[test]
    fn test_remaining_mines_never_negative() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        game.toggle_flag(p(2, 2)).unwrap();
        game.toggle_flag(p(2, 1)).unwrap();
        assert_eq!(game.flagged_count(), 2);
        assert_eq!(game.remaining_mines(), 0);
    }

    #[test]
    fn test_cycle_mark_reaches_question() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        let pos = p(2, 2);

        game.cycle_mark(pos).unwrap();
        assert_eq!(game.cell_state(pos).unwrap(), CellState::Flagged);
        game.cycle_mark(pos).unwrap();
        assert_eq!(game.cell_state(pos).unwrap(), CellState::Questioned);
        assert_eq!(game.flagged_count(), 0);
        game.cycle_mark(pos).unwrap();
        assert_eq!(game.cell_state(pos).unwrap(), CellState::Hidden);
    }

    #[test]
    fn test_questioned_cells_can_be_revealed() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        game.cycle_mark(p(2, 2)).unwrap();
        game.cycle_mark(p(2, 2)).unwrap();

        assert!(game.reveal_cell(p(2, 2)).unwrap());
        assert_eq!(game.cell_state(p(2, 2)).unwrap(), CellState::Revealed);
    }

    #[test]
    fn test_flood_fill_opens_question_marks() {
        let mut game = Game::from_mine_positions(3, 4, &[p(0, 3), p(2, 3)]);
        game.cycle_mark(p(0, 1)).unwrap();
        game.cycle_mark(p(0, 1)).unwrap();
        assert_eq!(game.cell_state(p(0, 1)).unwrap(), CellState::Questioned);

        game.reveal_cell(p(1, 0)).unwrap();

        assert_eq!(game.cell_state(p(0, 1)).unwrap(), CellState::Revealed);
        assert_eq!(game.revealed_count(), 9);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_chord_ignores_question_marks_in_flag_count() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0), p(0, 2)]);
        game.reveal_cell(p(1, 1)).unwrap();
        game.toggle_flag(p(0, 0)).unwrap();
        game.cycle_mark(p(0, 2)).unwrap();
        game.cycle_mark(p(0, 2)).unwrap();

        // one flag and one question mark around a 2
        assert!(!game.auto_reveal_neighbors(p(1, 1)).unwrap());
        assert_eq!(game.revealed_count(), 1);
        assert_eq!(game.cell_state(p(0, 2)).unwrap(), CellState::Questioned);

        game.toggle_flag(p(0, 2)).unwrap();
        game.cycle_mark(p(2, 2)).unwrap();
        game.cycle_mark(p(2, 2)).unwrap();

        assert!(game.auto_reveal_neighbors(p(1, 1)).unwrap());
        assert_eq!(game.cell_state(p(2, 2)).unwrap(), CellState::Revealed);
        assert_eq!(game.state(), GameState::Won);
    }

    #[test]
    fn test_win_freezes_clock() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        thread::sleep(Duration::from_millis(5));
        assert!(game.reveal_cell(p(2, 2)).unwrap());
        assert_eq!(game.state(), GameState::Won);

        let frozen = game.elapsed();
        assert!(frozen > Duration::ZERO);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(game.elapsed(), frozen);
    }

    #[test]
    fn test_chord_with_correct_flags_reveals_rest() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0), p(0, 2)]);
        game.reveal_cell(p(1, 1)).unwrap();
        assert_eq!(game.adjacent_mines(p(1, 1)).unwrap(), 2);
        game.toggle_flag(p(0, 0)).unwrap();
        game.toggle_flag(p(0, 2)).unwrap();

        assert!(game.auto_reveal_neighbors(p(1, 1)).unwrap());

        assert_eq!(game.revealed_count(), 7);
        assert_eq!(game.state(), GameState::Won);
    }

    #[test]
    fn test_chord_with_wrong_flag_detonates() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0), p(0, 2)]);
        game.reveal_cell(p(1, 1)).unwrap();
        game.toggle_flag(p(0, 0)).unwrap();
        game.toggle_flag(p(0, 1)).unwrap();

        assert!(!game.auto_reveal_neighbors(p(1, 1)).unwrap());

        assert_eq!(game.state(), GameState::Lost);
        assert_eq!(game.detonated(), Some(p(0, 2)));
        assert_eq!(game.wrong_flags().collect::<Vec<_>>(), vec![p(0, 1)]);
    }

    #[test]
    fn test_chord_requires_matching_flag_count() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0), p(0, 2)]);
        game.reveal_cell(p(1, 1)).unwrap();
        game.toggle_flag(p(0, 0)).unwrap();

        assert!(!game.auto_reveal_neighbors(p(1, 1)).unwrap());
        assert_eq!(game.revealed_count(), 1);
        assert_eq!(game.state(), GameState::Playing);

        // hidden cells cannot be chorded
        assert!(!game.auto_reveal_neighbors(p(2, 2)).unwrap());
    }

    #[test]
    fn test_reset_returns_to_ready() {
        let mut game = Game::from_mine_positions(3, 3, &[p(0, 0)]);
        game.toggle_flag(p(2, 2)).unwrap();
        game.reveal_cell(p(0, 0)).unwrap();
        assert_eq!(game.state(), GameState::Lost);

        game.reset();

        assert_eq!(game.state(), GameState::Ready);
        assert_eq!(game.revealed().count(), 0);
        assert_eq!(game.flagged().count(), 0);
        assert_eq!(game.mines().count(), 0);
        assert_eq!(game.detonated(), None);
        assert_eq!(game.elapsed(), Duration::ZERO);
        assert_eq!(game.adjacent_mines(p(1, 1)).unwrap(), 0);

        assert!(game.reveal_cell(p(1, 1)).unwrap());
        assert_eq!(game.state(), GameState::Won);
    }

    #[test]
    fn test_out_of_range_positions_are_rejected() {
        let mut game = Game::for_difficulty(Difficulty::Beginner);
        let err = GameError::InvalidPosition {
            row: 9,
            col: 0,
            rows: 9,
            cols: 9,
        };

        assert_eq!(game.reveal_cell(p(9, 0)), Err(err));
        assert_eq!(game.state(), GameState::Ready);
        assert_eq!(game.toggle_flag(p(9, 0)), Err(err));
        assert_eq!(game.auto_reveal_neighbors(p(9, 0)), Err(err));
        assert_eq!(game.cell_state(p(9, 0)), Err(err));
        assert!(Game::new(0, 5, 1).is_err());
        assert!(Game::new(usize::MAX, 2, 1).is_err());
    }
}
