//! The playfield: a tile arena, the cell grid over it, and the per-tick
//! board algorithm (advance animations, resolve matches, sweep the dead,
//! compact and refill columns).

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::kills::{KillTable, TypeGrid};
use super::tile::{Tile, TileId};
use crate::Millis;
use crate::consts::*;

/// Fixed-size board over an arena of live tiles.
///
/// Cells hold ids into the arena; every live tile is referenced by exactly
/// one cell. A cell keeps referencing its tile through the disappearance
/// animation and is only vacated once the tile is dead.
pub struct Board {
    /// All live tiles.
    pub tiles: Vec<Tile>,
    /// Grid cells, row-major.
    pub cells: [[Option<TileId>; GRID_COLUMNS]; GRID_ROWS],
    /// Tile under an in-progress pointer press.
    pub pressed: Option<TileId>,
    rng: Pcg32,
    next_id: TileId,
}

impl Board {
    pub fn new(seed: u64) -> Self {
        Self {
            tiles: Vec::with_capacity(GRID_COLUMNS * GRID_ROWS),
            cells: [[None; GRID_COLUMNS]; GRID_ROWS],
            pressed: None,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    fn alloc(&mut self, column: i32, row: i32, kind: u8) -> TileId {
        let id = self.next_id;
        self.next_id += 1;
        self.tiles.push(Tile::new(id, column, row, kind));
        id
    }

    /// Create a settled tile and place it in a cell.
    pub fn place(&mut self, column: usize, row: usize, kind: u8) -> TileId {
        let id = self.alloc(column as i32, row as i32, kind);
        self.cells[row][column] = Some(id);
        id
    }

    fn random_kind(&mut self) -> u8 {
        self.rng.random_range(0..TILE_KINDS)
    }

    /// Fill every cell with a fresh random tile. No attempt is made to
    /// avoid ready-made runs; they resolve on the first simulation step.
    pub fn generate(&mut self) {
        self.tiles.clear();
        self.pressed = None;
        for row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                let kind = self.random_kind();
                self.place(column, row, kind);
            }
        }
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id() == id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|t| t.id() == id)
    }

    pub fn tile_at(&self, column: usize, row: usize) -> Option<&Tile> {
        self.cells[row][column].and_then(|id| self.tile(id))
    }

    /// First tile satisfying the predicate, scanning cells row-major.
    pub fn find_tile(&self, pred: impl Fn(&Tile) -> bool) -> Option<TileId> {
        for row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                if let Some(tile) = self.tile_at(column, row) {
                    if pred(tile) {
                        return Some(tile.id());
                    }
                }
            }
        }
        None
    }

    /// Snapshot of settled tile kinds for match detection.
    pub fn type_grid(&self) -> TypeGrid {
        let mut grid = [[None; GRID_COLUMNS]; GRID_ROWS];
        for row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                grid[row][column] = self.tile_at(column, row).and_then(Tile::kind);
            }
        }
        grid
    }

    /// One full simulation step. Order matters: animations advance first,
    /// then matches are killed, finished disappearances swept, and columns
    /// compacted/refilled, so a tile can never be killed and refilled-over
    /// in the same step. Returns the number of tiles killed.
    pub fn simulate(&mut self, now: Millis) -> usize {
        for tile in &mut self.tiles {
            tile.tick(now);
        }
        let killed = self.simulate_kills(now);
        self.remove_dead_tiles();
        self.simulate_falling(now);
        killed
    }

    /// Kill every settled tile sitting in a completed run.
    pub fn simulate_kills(&mut self, now: Millis) -> usize {
        let mut table = KillTable::new(self.type_grid());
        table.calculate_kills();

        let mut killed = 0;
        for row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                if !table.kill_at(column, row) {
                    continue;
                }
                if let Some(id) = self.cells[row][column] {
                    if let Some(tile) = self.tile_mut(id) {
                        tile.kill(now);
                        killed += 1;
                    }
                }
            }
        }
        if killed > 0 {
            log::debug!("killed {killed} tiles");
        }
        killed
    }

    /// Vacate cells whose tile has finished disappearing. Runs after the
    /// kill pass, so a freshly killed tile keeps its cell for the whole
    /// animation.
    pub fn remove_dead_tiles(&mut self) {
        for row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                if let Some(id) = self.cells[row][column] {
                    if self.tile(id).is_none_or(Tile::is_dead) {
                        self.cells[row][column] = None;
                    }
                }
            }
        }
        self.tiles.retain(Tile::is_alive);
    }

    /// Drop tiles into vacant cells, spawning fresh tiles above the board
    /// when a column has nothing left to fall. Empties are taken
    /// top-to-bottom, one source per gap, so a cell vacated by this pass is
    /// not refilled until the next step and stacked gaps each pull a
    /// distinct source.
    pub fn simulate_falling(&mut self, now: Millis) {
        let mut spawned = [0u32; GRID_COLUMNS];
        for gap_row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                if self.cells[gap_row][column].is_some() {
                    continue;
                }
                // Nearest tile above that is free to move; a tile already
                // falling or moving is passed over, not redirected.
                let mut source = None;
                for test_row in (0..gap_row).rev() {
                    if let Some(id) = self.cells[test_row][column] {
                        if self.tile(id).is_some_and(Tile::can_accept_command) {
                            source = Some((test_row, id));
                            break;
                        }
                    }
                }
                match source {
                    Some((source_row, id)) => {
                        if let Some(tile) = self.tile_mut(id) {
                            tile.fall_to(now, column as i32, gap_row as i32);
                        }
                        let moved = self.cells[source_row][column].take();
                        self.cells[gap_row][column] = moved;
                    }
                    None => {
                        let start_row = -(spawned[column] as i32 + 1);
                        spawned[column] += 1;
                        let kind = self.random_kind();
                        let id = self.alloc(column as i32, start_row, kind);
                        if let Some(tile) = self.tile_mut(id) {
                            tile.fall_to(now, column as i32, gap_row as i32);
                        }
                        self.cells[gap_row][column] = Some(id);
                        log::trace!("spawned tile {id} above column {column}");
                    }
                }
            }
        }
    }

    /// Validate and commit a player swap. Legal only when the two tiles are
    /// grid neighbors, both settled, and the swapped layout completes at
    /// least one run. An illegal swap changes nothing.
    pub fn try_swap(&mut self, now: Millis, a: TileId, b: TileId) -> bool {
        let Some((src, dst)) = self.tile(a).zip(self.tile(b)) else {
            return false;
        };
        if !src.is_neighbor(dst) || !src.can_accept_command() || !dst.can_accept_command() {
            return false;
        }
        let from = (src.column() as usize, src.row() as usize);
        let to = (dst.column() as usize, dst.row() as usize);

        let mut table = KillTable::new(self.type_grid());
        table.swap_kinds(from, to);
        table.calculate_kills();
        if !table.has_kills() {
            log::debug!("swap {a}<->{b} rejected: no run");
            return false;
        }

        let tmp = self.cells[from.1][from.0];
        self.cells[from.1][from.0] = self.cells[to.1][to.0];
        self.cells[to.1][to.0] = tmp;
        if let Some((src, dst)) = self.tile_pair_mut(a, b) {
            src.swap_with(now, dst);
        }
        log::debug!("swap {a}<->{b} committed");
        true
    }

    /// Disjoint mutable borrows of two distinct tiles.
    fn tile_pair_mut(&mut self, a: TileId, b: TileId) -> Option<(&mut Tile, &mut Tile)> {
        let ia = self.tiles.iter().position(|t| t.id() == a)?;
        let ib = self.tiles.iter().position(|t| t.id() == b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (lo, hi) = self.tiles.split_at_mut(ib);
            Some((&mut lo[ia], &mut hi[0]))
        } else {
            let (lo, hi) = self.tiles.split_at_mut(ia);
            Some((&mut hi[0], &mut lo[ib]))
        }
    }
}
