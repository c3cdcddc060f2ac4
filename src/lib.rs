//! Gem Rush - a timed match-3 tile puzzle core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tiles, match detection, board, session)
//! - `renderer`: Renderer capability trait the core draws through
//!
//! This crate is the simulation core only. The host owns the window, event
//! polling and the real renderer backend; it feeds monotone timestamps and
//! pointer events into [`sim::GameSession`] each frame and hands it a
//! [`renderer::Renderer`] to draw with.

pub mod renderer;
pub mod sim;

use glam::Vec2;

/// Millisecond timestamp supplied by the host. Must be monotone
/// non-decreasing across calls within one session.
pub type Millis = u64;

/// Game configuration constants
pub mod consts {
    /// Board width in cells
    pub const GRID_COLUMNS: usize = 8;
    /// Board height in cells
    pub const GRID_ROWS: usize = 8;

    /// Number of tile kinds in the palette
    pub const TILE_KINDS: u8 = 5;

    /// Tile footprint in pixels (tiles are square)
    pub const TILE_SIZE: f32 = 42.0;
    /// Screen position of the board's top-left corner
    pub const BOARD_POS_X: f32 = 330.0;
    pub const BOARD_POS_Y: f32 = 105.0;

    /// Marker crossfade duration (mark and unmark), milliseconds
    pub const MARK_FADE_MS: u64 = 150;
    /// Swap/move animation duration, milliseconds
    pub const MOVE_TIME_MS: u64 = 300;
    /// Disappearance animation duration, milliseconds
    pub const KILL_TIME_MS: u64 = 300;
    /// Fall acceleration, cells per second squared
    pub const FALL_ACCELERATION: f32 = 25.0;

    /// Peak opacity of the hover/selection marker overlay
    pub const MAX_MARKER_OPACITY: f32 = 0.5;

    /// Round length, seconds
    pub const ROUND_TIME_SECS: u64 = 60;
    /// Delay after a round ends before a new one may start, seconds
    pub const COOLDOWN_SECS: u64 = 1;
}

/// Screen position of a cell's top-left corner. Rows above the board are
/// negative and resolve to positions above the visible grid.
#[inline]
pub fn cell_screen_pos(column: i32, row: i32) -> Vec2 {
    Vec2::new(
        consts::BOARD_POS_X + column as f32 * consts::TILE_SIZE,
        consts::BOARD_POS_Y + row as f32 * consts::TILE_SIZE,
    )
}

/// Screen position of a cell's center.
#[inline]
pub fn cell_center(column: i32, row: i32) -> Vec2 {
    cell_screen_pos(column, row) + Vec2::splat(consts::TILE_SIZE / 2.0)
}
