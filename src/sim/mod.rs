//! Deterministic match-3 simulation
//!
//! All gameplay logic lives here. This module must stay pure and
//! deterministic:
//! - Timestamp-driven only: every animation is a function of its recorded
//!   start time and the caller's current time, never integrated per frame
//! - Seeded RNG only
//! - No platform dependencies; drawing goes through the `Renderer` trait

pub mod board;
pub mod kills;
pub mod session;
pub mod tile;

pub use board::Board;
pub use kills::{KillTable, TypeGrid};
pub use session::{GameSession, SessionPhase};
pub use tile::{SwapDirection, Tile, TileId};
