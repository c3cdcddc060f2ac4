//! Gem Rush headless demo
//!
//! Drives one full round against the simulation core with synthesized
//! pointer gestures: random click pairs on adjacent cells, letting the
//! board reject the swaps that make no run. Wall-clock timestamps come
//! from `Instant`, drawing goes to the no-op backend, progress goes to the
//! log. Run with `RUST_LOG=debug` for per-swap detail.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use gem_rush::cell_center;
use gem_rush::consts::*;
use gem_rush::renderer::NullRenderer;
use gem_rush::sim::{Board, GameSession, SessionPhase};

fn main() {
    env_logger::init();

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    log::info!("board seed {seed}");

    let mut board = Board::new(seed);
    board.generate();
    let mut session = GameSession::new(board);
    let mut renderer = NullRenderer;
    let mut gestures = Pcg32::seed_from_u64(seed ^ 0x5eed);

    let start = Instant::now();
    let now_ms = || start.elapsed().as_millis() as u64;

    // First click starts the round
    let p = cell_center(0, 0);
    session.process_pointer_down(now_ms(), p.x, p.y);
    session.process_pointer_up(now_ms(), p.x, p.y);

    let mut last_gesture = 0u64;
    let mut last_report = 0u64;
    loop {
        let now = now_ms();
        session.tick(now);
        session.render(&mut renderer, now);

        if now.saturating_sub(last_gesture) >= 400 {
            last_gesture = now;
            let column = gestures.random_range(0..GRID_COLUMNS as i32 - 1);
            let row = gestures.random_range(0..GRID_ROWS as i32 - 1);
            let a = cell_center(column, row);
            session.process_pointer_move(now, a.x, a.y);
            session.process_pointer_down(now, a.x, a.y);
            session.process_pointer_up(now, a.x, a.y);

            let (dc, dr) = if gestures.random_bool(0.5) {
                (1, 0)
            } else {
                (0, 1)
            };
            let b = cell_center(column + dc, row + dr);
            session.process_pointer_down(now, b.x, b.y);
            session.process_pointer_up(now, b.x, b.y);
        }

        if now.saturating_sub(last_report) >= 5000 {
            last_report = now;
            log::info!(
                "t={}s score={} time_left={}s",
                now / 1000,
                session.score(),
                session.time_left_secs()
            );
        }

        if session.phase() == SessionPhase::Cooldown {
            log::info!("round over, final score {}", session.score());
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }
}
