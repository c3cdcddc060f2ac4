//! Round bookkeeping and pointer-input translation
//!
//! Wraps one [`Board`] with the round phase machine, countdown timer and
//! score, and turns raw pointer events into select/swap commands. Scoring
//! policy lives here, fed by the board's per-step kill count.

use super::board::Board;
use super::tile::{Tile, TileId};
use crate::Millis;
use crate::consts::*;
use crate::renderer::{Renderer, Sprite};

/// Round phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Process start: the board is drawn but inert until the first start
    /// gesture.
    NotStarted,
    /// A round is underway.
    Running,
    /// Round over; a new start is refused until the cooldown elapses.
    Cooldown,
}

/// One player session: a board plus round/clock/score state.
pub struct GameSession {
    pub board: Board,
    phase: SessionPhase,
    round_start: Millis,
    round_stop: Millis,
    time_left_secs: u64,
    score: u32,
}

impl GameSession {
    /// Wrap an already generated board. The first round plays on the board
    /// as handed in; later rounds regenerate it.
    pub fn new(board: Board) -> Self {
        Self {
            board,
            phase: SessionPhase::NotStarted,
            round_start: 0,
            round_stop: 0,
            time_left_secs: ROUND_TIME_SECS,
            score: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Remaining round time as displayed, pinned at 0 once expired.
    pub fn time_left_secs(&self) -> u64 {
        self.time_left_secs
    }

    /// Begin a round. Refused while the previous round's cooldown is still
    /// running (and while a round is already on).
    pub fn try_start(&mut self, now: Millis) -> bool {
        match self.phase {
            SessionPhase::Running => return false,
            SessionPhase::Cooldown => {
                if now.saturating_sub(self.round_stop) < COOLDOWN_SECS * 1000 {
                    return false;
                }
                self.board.generate();
            }
            SessionPhase::NotStarted => {}
        }
        self.phase = SessionPhase::Running;
        self.round_start = now;
        self.time_left_secs = ROUND_TIME_SECS;
        self.score = 0;
        log::info!("round started");
        true
    }

    /// One host tick. The board stays inert until the first round starts;
    /// afterwards it keeps simulating through cooldowns so cascades and
    /// animations settle between rounds. Score and the countdown only move
    /// while a round is on.
    pub fn tick(&mut self, now: Millis) {
        if self.phase == SessionPhase::NotStarted {
            return;
        }

        let killed = self.board.simulate(now);

        if self.phase != SessionPhase::Running {
            return;
        }

        if killed > 0 {
            let n = killed as u32;
            let points = 2 + (n - 1) * (n - 2) / 2;
            self.score += points;
            log::info!("{killed} tiles cleared, +{points} ({} total)", self.score);
        }

        let elapsed = now.saturating_sub(self.round_start);
        if elapsed > ROUND_TIME_SECS * 1000 {
            self.phase = SessionPhase::Cooldown;
            self.round_stop = now;
            self.board.pressed = None;
            self.time_left_secs = 0;
            log::info!("time up, final score {}", self.score);
        } else {
            self.time_left_secs = ROUND_TIME_SECS - elapsed / 1000;
        }
    }

    /// Pointer press: starts a round if none is on, then opens a gesture on
    /// the settled tile under the pointer, if any.
    pub fn process_pointer_down(&mut self, now: Millis, x: f32, y: f32) {
        if self.phase != SessionPhase::Running && !self.try_start(now) {
            return;
        }
        self.board.pressed = self
            .board
            .find_tile(|t| t.can_accept_command() && t.is_inside(x, y));
    }

    /// Pointer motion: the settled tile under the pointer carries the hover
    /// marker, every other tile fades out. Runs regardless of button state.
    pub fn process_pointer_move(&mut self, now: Millis, x: f32, y: f32) {
        if self.phase != SessionPhase::Running {
            return;
        }
        for tile in &mut self.board.tiles {
            if tile.can_accept_command() && tile.is_inside(x, y) {
                tile.mark(now);
            } else {
                tile.unmark(now);
            }
        }
    }

    /// Pointer release: a release on the pressed tile is a click, a release
    /// elsewhere is a drag toward one of its neighbors.
    pub fn process_pointer_up(&mut self, now: Millis, x: f32, y: f32) {
        if self.phase != SessionPhase::Running {
            return;
        }
        let Some(pressed) = self.board.pressed else {
            return;
        };
        let released = self
            .board
            .find_tile(|t| t.can_accept_command() && t.is_inside(x, y));

        if released == Some(pressed) {
            self.click(now, pressed);
        } else if self
            .board
            .tile(pressed)
            .is_some_and(|t| t.can_accept_command() && !t.is_inside(x, y))
        {
            self.drag(now, pressed, x, y);
        }
        self.board.pressed = None;
    }

    /// Click: select the tile, or try the swap with the previously selected
    /// one, falling back to reselecting the clicked tile.
    fn click(&mut self, now: Millis, clicked: TileId) {
        let Some(selected) = self.board.find_tile(Tile::is_selected) else {
            if let Some(tile) = self.board.tile_mut(clicked) {
                tile.select(now);
            }
            return;
        };
        if selected == clicked {
            return;
        }
        if !self.board.try_swap(now, selected, clicked) {
            if let Some(tile) = self.board.tile_mut(selected) {
                tile.unselect(now);
            }
            if let Some(tile) = self.board.tile_mut(clicked) {
                tile.select(now);
            }
        }
    }

    /// Drag: resolve one cardinal direction from the release point and try
    /// that swap, if the target cell is on the board and occupied.
    fn drag(&mut self, now: Millis, pressed: TileId, x: f32, y: f32) {
        let Some(tile) = self.board.tile(pressed) else {
            return;
        };
        let (dc, dr) = tile.swap_direction(x, y).delta();
        let column = tile.column() + dc;
        let row = tile.row() + dr;
        if column < 0 || column >= GRID_COLUMNS as i32 || row < 0 || row >= GRID_ROWS as i32 {
            return;
        }
        if let Some(target) = self.board.cells[row as usize][column as usize] {
            self.board.try_swap(now, pressed, target);
        }
    }

    /// Draw the frame: background, board tiles inside a clip rectangle with
    /// the on-top pass last, then the HUD.
    pub fn render(&self, r: &mut dyn Renderer, now: Millis) {
        r.clear();
        r.draw_background(Sprite::Background);

        r.set_clip_rect(
            BOARD_POS_X,
            BOARD_POS_Y,
            GRID_COLUMNS as f32 * TILE_SIZE,
            GRID_ROWS as f32 * TILE_SIZE,
        );
        for tile in &self.board.tiles {
            tile.render(r, now);
        }
        for tile in &self.board.tiles {
            tile.render_overlay(r, now);
        }
        r.reset_clip_rect();

        r.draw_text(&format!("Time: {}", self.time_left_secs), 25.0, 125.0);
        r.draw_text(&format!("Score: {}", self.score), 25.0, 175.0);

        r.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_center;

    /// Full board with no runs anywhere: 2x2 tiling of four kinds.
    fn pattern_rows() -> [[u8; GRID_COLUMNS]; GRID_ROWS] {
        let mut rows = [[0u8; GRID_COLUMNS]; GRID_ROWS];
        for (row, kinds) in rows.iter_mut().enumerate() {
            for (column, kind) in kinds.iter_mut().enumerate() {
                *kind = (column % 2 + 2 * (row % 2)) as u8;
            }
        }
        rows
    }

    fn session_from(rows: [[u8; GRID_COLUMNS]; GRID_ROWS]) -> GameSession {
        let mut board = Board::new(1);
        for (row, kinds) in rows.iter().enumerate() {
            for (column, &kind) in kinds.iter().enumerate() {
                board.place(column, row, kind);
            }
        }
        GameSession::new(board)
    }

    fn press(session: &mut GameSession, now: Millis, column: i32, row: i32) {
        let p = cell_center(column, row);
        session.process_pointer_down(now, p.x, p.y);
    }

    fn click(session: &mut GameSession, now: Millis, column: i32, row: i32) {
        let p = cell_center(column, row);
        session.process_pointer_down(now, p.x, p.y);
        session.process_pointer_up(now, p.x, p.y);
    }

    #[test]
    fn test_first_round_plays_the_board_as_given() {
        let mut rows = pattern_rows();
        rows[0][2] = 4;
        rows[0][3] = 4;
        rows[0][4] = 4;
        let mut session = session_from(rows);

        // Inert before the first start gesture: the run stays on the board
        session.tick(100);
        assert_eq!(session.score(), 0);
        assert!(session.board.tile_at(2, 0).unwrap().can_accept_command());

        press(&mut session, 500, 0, 0);
        assert_eq!(session.phase(), SessionPhase::Running);
        assert!(session.board.pressed.is_some());

        session.tick(1000);
        assert_eq!(session.score(), 3);
        for column in 2..=4 {
            assert_eq!(session.board.tile_at(column, 0).unwrap().kind(), None);
        }
        assert_eq!(session.time_left_secs(), ROUND_TIME_SECS);
    }

    #[test]
    fn test_larger_matches_score_superlinearly() {
        let mut rows = pattern_rows();
        for column in 2..=5 {
            rows[4][column] = 4;
        }
        let mut session = session_from(rows);
        press(&mut session, 0, 0, 0);

        session.tick(10);
        assert_eq!(session.score(), 2 + 3 * 2 / 2);
    }

    #[test]
    fn test_round_expiry_enters_cooldown_and_blocks_restart() {
        let mut session = session_from(pattern_rows());
        press(&mut session, 0, 0, 0);
        assert!(session.board.pressed.is_some());

        session.tick(60_500);
        assert_eq!(session.phase(), SessionPhase::Cooldown);
        assert_eq!(session.time_left_secs(), 0);
        assert!(session.board.pressed.is_none());

        assert!(!session.try_start(60_900));
        assert_eq!(session.phase(), SessionPhase::Cooldown);

        assert!(session.try_start(61_600));
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_left_secs(), ROUND_TIME_SECS);
        // Later rounds play a regenerated board
        assert_eq!(session.board.tiles.len(), GRID_COLUMNS * GRID_ROWS);
    }

    #[test]
    fn test_countdown_tracks_elapsed_time() {
        let mut session = session_from(pattern_rows());
        press(&mut session, 0, 0, 0);

        session.tick(12_500);
        assert_eq!(session.time_left_secs(), ROUND_TIME_SECS - 12);
    }

    #[test]
    fn test_click_selects_then_swaps() {
        let mut rows = pattern_rows();
        rows[0][1] = 4;
        rows[0][2] = 4;
        rows[1][3] = 4;
        let mut session = session_from(rows);

        click(&mut session, 0, 3, 0);
        assert!(session.board.tile_at(3, 0).unwrap().is_selected());

        click(&mut session, 50, 3, 1);
        let swapped_in = session.board.tile_at(3, 0).unwrap();
        assert!(!swapped_in.can_accept_command());
        assert!(!swapped_in.is_selected());

        // Once the swap lands the completed run is cleared and scored
        session.tick(400);
        assert_eq!(session.score(), 3);
    }

    #[test]
    fn test_rejected_swap_reselects_the_clicked_tile() {
        let mut session = session_from(pattern_rows());

        click(&mut session, 0, 0, 0);
        click(&mut session, 50, 1, 0);

        assert!(!session.board.tile_at(0, 0).unwrap().is_selected());
        assert!(session.board.tile_at(1, 0).unwrap().is_selected());
        assert!(session.board.tile_at(0, 0).unwrap().can_accept_command());
    }

    #[test]
    fn test_clicking_the_selected_tile_keeps_it_selected() {
        let mut session = session_from(pattern_rows());
        click(&mut session, 0, 2, 2);
        click(&mut session, 50, 2, 2);
        assert!(session.board.tile_at(2, 2).unwrap().is_selected());
    }

    #[test]
    fn test_drag_swaps_toward_the_release_point() {
        let mut rows = pattern_rows();
        rows[0][1] = 4;
        rows[0][2] = 4;
        rows[1][3] = 4;
        let mut session = session_from(rows);

        // Press the kind-4 tile at (3, 1), release over (3, 0)
        press(&mut session, 0, 3, 1);
        let up = cell_center(3, 0);
        session.process_pointer_up(10, up.x, up.y);

        let swapped_in = session.board.tile_at(3, 0).unwrap();
        assert!(!swapped_in.can_accept_command());
        session.tick(400);
        assert_eq!(session.score(), 3);
    }

    #[test]
    fn test_drag_off_the_board_is_ignored() {
        let mut session = session_from(pattern_rows());
        press(&mut session, 0, 0, 0);
        let p = cell_center(0, 0);
        session.process_pointer_up(10, p.x - 60.0, p.y);

        assert!(session.board.pressed.is_none());
        assert!(session.board.tile_at(0, 0).unwrap().can_accept_command());
    }

    #[test]
    fn test_hover_marks_only_the_tile_under_the_pointer() {
        let mut session = session_from(pattern_rows());

        // No marking before the first round starts
        let p = cell_center(2, 2);
        session.process_pointer_move(0, p.x, p.y);
        session.tick(75);
        assert_eq!(session.board.tile_at(2, 2).unwrap().marker_opacity(), 0.0);

        press(&mut session, 100, 0, 0);
        session.process_pointer_move(100, p.x, p.y);
        session.tick(175);
        assert!(session.board.tile_at(2, 2).unwrap().marker_opacity() > 0.4);
        assert_eq!(session.board.tile_at(4, 4).unwrap().marker_opacity(), 0.0);
    }

    /// Renderer double that records the call sequence.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn clear(&mut self) {
            self.calls.push("clear".into());
        }
        fn set_color(&mut self, _r: u8, _g: u8, _b: u8, a: u8) {
            self.calls.push(format!("color a={a}"));
        }
        fn set_clip_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {
            self.calls.push("clip".into());
        }
        fn reset_clip_rect(&mut self) {
            self.calls.push("unclip".into());
        }
        fn draw_background(&mut self, _sprite: Sprite) {
            self.calls.push("background".into());
        }
        fn draw_sprite_centered(
            &mut self,
            sprite: Sprite,
            _x: f32,
            _y: f32,
            _w: f32,
            _h: f32,
            _scale: f32,
        ) {
            self.calls.push(format!("sprite {sprite:?}"));
        }
        fn draw_filled_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {
            self.calls.push("rect".into());
        }
        fn draw_text(&mut self, text: &str, _x: f32, _y: f32) {
            self.calls.push(format!("text {text}"));
        }
        fn present(&mut self) {
            self.calls.push("present".into());
        }
    }

    #[test]
    fn test_render_draws_every_tile_between_clear_and_present() {
        let session = session_from(pattern_rows());
        let mut r = RecordingRenderer::default();
        session.render(&mut r, 0);

        assert_eq!(r.calls.first().map(String::as_str), Some("clear"));
        assert_eq!(r.calls.last().map(String::as_str), Some("present"));
        let sprites = r.calls.iter().filter(|c| c.starts_with("sprite")).count();
        assert_eq!(sprites, GRID_COLUMNS * GRID_ROWS);
        assert!(r.calls.iter().any(|c| c == "text Time: 60"));
        assert!(r.calls.iter().any(|c| c == "text Score: 0"));
    }

    #[test]
    fn test_swapping_tile_draws_in_the_overlay_pass() {
        let mut rows = pattern_rows();
        rows[0][1] = 4;
        rows[0][2] = 4;
        rows[1][3] = 4;
        let mut session = session_from(rows);
        click(&mut session, 0, 3, 0);
        click(&mut session, 50, 3, 1);

        let mut r = RecordingRenderer::default();
        session.render(&mut r, 100);

        let unclip = r.calls.iter().position(|c| c == "unclip").unwrap();
        // The initiating tile is the only draw after the base pass
        assert!(r.calls[unclip - 1].starts_with("sprite"));
        let sprites = r.calls.iter().filter(|c| c.starts_with("sprite")).count();
        assert_eq!(sprites, GRID_COLUMNS * GRID_ROWS);
    }
}
