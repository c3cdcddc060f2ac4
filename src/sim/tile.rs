//! Per-cell tile state machine
//!
//! A tile's pose is a pure function of a recorded start time and the
//! caller's current timestamp: commands store when they happened and `tick`
//! recomputes derived state from elapsed time. Nothing is integrated frame
//! to frame, so issuing the same command twice, or a tick arriving late,
//! cannot corrupt the animation.

use glam::Vec2;

use crate::consts::*;
use crate::renderer::{Renderer, Sprite};
use crate::{Millis, cell_center, cell_screen_pos};

/// Stable arena id for a tile.
pub type TileId = u32;

/// Primary life/motion state. At most one motion is active at a time and
/// `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TileState {
    Normal,
    Moving {
        since: Millis,
        from: Vec2,
        on_top: bool,
    },
    Falling {
        since: Millis,
        from: Vec2,
    },
    Disappearing {
        since: Millis,
    },
    Dead,
}

/// Hover/selection marker crossfade, independent of the primary state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerState {
    None,
    Marking { since: Millis },
    Marked,
    Unmarking { since: Millis },
}

/// Cardinal swap direction resolved from a pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwapDirection {
    /// Grid-cell delta (columns, rows).
    pub fn delta(self) -> (i32, i32) {
        match self {
            SwapDirection::Left => (-1, 0),
            SwapDirection::Right => (1, 0),
            SwapDirection::Up => (0, -1),
            SwapDirection::Down => (0, 1),
        }
    }
}

/// One grid cell's occupant: a typed tile with its animation state.
#[derive(Debug, Clone)]
pub struct Tile {
    id: TileId,
    column: i32,
    row: i32,
    kind: u8,
    state: TileState,
    marker: MarkerState,
    marker_opacity: f32,
    selected: bool,
}

impl Tile {
    pub fn new(id: TileId, column: i32, row: i32, kind: u8) -> Self {
        Self {
            id,
            column,
            row,
            kind,
            state: TileState::Normal,
            marker: MarkerState::None,
            marker_opacity: 0.0,
            selected: false,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    /// Palette kind, or `None` while the tile is not settled. Tiles that are
    /// mid-swap, falling, disappearing or dead never participate in match
    /// detection.
    pub fn kind(&self) -> Option<u8> {
        match self.state {
            TileState::Normal => Some(self.kind),
            _ => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_dead(&self) -> bool {
        self.state == TileState::Dead
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Settled and able to take a select/swap/kill/fall command.
    pub fn can_accept_command(&self) -> bool {
        self.state == TileState::Normal
    }

    /// Screen-space hit test against this tile's cell. Only a settled tile
    /// occupies its cell; a tile in motion reports `false` rather than
    /// guessing at its footprint.
    pub fn is_inside(&self, x: f32, y: f32) -> bool {
        if !self.can_accept_command() {
            return false;
        }
        let pos = cell_screen_pos(self.column, self.row);
        x >= pos.x && x < pos.x + TILE_SIZE && y >= pos.y && y < pos.y + TILE_SIZE
    }

    /// True when the other tile sits in an orthogonally adjacent cell.
    pub fn is_neighbor(&self, other: &Tile) -> bool {
        let dc = (self.column - other.column).abs();
        let dr = (self.row - other.row).abs();
        (dc == 0 && dr == 1) || (dc == 1 && dr == 0)
    }

    /// Which neighbor a release at (x, y) points at, judged by the dominant
    /// axis of the offset from this tile's center. Vertical wins ties;
    /// screen y grows downward so a positive offset is `Down`.
    pub fn swap_direction(&self, x: f32, y: f32) -> SwapDirection {
        let center = cell_center(self.column, self.row);
        let dx = x - center.x;
        let dy = y - center.y;
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                SwapDirection::Right
            } else {
                SwapDirection::Left
            }
        } else if dy > 0.0 {
            SwapDirection::Down
        } else {
            SwapDirection::Up
        }
    }

    /// Current marker overlay opacity in [0, 1], as of the last `tick`.
    pub fn marker_opacity(&self) -> f32 {
        self.marker_opacity
    }

    /// Begin (or continue) the marker fade-in. Interrupting a fade-out
    /// back-dates the start so the computed opacity continues from its
    /// current value instead of snapping to zero.
    pub fn mark(&mut self, now: Millis) {
        match self.marker {
            MarkerState::Marking { .. } | MarkerState::Marked => {}
            MarkerState::None => self.marker = MarkerState::Marking { since: now },
            MarkerState::Unmarking { .. } => {
                let done = (self.marker_opacity * MARK_FADE_MS as f32) as u64;
                self.marker = MarkerState::Marking {
                    since: now.saturating_sub(done),
                };
            }
        }
    }

    /// Begin the marker fade-out. A no-op while the tile is selected:
    /// selection pins the marker on.
    pub fn unmark(&mut self, now: Millis) {
        if self.selected {
            return;
        }
        match self.marker {
            MarkerState::None | MarkerState::Unmarking { .. } => {}
            MarkerState::Marked => self.marker = MarkerState::Unmarking { since: now },
            MarkerState::Marking { .. } => {
                let done = ((1.0 - self.marker_opacity) * MARK_FADE_MS as f32) as u64;
                self.marker = MarkerState::Unmarking {
                    since: now.saturating_sub(done),
                };
            }
        }
    }

    pub fn select(&mut self, now: Millis) {
        self.selected = true;
        self.mark(now);
    }

    pub fn unselect(&mut self, now: Millis) {
        self.selected = false;
        self.unmark(now);
    }

    /// Start an animated move into another cell. The logical coordinates
    /// change immediately so grid bookkeeping and match detection see the
    /// destination; only the drawn pose interpolates from the old cell.
    pub fn move_to(&mut self, now: Millis, column: i32, row: i32, on_top: bool) {
        self.unselect(now);
        if !self.can_accept_command() {
            return;
        }
        let from = cell_screen_pos(self.column, self.row);
        self.column = column;
        self.row = row;
        self.state = TileState::Moving { since: now, from, on_top };
    }

    /// Trade cells with another tile. The initiating tile draws on top so a
    /// dragged tile passes over its partner.
    pub fn swap_with(&mut self, now: Millis, other: &mut Tile) {
        let (old_column, old_row) = (self.column, self.row);
        self.move_to(now, other.column, other.row, true);
        other.move_to(now, old_column, old_row, false);
    }

    /// Start the disappearance animation. The tile stops matching right away
    /// (`kind` reports `None`) but keeps its cell until the animation has
    /// run and `tick` declares it dead.
    pub fn kill(&mut self, now: Millis) {
        self.unselect(now);
        if !self.can_accept_command() {
            return;
        }
        self.state = TileState::Disappearing { since: now };
    }

    /// Start falling into a cell below. Coordinates update immediately; the
    /// drawn pose accelerates down from the recorded origin.
    pub fn fall_to(&mut self, now: Millis, column: i32, row: i32) {
        self.unselect(now);
        if !self.can_accept_command() {
            return;
        }
        let from = cell_screen_pos(self.column, self.row);
        self.column = column;
        self.row = row;
        self.state = TileState::Falling { since: now, from };
    }

    /// Advance derived state to `now`. Call once per simulation step before
    /// the tile is queried or rendered.
    pub fn tick(&mut self, now: Millis) {
        match self.marker {
            MarkerState::Marking { since } => {
                let elapsed = now.saturating_sub(since);
                if elapsed > MARK_FADE_MS {
                    self.marker = MarkerState::Marked;
                    self.marker_opacity = 1.0;
                } else {
                    self.marker_opacity = elapsed as f32 / MARK_FADE_MS as f32;
                }
            }
            MarkerState::Unmarking { since } => {
                let elapsed = now.saturating_sub(since);
                if elapsed > MARK_FADE_MS {
                    self.marker = MarkerState::None;
                    self.marker_opacity = 0.0;
                } else {
                    self.marker_opacity = 1.0 - elapsed as f32 / MARK_FADE_MS as f32;
                }
            }
            MarkerState::None | MarkerState::Marked => {}
        }

        match self.state {
            TileState::Moving { since, .. } => {
                if now.saturating_sub(since) > MOVE_TIME_MS {
                    self.state = TileState::Normal;
                }
            }
            TileState::Disappearing { since } => {
                if now.saturating_sub(since) > KILL_TIME_MS {
                    self.state = TileState::Dead;
                }
            }
            TileState::Falling { since, from } => {
                // Landed once the accelerated pose reaches the resting y;
                // velocity is discarded, no bounce.
                let rest_y = cell_screen_pos(self.column, self.row).y;
                if fall_y(now, since, from) >= rest_y {
                    self.state = TileState::Normal;
                }
            }
            TileState::Normal | TileState::Dead => {}
        }
    }

    /// Draw the tile at its current pose. `tick` must have run for this
    /// step. Dead tiles draw nothing.
    pub fn render(&self, r: &mut dyn Renderer, now: Millis) {
        self.render_marker(r);
        match self.state {
            TileState::Normal => {
                let pos = cell_screen_pos(self.column, self.row);
                r.draw_sprite_centered(
                    Sprite::Tile(self.kind),
                    pos.x,
                    pos.y,
                    TILE_SIZE,
                    TILE_SIZE,
                    1.0,
                );
            }
            TileState::Moving { since, from, on_top } => {
                if !on_top {
                    self.render_moving(r, now, since, from);
                }
            }
            TileState::Disappearing { since } => {
                let progress =
                    (now.saturating_sub(since) as f32 / KILL_TIME_MS as f32).clamp(0.0, 1.0);
                let pos = cell_screen_pos(self.column, self.row);
                r.draw_sprite_centered(
                    Sprite::Tile(self.kind),
                    pos.x,
                    pos.y,
                    TILE_SIZE,
                    TILE_SIZE,
                    1.0 - progress,
                );
            }
            TileState::Falling { since, from } => {
                let dest = cell_screen_pos(self.column, self.row);
                let y = fall_y(now, since, from).min(dest.y);
                r.draw_sprite_centered(
                    Sprite::Tile(self.kind),
                    dest.x,
                    y,
                    TILE_SIZE,
                    TILE_SIZE,
                    1.0,
                );
            }
            TileState::Dead => {}
        }
    }

    /// Second draw pass for tiles layered above the rest: the initiating
    /// half of a swap.
    pub fn render_overlay(&self, r: &mut dyn Renderer, now: Millis) {
        if let TileState::Moving { since, from, on_top: true } = self.state {
            self.render_moving(r, now, since, from);
        }
    }

    fn render_marker(&self, r: &mut dyn Renderer) {
        if self.marker == MarkerState::None {
            return;
        }
        let pos = cell_screen_pos(self.column, self.row);
        let alpha = (255.0 * self.marker_opacity * MAX_MARKER_OPACITY) as u8;
        r.set_color(255, 255, 255, alpha);
        r.draw_filled_rect(pos.x, pos.y, TILE_SIZE, TILE_SIZE);
    }

    fn render_moving(&self, r: &mut dyn Renderer, now: Millis, since: Millis, from: Vec2) {
        let dest = cell_screen_pos(self.column, self.row);
        let t = (now.saturating_sub(since) as f32 / MOVE_TIME_MS as f32).clamp(0.0, 1.0);
        let pos = from.lerp(dest, t);
        r.draw_sprite_centered(
            Sprite::Tile(self.kind),
            pos.x,
            pos.y,
            TILE_SIZE,
            TILE_SIZE,
            1.0,
        );
    }
}

/// Screen y of a fall that started at `since` from `from`: constant
/// acceleration, no initial velocity.
fn fall_y(now: Millis, since: Millis, from: Vec2) -> f32 {
    let t = now.saturating_sub(since) as f32 / 1000.0;
    from.y + 0.5 * FALL_ACCELERATION * t * t * TILE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> Tile {
        Tile::new(1, 3, 4, 2)
    }

    #[test]
    fn test_marker_fades_in_and_holds() {
        let mut t = tile();
        t.mark(1000);
        t.tick(1075);
        assert!((t.marker_opacity() - 0.5).abs() < 0.01);

        t.tick(1200);
        assert_eq!(t.marker_opacity(), 1.0);

        // A repeated mark must not restart the fade
        t.mark(1300);
        t.tick(1310);
        assert_eq!(t.marker_opacity(), 1.0);
    }

    #[test]
    fn test_marker_crossfade_continuity() {
        let mut t = tile();
        t.mark(0);
        t.tick(100);
        let up = t.marker_opacity();
        assert!((up - 100.0 / 150.0).abs() < 0.01);

        // Reversing mid-flight keeps the opacity where it was
        t.unmark(100);
        t.tick(100);
        assert!((t.marker_opacity() - up).abs() < 0.01);

        t.tick(130);
        let down = t.marker_opacity();
        assert!(down < up);

        // And reversing again keeps it again
        t.mark(130);
        t.tick(130);
        assert!((t.marker_opacity() - down).abs() < 0.02);
    }

    #[test]
    fn test_selection_pins_marker() {
        let mut t = tile();
        t.select(0);
        t.tick(200);
        assert_eq!(t.marker_opacity(), 1.0);

        t.unmark(200);
        t.tick(300);
        assert_eq!(t.marker_opacity(), 1.0);

        t.unselect(300);
        t.tick(375);
        assert!((t.marker_opacity() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_move_updates_coordinates_immediately() {
        let mut t = Tile::new(1, 2, 2, 0);
        t.move_to(1000, 3, 2, true);
        assert_eq!((t.column(), t.row()), (3, 2));
        assert_eq!(t.kind(), None);
        assert!(!t.can_accept_command());

        t.tick(1200);
        assert!(!t.can_accept_command());
        t.tick(1301);
        assert!(t.can_accept_command());
        assert_eq!(t.kind(), Some(0));
    }

    #[test]
    fn test_commands_are_ignored_unless_settled() {
        let mut t = tile();
        t.kill(0);
        assert_eq!(t.kind(), None);

        // Stale commands against the dying tile change nothing
        t.fall_to(10, 5, 5);
        t.move_to(10, 5, 5, false);
        assert_eq!((t.column(), t.row()), (3, 4));

        t.tick(301);
        assert!(t.is_dead());
        assert!(!t.is_alive());
        t.kill(400);
        assert!(t.is_dead());
    }

    #[test]
    fn test_swap_with_trades_cells() {
        let mut a = Tile::new(1, 2, 2, 0);
        let mut b = Tile::new(2, 3, 2, 1);
        a.swap_with(100, &mut b);
        assert_eq!((a.column(), a.row()), (3, 2));
        assert_eq!((b.column(), b.row()), (2, 2));
        assert!(!a.can_accept_command());
        assert!(!b.can_accept_command());

        a.tick(500);
        b.tick(500);
        assert!(a.can_accept_command());
        assert!(b.can_accept_command());
    }

    #[test]
    fn test_fall_lands_at_destination() {
        // Three cells of travel: 0.5 * 25 * t^2 >= 3 at t ~ 0.49 s
        let mut t = Tile::new(1, 4, 0, 3);
        t.fall_to(0, 4, 3);
        assert_eq!((t.column(), t.row()), (4, 3));
        assert_eq!(t.kind(), None);

        t.tick(400);
        assert!(!t.can_accept_command());
        t.tick(500);
        assert!(t.can_accept_command());
        assert_eq!(t.kind(), Some(3));
    }

    #[test]
    fn test_kill_unselects_first() {
        let mut t = tile();
        t.select(0);
        t.kill(10);
        assert!(!t.is_selected());
        assert!(!t.can_accept_command());
    }

    #[test]
    fn test_swap_direction_dominant_axis() {
        let t = tile();
        let c = cell_center(3, 4);
        assert_eq!(t.swap_direction(c.x + 20.0, c.y + 10.0), SwapDirection::Right);
        assert_eq!(t.swap_direction(c.x - 9.0, c.y + 2.0), SwapDirection::Left);
        assert_eq!(t.swap_direction(c.x + 10.0, c.y - 20.0), SwapDirection::Up);
        assert_eq!(t.swap_direction(c.x + 3.0, c.y + 15.0), SwapDirection::Down);
        // Ties go vertical
        assert_eq!(t.swap_direction(c.x + 5.0, c.y + 5.0), SwapDirection::Down);
        assert_eq!(t.swap_direction(c.x - 5.0, c.y - 5.0), SwapDirection::Up);
    }

    #[test]
    fn test_neighbor_detection() {
        let t = tile();
        assert!(t.is_neighbor(&Tile::new(2, 3, 5, 0)));
        assert!(t.is_neighbor(&Tile::new(3, 2, 4, 0)));
        assert!(!t.is_neighbor(&Tile::new(4, 4, 5, 0)));
        assert!(!t.is_neighbor(&Tile::new(5, 3, 4, 0)));
    }

    #[test]
    fn test_hit_test_only_when_settled() {
        let mut t = Tile::new(1, 0, 0, 0);
        let pos = cell_screen_pos(0, 0);
        assert!(t.is_inside(pos.x + 1.0, pos.y + 1.0));
        assert!(!t.is_inside(pos.x + TILE_SIZE, pos.y + 1.0));
        assert!(!t.is_inside(pos.x - 1.0, pos.y + 1.0));

        t.kill(0);
        assert!(!t.is_inside(pos.x + 1.0, pos.y + 1.0));
    }
}
