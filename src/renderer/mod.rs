//! Renderer capability interface
//!
//! The core only issues draw calls through this trait and never reads
//! anything back, so backends stay swappable: the host wires up a real one,
//! tests and the headless demo use [`NullRenderer`].

/// Drawable image identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Background,
    /// One tile kind from the palette.
    Tile(u8),
}

/// Draw-call surface consumed by the simulation.
///
/// Coordinates are screen-space pixels, y growing downward. Draw order is
/// the call order; there is no depth.
pub trait Renderer {
    fn clear(&mut self);
    /// Color and opacity applied to subsequent primitive draws.
    fn set_color(&mut self, r: u8, g: u8, b: u8, a: u8);
    fn set_clip_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn reset_clip_rect(&mut self);
    fn draw_background(&mut self, sprite: Sprite);
    /// Draw a sprite centered in the box at (x, y), uniformly scaled.
    fn draw_sprite_centered(&mut self, sprite: Sprite, x: f32, y: f32, w: f32, h: f32, scale: f32);
    fn draw_filled_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
    fn present(&mut self);
}

/// No-op backend for tests and headless runs.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn clear(&mut self) {}
    fn set_color(&mut self, _r: u8, _g: u8, _b: u8, _a: u8) {}
    fn set_clip_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {}
    fn reset_clip_rect(&mut self) {}
    fn draw_background(&mut self, _sprite: Sprite) {}
    fn draw_sprite_centered(
        &mut self,
        _sprite: Sprite,
        _x: f32,
        _y: f32,
        _w: f32,
        _h: f32,
        _scale: f32,
    ) {
    }
    fn draw_filled_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {}
    fn draw_text(&mut self, _text: &str, _x: f32, _y: f32) {}
    fn present(&mut self) {}
}
