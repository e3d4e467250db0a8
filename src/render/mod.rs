//! Software renderer: wall raycasting and depth-tested sprites into an RGBA buffer.

pub mod raycast;
pub mod sprites;

use crate::generation::Rgb;

pub use raycast::{cast_ray, render_column, render_walls, ColumnHit, DepthBuffer, HitSide};
pub use sprites::{collect_sprites, draw_sprites, Sprite, SpriteKind, SpriteProjection};

pub const CEILING_COLOR: Rgb = Rgb::new(34, 34, 44);
pub const FLOOR_COLOR: Rgb = Rgb::new(58, 52, 46);

/// Row-major RGBA8 image the frame is drawn into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Ceiling over the top half, floor under the bottom half
    pub fn fill_background(&mut self, ceiling: Rgb, floor: Rgb) {
        let row = self.width * 4;
        let split = self.height / 2 * row;
        let (top, bottom) = self.pixels.split_at_mut(split);
        for px in top.chunks_exact_mut(4) {
            px.copy_from_slice(&ceiling.to_rgba());
        }
        for px in bottom.chunks_exact_mut(4) {
            px.copy_from_slice(&floor.to_rgba());
        }
    }

    pub fn put(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * 4;
            self.pixels[i..i + 4].copy_from_slice(&color.to_rgba());
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * 4;
            Some(Rgb::new(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
        } else {
            None
        }
    }

    /// Fill rows `y0..=y1` of column `x`, clipped to the buffer
    pub fn draw_column(&mut self, x: usize, y0: usize, y1: usize, color: Rgb) {
        if x >= self.width || y0 > y1 {
            return;
        }
        for y in y0..=y1.min(self.height - 1) {
            self.put(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut fb = Framebuffer::new(4, 3);
        fb.put(1, 2, Rgb::new(1, 2, 3));
        assert_eq!(fb.get(1, 2), Some(Rgb::new(1, 2, 3)));
        assert_eq!(fb.get(4, 0), None);
        assert_eq!(fb.as_bytes().len(), 4 * 3 * 4);
        assert_eq!(fb.as_bytes()[(2 * 4 + 1) * 4 + 3], 255);
        assert_eq!(fb.as_bytes()[3], 0, "untouched alpha");
    }

    #[test]
    fn test_background_split() {
        let mut fb = Framebuffer::new(2, 4);
        fb.fill_background(CEILING_COLOR, FLOOR_COLOR);
        assert_eq!(fb.get(1, 1), Some(CEILING_COLOR));
        assert_eq!(fb.get(0, 2), Some(FLOOR_COLOR));
    }

    #[test]
    fn test_draw_column_clips() {
        let mut fb = Framebuffer::new(2, 5);
        fb.draw_column(0, 3, 99, Rgb::new(9, 9, 9));
        assert_eq!(fb.get(0, 2), Some(Rgb::BLACK));
        assert_eq!(fb.get(0, 4), Some(Rgb::new(9, 9, 9)));
        fb.draw_column(7, 0, 4, Rgb::new(1, 1, 1));
    }
}
