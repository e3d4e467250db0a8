//! Wall colors: random-hue tile tints and brightness scaling.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const BLOCK_GRAY: Rgb = Rgb::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, truncating like an integer cast
    pub fn scaled(self, factor: f32) -> Self {
        let f = factor.max(0.0);
        let ch = |c: u8| (c as f32 * f).min(255.0) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// HSV to RGB with all inputs in 0..=1
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ch = |c: f32| (c * 255.0).clamp(0.0, 255.0) as u8;
    Rgb::new(ch(r), ch(g), ch(b))
}

/// Fully saturated, full value color with a random hue
pub fn random_hue<R: Rng>(rng: &mut R) -> Rgb {
    hsv_to_rgb(rng.gen::<f32>(), 1.0, 1.0)
}
