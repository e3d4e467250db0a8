//! Billboard sprites for enemies and shots, depth tested per column.

use bevy::math::Vec2;

use super::{DepthBuffer, Framebuffer};
use crate::camera::Camera;
use crate::constants::*;
use crate::generation::Rgb;

/// Closest transformed depth at which a sprite is still drawn
const NEAR_CLIP: f32 = 1e-4;

const PLAYER_SHOT_COLOR: Rgb = Rgb::new(255, 230, 90);
const ENEMY_SHOT_COLOR: Rgb = Rgb::new(255, 70, 50);
const FLASH_COLOR: Rgb = Rgb::new(255, 255, 255);
const CORPSE_GRAY: Rgb = Rgb::new(110, 110, 110);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpriteKind {
    Enemy {
        tint: Rgb,
        /// Telegraph flash frame
        flash: bool,
        /// Death progress in 0..=1; squishes the sprite toward its feet
        squish: f32,
    },
    PlayerShot,
    EnemyShot,
}

impl SpriteKind {
    pub fn scale(&self) -> f32 {
        match self {
            SpriteKind::Enemy { .. } => ENEMY_SCALE,
            SpriteKind::PlayerShot => PLAYER_SHOT_SCALE,
            SpriteKind::EnemyShot => ENEMY_SHOT_SCALE,
        }
    }

    fn color(&self) -> Rgb {
        match *self {
            SpriteKind::Enemy { flash: true, squish, .. } if squish <= 0.0 => FLASH_COLOR,
            SpriteKind::Enemy { tint, squish, .. } => lerp(tint, CORPSE_GRAY, squish),
            SpriteKind::PlayerShot => PLAYER_SHOT_COLOR,
            SpriteKind::EnemyShot => ENEMY_SHOT_COLOR,
        }
    }
}

fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let ch = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Rgb::new(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b))
}

/// Anything drawn as a camera-facing billboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub kind: SpriteKind,
}

/// Screen footprint of a sprite after projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteProjection {
    /// Forward depth in camera space
    pub depth: f32,
    pub screen_x: f32,
    pub width: f32,
    pub height: f32,
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

/// Project a sprite onto a `width` x `height` screen.
///
/// Sprites behind the camera or entirely off screen yield `None`.
pub fn project_sprite(
    camera: &Camera,
    sprite: &Sprite,
    width: usize,
    height: usize,
) -> Option<SpriteProjection> {
    let t = camera.to_camera_space(sprite.position);
    if t.y <= NEAR_CLIP || !t.x.is_finite() {
        return None;
    }
    let w = width as f32;
    let h = height as f32;
    let half_h = (height / 2) as f32;

    let screen_x = (w / 2.0) * (1.0 + t.x / t.y);
    let mut full_h = (h / t.y * sprite.kind.scale()).abs();
    let mut squish = 0.0;
    if let SpriteKind::Enemy { squish: s, .. } = sprite.kind {
        full_h = full_h.min(h * ENEMY_MAX_HEIGHT_FRACTION);
        squish = s.clamp(0.0, 1.0);
    }
    let sprite_w = full_h;
    let sprite_h = full_h * (1.0 - squish);

    let (top, bottom) = if squish > 0.0 {
        let feet = half_h + full_h / 2.0;
        (feet - sprite_h, feet)
    } else {
        (half_h - sprite_h / 2.0, half_h + sprite_h / 2.0)
    };
    let left = screen_x - sprite_w / 2.0;
    let right = screen_x + sprite_w / 2.0;

    if right < 0.0 || left >= w || bottom < 0.0 || top >= h {
        return None;
    }

    Some(SpriteProjection {
        depth: t.y,
        screen_x,
        width: sprite_w,
        height: sprite_h,
        left: left.max(0.0) as usize,
        right: (right as usize).min(width - 1),
        top: top.max(0.0) as usize,
        bottom: (bottom as usize).min(height - 1),
    })
}

/// Gather sprites into one list ordered far to near from the camera
pub fn collect_sprites(camera: &Camera, sprites: impl IntoIterator<Item = Sprite>) -> Vec<Sprite> {
    let mut list: Vec<(f32, Sprite)> = sprites
        .into_iter()
        .map(|s| (s.position.distance_squared(camera.position), s))
        .collect();
    list.sort_by(|a, b| b.0.total_cmp(&a.0));
    list.into_iter().map(|(_, s)| s).collect()
}

/// Rasterize sprites in the given order, skipping columns where a wall is nearer
pub fn draw_sprites(fb: &mut Framebuffer, camera: &Camera, sprites: &[Sprite], depth: &DepthBuffer) {
    let width = fb.width();
    let height = fb.height();
    for sprite in sprites {
        let Some(p) = project_sprite(camera, sprite, width, height) else {
            continue;
        };
        let color = sprite.kind.color();
        let x0 = p.screen_x - p.width / 2.0;
        let span_h = (p.bottom as f32 - p.top as f32).max(1.0);
        for stripe in p.left..=p.right {
            if p.depth >= depth.get(stripe) {
                continue;
            }
            let u = (stripe as f32 + 0.5 - x0) / p.width.max(1.0) * 2.0 - 1.0;
            for y in p.top..=p.bottom {
                let v = (y - p.top) as f32 / span_h * 2.0 - 1.0;
                if u * u + v * v <= 1.0 {
                    fb.put(stripe, y, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy_at(x: f32, y: f32) -> Sprite {
        Sprite {
            position: Vec2::new(x, y),
            kind: SpriteKind::Enemy {
                tint: Rgb::new(80, 255, 180),
                flash: false,
                squish: 0.0,
            },
        }
    }

    #[test]
    fn test_behind_camera_is_culled() {
        let cam = Camera::new(Vec2::new(5.0, 5.0));
        assert!(project_sprite(&cam, &enemy_at(3.0, 5.0), 64, 48).is_none());
        assert!(project_sprite(&cam, &enemy_at(8.0, 5.0), 64, 48).is_some());
    }

    #[test]
    fn test_centered_sprite_projection() {
        let cam = Camera::new(Vec2::new(5.0, 5.0));
        let p = project_sprite(&cam, &enemy_at(7.0, 5.0), 64, 48).unwrap();
        assert!((p.depth - 2.0).abs() < 1e-4);
        assert!((p.screen_x - 32.0).abs() < 1e-3);
        assert!(p.left < 32 && p.right > 32);
    }

    #[test]
    fn test_enemy_height_is_capped() {
        let cam = Camera::new(Vec2::new(5.0, 5.0));
        let p = project_sprite(&cam, &enemy_at(5.2, 5.0), 64, 100).unwrap();
        assert!(p.height <= 80.0 + 1e-3);
    }

    #[test]
    fn test_dying_sprite_keeps_feet() {
        let cam = Camera::new(Vec2::new(5.0, 5.0));
        let alive = project_sprite(&cam, &enemy_at(9.0, 5.0), 64, 48).unwrap();
        let mut dying = enemy_at(9.0, 5.0);
        dying.kind = SpriteKind::Enemy {
            tint: Rgb::BLACK,
            flash: false,
            squish: 0.5,
        };
        let squished = project_sprite(&cam, &dying, 64, 48).unwrap();
        assert_eq!(squished.bottom, alive.bottom);
        assert!(squished.top > alive.top);
    }

    #[test]
    fn test_far_to_near_order() {
        let cam = Camera::new(Vec2::new(0.0, 0.0));
        let sorted = collect_sprites(
            &cam,
            [enemy_at(2.0, 0.0), enemy_at(9.0, 0.0), enemy_at(5.0, 0.0)],
        );
        let xs: Vec<f32> = sorted.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![9.0, 5.0, 2.0]);
    }

    #[test]
    fn test_wall_occludes_sprite() {
        let cam = Camera::new(Vec2::new(5.0, 5.0));
        let sprites = [enemy_at(8.0, 5.0)];
        let mut fb = Framebuffer::new(64, 48);
        let mut near_wall = DepthBuffer::new(64);
        for x in 0..64 {
            near_wall.set(x, 1.0);
        }
        draw_sprites(&mut fb, &cam, &sprites, &near_wall);
        assert_eq!(fb.get(32, 24), Some(Rgb::BLACK));

        let far_wall = DepthBuffer::new(64);
        draw_sprites(&mut fb, &cam, &sprites, &far_wall);
        assert_eq!(fb.get(32, 24), Some(Rgb::new(80, 255, 180)));
    }

    #[test]
    fn test_near_sprite_overdraws_far() {
        let cam = Camera::new(Vec2::new(5.0, 5.0));
        let far = enemy_at(9.0, 5.0);
        let near = Sprite {
            position: Vec2::new(7.0, 5.0),
            kind: SpriteKind::PlayerShot,
        };
        let sorted = collect_sprites(&cam, [near, far]);
        let mut fb = Framebuffer::new(64, 48);
        draw_sprites(&mut fb, &cam, &sorted, &DepthBuffer::new(64));
        assert_eq!(fb.get(32, 24), Some(PLAYER_SHOT_COLOR));
    }
}
