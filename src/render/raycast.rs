//! DDA wall raycaster.
//!
//! One ray per screen column marches cell by cell through the grid until it
//! meets a non-empty cell. The perpendicular distance to that wall drives
//! the column height, the shading and the depth buffer used by sprites.

use bevy::math::Vec2;

use super::Framebuffer;
use crate::camera::Camera;
use crate::constants::*;
use crate::generation::Rgb;
use crate::world::{World, WorldGrid};

/// Which family of cell faces a ray struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSide {
    /// Stepped along x into the cell: an east or west face
    EastWest,
    /// Stepped along y into the cell: a north or south face
    NorthSouth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnHit {
    /// Perpendicular distance to the wall, always positive
    pub distance: f32,
    /// Cell id that stopped the ray
    pub wall_id: u32,
    pub side: HitSide,
    /// Grid cell that stopped the ray
    pub cell: (i32, i32),
}

/// Per-column wall distances of the last rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    depths: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            depths: vec![f32::INFINITY; width],
        }
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Wall depth at a column; columns off screen read as infinitely far
    pub fn get(&self, column: usize) -> f32 {
        self.depths.get(column).copied().unwrap_or(f32::INFINITY)
    }

    pub fn set(&mut self, column: usize, depth: f32) {
        if let Some(slot) = self.depths.get_mut(column) {
            *slot = depth;
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.depths
    }
}

fn step_distance(component: f32) -> f32 {
    let inv = (1.0 / component).abs();
    if component == 0.0 || !inv.is_finite() {
        INFINITE_STEP
    } else {
        inv
    }
}

fn nonzero(component: f32) -> f32 {
    if component == 0.0 {
        1e-9
    } else {
        component
    }
}

/// March a ray from `origin` along `dir` until it meets a blocking cell.
///
/// Leaving the grid or running out of steps ends the ray on boundary
/// material.
pub fn cast_ray(grid: &WorldGrid, origin: Vec2, dir: Vec2) -> ColumnHit {
    let mut map_x = origin.x.floor() as i32;
    let mut map_y = origin.y.floor() as i32;

    let delta_x = step_distance(dir.x);
    let delta_y = step_distance(dir.y);

    let (step_x, mut side_x) = if dir.x < 0.0 {
        (-1, (origin.x - map_x as f32) * delta_x)
    } else {
        (1, (map_x as f32 + 1.0 - origin.x) * delta_x)
    };
    let (step_y, mut side_y) = if dir.y < 0.0 {
        (-1, (origin.y - map_y as f32) * delta_y)
    } else {
        (1, (map_y as f32 + 1.0 - origin.y) * delta_y)
    };

    let mut side = HitSide::EastWest;
    let mut wall_id = CELL_BOUNDARY;
    for _ in 0..MAX_RAY_STEPS {
        if side_x < side_y {
            side_x += delta_x;
            map_x += step_x;
            side = HitSide::EastWest;
        } else {
            side_y += delta_y;
            map_y += step_y;
            side = HitSide::NorthSouth;
        }
        if !grid.in_bounds(map_x, map_y) {
            wall_id = CELL_BOUNDARY;
            break;
        }
        let id = grid.get(map_x, map_y);
        if id != CELL_EMPTY {
            wall_id = id;
            break;
        }
    }

    let distance = match side {
        HitSide::EastWest => {
            (map_x as f32 - origin.x + (1 - step_x) as f32 / 2.0) / nonzero(dir.x)
        }
        HitSide::NorthSouth => {
            (map_y as f32 - origin.y + (1 - step_y) as f32 / 2.0) / nonzero(dir.y)
        }
    };
    let distance = if distance > 0.0 {
        distance
    } else {
        MIN_PERP_DISTANCE
    };

    ColumnHit {
        distance,
        wall_id,
        side,
        cell: (map_x, map_y),
    }
}

/// Cast the ray for screen column `column` of a `width`-column view
pub fn render_column(camera: &Camera, grid: &WorldGrid, column: usize, width: usize) -> ColumnHit {
    cast_ray(grid, camera.position, camera.ray_direction(column, width))
}

/// Top and bottom rows of a wall slice at `distance`, clamped to the screen
pub fn column_span(distance: f32, height: usize) -> (usize, usize) {
    let height = height.max(1);
    let half = (height / 2) as f32;
    let line = (height as f32 / distance.max(MIN_PERP_DISTANCE)).floor();
    let top = (half - line / 2.0).max(0.0) as usize;
    let bottom = ((half + line / 2.0) as usize).min(height - 1);
    (top, bottom)
}

/// Shaded wall color: N/S faces are darker, distance fades toward a floor
pub fn shade_wall(base: Rgb, side: HitSide, distance: f32) -> Rgb {
    let base = match side {
        HitSide::NorthSouth => base.scaled(SIDE_SHADE),
        HitSide::EastWest => base,
    };
    let fog = (FOG_NUMERATOR / (distance + FOG_OFFSET)).clamp(FOG_MIN, FOG_MAX);
    base.scaled(fog)
}

/// Draw every wall column and record its depth
pub fn render_walls(fb: &mut Framebuffer, camera: &Camera, world: &World, depth: &mut DepthBuffer) {
    let width = fb.width();
    let height = fb.height();
    for x in 0..width {
        let hit = render_column(camera, &world.grid, x, width);
        depth.set(x, hit.distance);
        let color = shade_wall(world.wall_color(hit.wall_id), hit.side, hit.distance);
        let (top, bottom) = column_span(hit.distance, height);
        fb.draw_column(x, top, bottom, color);
    }
}
