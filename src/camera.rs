//! First-person camera: position plus a direction/plane basis.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::{CAMERA_PLANE, MIN_DETERMINANT};
use crate::world::WorldGrid;

/// Directional movement flags for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveIntent {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
}

impl MoveIntent {
    pub fn any(&self) -> bool {
        self.forward || self.back || self.strafe_left || self.strafe_right
    }
}

/// Rotate a direction/plane pair by the same angle.
///
/// Both vectors are read before either is written, so the pair stays
/// orthogonal with unchanged lengths.
pub fn rotate_basis(direction: Vec2, plane: Vec2, angle: f32) -> (Vec2, Vec2) {
    let rotation = Vec2::from_angle(angle);
    (rotation.rotate(direction), rotation.rotate(plane))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub direction: Vec2,
    pub plane: Vec2,
}

impl Camera {
    /// Camera at `position` looking east
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            direction: Vec2::new(1.0, 0.0),
            plane: Vec2::new(0.0, CAMERA_PLANE),
        }
    }

    pub fn rotated(&self, angle: f32) -> Self {
        let (direction, plane) = rotate_basis(self.direction, self.plane, angle);
        Self {
            position: self.position,
            direction,
            plane,
        }
    }

    /// Unit vector to the camera's right in grid space (y grows south)
    pub fn right(&self) -> Vec2 {
        Vec2::new(-self.direction.y, self.direction.x)
    }

    /// Ray through screen column `column` of a `width`-column view
    pub fn ray_direction(&self, column: usize, width: usize) -> Vec2 {
        let camera_x = 2.0 * column as f32 / width.max(1) as f32 - 1.0;
        self.direction + self.plane * camera_x
    }

    /// World point in camera space: x across the view, y the forward depth.
    ///
    /// A degenerate basis uses a minimal determinant so the result stays finite.
    pub fn to_camera_space(&self, point: Vec2) -> Vec2 {
        let rel = point - self.position;
        let det = self.plane.x * self.direction.y - self.direction.x * self.plane.y;
        let det = if det.abs() < MIN_DETERMINANT {
            MIN_DETERMINANT.copysign(det)
        } else {
            det
        };
        let inv = 1.0 / det;
        Vec2::new(
            inv * (self.direction.y * rel.x - self.direction.x * rel.y),
            inv * (-self.plane.y * rel.x + self.plane.x * rel.y),
        )
    }

    /// Combined movement vector for the given intent, not yet normalized
    pub fn intent_vector(&self, intent: MoveIntent) -> Vec2 {
        let d = self.direction;
        let mut v = Vec2::ZERO;
        if intent.forward {
            v += d;
        }
        if intent.back {
            v -= d;
        }
        if intent.strafe_left {
            v += Vec2::new(d.y, -d.x);
        }
        if intent.strafe_right {
            v += Vec2::new(-d.y, d.x);
        }
        v
    }

    /// Walk `distance` along the intent, resolving each axis against the grid
    /// separately so the camera slides along walls.
    pub fn walk(&mut self, intent: MoveIntent, distance: f32, grid: &WorldGrid) -> bool {
        if !intent.any() {
            return false;
        }
        let v = self.intent_vector(intent);
        let v = v / v.length().max(1.0);
        let target = self.position + v * distance;

        let mut moved = false;
        if grid.is_passable(target.x, self.position.y) {
            self.position.x = target.x;
            moved = true;
        }
        if grid.is_passable(self.position.x, target.y) {
            self.position.y = target.y;
            moved = true;
        }
        moved
    }
}
