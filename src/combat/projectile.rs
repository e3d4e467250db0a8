//! Shots with fixed sub-step movement.

use bevy::math::Vec2;

use crate::constants::{SHOT_STEP, SHOT_TTL};
use crate::world::WorldGrid;

/// Why a shot stopped, or that it is still flying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Flying,
    HitWall,
    Expired,
    /// The per-step target check reported a hit
    HitTarget,
}

impl ShotOutcome {
    pub fn is_spent(self) -> bool {
        self != ShotOutcome::Flying
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds since the shot was fired
    pub age: f32,
}

impl Projectile {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            age: 0.0,
        }
    }

    /// Shot leaving `origin` toward `target` at `speed`.
    ///
    /// The direction is fixed at fire time. A target on top of the origin
    /// gives no shot.
    pub fn aimed(origin: Vec2, target: Vec2, speed: f32) -> Option<Self> {
        let to = target - origin;
        let dist = to.length();
        if dist <= 1e-4 {
            return None;
        }
        Some(Self::new(origin, to / dist * speed))
    }

    /// Advance by `dt` in sub-steps of at most [`SHOT_STEP`].
    ///
    /// Each sub-step moves only if the destination cell is passable, ages
    /// the shot, and then asks `hit_check` whether the new position struck
    /// something. The first wall, expiry or hit ends the shot.
    pub fn advance<F>(&mut self, dt: f32, grid: &WorldGrid, mut hit_check: F) -> ShotOutcome
    where
        F: FnMut(Vec2) -> bool,
    {
        let mut remain = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        while remain > 1e-6 {
            let step = remain.min(SHOT_STEP);
            let next = self.position + self.velocity * step;
            if !grid.is_passable(next.x, next.y) {
                return ShotOutcome::HitWall;
            }
            self.position = next;
            self.age += step;
            remain -= step;
            if self.age > SHOT_TTL {
                return ShotOutcome::Expired;
            }
            if hit_check(self.position) {
                return ShotOutcome::HitTarget;
            }
        }
        ShotOutcome::Flying
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

/// Exclusive squared-distance overlap test
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ENEMY_RADIUS;

    #[test]
    fn test_radius_is_exclusive() {
        let shot = Vec2::new(10.0, 10.0);
        assert!(!within_radius(shot, Vec2::new(10.35, 10.0), ENEMY_RADIUS));
        assert!(within_radius(shot, Vec2::new(10.34, 10.0), ENEMY_RADIUS));
    }

    #[test]
    fn test_stops_at_wall_cell() {
        let mut grid = WorldGrid::new(20);
        for y in 0..20 {
            grid.set(10, y, 77);
        }
        let mut shot = Projectile::new(Vec2::new(5.5, 5.5), Vec2::new(10.0, 0.0));
        let outcome = shot.advance(1.0, &grid, |_| false);
        assert_eq!(outcome, ShotOutcome::HitWall);
        assert!(shot.position.x < 10.0);
    }

    #[test]
    fn test_expires_after_ttl() {
        let grid = WorldGrid::new(200);
        let mut shot = Projectile::new(Vec2::new(5.5, 5.5), Vec2::new(1.0, 0.0));
        let mut outcome = ShotOutcome::Flying;
        for _ in 0..100 {
            outcome = shot.advance(0.05, &grid, |_| false);
            if outcome.is_spent() {
                break;
            }
        }
        assert_eq!(outcome, ShotOutcome::Expired);
        assert!(shot.age > SHOT_TTL && shot.age < SHOT_TTL + SHOT_STEP + 1e-4);
    }

    #[test]
    fn test_hit_check_runs_every_substep() {
        let grid = WorldGrid::new(50);
        let mut shot = Projectile::new(Vec2::new(5.5, 5.5), Vec2::new(10.0, 0.0));
        let mut calls = 0;
        shot.advance(0.05, &grid, |_| {
            calls += 1;
            false
        });
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_target_hit_mid_frame() {
        let grid = WorldGrid::new(50);
        let target = Vec2::new(6.0, 5.5);
        let mut shot = Projectile::new(Vec2::new(5.5, 5.5), Vec2::new(10.0, 0.0));
        let outcome = shot.advance(0.05, &grid, |p| within_radius(p, target, 0.35));
        assert_eq!(outcome, ShotOutcome::HitTarget);
        assert!((shot.position.x - 5.75).abs() < 1e-4);
    }

    #[test]
    fn test_aimed_direction() {
        let shot = Projectile::aimed(Vec2::ZERO, Vec2::new(0.0, 3.0), 12.0).unwrap();
        assert!((shot.velocity - Vec2::new(0.0, 12.0)).length() < 1e-4);
        assert!(Projectile::aimed(Vec2::ONE, Vec2::ONE, 12.0).is_none());
    }
}
