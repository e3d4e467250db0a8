//! Enemy behavior: chase the player, and for ranged enemies telegraph then fire.

use bevy::math::Vec2;

use super::{Enemy, FireState, RangedWeapon};
use crate::combat::Projectile;
use crate::constants::{ENEMY_RADIUS, ENEMY_SHOT_SPEED, PLAYER_RADIUS, TELEGRAPH_SECS};
use crate::world::WorldGrid;

/// What one enemy did this frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnemyStep {
    /// Enemy overlaps the player
    pub contact: bool,
    pub shot: Option<Projectile>,
}

/// Move straight toward `target`, resolving each axis separately
pub fn chase(enemy: &mut Enemy, target: Vec2, dt: f32, grid: &WorldGrid) {
    let to = target - enemy.position;
    let dist = to.length();
    if dist <= 1e-4 {
        return;
    }
    let next = enemy.position + to / dist * (enemy.speed * dt);
    if grid.is_passable(next.x, enemy.position.y) {
        enemy.position.x = next.x;
    }
    if grid.is_passable(enemy.position.x, next.y) {
        enemy.position.y = next.y;
    }
}

/// Run the idle -> telegraphing -> fire cycle.
///
/// The shot is aimed at where `target` is at the moment the telegraph ends.
pub fn update_weapon(
    weapon: &mut RangedWeapon,
    dt: f32,
    origin: Vec2,
    target: Vec2,
) -> Option<Projectile> {
    weapon.since_last_shot += dt;
    match weapon.state {
        FireState::Idle => {
            if weapon.since_last_shot >= weapon.fire_rate {
                weapon.state = FireState::Telegraphing { elapsed: 0.0 };
            }
            None
        }
        FireState::Telegraphing { elapsed } => {
            let elapsed = elapsed + dt;
            if elapsed < TELEGRAPH_SECS {
                weapon.state = FireState::Telegraphing { elapsed };
                return None;
            }
            weapon.state = FireState::Idle;
            weapon.since_last_shot = 0.0;
            Projectile::aimed(origin, target, ENEMY_SHOT_SPEED)
        }
    }
}

pub fn touches_player(enemy: &Enemy, player: Vec2) -> bool {
    enemy.position.distance(player) < PLAYER_RADIUS + ENEMY_RADIUS
}

/// One frame of behavior for a living enemy
pub fn update_enemy(enemy: &mut Enemy, player: Vec2, dt: f32, grid: &WorldGrid) -> EnemyStep {
    if !enemy.is_alive() {
        return EnemyStep::default();
    }
    chase(enemy, player, dt, grid);
    let origin = enemy.position;
    let shot = enemy
        .weapon
        .as_mut()
        .and_then(|weapon| update_weapon(weapon, dt, origin, player));
    EnemyStep {
        contact: touches_player(enemy, player),
        shot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RANGED_GRACE_SECS;
    use crate::generation::TileId;
    use crate::monster::EnemyKind;

    fn open_grid() -> WorldGrid {
        WorldGrid::new(40)
    }

    #[test]
    fn test_chase_moves_at_speed() {
        let mut e = Enemy::new(TileId(0), EnemyKind::Normal, Vec2::new(10.0, 10.0), 0.0);
        chase(&mut e, Vec2::new(20.0, 10.0), 0.5, &open_grid());
        assert!((e.position.x - 10.5).abs() < 1e-5);
        assert_eq!(e.position.y, 10.0);
    }

    #[test]
    fn test_chase_slides_along_wall() {
        let mut grid = open_grid();
        for y in 0..40 {
            grid.set(11, y, 50);
        }
        let mut e = Enemy::new(TileId(0), EnemyKind::Normal, Vec2::new(10.9, 10.0), 1.0);
        chase(&mut e, Vec2::new(20.0, 20.0), 0.1, &grid);
        assert!(e.position.x < 11.0);
        assert!(e.position.y > 10.0);
    }

    #[test]
    fn test_ranged_grace_then_telegraph_then_fire() {
        let mut w = RangedWeapon::new(0.9);
        let origin = Vec2::new(0.0, 0.0);
        let target = Vec2::new(5.0, 0.0);
        let dt = 0.05;
        let mut t = 0.0;
        let mut fired_at = None;
        let mut telegraph_seen = false;
        while t < 10.0 {
            t += dt;
            if let Some(shot) = update_weapon(&mut w, dt, origin, target) {
                assert!((shot.velocity - Vec2::new(ENEMY_SHOT_SPEED, 0.0)).length() < 1e-3);
                fired_at = Some(t);
                break;
            }
            telegraph_seen |= w.is_telegraphing();
        }
        let fired_at = fired_at.expect("ranged enemy never fired");
        assert!(telegraph_seen);
        // Grace, then the 1 s cooldown, then the telegraph
        let earliest = RANGED_GRACE_SECS + 1.0 + TELEGRAPH_SECS;
        assert!(fired_at >= earliest - 1e-3, "fired at {fired_at}");
        assert!(fired_at < earliest + 3.0 * dt);
        assert!(!w.is_telegraphing());
    }

    #[test]
    fn test_aim_is_fixed_at_fire_time() {
        let mut w = RangedWeapon::new(0.9);
        w.since_last_shot = w.fire_rate;
        assert!(update_weapon(&mut w, 0.01, Vec2::ZERO, Vec2::new(0.0, 9.0)).is_none());
        let shot = update_weapon(&mut w, TELEGRAPH_SECS, Vec2::ZERO, Vec2::new(4.0, 0.0))
            .expect("telegraph complete");
        assert!(shot.velocity.y.abs() < 1e-5);
        assert!(shot.velocity.x > 0.0);
    }

    #[test]
    fn test_contact_threshold() {
        let e = Enemy::new(TileId(0), EnemyKind::Normal, Vec2::new(5.0, 5.0), 0.0);
        assert!(touches_player(&e, Vec2::new(5.69, 5.0)));
        assert!(!touches_player(&e, Vec2::new(5.71, 5.0)));
    }

    #[test]
    fn test_dead_enemy_is_inert() {
        let mut e = Enemy::new(TileId(0), EnemyKind::Normal, Vec2::new(5.0, 5.0), 0.0);
        e.kill();
        let step = update_enemy(&mut e, Vec2::new(5.1, 5.0), 0.1, &open_grid());
        assert_eq!(step, EnemyStep::default());
        assert_eq!(e.position, Vec2::new(5.0, 5.0));
    }
}
