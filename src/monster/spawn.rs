//! Room population: how many enemies a room gets and where they stand.

use bevy::math::Vec2;
use rand::Rng;

use super::{Enemy, EnemyKind};
use crate::constants::*;
use crate::generation::Tile;
use crate::world::builder::{pillar_rects, CellRect};

/// Inclusive (min, max) enemy count for a room at a given progression
pub fn enemy_count_range(rooms_cleared: u32) -> (u32, u32) {
    const BRACKETS: [(u32, u32, u32); 12] = [
        (4, 1, 2),
        (9, 2, 3),
        (14, 2, 4),
        (18, 3, 5),
        (24, 4, 6),
        (29, 5, 7),
        (36, 6, 8),
        (40, 7, 9),
        (50, 8, 10),
        (60, 9, 11),
        (70, 10, 12),
        (80, 11, 13),
    ];
    for (upper, min, max) in BRACKETS {
        if rooms_cleared <= upper {
            return (min, max);
        }
    }
    // Past the table the bracket slides up by one every ten rooms
    let tier = (rooms_cleared - 81) / 10 + 1;
    (11 + tier, 13 + tier)
}

pub fn enemy_count_for_room<R: Rng>(rooms_cleared: u32, rng: &mut R) -> u32 {
    let (min, max) = enemy_count_range(rooms_cleared);
    rng.gen_range(min..=max)
}

/// Difficulty roll for a new enemy, or `None` for a ranged enemy that is not unlocked yet
pub fn roll_difficulty<R: Rng>(kind: EnemyKind, rooms_cleared: u32, rng: &mut R) -> Option<f32> {
    let rooms = rooms_cleared as f32;
    let ceiling = match kind {
        EnemyKind::Normal => (rooms / DIFFICULTY_RAMP_ROOMS)
            .min(1.0)
            .max(MIN_DIFFICULTY_CEILING),
        EnemyKind::Ranged => {
            if rooms_cleared < RANGED_UNLOCK_ROOMS {
                return None;
            }
            ((rooms - RANGED_UNLOCK_ROOMS as f32) / DIFFICULTY_RAMP_ROOMS).min(1.0)
        }
    };
    Some(rng.gen::<f32>() * ceiling)
}

/// Strictly inside the room, clear of its border walls
pub fn is_inside_room(p: Vec2, origin: (i32, i32)) -> bool {
    let (ox, oy) = (origin.0 as f32, origin.1 as f32);
    let far = (TILE_SIZE - 1) as f32;
    p.x > ox + 1.0 && p.x < ox + far && p.y > oy + 1.0 && p.y < oy + far
}

pub fn is_far_from_player(p: Vec2, player: Vec2) -> bool {
    p.distance(player) >= SPAWN_MIN_PLAYER_DISTANCE
}

pub fn is_clear_of_pillars(p: Vec2, pillars: &[CellRect]) -> bool {
    !pillars
        .iter()
        .any(|r| r.contains_with_margin(p.x, p.y, SPAWN_PILLAR_BUFFER))
}

/// Uniform candidate point inset from the tile edges
pub fn random_spawn_point<R: Rng>(origin: (i32, i32), rng: &mut R) -> Vec2 {
    let span = TILE_SIZE as f32 - 2.0 * SPAWN_INSET;
    Vec2::new(
        origin.0 as f32 + SPAWN_INSET + rng.gen::<f32>() * span,
        origin.1 as f32 + SPAWN_INSET + rng.gen::<f32>() * span,
    )
}

/// Rejection-sample one enemy position; gives up after [`SPAWN_ATTEMPTS`]
pub fn attempt_spawn<R: Rng>(
    tile: &Tile,
    origin: (i32, i32),
    player: Vec2,
    kind: EnemyKind,
    rooms_cleared: u32,
    rng: &mut R,
) -> Option<Enemy> {
    let pillars = pillar_rects(tile.variety, origin.0, origin.1);
    for _ in 0..SPAWN_ATTEMPTS {
        let p = random_spawn_point(origin, rng);
        if is_inside_room(p, origin) && is_far_from_player(p, player) && is_clear_of_pillars(p, &pillars)
        {
            let difficulty = roll_difficulty(kind, rooms_cleared, rng)?;
            return Some(Enemy::new(tile.id, kind, p, difficulty));
        }
    }
    None
}

/// Issue a room's enemies. May return fewer than the drawn count when
/// placement keeps failing.
pub fn spawn_room<R: Rng>(
    tile: &Tile,
    origin: (i32, i32),
    player: Vec2,
    rooms_cleared: u32,
    rng: &mut R,
) -> Vec<Enemy> {
    let count = enemy_count_for_room(rooms_cleared, rng);
    let ranged_unlocked = rooms_cleared >= RANGED_UNLOCK_ROOMS;
    let mut enemies = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = if ranged_unlocked && rng.gen_bool(RANGED_CHANCE) {
            EnemyKind::Ranged
        } else {
            EnemyKind::Normal
        };
        if let Some(enemy) = attempt_spawn(tile, origin, player, kind, rooms_cleared, rng) {
            enemies.push(enemy);
        }
    }
    tracing::debug!(
        tile = tile.id.0,
        requested = count,
        placed = enemies.len(),
        rooms_cleared,
        "room populated"
    );
    enemies
}
