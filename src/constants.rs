//! Centralized game constants for the Kruptins core.
//!
//! Geometry, combat and progression tunables shared by the generator,
//! the world builder, the raycaster and the simulation. Upgrade tables
//! stay in `upgrades` as their single source of truth.

// =====================================================
// Tile Geometry
// =====================================================

/// Side length of one tile in grid cells
pub const TILE_SIZE: i32 = 18;

/// Door gap span carved into a room wall (odd, centered)
pub const DOOR_WIDTH: i32 = 5;

/// Half of the door span, excluding the center cell
pub const DOOR_HALF: i32 = DOOR_WIDTH / 2;

/// Carved path width through a solid corridor tile (odd, centered)
pub const PATH_WIDTH: i32 = 3;

/// Half of the path width, excluding the center cell
pub const PATH_HALF: i32 = PATH_WIDTH / 2;

/// Boundary margin around the 3x3 tile layout
pub const WORLD_BORDER: i32 = 2;

/// Tiles per side of the active window layout
pub const GRID_SIDE: i32 = 3;

/// Grid cells per side of the world grid
pub const WORLD_SIZE: i32 = WORLD_BORDER * 2 + TILE_SIZE * GRID_SIDE;

/// Distance of exit-block cells outside a tile's edge
pub const EXIT_BLOCK_OFFSET: i32 = 2;

/// Side of the square center pillar
pub const CENTER_PILLAR_SIZE: i32 = 5;

/// Side of each square corner pillar
pub const CORNER_PILLAR_SIZE: i32 = 2;

/// Inset of corner pillars from the tile origin
pub const CORNER_PILLAR_INSET: i32 = 4;

// =====================================================
// Grid Cell Ids
// =====================================================

/// Passable cell
pub const CELL_EMPTY: u32 = 0;

/// Outer world boundary
pub const CELL_BOUNDARY: u32 = 1;

/// Temporary exit seal while a room holds living enemies
pub const CELL_BLOCK: u32 = 2;

/// First wall-material id handed out to generated tiles
pub const FIRST_WALL_ID: u32 = 16;

// =====================================================
// Camera & Movement
// =====================================================

/// Camera plane length (field of view ~66 degrees)
pub const CAMERA_PLANE: f32 = 0.66;

/// Radians turned per unit of look delta
pub const MOUSE_SENSITIVITY: f32 = 0.0025;

/// Base walking speed in grid units per second
pub const MOVE_SPEED: f32 = 3.2;

/// Scalar applied on top of the base walking speed
pub const MOVE_SPEED_SCALE: f32 = 3.0;

/// Largest simulated frame delta in seconds
pub const MAX_FRAME_DELTA: f32 = 0.05;

/// Collision radius of the player
pub const PLAYER_RADIUS: f32 = 0.35;

// =====================================================
// Raycaster
// =====================================================

/// Upper bound on DDA steps per ray
pub const MAX_RAY_STEPS: u32 = 4096;

/// Step distance used for an axis-aligned ray component
pub const INFINITE_STEP: f32 = 1e30;

/// Floor for a non-positive perpendicular distance
pub const MIN_PERP_DISTANCE: f32 = 1e-6;

/// Floor for a near-zero camera determinant
pub const MIN_DETERMINANT: f32 = 1e-9;

/// Brightness multiplier for walls hit on a N/S face
pub const SIDE_SHADE: f32 = 0.75;

/// Numerator of the distance attenuation curve
pub const FOG_NUMERATOR: f32 = 2.0;

/// Offset added to distance in the attenuation curve
pub const FOG_OFFSET: f32 = 0.5;

/// Darkest wall brightness after attenuation
pub const FOG_MIN: f32 = 0.4;

/// Brightest wall brightness after attenuation
pub const FOG_MAX: f32 = 1.0;

// =====================================================
// Projectiles
// =====================================================

/// Player shot speed in grid units per second (before multiplier)
pub const SHOT_SPEED: f32 = 10.0;

/// Enemy shot speed in grid units per second
pub const ENEMY_SHOT_SPEED: f32 = 12.0;

/// Time-to-live of any shot in seconds
pub const SHOT_TTL: f32 = 1.2;

/// Fixed sub-step used when advancing shots
pub const SHOT_STEP: f32 = 0.025;

/// Blaster cooldown in seconds (before multiplier)
pub const BLASTER_COOLDOWN: f32 = 1.4;

/// Spawn offset along the camera direction
pub const SHOT_FORWARD_OFFSET: f32 = 0.8;

/// Spawn offset to the camera's right
pub const SHOT_RIGHT_OFFSET: f32 = 0.2;

/// Sprite size factor for player shots
pub const PLAYER_SHOT_SCALE: f32 = 0.25;

/// Sprite size factor for enemy shots
pub const ENEMY_SHOT_SCALE: f32 = 0.5;

// =====================================================
// Enemies
// =====================================================

/// Collision radius of an enemy
pub const ENEMY_RADIUS: f32 = 0.35;

/// Sprite size factor for enemies
pub const ENEMY_SCALE: f32 = 0.9;

/// Enemy sprite height cap as a fraction of screen height
pub const ENEMY_MAX_HEIGHT_FRACTION: f32 = 0.8;

/// Speed at difficulty 0
pub const ENEMY_BASE_SPEED: f32 = 1.0;

/// Extra speed gained at difficulty 1
pub const ENEMY_SPEED_RANGE: f32 = 2.5;

/// Duration of the pre-fire flash
pub const TELEGRAPH_SECS: f32 = 0.3;

/// Flash toggle period during a telegraph
pub const FLASH_INTERVAL: f32 = 0.1;

/// Delay after spawn before a ranged enemy may fire
pub const RANGED_GRACE_SECS: f32 = 3.0;

/// Length of the visual death squish
pub const DYING_SECS: f32 = 0.25;

// =====================================================
// Spawning & Progression
// =====================================================

/// Random placement attempts per requested enemy
pub const SPAWN_ATTEMPTS: u32 = 50;

/// Inset from the tile origin for spawn candidates
pub const SPAWN_INSET: f32 = 2.0;

/// Minimum distance between a fresh enemy and the player
pub const SPAWN_MIN_PLAYER_DISTANCE: f32 = 7.0;

/// Extra margin around pillar footprints when placing enemies
pub const SPAWN_PILLAR_BUFFER: f32 = 0.5;

/// Rooms cleared before ranged enemies appear
pub const RANGED_UNLOCK_ROOMS: u32 = 12;

/// Chance that an enemy is ranged once unlocked
pub const RANGED_CHANCE: f64 = 0.4;

/// Rooms over which difficulty ramps to its maximum
pub const DIFFICULTY_RAMP_ROOMS: f32 = 12.0;

/// Lowest difficulty ceiling for normal enemies
pub const MIN_DIFFICULTY_CEILING: f32 = 0.05;

// =====================================================
// Lives & Flow
// =====================================================

/// Base number of lives before upgrades
pub const BASE_LIVES: u32 = 1;

/// Invincibility window after taking damage
pub const INVINCIBILITY_SECS: f32 = 1.0;

/// Delay between game over and the next run
pub const GAME_OVER_DELAY: f32 = 1.2;

/// Base credits for a normal kill
pub const NORMAL_KILL_CREDITS: f32 = 50.0;

/// Base credits for a ranged kill
pub const RANGED_KILL_CREDITS: f32 = 60.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_size() {
        assert_eq!(WORLD_SIZE, 58);
    }

    #[test]
    fn test_spans_are_odd() {
        assert_eq!(DOOR_WIDTH % 2, 1, "door span must center on one cell");
        assert_eq!(PATH_WIDTH % 2, 1, "path width must center on one cell");
        assert_eq!(DOOR_HALF * 2 + 1, DOOR_WIDTH);
        assert_eq!(PATH_HALF * 2 + 1, PATH_WIDTH);
    }

    #[test]
    fn test_reserved_ids_below_walls() {
        assert!(CELL_BOUNDARY < FIRST_WALL_ID);
        assert!(CELL_BLOCK < FIRST_WALL_ID);
        assert_ne!(CELL_BOUNDARY, CELL_BLOCK);
    }
}
