//! Attack of The Kruptins - Core Library
//!
//! A first-person raycasting shooter over an endless rolling dungeon:
//! - Tile graph generation (rooms, corridors, dead ends)
//! - World builder rasterizing a 3x3 tile window into an occupancy grid
//! - DDA raycaster with per-column depth buffer
//! - Enemy AI, ranged fire, sub-stepped projectiles
//! - Depth-tested billboard sprites
//! - Persistent upgrades bought with kill credits

pub mod camera;
pub mod combat;
pub mod constants;
pub mod engine;
pub mod generation;
pub mod logging;
pub mod monster;
pub mod render;
pub mod upgrades;
pub mod world;
