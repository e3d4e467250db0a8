//! Combat primitives: projectiles and player lives.

pub mod lives;
pub mod projectile;

pub use lives::{DamageOutcome, Lives};
pub use projectile::{within_radius, Projectile, ShotOutcome};
