//! Persistent upgrades bought with kill credits.
//!
//! Credits and upgrade levels survive game over; everything else resets
//! with a new run. The simulation only reads the derived multipliers.

pub mod save;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use save::{load_progress, save_progress, SaveError, SaveFile, CURRENT_SAVE_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTrack {
    /// Shorter blaster cooldown
    FireRate,
    /// Faster player shots
    ProjectileSpeed,
    MoveSpeed,
    /// Extra starting lives
    Health,
}

impl UpgradeTrack {
    pub const ALL: [UpgradeTrack; 4] = [
        UpgradeTrack::FireRate,
        UpgradeTrack::ProjectileSpeed,
        UpgradeTrack::MoveSpeed,
        UpgradeTrack::Health,
    ];

    pub fn max_level(self) -> u32 {
        match self {
            UpgradeTrack::FireRate => 5,
            UpgradeTrack::ProjectileSpeed => 3,
            UpgradeTrack::MoveSpeed => 4,
            UpgradeTrack::Health => 3,
        }
    }

    pub fn base_cost(self) -> u64 {
        match self {
            UpgradeTrack::FireRate => 200,
            UpgradeTrack::ProjectileSpeed => 300,
            UpgradeTrack::MoveSpeed => 240,
            UpgradeTrack::Health => 400,
        }
    }

    /// Cost growth per level already owned
    pub fn cost_growth(self) -> f64 {
        match self {
            UpgradeTrack::FireRate => 1.5,
            UpgradeTrack::ProjectileSpeed => 2.0,
            UpgradeTrack::MoveSpeed => 1.8,
            UpgradeTrack::Health => 2.5,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UpgradeTrack::FireRate => "Faster Reload",
            UpgradeTrack::ProjectileSpeed => "Rapid Fire",
            UpgradeTrack::MoveSpeed => "Swift Movement",
            UpgradeTrack::Health => "Extra Lives",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("{0:?} is already at its maximum level")]
    Maxed(UpgradeTrack),
    #[error("upgrade costs {cost} credits but only {available} are banked")]
    InsufficientCredits { cost: u64, available: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub fire_rate: u32,
    pub projectile_speed: u32,
    pub move_speed: u32,
    pub health: u32,
}

impl UpgradeLevels {
    pub fn get(&self, track: UpgradeTrack) -> u32 {
        match track {
            UpgradeTrack::FireRate => self.fire_rate,
            UpgradeTrack::ProjectileSpeed => self.projectile_speed,
            UpgradeTrack::MoveSpeed => self.move_speed,
            UpgradeTrack::Health => self.health,
        }
    }

    fn slot(&mut self, track: UpgradeTrack) -> &mut u32 {
        match track {
            UpgradeTrack::FireRate => &mut self.fire_rate,
            UpgradeTrack::ProjectileSpeed => &mut self.projectile_speed,
            UpgradeTrack::MoveSpeed => &mut self.move_speed,
            UpgradeTrack::Health => &mut self.health,
        }
    }

    /// Clamp every track into its valid range
    pub fn clamped(mut self) -> Self {
        for track in UpgradeTrack::ALL {
            let slot = self.slot(track);
            *slot = (*slot).min(track.max_level());
        }
        self
    }
}

/// Banked credits plus owned upgrade levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub credits: u64,
    pub levels: UpgradeLevels,
}

impl Progress {
    pub fn level(&self, track: UpgradeTrack) -> u32 {
        self.levels.get(track)
    }

    /// Price of the next level, or `None` once the track is maxed
    pub fn cost(&self, track: UpgradeTrack) -> Option<u64> {
        let level = self.level(track);
        if level >= track.max_level() {
            return None;
        }
        Some((track.base_cost() as f64 * track.cost_growth().powi(level as i32)).floor() as u64)
    }

    /// Buy the next level of `track`; returns the credits spent
    pub fn purchase(&mut self, track: UpgradeTrack) -> Result<u64, UpgradeError> {
        let cost = self.cost(track).ok_or(UpgradeError::Maxed(track))?;
        if self.credits < cost {
            return Err(UpgradeError::InsufficientCredits {
                cost,
                available: self.credits,
            });
        }
        self.credits -= cost;
        *self.levels.slot(track) += 1;
        tracing::info!(
            ?track,
            level = self.level(track),
            cost,
            credits = self.credits,
            "upgrade purchased"
        );
        Ok(cost)
    }

    pub fn add_credits(&mut self, amount: u64) -> u64 {
        self.credits = self.credits.saturating_add(amount);
        self.credits
    }

    pub fn cooldown_multiplier(&self) -> f32 {
        1.0 - 0.15 * self.levels.fire_rate as f32
    }

    pub fn projectile_speed_multiplier(&self) -> f32 {
        1.0 + 0.4 * self.levels.projectile_speed as f32
    }

    pub fn move_speed_multiplier(&self) -> f32 {
        1.0 + 0.2 * self.levels.move_speed as f32
    }

    /// Lives at the start of a run
    pub fn max_lives(&self) -> u32 {
        crate::constants::BASE_LIVES + self.levels.health
    }

    /// Drop all upgrades and credits
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
