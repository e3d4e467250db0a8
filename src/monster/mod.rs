//! Kruptins: difficulty-scaled enemies that chase the player, and in later
//! rooms shoot at it.

pub mod ai;
pub mod spawn;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::generation::{Rgb, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Melee chaser
    Normal,
    /// Chaser that also telegraphs and fires aimed shots
    Ranged,
}

/// Lifecycle of an enemy. Only `Alive` enemies act or count toward a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyState {
    Alive,
    /// Shot down, playing the squish before removal
    Dying { progress: f32 },
    Killed,
    /// Left behind when the player walked out of the room
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FireState {
    Idle,
    Telegraphing { elapsed: f32 },
}

/// Fire control of a ranged enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedWeapon {
    /// Seconds between shots
    pub fire_rate: f32,
    /// Negative during the post-spawn grace period
    pub since_last_shot: f32,
    pub state: FireState,
}

impl RangedWeapon {
    pub fn new(difficulty: f32) -> Self {
        Self {
            fire_rate: fire_rate_for_difficulty(difficulty),
            since_last_shot: -RANGED_GRACE_SECS,
            state: FireState::Idle,
        }
    }

    pub fn is_telegraphing(&self) -> bool {
        matches!(self.state, FireState::Telegraphing { .. })
    }

    /// Whether the telegraph is in a lit half-period
    pub fn flash_on(&self) -> bool {
        match self.state {
            FireState::Telegraphing { elapsed } => (elapsed / FLASH_INTERVAL) % 2.0 < 1.0,
            FireState::Idle => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    /// Room the enemy was issued for
    pub tile: TileId,
    pub kind: EnemyKind,
    pub position: Vec2,
    pub speed: f32,
    pub difficulty: f32,
    pub tint: Rgb,
    pub state: EnemyState,
    pub weapon: Option<RangedWeapon>,
}

impl Enemy {
    pub fn new(tile: TileId, kind: EnemyKind, position: Vec2, difficulty: f32) -> Self {
        let difficulty = difficulty.clamp(0.0, 1.0);
        Self {
            tile,
            kind,
            position,
            speed: speed_for_difficulty(difficulty),
            difficulty,
            tint: color_for_difficulty(difficulty),
            state: EnemyState::Alive,
            weapon: match kind {
                EnemyKind::Ranged => Some(RangedWeapon::new(difficulty)),
                EnemyKind::Normal => None,
            },
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == EnemyState::Alive
    }

    /// Still drawn: alive or mid-squish
    pub fn is_visible(&self) -> bool {
        matches!(self.state, EnemyState::Alive | EnemyState::Dying { .. })
    }

    /// Shoot down a living enemy. Returns false if it was already out.
    pub fn kill(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.state = EnemyState::Dying { progress: 0.0 };
        true
    }

    /// Retire a living enemy without a kill. Returns false if it was already out.
    pub fn despawn(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.state = EnemyState::Spent;
        true
    }

    /// Advance the death squish; finishes as `Killed`
    pub fn tick_dying(&mut self, dt: f32) {
        if let EnemyState::Dying { progress } = self.state {
            let progress = progress + dt / DYING_SECS;
            self.state = if progress >= 1.0 {
                EnemyState::Killed
            } else {
                EnemyState::Dying { progress }
            };
        }
    }

    pub fn credits(&self) -> u32 {
        kill_credits(self.kind, self.difficulty)
    }
}

/// Green at 0, through blue at 0.5, to red at 1
pub fn color_for_difficulty(d: f32) -> Rgb {
    let d = d.clamp(0.0, 1.0);
    let ch = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    if d < 0.5 {
        let t = d / 0.5;
        Rgb::new(80, ch(180.0 + 75.0 * (1.0 - t)), ch(180.0 + 75.0 * t))
    } else {
        let t = (d - 0.5) / 0.5;
        Rgb::new(ch(180.0 + 75.0 * t), 80, ch(180.0 + 75.0 * (1.0 - t)))
    }
}

pub fn speed_for_difficulty(d: f32) -> f32 {
    ENEMY_BASE_SPEED + ENEMY_SPEED_RANGE * d
}

/// Seconds between ranged shots, by difficulty tier
pub fn fire_rate_for_difficulty(d: f32) -> f32 {
    if d < 0.33 {
        3.0
    } else if d < 0.66 {
        2.0
    } else {
        1.0
    }
}

pub fn kill_credits(kind: EnemyKind, difficulty: f32) -> u32 {
    let base = match kind {
        EnemyKind::Normal => NORMAL_KILL_CREDITS,
        EnemyKind::Ranged => RANGED_KILL_CREDITS,
    };
    (base + base * difficulty).round() as u32
}
