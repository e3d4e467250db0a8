//! Player lives with a short invincibility window after each hit.

use serde::{Deserialize, Serialize};

use crate::constants::INVINCIBILITY_SECS;

/// Result of a damage attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Still inside the invincibility window
    Ignored,
    Hurt { remaining: u32 },
    /// The last life was lost
    OutOfLives,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lives {
    current: u32,
    max: u32,
    invincible_timer: f32,
}

impl Lives {
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            invincible_timer: 0.0,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_timer > 0.0
    }

    /// Refill to a (possibly new) maximum
    pub fn reset(&mut self, max: u32) {
        *self = Self::new(max);
    }

    /// Raise the maximum mid-run and hand out the new life immediately
    pub fn grant_life(&mut self, new_max: u32) {
        if new_max > self.max {
            self.max = new_max;
            self.current = (self.current + 1).min(self.max);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.invincible_timer = (self.invincible_timer - dt).max(0.0);
    }

    pub fn take_damage(&mut self) -> DamageOutcome {
        if self.is_invincible() {
            return DamageOutcome::Ignored;
        }
        if self.current <= 1 {
            self.current = 0;
            return DamageOutcome::OutOfLives;
        }
        self.current -= 1;
        self.invincible_timer = INVINCIBILITY_SECS;
        DamageOutcome::Hurt {
            remaining: self.current,
        }
    }
}
