//! Side-effect notifications for audio and UI. The simulation calls these
//! unconditionally and never waits on them.

use crate::monster::EnemyKind;

pub trait GameHooks: Send + Sync {
    fn shot_fired(&mut self) {}
    fn enemy_shot_fired(&mut self) {}
    fn enemy_killed(&mut self, _kind: EnemyKind) {}
    fn player_damaged(&mut self, _remaining: u32) {}
    /// `total` is the run's rooms-cleared counter after the increment
    fn room_cleared(&mut self, _total: u32) {}
    fn credits_changed(&mut self, _total: u64) {}
    fn game_over(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl GameHooks for NoopHooks {}

/// Emits every notification as a structured event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHooks;

impl GameHooks for TracingHooks {
    fn shot_fired(&mut self) {
        tracing::trace!("player shot fired");
    }

    fn enemy_shot_fired(&mut self) {
        tracing::trace!("enemy shot fired");
    }

    fn enemy_killed(&mut self, kind: EnemyKind) {
        tracing::debug!(?kind, "enemy killed");
    }

    fn player_damaged(&mut self, remaining: u32) {
        tracing::info!(remaining, "player damaged");
    }

    fn room_cleared(&mut self, total: u32) {
        tracing::info!(total, "room cleared");
    }

    fn credits_changed(&mut self, total: u64) {
        tracing::debug!(total, "credits changed");
    }

    fn game_over(&mut self) {
        tracing::info!("game over");
    }
}
