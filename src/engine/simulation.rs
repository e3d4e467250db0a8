//! The whole game state and its single per-frame step.
//!
//! Ordering inside [`Simulation::frame`]:
//! 1. clamp the frame delta, tick cooldown and invincibility
//! 2. game-over countdown (freezes everything else)
//! 3. look, then walk
//! 4. tile transition and window rebuild
//! 5. fire
//! 6. player shots, enemy shots, enemies
//! 7. dying enemies finish, dead entries are pruned
//! 8. render walls, then sprites over the depth buffer

use std::path::PathBuf;

use bevy::math::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::config::GameConfig;
use super::hooks::{GameHooks, NoopHooks};
use crate::camera::{Camera, MoveIntent};
use crate::combat::{within_radius, DamageOutcome, Lives, Projectile, ShotOutcome};
use crate::constants::*;
use crate::generation::{Direction, TileGraph, TileId};
use crate::monster::ai::update_enemy;
use crate::monster::spawn::spawn_room;
use crate::monster::{Enemy, EnemyState};
use crate::render::{
    collect_sprites, draw_sprites, render_walls, DepthBuffer, Framebuffer, Sprite, SpriteKind,
    CEILING_COLOR, FLOOR_COLOR,
};
use crate::upgrades::{save_progress, Progress, UpgradeError, UpgradeTrack};
use crate::world::World;

/// Input sampled by the host for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub movement: MoveIntent,
    /// Accumulated look delta since the last frame, in input units
    pub look_delta: f32,
    pub fire: bool,
}

pub struct Simulation {
    rng: Xoshiro256PlusPlus,
    graph: TileGraph,
    world: World,
    camera: Camera,
    previous: Option<TileId>,
    enemies: Vec<Enemy>,
    player_shots: Vec<Projectile>,
    enemy_shots: Vec<Projectile>,
    lives: Lives,
    progress: Progress,
    rooms_cleared: u32,
    kills: u32,
    /// Seconds until the blaster may fire again
    cooldown: f32,
    /// Seconds left before a new run, while game over
    game_over_timer: Option<f32>,
    god_mode: bool,
    mouse_sensitivity: f32,
    max_frame_delta: f32,
    framebuffer: Framebuffer,
    depth: DepthBuffer,
    save_path: Option<PathBuf>,
    hooks: Box<dyn GameHooks>,
}

impl Simulation {
    pub fn new(config: &GameConfig, progress: Progress) -> Self {
        let width = config.width.max(1) as usize;
        let height = config.height.max(1) as usize;
        let mut sim = Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
            graph: TileGraph::new(),
            world: World::new(),
            camera: Camera::new(Vec2::ZERO),
            previous: None,
            enemies: Vec::new(),
            player_shots: Vec::new(),
            enemy_shots: Vec::new(),
            lives: Lives::new(progress.max_lives()),
            progress,
            rooms_cleared: 0,
            kills: 0,
            cooldown: 0.0,
            game_over_timer: None,
            god_mode: config.god_mode,
            mouse_sensitivity: config.mouse_sensitivity,
            max_frame_delta: config.max_frame_delta,
            framebuffer: Framebuffer::new(width, height),
            depth: DepthBuffer::new(width),
            save_path: None,
            hooks: Box::new(NoopHooks),
        };
        sim.start_new_run();
        sim
    }

    pub fn with_hooks(mut self, hooks: impl GameHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Persist progress to `path` after purchases, room clears and game over
    pub fn with_save_path(mut self, path: PathBuf) -> Self {
        self.save_path = Some(path);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn center(&self) -> Option<TileId> {
        self.world.center()
    }

    pub fn previous(&self) -> Option<TileId> {
        self.previous
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn player_shots(&self) -> &[Projectile] {
        &self.player_shots
    }

    pub fn enemy_shots(&self) -> &[Projectile] {
        &self.enemy_shots
    }

    pub fn lives(&self) -> &Lives {
        &self.lives
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn rooms_cleared(&self) -> u32 {
        self.rooms_cleared
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over_timer.is_some()
    }

    pub fn god_mode(&self) -> bool {
        self.god_mode
    }

    pub fn set_god_mode(&mut self, on: bool) {
        self.god_mode = on;
        tracing::info!(god_mode = on, "god mode toggled");
    }

    pub fn toggle_god_mode(&mut self) -> bool {
        self.set_god_mode(!self.god_mode);
        self.god_mode
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    // ========================================================================
    // Run lifecycle
    // ========================================================================

    /// Fresh dungeon, full lives, no enemies. Credits and upgrades carry over.
    pub fn start_new_run(&mut self) {
        self.graph.clear();
        let start = self.graph.generate_start(&mut self.rng);
        self.graph.generate_neighbors(start, None, &mut self.rng);
        self.previous = None;
        self.world.rebuild(&mut self.graph, start, None, None);

        let half = TILE_SIZE as f32 / 2.0;
        let (ox, oy) = self.world.origin(start).unwrap_or((0, 0));
        self.camera = Camera::new(Vec2::new(ox as f32 + half, oy as f32 + half));

        self.enemies.clear();
        self.player_shots.clear();
        self.enemy_shots.clear();
        self.lives.reset(self.progress.max_lives());
        self.rooms_cleared = 0;
        self.kills = 0;
        self.cooldown = 0.0;
        self.game_over_timer = None;
        tracing::info!(lives = self.lives.max(), start = start.0, "new run started");
    }

    /// Advance the game by one frame and redraw
    pub fn frame(&mut self, input: &FrameInput, dt: f32) {
        let dt = if dt.is_finite() {
            dt.max(0.0).min(self.max_frame_delta.max(0.0))
        } else {
            0.0
        };
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.lives.tick(dt);

        if let Some(timer) = self.game_over_timer {
            let left = timer - dt;
            if left <= 0.0 {
                self.start_new_run();
            } else {
                self.game_over_timer = Some(left);
            }
            self.render();
            return;
        }

        if input.look_delta != 0.0 && input.look_delta.is_finite() {
            self.camera = self.camera.rotated(input.look_delta * self.mouse_sensitivity);
        }
        let speed = MOVE_SPEED * MOVE_SPEED_SCALE * self.progress.move_speed_multiplier();
        self.camera.walk(input.movement, speed * dt, &self.world.grid);

        let pos = self.camera.position;
        if let Some((next, side)) = self.world.entered_neighbor(&self.graph, pos.x, pos.y) {
            self.transition(next, side);
        }

        if input.fire {
            self.fire();
        }

        self.update_player_shots(dt);
        self.update_enemy_shots(dt);
        self.update_enemies(dt);

        for enemy in &mut self.enemies {
            enemy.tick_dying(dt);
        }
        self.enemies.retain(Enemy::is_visible);

        self.render();
    }

    // ========================================================================
    // Tile transition
    // ========================================================================

    /// Move the window so `next`, lying on `side` of the current center,
    /// becomes the new center.
    pub fn transition(&mut self, next: TileId, side: Direction) {
        let Some(old) = self.world.center() else {
            return;
        };
        if next == old {
            return;
        }

        for i in 0..self.enemies.len() {
            if self.enemies[i].tile == old && self.enemies[i].despawn() {
                self.settle_room(old);
            }
        }
        self.enemies.retain(Enemy::is_visible);

        let delta = Vec2::new(
            -(side.dx() * TILE_SIZE) as f32,
            -(side.dy() * TILE_SIZE) as f32,
        );
        self.camera.position += delta;
        for shot in self.player_shots.iter_mut().chain(self.enemy_shots.iter_mut()) {
            shot.translate(delta);
        }
        for enemy in &mut self.enemies {
            enemy.position += delta;
        }

        let arrival = side.opposite();
        self.graph.generate_neighbors(next, Some(arrival), &mut self.rng);
        self.graph.evict_outside(next, Some(old));
        self.previous = Some(old);
        self.world
            .rebuild(&mut self.graph, next, Some(old), Some(arrival));

        self.populate_room(next);
        tracing::debug!(from = old.0, to = next.0, ?side, "tile transition");
    }

    /// Spawn a room's wave the first time it becomes the center
    fn populate_room(&mut self, id: TileId) {
        let Some(tile) = self.graph.get_mut(id) else {
            return;
        };
        if !tile.is_room() || tile.spawned {
            return;
        }
        tile.spawned = true;
        let Some(origin) = self.world.origin(id) else {
            return;
        };
        let Some(tile) = self.graph.get(id) else {
            return;
        };
        let wave = spawn_room(
            tile,
            origin,
            self.camera.position,
            self.rooms_cleared,
            &mut self.rng,
        );
        for enemy in wave {
            self.add_enemy(enemy);
        }
    }

    /// Put a living enemy into play and seal its room
    pub fn add_enemy(&mut self, enemy: Enemy) {
        let id = enemy.tile;
        self.enemies.push(enemy);
        let Some(tile) = self.graph.get_mut(id) else {
            return;
        };
        if tile.is_room() && !tile.has_active_enemies {
            tile.has_active_enemies = true;
            self.world.create_exit_blocks(&mut self.graph, id);
        }
    }

    // ========================================================================
    // Enemy retirement and room clearing
    // ========================================================================

    /// Shoot down the enemy at `index`, paying out its credits
    pub fn kill_enemy(&mut self, index: usize) -> bool {
        let killed = self.enemies.get_mut(index).is_some_and(|e| e.kill());
        if killed {
            self.reward_kill(index);
        }
        killed
    }

    /// Bookkeeping for an enemy that just entered its dying state
    fn reward_kill(&mut self, index: usize) {
        let Some(enemy) = self.enemies.get(index) else {
            return;
        };
        let (tile, kind, credits) = (enemy.tile, enemy.kind, enemy.credits());
        self.kills += 1;
        let total = self.progress.add_credits(credits as u64);
        self.hooks.enemy_killed(kind);
        self.hooks.credits_changed(total);
        self.settle_room(tile);
    }

    /// Retire the enemy at `index` without a kill
    pub fn despawn_enemy(&mut self, index: usize) -> bool {
        let Some(enemy) = self.enemies.get_mut(index) else {
            return false;
        };
        if !enemy.despawn() {
            return false;
        }
        let tile = enemy.tile;
        self.settle_room(tile);
        true
    }

    /// Unseal and count the room once its last living enemy is gone
    fn settle_room(&mut self, id: TileId) {
        let active = self.graph.get(id).is_some_and(|t| t.has_active_enemies);
        if !active || self.enemies.iter().any(|e| e.tile == id && e.is_alive()) {
            return;
        }
        if let Some(tile) = self.graph.get_mut(id) {
            tile.has_active_enemies = false;
        }
        self.world.remove_exit_blocks(&mut self.graph, id);
        self.rooms_cleared += 1;
        self.hooks.room_cleared(self.rooms_cleared);
        tracing::info!(
            tile = id.0,
            rooms_cleared = self.rooms_cleared,
            "room cleared"
        );
        self.persist();
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Fire the blaster if it is off cooldown
    pub fn fire(&mut self) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        let dir = self.camera.direction.normalize_or_zero();
        if dir == Vec2::ZERO {
            return false;
        }
        let mut origin = self.camera.position
            + dir * SHOT_FORWARD_OFFSET
            + self.camera.right() * SHOT_RIGHT_OFFSET;
        if !self.world.grid.is_passable(origin.x, origin.y) {
            origin = self.camera.position;
        }
        let speed = SHOT_SPEED * self.progress.projectile_speed_multiplier();
        self.player_shots.push(Projectile::new(origin, dir * speed));
        self.cooldown = BLASTER_COOLDOWN * self.progress.cooldown_multiplier();
        self.hooks.shot_fired();
        true
    }

    fn update_player_shots(&mut self, dt: f32) {
        let mut shots = std::mem::take(&mut self.player_shots);
        let mut struck = Vec::new();
        let enemies = &mut self.enemies;
        shots.retain_mut(|shot| {
            let outcome = shot.advance(dt, &self.world.grid, |p| {
                // Every living enemy inside the radius at this sub-step goes down
                let mut hit = false;
                for (i, enemy) in enemies.iter_mut().enumerate() {
                    if enemy.is_alive()
                        && within_radius(p, enemy.position, ENEMY_RADIUS)
                        && enemy.kill()
                    {
                        struck.push(i);
                        hit = true;
                    }
                }
                hit
            });
            !outcome.is_spent()
        });
        self.player_shots = shots;
        for i in struck {
            self.reward_kill(i);
        }
    }

    fn update_enemy_shots(&mut self, dt: f32) {
        let player = self.camera.position;
        let mut hits = 0;
        let grid = &self.world.grid;
        self.enemy_shots.retain_mut(|shot| {
            let outcome = shot.advance(dt, grid, |p| within_radius(p, player, PLAYER_RADIUS));
            if outcome == ShotOutcome::HitTarget {
                hits += 1;
            }
            !outcome.is_spent()
        });
        for _ in 0..hits {
            self.damage_player();
        }
    }

    fn update_enemies(&mut self, dt: f32) {
        let player = self.camera.position;
        let mut contact = false;
        for i in 0..self.enemies.len() {
            let step = update_enemy(&mut self.enemies[i], player, dt, &self.world.grid);
            contact |= step.contact;
            if let Some(shot) = step.shot {
                self.enemy_shots.push(shot);
                self.hooks.enemy_shot_fired();
            }
        }
        if contact {
            self.damage_player();
        }
    }

    /// Apply one hit to the player unless god mode is on
    pub fn damage_player(&mut self) -> DamageOutcome {
        if self.god_mode || self.is_game_over() {
            return DamageOutcome::Ignored;
        }
        let outcome = self.lives.take_damage();
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hurt { remaining } => self.hooks.player_damaged(remaining),
            DamageOutcome::OutOfLives => {
                self.hooks.player_damaged(0);
                self.game_over_timer = Some(GAME_OVER_DELAY);
                self.hooks.game_over();
                tracing::info!(
                    rooms_cleared = self.rooms_cleared,
                    kills = self.kills,
                    "game over"
                );
                self.persist();
            }
        }
        outcome
    }

    // ========================================================================
    // Upgrades
    // ========================================================================

    pub fn purchase(&mut self, track: UpgradeTrack) -> Result<u64, UpgradeError> {
        let cost = self.progress.purchase(track)?;
        if track == UpgradeTrack::Health {
            self.lives.grant_life(self.progress.max_lives());
        }
        self.hooks.credits_changed(self.progress.credits);
        self.persist();
        Ok(cost)
    }

    /// Wipe credits and upgrades, then start over from a fresh run
    pub fn reset_progress(&mut self) {
        self.progress.reset();
        self.hooks.credits_changed(self.progress.credits);
        tracing::info!("progress reset");
        self.persist();
        self.start_new_run();
    }

    fn persist(&self) {
        let Some(path) = &self.save_path else {
            return;
        };
        if let Err(e) = save_progress(path, &self.progress) {
            tracing::warn!(error = %e, "failed to save progress");
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Redraw the framebuffer from the current state
    pub fn render(&mut self) {
        self.framebuffer.fill_background(CEILING_COLOR, FLOOR_COLOR);
        render_walls(
            &mut self.framebuffer,
            &self.camera,
            &self.world,
            &mut self.depth,
        );

        let enemies = self.enemies.iter().filter(|e| e.is_visible()).map(|e| Sprite {
            position: e.position,
            kind: SpriteKind::Enemy {
                tint: e.tint,
                flash: e.weapon.is_some_and(|w| w.flash_on()),
                squish: match e.state {
                    EnemyState::Dying { progress } => progress,
                    _ => 0.0,
                },
            },
        });
        let player_shots = self.player_shots.iter().map(|s| Sprite {
            position: s.position,
            kind: SpriteKind::PlayerShot,
        });
        let enemy_shots = self.enemy_shots.iter().map(|s| Sprite {
            position: s.position,
            kind: SpriteKind::EnemyShot,
        });
        let sprites = collect_sprites(
            &self.camera,
            enemies.chain(player_shots).chain(enemy_shots),
        );
        draw_sprites(&mut self.framebuffer, &self.camera, &sprites, &self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hooks::recording::{HookEvent, RecordingHooks};
    use crate::monster::EnemyKind;

    fn sim() -> Simulation {
        let config = GameConfig {
            width: 64,
            height: 40,
            ..Default::default()
        };
        Simulation::new(&config, Progress::default())
    }

    /// A room tile in the window other than the start, if the seed made one
    fn neighbor_room(sim: &Simulation) -> Option<(TileId, Direction)> {
        let center = sim.center()?;
        let tile = sim.graph().get(center)?;
        tile.neighbors
            .iter()
            .map(|(side, id)| (*id, *side))
            .find(|(id, _)| sim.graph().get(*id).is_some_and(|t| t.is_room()))
    }

    #[test]
    fn test_new_run_layout() {
        let s = sim();
        let start = s.center().unwrap();
        let (ox, oy) = s.world().origin(start).unwrap();
        assert_eq!(s.camera().position, Vec2::new(ox as f32 + 9.0, oy as f32 + 9.0));
        assert!(s.graph().get(start).unwrap().spawned);
        assert!(s.enemies().is_empty());
        assert_eq!(s.lives().current(), 1);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut s = sim();
        assert!(s.fire());
        assert!(!s.fire());
        assert_eq!(s.player_shots().len(), 1);
        assert!((s.cooldown() - BLASTER_COOLDOWN).abs() < 1e-6);
        let shot = s.player_shots()[0];
        assert!((shot.velocity - Vec2::new(SHOT_SPEED, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_frame_clamps_delta() {
        let mut s = sim();
        let start = s.camera().position;
        let input = FrameInput {
            movement: MoveIntent {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        };
        s.frame(&input, 10.0);
        let moved = s.camera().position.x - start.x;
        let expected = MOVE_SPEED * MOVE_SPEED_SCALE * MAX_FRAME_DELTA;
        assert!((moved - expected).abs() < 1e-4, "moved {moved}");
    }

    #[test]
    fn test_shot_kills_enemy_and_pays() {
        let hooks = RecordingHooks::default();
        let mut s = sim().with_hooks(hooks.clone());
        let center = s.center().unwrap();
        let target = s.camera().position + Vec2::new(3.0, 0.2);
        s.add_enemy(Enemy::new(center, EnemyKind::Normal, target, 0.0));
        assert!(s.fire());
        for _ in 0..20 {
            s.frame(&FrameInput::default(), 0.02);
        }
        assert_eq!(s.kills(), 1);
        assert_eq!(s.progress().credits, 50);
        let events = hooks.events();
        assert!(events.contains(&HookEvent::EnemyKilled(EnemyKind::Normal)));
        assert!(events.contains(&HookEvent::CreditsChanged(50)));
    }

    #[test]
    fn test_contact_ends_single_life_run() {
        let hooks = RecordingHooks::default();
        let mut s = sim().with_hooks(hooks.clone());
        let center = s.center().unwrap();
        let on_top = s.camera().position + Vec2::new(0.2, 0.0);
        s.add_enemy(Enemy::new(center, EnemyKind::Normal, on_top, 0.0));
        s.frame(&FrameInput::default(), 0.016);
        assert!(s.is_game_over());
        assert!(hooks.events().contains(&HookEvent::GameOver));

        // The countdown restarts the run
        for _ in 0..40 {
            s.frame(&FrameInput::default(), 0.05);
        }
        assert!(!s.is_game_over());
        assert!(s.enemies().is_empty());
        assert_eq!(s.rooms_cleared(), 0);
    }

    #[test]
    fn test_god_mode_blocks_damage() {
        let mut s = sim();
        s.set_god_mode(true);
        assert_eq!(s.damage_player(), DamageOutcome::Ignored);
        assert_eq!(s.lives().current(), 1);
        assert!(!s.is_game_over());
    }

    #[test]
    fn test_health_purchase_grants_life() {
        let config = GameConfig::default();
        let progress = Progress {
            credits: 400,
            ..Default::default()
        };
        let mut s = Simulation::new(&config, progress);
        assert_eq!(s.purchase(UpgradeTrack::Health), Ok(400));
        assert_eq!(s.lives().current(), 2);
        assert_eq!(s.lives().max(), 2);
        assert!(s.purchase(UpgradeTrack::Health).is_err());
    }

    #[test]
    fn test_transition_shifts_and_spawns() {
        let mut s = sim();
        let Some((room, side)) = neighbor_room(&s) else {
            return;
        };
        let old = s.center().unwrap();
        let before = s.camera().position;
        s.transition(room, side);
        assert_eq!(s.center(), Some(room));
        assert_eq!(s.previous(), Some(old));
        let delta = s.camera().position - before;
        assert_eq!(
            delta,
            Vec2::new(-(side.dx() * TILE_SIZE) as f32, -(side.dy() * TILE_SIZE) as f32)
        );
        let tile = s.graph().get(room).unwrap();
        assert!(tile.spawned);
        assert_eq!(tile.has_active_enemies, s.enemies().iter().any(|e| e.is_alive()));
    }

    #[test]
    fn test_frame_survives_bad_delta_bound() {
        for bound in [-1.0, f32::NAN] {
            let config = GameConfig {
                width: 64,
                height: 40,
                max_frame_delta: bound,
                ..Default::default()
            };
            let mut s = Simulation::new(&config, Progress::default());
            let before = s.camera().position;
            let input = FrameInput {
                movement: MoveIntent {
                    forward: true,
                    ..Default::default()
                },
                ..Default::default()
            };
            s.frame(&input, 0.016);
            assert_eq!(s.camera().position, before, "a zero bound freezes time");
        }
    }

    #[test]
    fn test_reset_progress_wipes_upgrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let progress = Progress {
            credits: 900,
            ..Default::default()
        };
        let config = GameConfig {
            width: 64,
            height: 40,
            ..Default::default()
        };
        let mut s = Simulation::new(&config, progress).with_save_path(path.clone());
        s.purchase(UpgradeTrack::Health).unwrap();
        assert_eq!(s.lives().max(), 2);

        s.reset_progress();
        assert_eq!(s.progress(), &Progress::default());
        assert_eq!(s.lives().max(), 1);
        assert_eq!(s.lives().current(), 1);
        assert_eq!(crate::upgrades::load_progress(&path).unwrap(), Progress::default());
    }
}
