use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use bevy::image::ImageSampler;
use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::camera::MoveIntent;
use crate::engine::config::GameConfig;
use crate::engine::hooks::TracingHooks;
use crate::engine::simulation::{FrameInput, Simulation};
use crate::upgrades::{load_progress, Progress, UpgradeTrack};

/// Largest per-frame mouse delta accepted, in pixels
const MAX_MOUSE_DELTA: f32 = 50.0;
/// Frames of mouse motion averaged together
const MOUSE_SMOOTHING: usize = 3;

pub struct KruptinsPlugin {
    pub config: GameConfig,
}

impl Plugin for KruptinsPlugin {
    fn build(&self, app: &mut App) {
        let progress = load_progress(&self.config.save_path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load progress, starting fresh");
            Progress::default()
        });
        let sim = Simulation::new(&self.config, progress)
            .with_hooks(TracingHooks)
            .with_save_path(self.config.save_path.clone());

        app.insert_resource(SimulationResource(Arc::new(RwLock::new(sim))))
            .insert_resource(ViewSettings {
                width: self.config.width,
                height: self.config.height,
                scale: self.config.window_scale,
            })
            .init_resource::<LookSmoother>()
            .add_systems(Startup, setup_view)
            .add_systems(
                Update,
                (grab_cursor, simulation_step_system, upload_framebuffer_system).chain(),
            );
    }
}

#[derive(Resource)]
pub struct SimulationResource(pub Arc<RwLock<Simulation>>);

#[derive(Resource, Debug, Clone, Copy)]
pub struct ViewSettings {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

/// Image the framebuffer is copied into each frame
#[derive(Resource)]
pub struct ScreenImage(pub Handle<Image>);

/// Clamps and averages raw mouse motion, one sample per frame
#[derive(Resource, Default, Debug)]
pub struct LookSmoother {
    recent: VecDeque<f32>,
}

impl LookSmoother {
    pub fn push(&mut self, raw: f32) -> f32 {
        self.recent
            .push_back(raw.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA));
        while self.recent.len() > MOUSE_SMOOTHING {
            self.recent.pop_front();
        }
        self.recent.iter().sum::<f32>() / self.recent.len() as f32
    }

    /// Fold one frame's motion events into a single smoothed delta
    pub fn push_frame(&mut self, deltas: impl IntoIterator<Item = f32>) -> f32 {
        self.push(deltas.into_iter().sum())
    }
}

fn setup_view(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    settings: Res<ViewSettings>,
) {
    let mut image = Image::new_fill(
        Extent3d {
            width: settings.width,
            height: settings.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    image.sampler = ImageSampler::nearest();
    let handle = images.add(image);

    commands.spawn(Camera2d);
    commands.spawn(Sprite {
        image: handle.clone(),
        custom_size: Some(Vec2::new(
            settings.width as f32 * settings.scale,
            settings.height as f32 * settings.scale,
        )),
        ..default()
    });
    commands.insert_resource(ScreenImage(handle));
}

/// Lock the cursor on click, release it on Escape
fn grab_cursor(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
) {
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    if mouse.just_pressed(MouseButton::Left) {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
    if keys.just_pressed(KeyCode::Escape) {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}

fn pressed_any(keys: &ButtonInput<KeyCode>, codes: &[KeyCode]) -> bool {
    codes.iter().any(|k| keys.pressed(*k))
}

fn simulation_step_system(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut smoother: ResMut<LookSmoother>,
    sim_res: Res<SimulationResource>,
) {
    let look_delta = smoother.push_frame(motion.read().map(|m| m.delta.x));
    let input = FrameInput {
        movement: MoveIntent {
            forward: pressed_any(&keys, &[KeyCode::KeyW, KeyCode::ArrowUp]),
            back: pressed_any(&keys, &[KeyCode::KeyS, KeyCode::ArrowDown]),
            strafe_left: pressed_any(&keys, &[KeyCode::KeyA, KeyCode::ArrowLeft]),
            strafe_right: pressed_any(&keys, &[KeyCode::KeyD, KeyCode::ArrowRight]),
        },
        look_delta,
        fire: keys.pressed(KeyCode::Space) || mouse.pressed(MouseButton::Left),
    };

    let Ok(mut sim) = sim_res.0.write() else {
        return;
    };
    if keys.just_pressed(KeyCode::KeyG) {
        sim.toggle_god_mode();
    }
    if keys.just_pressed(KeyCode::KeyR) {
        sim.start_new_run();
    }
    if keys.just_pressed(KeyCode::Backspace) {
        sim.reset_progress();
    }
    let shop = [
        (KeyCode::Digit1, UpgradeTrack::FireRate),
        (KeyCode::Digit2, UpgradeTrack::ProjectileSpeed),
        (KeyCode::Digit3, UpgradeTrack::MoveSpeed),
        (KeyCode::Digit4, UpgradeTrack::Health),
    ];
    for (key, track) in shop {
        if keys.just_pressed(key) {
            if let Err(e) = sim.purchase(track) {
                tracing::info!(track = track.display_name(), reason = %e, "upgrade not bought");
            }
        }
    }
    sim.frame(&input, time.delta_secs());
}

fn upload_framebuffer_system(
    sim_res: Res<SimulationResource>,
    screen: Option<Res<ScreenImage>>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(screen) = screen else {
        return;
    };
    let Some(image) = images.get_mut(&screen.0) else {
        return;
    };
    let Ok(sim) = sim_res.0.read() else {
        return;
    };
    let bytes = sim.framebuffer().as_bytes();
    if image.data.len() == bytes.len() {
        image.data.copy_from_slice(bytes);
    }
}
