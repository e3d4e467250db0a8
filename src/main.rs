use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::*;

use kruptins::engine::{GameConfig, KruptinsPlugin};
use kruptins::logging::init_tracing;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/game.ron"));
    let config = GameConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    init_tracing(&config.logging);
    tracing::info!(path = %config_path.display(), seed = config.seed, "starting");

    let window_size = (
        config.width as f32 * config.window_scale,
        config.height as f32 * config.window_scale,
    );

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Attack of The Kruptins".into(),
                        resolution: window_size.into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<bevy::log::LogPlugin>(),
        )
        .add_plugins(KruptinsPlugin { config })
        .run();

    Ok(())
}
