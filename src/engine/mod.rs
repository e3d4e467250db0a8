//! Game engine: the simulation state, its configuration, collaborator
//! hooks, and the Bevy plugin that drives it.
//!
//! Frame flow:
//!   Bevy input → FrameInput → Simulation::frame → Framebuffer → Image upload

pub mod config;
pub mod hooks;
pub mod plugin;
pub mod simulation;

pub use config::{ConfigError, GameConfig};
pub use hooks::{GameHooks, NoopHooks, TracingHooks};
pub use plugin::{KruptinsPlugin, SimulationResource};
pub use simulation::{FrameInput, Simulation};
