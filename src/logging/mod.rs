//! Structured logging through `tracing`.
//!
//! - Level filtering per module, rendered to an `EnvFilter` string
//! - `RUST_LOG` overrides the configured filter
//! - Initialization is idempotent: the first call wins

use serde::{Deserialize, Serialize};
use std::sync::Once;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                // Bevy's own chatter stays quiet unless asked for
                ("wgpu".to_string(), LogLevel::Error),
                ("naga".to_string(), LogLevel::Warn),
                ("bevy_render".to_string(), LogLevel::Warn),
                ("kruptins::world".to_string(), LogLevel::Info),
                ("kruptins::engine".to_string(), LogLevel::Info),
            ],
            show_targets: true,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with custom config (idempotent, first call wins)
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let show_targets = config.show_targets;
    let show_file_line = config.show_file_line;
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_thread_ids(false)
            .with_file(show_file_line)
            .with_line_number(show_file_line)
            .compact();

        // A global subscriber may already be installed (tests, embedding hosts)
        let _ = subscriber.try_init();
    });
}

/// Named span around an expensive operation; logs its duration on drop
pub struct TimingSpan {
    name: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!("operation", name = name);
        Self {
            name,
            started: Instant::now(),
            _span: span.entered(),
        }
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        tracing::trace!(
            operation = self.name,
            micros = self.started.elapsed().as_micros() as u64,
            "operation finished"
        );
    }
}
