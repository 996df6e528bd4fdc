//! Engine configuration: defaults, `config.json` in the XDG config
//! directory, then `GHOSTLINE_*` environment overrides.

use crate::router::SourceMode;
use crate::terminal::PaintStrategy;
use anyhow::{Context as _, Result};
use ghostline_types::GhostError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const APP_NAME: &str = "ghostline";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GhostConfig {
    pub mode: SourceMode,
    /// Quiet time before a generative query is sent.
    pub debounce_ms: u64,
    pub history_refresh_secs: u64,
    pub path_refresh_secs: u64,
    pub include_hidden: bool,
    /// Recent history lines sent along with a generative query.
    pub history_excerpt: usize,
    pub paint_strategy: PaintStrategy,
    pub shell: String,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::default(),
            debounce_ms: 300,
            history_refresh_secs: 5,
            path_refresh_secs: 60,
            include_hidden: false,
            history_excerpt: 8,
            paint_strategy: PaintStrategy::default(),
            shell: default_shell(),
        }
    }
}

impl GhostConfig {
    /// Defaults, overlaid with the user's config file and environment.
    pub fn load() -> Result<Self> {
        let config = match config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn apply_env(mut self, mut getter: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        if let Some(mode) = getter("GHOSTLINE_MODE") {
            self.mode = mode.parse().map_err(GhostError::Config)?;
        }
        if let Some(ms) = getter("GHOSTLINE_DEBOUNCE_MS") {
            self.debounce_ms = ms
                .trim()
                .parse()
                .map_err(|_| GhostError::Config(format!("invalid GHOSTLINE_DEBOUNCE_MS: {ms}")))?;
        }
        if let Some(strategy) = getter("GHOSTLINE_PAINT") {
            self.paint_strategy = strategy.parse().map_err(GhostError::Config)?;
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn history_refresh(&self) -> Duration {
        Duration::from_secs(self.history_refresh_secs.max(1))
    }

    pub fn path_refresh(&self) -> Duration {
        Duration::from_secs(self.path_refresh_secs.max(1))
    }
}

fn config_file() -> Option<PathBuf> {
    let xdg_dir = xdg::BaseDirectories::with_prefix(APP_NAME).ok()?;
    xdg_dir.find_config_file(CONFIG_FILE)
}

/// Path to a file in the XDG state directory, e.g. the log.
pub fn get_state_file(name: &str) -> Result<PathBuf> {
    let xdg_dir =
        xdg::BaseDirectories::with_prefix(APP_NAME).context("failed get xdg directory")?;
    xdg_dir.place_state_file(name).context("failed get path")
}

fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .and_then(|shell| {
            Path::new(&shell)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "sh".to_string())
}
