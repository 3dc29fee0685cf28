//! Configuration loading.
//!
//! Search order:
//! 1. Explicit path if provided (must exist)
//! 2. `agentviz.toml` in the working directory
//! 3. Platform-specific config directory (`config.toml`)
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;

const LOCAL_CONFIG: &str = "agentviz.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Bounds used when synthesizing node labels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Maximum characters kept from a session's display name.
    pub session_name_max: usize,
    /// Maximum characters kept from a raw, unparseable details payload.
    pub details_max: usize,
    /// Maximum characters kept from a parsed `args_preview`.
    pub args_preview_max: usize,
    /// strftime pattern for the time-of-day line of actions.
    pub time_format: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            session_name_max: 40,
            details_max: 60,
            args_preview_max: 60,
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Default directory of session logs when neither `--graph` nor
    /// `--sessions` is given.
    pub sessions_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub refresh_ms: u64,
    pub recent_sessions: usize,
    /// Newest actions kept in the graph view; 0 shows all.
    pub graph_limit: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            recent_sessions: 20,
            graph_limit: 100,
        }
    }
}

/// Find and load configuration from the usual locations.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        if !path.exists() {
            return Err(eyre!("Missing configuration file: {}", path.display()));
        }
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!(path = local.display().to_string(); "Loading configuration from local path");
        return load_config_file(local);
    }

    if let Some(dirs) = ProjectDirs::from("dev", "agentviz", "agentviz") {
        let system = dirs.config_dir().join("config.toml");
        if system.exists() {
            info!(path = system.display().to_string(); "Loading configuration from system path");
            return load_config_file(&system);
        }
        debug!(path = system.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using defaults");
    Ok(AppConfig::default())
}

pub fn load_config_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).wrap_err_with(|| format!("Invalid configuration in {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    if config.ui.refresh_ms == 0 {
        return Err(eyre!("ui.refresh_ms must be greater than zero"));
    }
    Ok(config)
}
