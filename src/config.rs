//! Configuration for the embedwin host
//!
//! Loads configuration from TOML file at `~/.config/embedwin/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::focus::REFOCUS_DELAY;
use crate::input::DEFAULT_WHEEL_PIXELS_PER_TICK;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub focus: FocusConfig,
    pub input: InputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("embedwin");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Host window creation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Used when the requested width is 0
    pub default_width: u32,
    /// Used when the requested height is 0
    pub default_height: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Embed into this XID instead of the root window
    pub parent_window: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_width: 800,
            default_height: 600,
            name: "embedwin".to_string(),
            x: 0,
            y: 0,
            parent_window: None,
        }
    }
}

/// Focus handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Delay between FocusIn and re-applying browser focus
    pub refocus_delay_ms: u64,
}

impl FocusConfig {
    pub fn refocus_delay(&self) -> Duration {
        Duration::from_millis(self.refocus_delay_ms)
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            refocus_delay_ms: REFOCUS_DELAY.as_millis() as u64,
        }
    }
}

/// Input translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Scroll pixel distance per wheel tick
    pub wheel_pixels_per_tick: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_pixels_per_tick: DEFAULT_WHEEL_PIXELS_PER_TICK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "embedwin=debug,info".to_string(),
        }
    }
}
