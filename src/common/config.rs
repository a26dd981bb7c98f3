//! User configuration, loaded from a TOML file in the platform config
//! directory. Every field has a default so a missing or partial file works.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Delay before the built-in panel is automatically restored once it is
    /// the only usable screen left, in milliseconds.
    pub auto_restore_delay_ms: u64,
    /// Highest display handle probed when looking for a built-in panel that
    /// the OS has never reported to us.
    pub builtin_probe_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auto_restore_delay_ms: 3000,
            builtin_probe_limit: 10,
        }
    }
}

impl Config {
    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.auto_restore_delay_ms)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("monoff").join("monoff.toml"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        Ok(config)
    }

    /// Loads the config from the default location, falling back to defaults
    /// if no file exists there yet.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Config::default();
        };
        if !path.exists() {
            return Config::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to load config, using defaults: {err:#}");
                Config::default()
            }
        }
    }
}
