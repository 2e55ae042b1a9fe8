//! Configuration for bup clients
//!
//! Stored in `<config dir>/bup/config.toml`, overridable with `BUP_CONFIG`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "BUP_CONFIG";

/// bup client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the issue backend
    pub api_base_url: String,

    /// Base URL of bup-api (chat proxy and image upload relay)
    pub chat_base_url: String,

    /// Seconds between automatic refreshes
    pub refresh_interval_secs: u64,

    /// Fade-out delay of the loading overlay, in milliseconds
    pub loader_fade_ms: u64,

    /// How long a notification stays visible, in seconds
    pub toast_secs: u64,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            chat_base_url: "http://localhost:5000".to_string(),
            refresh_interval_secs: 60,
            loader_fade_ms: 500,
            toast_secs: 3,
            display: DisplayConfig::default(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Date format for display
    pub date_format: String,

    /// Maximum description length in list rows before truncation
    pub max_description_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d %H:%M".to_string(),
            max_description_length: 60,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load config from `BUP_CONFIG` or the default location
    pub fn load_default() -> crate::Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        std::env::var(CONFIG_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("bup").join("config.toml")))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn loader_fade(&self) -> Duration {
        Duration::from_millis(self.loader_fade_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs)
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# bup configuration

# Issue backend
api_base_url = "http://localhost:3000"

# bup-api (chat proxy and image uploads)
chat_base_url = "http://localhost:5000"

# Seconds between automatic refreshes of the issue list
refresh_interval_secs = 60

# Loading overlay fade-out delay (milliseconds)
loader_fade_ms = 500

# How long notifications stay on screen (seconds)
toast_secs = 3

[display]
# Date format for display (strftime format)
date_format = "%Y-%m-%d %H:%M"

# Maximum description length in list rows
max_description_length = 60
"#
        .to_string()
    }
}

/// State directory for client storage and logs
///
/// `$XDG_STATE_HOME/bup`, falling back to `~/.local/state/bup`.
pub fn state_dir() -> crate::Result<PathBuf> {
    let base = std::env::var("XDG_STATE_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
        .ok_or_else(|| crate::Error::Config("Could not determine state directory".into()))?;

    Ok(base.join("bup"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_default_parses_to_default() {
        let parsed: Config = toml::from_str(&Config::default_with_comments()).unwrap();
        let default = Config::default();
        assert_eq!(parsed.api_base_url, default.api_base_url);
        assert_eq!(parsed.refresh_interval_secs, 60);
        assert_eq!(parsed.display.date_format, default.display.date_format);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_secs = 15\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        assert_eq!(config.loader_fade(), Duration::from_millis(500));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.chat_base_url, "http://localhost:5000");
    }
}
