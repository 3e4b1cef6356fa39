//! Configuration for the noeul sky.
//!
//! Settings are read from `config.toml` in the platform config directory
//! (for example `~/.config/noeul/config.toml` on Linux). A missing file
//! yields the defaults; a malformed one is an error.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use noeul_core::{DetectionPolicy, DeviceInfo, TierOverride};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// User settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device tier, or `auto` to detect it.
    pub tier: TierOverride,
    /// Platform identifier fed to tier detection.
    pub user_agent: String,
    /// Whether the host should be treated as touch capable.
    pub touch: bool,
    /// Frames per second the host aims for.
    pub target_fps: u32,
    /// Show the footer with key hints and frame stats.
    pub show_help: bool,
    /// Fixed RNG seed. Random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Mobile detection rules.
    pub detection: DetectionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tier: TierOverride::Auto,
            user_agent: String::new(),
            touch: false,
            target_fps: 60,
            show_help: true,
            seed: None,
            detection: DetectionPolicy::default(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "noeul").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 || self.target_fps > 240 {
            return Err(ConfigError::Invalid(format!(
                "target_fps must be between 1 and 240, got {}",
                self.target_fps
            )));
        }
        let width = self.detection.narrow_viewport_width;
        if !width.is_finite() || width < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "detection.narrow_viewport_width must be a non-negative number, got {width}"
            )));
        }
        Ok(())
    }

    /// Device snapshot for tier detection, given the current viewport width.
    pub fn device_info(&self, viewport_width: f32) -> DeviceInfo {
        DeviceInfo {
            user_agent: self.user_agent.clone(),
            viewport_width,
            touch: self.touch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            tier = "mobile"
            seed = 42

            [detection]
            narrow_viewport_width = 600.0
            "#,
        )
        .unwrap();
        assert_eq!(config.tier, TierOverride::Mobile);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.detection.narrow_viewport_width, 600.0);
        assert!(config.detection.narrow_requires_touch);
        assert!(!config.detection.mobile_user_agent_tokens.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            tier: TierOverride::Desktop,
            user_agent: "Android 14".to_string(),
            target_fps: 30,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::parse("target_fps = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("tier = \"tablet\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::parse("[detection]\nnarrow_viewport_width = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_device_info_uses_settings() {
        let config = Config {
            user_agent: "iPad".to_string(),
            touch: true,
            ..Default::default()
        };
        let info = config.device_info(1024.0);
        assert_eq!(info.user_agent, "iPad");
        assert!(info.touch);
        assert_eq!(info.viewport_width, 1024.0);
    }
}
