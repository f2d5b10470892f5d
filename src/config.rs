//! Configuration file handling

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub media: MediaConfig,
    pub listen: ListenConfig,
}

impl Config {
    /// Get the config file path for this platform
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dock-sync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load config from the platform path. A missing file yields the defaults;
    /// nothing is ever written back.
    pub fn load() -> Result<Self, Box<dyn Error>> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            },
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        debug!("config loaded from {}", path.display());
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Backlight brightness applied when no value is given
    pub brightness: u8,
    /// Bytes requested per inbound report read
    pub report_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            brightness: 0x19,
            report_size: streamdock293::consts::REPORT_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Use nearest neighbor interpolation
    pub use_nearest_neighbor: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Icon shown on every key at rest
    pub idle_image: Option<PathBuf>,
    /// Icon shown while a key is held
    pub pressed_image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.device.brightness, 0x19);
        assert_eq!(config.device.report_size, 512);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config: Config = toml::from_str(
            r#"
            [device]
            brightness = 80

            [listen]
            pressed_image = "icons/pressed.png"
            "#,
        )
        .unwrap();
        assert_eq!(config.device.brightness, 80);
        assert_eq!(config.device.report_size, 512);
        assert!(!config.media.use_nearest_neighbor);
        assert_eq!(config.listen.idle_image, None);
        assert_eq!(
            config.listen.pressed_image.as_deref(),
            Some(Path::new("icons/pressed.png"))
        );
    }

    #[test]
    fn defaults_survive_serialization() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }
}
