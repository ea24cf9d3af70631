use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// User configuration, read once at startup.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub zoom: ZoomConfig,
    pub view: ViewConfig,
}

/// Wheel zoom settings handed to the view. The navigator never enforces them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ZoomConfig {
    pub step: f64,
    pub max: f64,
    pub min: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomConfig {
            step: 0.1,
            max: 10.0,
            min: 0.1,
        }
    }
}

impl ZoomConfig {
    pub fn is_valid(&self) -> bool {
        self.step > 0.0 && self.min > 0.0 && self.min <= self.max
    }
}

/// Container the terminal view fits images into.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub container_width: f64,
    pub container_height: f64,
    /// Height taken by toolbar/status strip, excluded from the fit area.
    pub reserved_height: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            container_width: 1280.0,
            container_height: 800.0,
            reserved_height: 40.0,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "imgnav", "imgnav").map(|d| d.config_dir().join("config.toml"))
    }

    /// Load from `path`, or the default location when `None`. A missing file
    /// means defaults; a broken one is reported and replaced by defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Config::default(),
        };
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Config::default();
        }
        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), "failed to parse config: {}", e);
                Config::default()
            }),
            Err(e) => {
                warn!(path = %path.display(), "failed to read config: {}", e);
                Config::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(contents)?;
        if !config.zoom.is_valid() {
            warn!(zoom = ?config.zoom, "invalid zoom settings, using defaults");
            config.zoom = ZoomConfig::default();
        }
        Ok(config)
    }
}
