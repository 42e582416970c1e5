use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::session::{SessionConfig, DEFAULT_SESSION_SECS, DEFAULT_TICK_SECS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub session_secs: u32,
    pub tick_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
            tick_secs: DEFAULT_TICK_SECS,
        }
    }
}

impl Config {
    /// Apply command line overrides on top of stored values
    pub fn with_overrides(self, session_secs: Option<u32>, tick_secs: Option<u32>) -> Self {
        Self {
            session_secs: session_secs.unwrap_or(self.session_secs),
            tick_secs: tick_secs.unwrap_or(self.tick_secs),
        }
    }
}

impl TryFrom<&Config> for SessionConfig {
    type Error = Error;

    fn try_from(cfg: &Config) -> std::result::Result<Self, Self::Error> {
        SessionConfig::new(cfg.session_secs, cfg.tick_secs)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(cfg)?)?;
        Ok(())
    }
}
