use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "timefighter";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("timefighter_config.json")
        }
    }

    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn snapshot_path() -> PathBuf {
        Self::state_dir().join("snapshot.json")
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("timefighter.log")
    }
}
