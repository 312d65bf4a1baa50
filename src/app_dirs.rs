use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_NAME: &str = "einmaleins";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where history and logs live: `$HOME/.local/state/einmaleins`,
    /// falling back to the platform data dir, then the working directory.
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("einmaleins_config.json")
        }
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("einmaleins.log")
    }
}
