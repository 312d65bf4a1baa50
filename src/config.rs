use crate::app_dirs::AppDirs;
use crate::history::HistoryBackend;
use crate::problem::{Operator, ProblemSpec, SpecError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User defaults for new sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub problem_count: usize,
    pub min_operand_value: i64,
    pub max_operand_value: i64,
    pub operators: Vec<Operator>,
    pub history: HistoryBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            problem_count: 20,
            min_operand_value: 2,
            max_operand_value: 9,
            operators: vec![Operator::Multiply],
            history: HistoryBackend::Sqlite,
        }
    }
}

impl Config {
    pub fn problem_spec(&self) -> Result<ProblemSpec, SpecError> {
        ProblemSpec::new(
            self.operators.iter().copied(),
            self.min_operand_value,
            self.max_operand_value,
        )
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
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

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "ignoring unreadable config: {e}");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
