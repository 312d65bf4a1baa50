//! Persistence of finished-game summaries.
//!
//! [`GameHistoryRepository`] is the only sanctioned way to read or append
//! history. Two implementations ship with the crate: a durable one layered
//! over a [`KeyValueStore`] and a null one that keeps nothing. Callers receive
//! a repository as a value (see [`open_repository`]); nothing here is global.

pub mod codec;
pub mod null;
pub mod storage;
pub mod store;

pub use null::NullGameHistoryRepository;
pub use storage::StorageGameHistoryRepository;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};

use crate::clock::Timestamp;
use crate::game::GameResult;
use crate::util::{mean, std_dev};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Durable, aggregate-only summary of one finished game
#[derive(Debug, Clone, PartialEq)]
pub struct GameHistoryEntry {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub problem_count: usize,
    pub correct_count: usize,
    pub correct_rate: f64,
    pub duration: i64,
    pub duration_per_problem: f64,
}

impl From<&GameResult> for GameHistoryEntry {
    fn from(result: &GameResult) -> Self {
        Self {
            started_at: result.started_at,
            finished_at: result.finished_at,
            problem_count: result.problem_count,
            correct_count: result.correct_count,
            correct_rate: result.correct_rate,
            duration: result.duration,
            duration_per_problem: result.duration_per_problem,
        }
    }
}

/// All persisted games, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameHistory {
    pub games: Vec<GameHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub games: usize,
    pub problems: usize,
    pub correct: usize,
    pub mean_correct_rate: Option<f64>,
    pub mean_duration_per_problem: Option<f64>,
    pub std_dev_duration_per_problem: Option<f64>,
}

impl GameHistory {
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn summary(&self) -> HistorySummary {
        let rates: Vec<f64> = self.games.iter().map(|g| g.correct_rate).collect();
        let per_problem: Vec<f64> = self.games.iter().map(|g| g.duration_per_problem).collect();

        HistorySummary {
            games: self.games.len(),
            problems: self.games.iter().map(|g| g.problem_count).sum(),
            correct: self.games.iter().map(|g| g.correct_count).sum(),
            mean_correct_rate: mean(&rates),
            mean_duration_per_problem: mean(&per_problem),
            std_dev_duration_per_problem: std_dev(&per_problem),
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupted history data: {0}")]
    Corrupted(#[from] serde_json::Error),
    #[error("malformed history data: {0}")]
    Malformed(String),
    #[error("unsupported history data version: {0}")]
    UnsupportedVersion(serde_json::Value),
    #[error("game {index} has a {field} that is not a finite number")]
    NonFinite { index: usize, field: &'static str },
}

/// Capability to load and append game history
pub trait GameHistoryRepository {
    /// The complete history, oldest first. No data yet is an empty history.
    fn load(&self) -> Result<GameHistory, HistoryError>;

    /// Append `entry` after every previously saved entry
    fn save(&mut self, entry: &GameHistoryEntry) -> Result<(), HistoryError>;
}

impl<R: GameHistoryRepository + ?Sized> GameHistoryRepository for Box<R> {
    fn load(&self) -> Result<GameHistory, HistoryError> {
        (**self).load()
    }

    fn save(&mut self, entry: &GameHistoryEntry) -> Result<(), HistoryError> {
        (**self).save(entry)
    }
}

/// Where finished games are kept
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HistoryBackend {
    /// SQLite database in the state directory
    #[default]
    Sqlite,
    /// JSON file in the state directory
    File,
    /// Keep nothing
    Off,
}

pub const SQLITE_FILE_NAME: &str = "history.db";
pub const JSON_DIR_NAME: &str = "history";

/// Open the repository for `backend`, keeping its files under `data_dir`
pub fn open_repository(
    backend: HistoryBackend,
    data_dir: &Path,
) -> Result<Box<dyn GameHistoryRepository>, HistoryError> {
    Ok(match backend {
        HistoryBackend::Sqlite => {
            let store = SqliteStore::open(data_dir.join(SQLITE_FILE_NAME))?;
            Box::new(StorageGameHistoryRepository::new(store))
        }
        HistoryBackend::File => {
            let store = JsonFileStore::new(data_dir.join(JSON_DIR_NAME));
            Box::new(StorageGameHistoryRepository::new(store))
        }
        HistoryBackend::Off => Box::new(NullGameHistoryRepository),
    })
}
