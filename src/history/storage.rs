use super::codec::{self, STORAGE_KEY};
use super::{GameHistory, GameHistoryEntry, GameHistoryRepository, HistoryError};
use super::store::{KeyValueStore, SqliteStore};

/// Durable repository keeping the whole history as one codec document.
///
/// `save` reads, appends and writes back the full document. Two owners of the
/// same underlying store must not save concurrently: the later write wins.
#[derive(Debug)]
pub struct StorageGameHistoryRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

pub type SqliteGameHistoryRepository = StorageGameHistoryRepository<SqliteStore>;

impl<S: KeyValueStore> StorageGameHistoryRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> GameHistoryRepository for StorageGameHistoryRepository<S> {
    fn load(&self) -> Result<GameHistory, HistoryError> {
        match self.store.get(&self.key)? {
            Some(json) => codec::decode(&json),
            None => Ok(GameHistory::default()),
        }
    }

    fn save(&mut self, entry: &GameHistoryEntry) -> Result<(), HistoryError> {
        let mut history = self.load()?;
        history.games.push(entry.clone());
        let json = codec::encode(&history)?;
        self.store.set(&self.key, &json)
    }
}
