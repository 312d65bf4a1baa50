use super::{GameHistory, GameHistoryEntry, GameHistoryRepository, HistoryError};

/// Repository that persists nothing.
///
/// `load` is always empty and `save` discards its argument. Used for
/// `--no-history` runs and wherever no state may leak between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGameHistoryRepository;

impl GameHistoryRepository for NullGameHistoryRepository {
    fn load(&self) -> Result<GameHistory, HistoryError> {
        Ok(GameHistory::default())
    }

    fn save(&mut self, _entry: &GameHistoryEntry) -> Result<(), HistoryError> {
        Ok(())
    }
}
