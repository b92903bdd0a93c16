//! Per-level high score persistence.

use std::collections::BTreeMap;

use grid_snake_core::LevelNumber;
use log::warn;

/// Errors reported by a [`HighScoreStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage medium cannot be reached at all.
    #[error("high score storage is unavailable: {0}")]
    Unavailable(String),
    /// Reading or writing the storage failed.
    #[error("high score storage I/O failed")]
    Io(#[from] std::io::Error),
    /// The backend failed for a reason specific to its medium.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence collaborator keeping one integer per level.
pub trait HighScoreStore {
    /// Loads the stored high score of `level`, zero when none was saved.
    fn load(&mut self, level: LevelNumber) -> Result<u32, StoreError>;

    /// Stores `score` as the high score of `level`.
    fn save(&mut self, level: LevelNumber, score: u32) -> Result<(), StoreError>;
}

/// Store that keeps scores for the lifetime of the value only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    scores: BTreeMap<LevelNumber, u32>,
}

impl MemoryStore {
    /// Creates a store seeded with existing scores.
    #[must_use]
    pub fn with_scores(scores: impl IntoIterator<Item = (LevelNumber, u32)>) -> Self {
        Self {
            scores: scores.into_iter().collect(),
        }
    }

    /// Stored score of `level`, if any.
    #[must_use]
    pub fn get(&self, level: LevelNumber) -> Option<u32> {
        self.scores.get(&level).copied()
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&mut self, level: LevelNumber) -> Result<u32, StoreError> {
        Ok(self.get(level).unwrap_or(0))
    }

    fn save(&mut self, level: LevelNumber, score: u32) -> Result<(), StoreError> {
        let _ = self.scores.insert(level, score);
        Ok(())
    }
}

/// Caches high scores and shields the session from storage failures.
///
/// The first failure switches the ledger to memory-only tracking for the rest
/// of the session; the store is not consulted again.
#[derive(Debug)]
pub struct HighScoreLedger<S> {
    store: S,
    cache: BTreeMap<LevelNumber, u32>,
    degraded: bool,
}

impl<S: HighScoreStore> HighScoreLedger<S> {
    /// Creates a ledger on top of `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: BTreeMap::new(),
            degraded: false,
        }
    }

    /// High score of `level`, loading it from the store on first use.
    pub fn best(&mut self, level: LevelNumber) -> u32 {
        if let Some(score) = self.cache.get(&level) {
            return *score;
        }

        let score = if self.degraded {
            0
        } else {
            match self.store.load(level) {
                Ok(score) => score,
                Err(error) => {
                    self.degrade(&error);
                    0
                }
            }
        };
        let _ = self.cache.insert(level, score);
        score
    }

    /// Cached high score of `level` without touching the store.
    #[must_use]
    pub fn cached(&self, level: LevelNumber) -> u32 {
        self.cache.get(&level).copied().unwrap_or(0)
    }

    /// Records `score` for `level`. Returns `true` when it beats the previous best.
    pub fn record(&mut self, level: LevelNumber, score: u32) -> bool {
        if score <= self.best(level) {
            return false;
        }

        let _ = self.cache.insert(level, score);
        if !self.degraded {
            if let Err(error) = self.store.save(level, score) {
                self.degrade(&error);
            }
        }
        true
    }

    /// Whether storage failed and scores are tracked in memory only.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Provides read-only access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn degrade(&mut self, error: &StoreError) {
        warn!("high score storage failed, keeping scores in memory only: {error}");
        self.degraded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct BrokenStore {
        loads: u32,
        saves: u32,
    }

    impl HighScoreStore for BrokenStore {
        fn load(&mut self, _level: LevelNumber) -> Result<u32, StoreError> {
            self.loads += 1;
            Err(StoreError::Unavailable("disk detached".to_owned()))
        }

        fn save(&mut self, _level: LevelNumber, _score: u32) -> Result<(), StoreError> {
            self.saves += 1;
            Err(StoreError::Unavailable("disk detached".to_owned()))
        }
    }

    #[test]
    fn records_only_improvements() {
        let mut ledger = HighScoreLedger::new(MemoryStore::with_scores([(1, 50)]));

        assert_eq!(ledger.best(1), 50);
        assert!(!ledger.record(1, 40));
        assert!(ledger.record(1, 60));
        assert_eq!(ledger.store().get(1), Some(60));
        assert_eq!(ledger.cached(1), 60);
    }

    #[test]
    fn scores_are_kept_per_level() {
        let mut ledger = HighScoreLedger::new(MemoryStore::default());
        assert!(ledger.record(2, 30));
        assert_eq!(ledger.best(1), 0);
        assert_eq!(ledger.best(2), 30);
    }

    #[test]
    fn storage_failure_degrades_to_memory() {
        let mut ledger = HighScoreLedger::new(BrokenStore::default());

        assert_eq!(ledger.best(1), 0);
        assert!(ledger.is_degraded());
        assert!(ledger.record(1, 80));
        assert_eq!(ledger.best(1), 80);
        assert_eq!(ledger.best(3), 0);

        assert_eq!(ledger.store().loads, 1, "store is not consulted after failing");
        assert_eq!(ledger.store().saves, 0);
    }
}
