use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use grid_snake_core::LevelNumber;
use grid_snake_session::{HighScoreStore, StoreError};

/// High scores kept in a flat JSON object, one key per level.
#[derive(Clone, Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, u32>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(source) => serde_json::from_str(&source)
                .map_err(|error| StoreError::Backend(anyhow::Error::new(error))),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(error) => Err(error.into()),
        }
    }
}

fn key(level: LevelNumber) -> String {
    format!("snakeHighScore_level_{level}")
}

impl HighScoreStore for JsonFileStore {
    fn load(&mut self, level: LevelNumber) -> Result<u32, StoreError> {
        Ok(self.read_all()?.get(&key(level)).copied().unwrap_or(0))
    }

    fn save(&mut self, level: LevelNumber, score: u32) -> Result<(), StoreError> {
        let mut scores = self.read_all()?;
        let _ = scores.insert(key(level), score);
        let encoded = serde_json::to_string_pretty(&scores)
            .map_err(|error| StoreError::Backend(anyhow::Error::new(error)))?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("grid-snake-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let mut store = JsonFileStore::new(scratch_path("missing"));
        assert_eq!(store.load(1).expect("missing file is empty"), 0);
    }

    #[test]
    fn scores_round_trip_through_the_file() {
        let path = scratch_path("round-trip");
        let mut store = JsonFileStore::new(&path);
        store.save(1, 120).expect("write succeeds");
        store.save(3, 40).expect("write succeeds");

        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load(1).expect("read succeeds"), 120);
        assert_eq!(reopened.load(2).expect("read succeeds"), 0);

        let raw = fs::read_to_string(&path).expect("file exists");
        assert!(raw.contains("\"snakeHighScore_level_3\": 40"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = scratch_path("corrupt");
        fs::write(&path, "not json").expect("write succeeds");
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load(1), Err(StoreError::Backend(_))));
        let _ = fs::remove_file(path);
    }
}
