//! Memoized dataset loading, keyed by file modification time.
//!
//! The consuming dashboard reloads the CSV on every interaction; caching by
//! path + mtime makes the reload explicit and invalidates exactly when the
//! file changes (regeneration or manual enrichment).

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{csv, DatasetError, VocabRow};

pub struct DatasetCache {
    path: PathBuf,
    loaded: Option<(SystemTime, Vec<VocabRow>)>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the dataset rows, reading the file only when its modification
    /// time differs from the memoized load.
    pub fn rows(&mut self) -> Result<&[VocabRow], DatasetError> {
        let mtime = std::fs::metadata(&self.path)?.modified()?;
        let stale = match &self.loaded {
            Some((loaded_at, _)) => *loaded_at != mtime,
            None => true,
        };
        if stale {
            tracing::debug!(path = %self.path.display(), "reloading dataset");
            let rows = csv::read_dataset(&self.path)?;
            self.loaded = Some((mtime, rows));
        }
        // Memoized entry is guaranteed present here
        Ok(self.loaded.as_ref().map(|(_, rows)| rows.as_slice()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn write_rows(path: &Path, words: &[&str]) {
        let rows: Vec<VocabRow> = words
            .iter()
            .map(|w| VocabRow {
                word: w.to_string(),
                ..VocabRow::default()
            })
            .collect();
        csv::write_dataset(path, &rows).unwrap();
    }

    #[test]
    fn test_cache_loads_and_memoizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.csv");
        write_rows(&path, &["犬", "猫"]);

        let mut cache = DatasetCache::new(&path);
        assert_eq!(cache.rows().unwrap().len(), 2);
        // Unchanged file: second call serves the memoized rows
        assert_eq!(cache.rows().unwrap().len(), 2);
    }

    #[test]
    fn test_cache_reloads_when_mtime_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.csv");
        write_rows(&path, &["犬"]);

        let mut cache = DatasetCache::new(&path);
        assert_eq!(cache.rows().unwrap().len(), 1);

        write_rows(&path, &["犬", "猫", "鳥"]);
        // Force a distinct mtime; same-second rewrites are below filesystem
        // timestamp granularity on some platforms.
        let file = fs::File::options().append(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        assert_eq!(cache.rows().unwrap().len(), 3);
    }

    #[test]
    fn test_cache_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DatasetCache::new(dir.path().join("absent.csv"));
        assert!(matches!(cache.rows(), Err(DatasetError::Io(_))));
    }
}
