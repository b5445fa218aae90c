//! File-backed document store.
//!
//! Each collection key maps to `<data_dir>/<key>.json`. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers never observe a half-written document.

use std::io::Write;
use std::path::{Path, PathBuf};

use anistream_common::{Error, Result};
use tempfile::NamedTempFile;

use crate::store::DocumentStore;

/// Stores each collection as a JSON file under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
            tracing::info!("Created data directory {}", data_dir.display());
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Never leave the data directory.
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(Error::storage(key, "invalid collection key"));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

impl DocumentStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&self, key: &str, contents: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let dir = path.parent().unwrap_or(&self.data_dir);
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(key, bytes = contents.len(), "Wrote collection {}", path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
