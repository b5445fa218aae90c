//! Typed access to collections on top of a byte-level backend.

use std::fmt;
use std::sync::Arc;

use anistream_common::{Error, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collection::Collection;

/// Backend that persists whole collection documents as bytes.
///
/// Implementations only need to be safe for concurrent readers. Writers of
/// the same key are serialized by [`Store`].
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Read a document, or `None` when it has never been written.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a document in full.
    fn write(&self, key: &str, contents: &[u8]) -> Result<()>;

    /// Remove a document. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// Typed collection store.
///
/// Cheap to clone; clones share the backend and the per-key write locks.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentStore>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend)
            .field("locked_keys", &self.locks.len())
            .finish()
    }
}

impl Store {
    pub fn new(backend: impl DocumentStore + 'static) -> Self {
        Self::from_backend(Arc::new(backend))
    }

    pub fn from_backend(backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Load a collection, falling back to its default when absent.
    pub fn load<T>(&self, collection: &Collection) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let key = collection.key();
        match self.backend.read(&key)? {
            Some(bytes) if !bytes.is_empty() => {
                serde_json::from_slice(&bytes).map_err(|e| Error::storage(key, e))
            }
            _ => Ok(T::default()),
        }
    }

    /// Replace a collection in full.
    ///
    /// Prefer [`Store::update`] for read-modify-write cycles; a bare `save`
    /// does not guard against a concurrent writer of the same collection.
    pub fn save<T>(&self, collection: &Collection, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let key = collection.key();
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| Error::storage(&key, e))?;
        self.backend.write(&key, &bytes)
    }

    /// Run a read-modify-write cycle while holding the collection's lock.
    ///
    /// The document is only written back when `f` succeeds.
    pub fn update<T, R, F>(&self, collection: &Collection, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let lock = self.lock_for(collection);
        let _guard = lock.lock();

        let mut doc: T = self.load(collection)?;
        let out = f(&mut doc)?;
        self.save(collection, &doc)?;
        tracing::trace!(collection = %collection, "Collection updated");
        Ok(out)
    }

    /// Delete a collection document.
    pub fn remove(&self, collection: &Collection) -> Result<bool> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock();
        self.backend.remove(&collection.key())
    }

    fn lock_for(&self, collection: &Collection) -> Arc<Mutex<()>> {
        self.locks
            .entry(collection.key())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use anistream_common::{AnimeId, Episode, TrendingConfig};
    use std::thread;

    #[test]
    fn load_missing_returns_default() {
        let store = Store::new(MemoryStore::default());
        let cfg: TrendingConfig = store.load(&Collection::Trending).unwrap();
        assert_eq!(cfg, TrendingConfig::default());
    }

    #[test]
    fn failed_update_does_not_write() {
        let store = Store::new(MemoryStore::default());
        let key = Collection::Episodes(AnimeId::new(1));

        let result: Result<()> = store.update(&key, |eps: &mut Vec<Episode>| {
            eps.push(Episode::new(1));
            Err(Error::validation("nope"))
        });
        assert!(result.is_err());

        let eps: Vec<Episode> = store.load(&key).unwrap();
        assert!(eps.is_empty());
    }

    #[test]
    fn corrupt_document_is_a_storage_error() {
        let backend = MemoryStore::default();
        backend.write("animes", b"{not json").unwrap();
        let store = Store::new(backend);

        let err = store
            .load::<Vec<anistream_common::Anime>>(&Collection::Animes)
            .unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let store = Store::new(MemoryStore::default());
        let key = Collection::Episodes(AnimeId::new(9));

        let handles: Vec<_> = (1..=16u32)
            .map(|n| {
                let store = store.clone();
                let key = key.clone();
                thread::spawn(move || {
                    store
                        .update(&key, |eps: &mut Vec<Episode>| {
                            eps.push(Episode::new(n));
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let eps: Vec<Episode> = store.load(&key).unwrap();
        assert_eq!(eps.len(), 16);
    }

    #[test]
    fn remove_reports_existence() {
        let store = Store::new(MemoryStore::default());
        assert!(!store.remove(&Collection::Schedule).unwrap());
        store
            .save(&Collection::Schedule, &Vec::<anistream_common::ScheduleEntry>::new())
            .unwrap();
        assert!(store.remove(&Collection::Schedule).unwrap());
    }
}
