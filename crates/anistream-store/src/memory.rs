use std::collections::HashMap;

use anistream_common::Result;
use parking_lot::RwLock;

use crate::store::DocumentStore;

/// In-memory backend. Documents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Vec<u8>>>,
}

impl DocumentStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.docs.read().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &[u8]) -> Result<()> {
        self.docs.write().insert(key.to_string(), contents.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.docs.write().remove(key).is_some())
    }
}
