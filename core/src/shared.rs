//! Thread-safe handle. The trie, document map and document list must change
//! together, so the whole [`Index`] sits behind one lock: mutators take it
//! exclusively, readers share it.

use crate::error::Result;
use crate::index::{Index, SearchResult, Source};
use crate::options::IndexOptions;
use crate::persist::SerializedIndex;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Index>>,
}

impl From<Index> for SharedIndex {
    fn from(index: Index) -> Self { Self { inner: Arc::new(RwLock::new(index)) } }
}

impl SharedIndex {
    pub fn new(options: IndexOptions, source: Source) -> Result<Self> {
        Ok(Index::new(options, source)?.into())
    }

    /// Holds the read lock for several reads that must see the same state.
    pub fn read(&self) -> RwLockReadGuard<'_, Index> { self.inner.read() }

    /// Holds the write lock across several mutations.
    pub fn write(&self) -> RwLockWriteGuard<'_, Index> { self.inner.write() }

    pub fn add(&self, doc: &Value) -> Result<()> { self.inner.write().add(doc) }

    pub fn add_all<I>(&self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.inner.write().add_all(docs)
    }

    pub fn remove(&self, doc: &Value) -> Result<()> { self.inner.write().remove(doc) }

    pub fn reindex(&self, doc: &Value) -> Result<()> { self.inner.write().reindex(doc) }

    pub fn clear(&self) { self.inner.write().clear() }

    pub fn deserialize(&self, snapshot: SerializedIndex) -> Result<()> {
        self.inner.write().deserialize(snapshot)
    }

    pub fn search(&self, query: &str) -> Vec<SearchResult> { self.inner.read().search(query) }

    pub fn document_count(&self) -> usize { self.inner.read().document_count() }

    pub fn document_list(&self) -> Vec<SearchResult> {
        self.inner.read().document_list().cloned().collect()
    }

    pub fn document(&self, id: &str) -> Option<Value> { self.inner.read().document(id).cloned() }

    pub fn serialize(&self) -> SerializedIndex { self.inner.read().serialize() }
}
