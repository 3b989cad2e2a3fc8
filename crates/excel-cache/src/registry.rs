//! In-memory decoded cache.
//!
//! Entries are replaced wholesale on refresh, never edited in place. Nothing
//! here is written to disk.

use std::collections::BTreeMap;

use serde::Serialize;

use excel_model::CacheIndex;

use crate::strategy::IndexingStrategy;

/// One decoded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub dataset: String,
    pub index: CacheIndex,
    pub strategy: IndexingStrategy,
    /// SHA-256 of the dump this entry was decoded from.
    pub sha256: String,
    pub confidence: f64,
    pub records: usize,
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DecodedCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl DecodedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dataset: &str) -> Option<&CacheIndex> {
        self.entries.get(dataset).map(|entry| &entry.index)
    }

    pub fn entry(&self, dataset: &str) -> Option<&CacheEntry> {
        self.entries.get(dataset)
    }

    /// Installs `entry`, returning the entry it replaced.
    pub fn replace(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(entry.dataset.clone(), entry)
    }

    pub fn remove(&mut self, dataset: &str) -> Option<CacheEntry> {
        self.entries.remove(dataset)
    }

    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
