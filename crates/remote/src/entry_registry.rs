//! EntryRegistry - Process-wide cache of loaded remote entries

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL_ENTRIES: Lazy<EntryRegistry> = Lazy::new(EntryRegistry::new);

/// Entry sources keyed by URL.
///
/// Only sources that fetched and linked successfully are stored, so a
/// failed load is retried from the network next time.
#[derive(Debug, Clone, Default)]
pub struct EntryRegistry {
    entries: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static EntryRegistry {
        &GLOBAL_ENTRIES
    }

    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.entries.lock().get(url).cloned()
    }

    pub fn insert(&self, url: impl Into<String>, source: Arc<[u8]>) {
        self.entries.lock().insert(url.into(), source);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.lock().contains_key(url)
    }

    pub fn evict(&self, url: &str) -> bool {
        self.entries.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
