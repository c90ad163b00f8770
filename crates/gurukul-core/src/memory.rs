//! In-process document store.
//!
//! Used by tests and by the CLI's `memory` and `file` backends. Each request
//! takes the lock once, so individual requests are atomic but sequences of
//! requests are not.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Document, DocumentKey, Fields};
use crate::traits::{Direction, DocumentStore, Query};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// On-disk form of a [`MemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    collections: Collections,
}

/// A [`DocumentStore`] backed by an in-memory map.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    /// Collections whose requests fail with a network error.
    failing: Mutex<HashMap<String, String>>,
    reads: AtomicU32,
    writes: AtomicU32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Collections::new()),
            failing: Mutex::new(HashMap::new()),
            reads: AtomicU32::new(0),
            writes: AtomicU32::new(0),
        }
    }

    /// Load a store from a JSON snapshot. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let store = Self::new();
        if !path.exists() {
            return Ok(store);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read store snapshot: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse store snapshot: {}", path.display()))?;
        *store.lock_collections() = snapshot.collections;
        Ok(store)
    }

    /// Write the current contents to a JSON snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            collections: self.lock_collections().clone(),
        };
        let json =
            serde_json::to_string_pretty(&snapshot).context("failed to serialize store")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write store snapshot: {}", path.display()))?;
        Ok(())
    }

    /// Insert a document directly, bypassing request counting.
    pub fn seed(&self, key: &DocumentKey, fields: Fields) {
        self.lock_collections()
            .entry(key.collection.clone())
            .or_default()
            .insert(key.id.clone(), fields);
    }

    /// Make every later request touching `collection` fail.
    pub fn fail_collection(&self, collection: &str, message: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection.to_string(), message.to_string());
    }

    /// Number of `get` and `query` requests served.
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `set`, `update` and `add` requests served.
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.lock_collections()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lock_collections().values().all(BTreeMap::is_empty)
    }

    fn lock_collections(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        match failing.get(collection) {
            Some(message) => Err(StoreError::Network(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError> {
        key.validate()?;
        self.check_available(&key.collection)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let collections = self.lock_collections();
        Ok(collections
            .get(&key.collection)
            .and_then(|docs| docs.get(&key.id))
            .map(|fields| Document {
                id: key.id.clone(),
                fields: fields.clone(),
            }))
    }

    async fn set(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError> {
        key.validate()?;
        self.check_available(&key.collection)?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        self.lock_collections()
            .entry(key.collection.clone())
            .or_default()
            .insert(key.id.clone(), fields);
        Ok(())
    }

    async fn update(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError> {
        key.validate()?;
        self.check_available(&key.collection)?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        let mut collections = self.lock_collections();
        let existing = collections
            .get_mut(&key.collection)
            .and_then(|docs| docs.get_mut(&key.id))
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let key = DocumentKey::new(collection, id.clone());
        key.validate()?;
        self.check_available(collection)?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        self.lock_collections()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        if query.collection.is_empty() || query.collection.contains('/') {
            return Err(StoreError::InvalidKey(query.collection.clone()));
        }
        self.check_available(&query.collection)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let collections = self.lock_collections();
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|(_, fields)| query.filters.iter().all(|f| f.matches(fields)))
            // Ordering on a field drops documents that lack it.
            .filter(|(_, fields)| {
                query
                    .order_by
                    .as_ref()
                    .map(|o| fields.contains_key(&o.field))
                    .unwrap_or(true)
            })
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();

        if let Some(order) = &query.order_by {
            matched.sort_by(|a, b| {
                let ord = match (a.fields.get(&order.field), b.fields.get(&order.field)) {
                    (Some(x), Some(y)) => x.compare(y),
                    _ => std::cmp::Ordering::Equal,
                };
                let ord = match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                ord.then_with(|| a.id.cmp(&b.id))
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }
}
