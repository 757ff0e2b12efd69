//! Lookup of the objects that sources and observers point at.
//!
//! Links only hold weak `(entity_type, id)` references; whatever owns those
//! objects plugs in through [`ObjectStore`]. A dangling reference resolves
//! to `None` and is never an error.

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{LinkTrackerError, Result};
use crate::storage::{EntityRef, Source};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub entity_type: String,
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl StoredObject {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type.clone(), self.id)
    }
}

/// What a link's source resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedSource {
    /// Stand-in for a plain label
    Label { name: String },
    Entity(StoredObject),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_by_id(&self, entity_type: &str, id: i64) -> Result<Option<StoredObject>>;

    async fn resolve(&self, entity: &EntityRef) -> Result<Option<StoredObject>> {
        self.get_by_id(&entity.entity_type, entity.id).await
    }
}

/// Resolve a source: labels always succeed, references may dangle.
pub async fn resolve_source(
    store: &dyn ObjectStore,
    source: &Source,
) -> Result<Option<ResolvedSource>> {
    match source {
        Source::Label(name) => Ok(Some(ResolvedSource::Label { name: name.clone() })),
        Source::Entity(r) => {
            let found = store.resolve(r).await?;
            if found.is_none() {
                warn!("Dangling source reference {}", r);
            }
            Ok(found.map(ResolvedSource::Entity))
        }
    }
}

/// 内存对象存储，可从 JSON 种子文件加载
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<(String, i64), StoredObject>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 数组文件加载
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LinkTrackerError::file_operation(format!(
                "无法读取对象种子文件 {}: {}",
                path.display(),
                e
            ))
        })?;
        let objects: Vec<StoredObject> = serde_json::from_str(&content)?;

        let store = Self::new();
        let count = objects.len();
        for object in objects {
            store.insert(object);
        }
        info!("Loaded {} objects from {}", count, path.display());
        Ok(store)
    }

    pub fn insert(&self, object: StoredObject) {
        self.objects
            .insert((object.entity_type.clone(), object.id), object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_by_id(&self, entity_type: &str, id: i64) -> Result<Option<StoredObject>> {
        Ok(self
            .objects
            .get(&(entity_type.to_string(), id))
            .map(|entry| entry.value().clone()))
    }
}
