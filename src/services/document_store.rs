//! Document database seam
//!
//! Collections are addressed by slash-separated paths (`pets`,
//! `users/{uid}/favorites`) and hold JSON object documents keyed by id.

use crate::model::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Field map of a stored document
pub type Document = Map<String, Value>;

/// A document read back together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Document,
}

impl DocumentSnapshot {
    /// Deserialize the document, exposing its id as an `id` field
    pub fn to_record<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// How `set` treats an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    /// Top-level fields of the new data overwrite, other fields are kept
    Merge,
}

/// Serialize a record into a document, failing for non-object values
pub fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>>;

    async fn set(&self, collection: &str, id: &str, data: Document, mode: WriteMode) -> StoreResult<()>;

    /// Merge fields into an existing document; fails with `NotFound` if it is missing
    async fn update(&self, collection: &str, id: &str, data: Document) -> StoreResult<()>;

    /// Store a new document under a generated id
    async fn add(&self, collection: &str, data: Document) -> StoreResult<String>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn list(&self, collection: &str) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Documents whose top-level `field` equals `value`
    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<DocumentSnapshot>>;
}

/// All collections of a local store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
}

impl StoreState {
    fn snapshots(&self, collection: &str) -> impl Iterator<Item = DocumentSnapshot> + '_ {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .map(|(id, data)| DocumentSnapshot {
                id: id.clone(),
                data: data.clone(),
            })
    }
}

/// Document store kept in memory and optionally mirrored to a JSON file
pub struct LocalDocumentStore {
    /// Path to the state file, if persistent
    state_file: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl LocalDocumentStore {
    pub fn in_memory() -> Self {
        LocalDocumentStore {
            state_file: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Open a store backed by `state_file`, loading it if it exists
    pub async fn open(state_file: impl Into<PathBuf>) -> StoreResult<Self> {
        let state_file = state_file.into();
        let state = if state_file.exists() {
            match Self::load_from_file(&state_file).await {
                Ok(state) => {
                    tracing::info!(
                        "Loaded document store with {} collection(s) from {}",
                        state.collections.len(),
                        state_file.display()
                    );
                    state
                }
                Err(e) => {
                    tracing::warn!("Failed to load document store, starting fresh: {}", e);
                    StoreState::default()
                }
            }
        } else {
            StoreState::default()
        };

        Ok(LocalDocumentStore {
            state_file: Some(state_file),
            state: RwLock::new(state),
        })
    }

    async fn load_from_file(path: &Path) -> StoreResult<StoreState> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the state to disk; called with the write lock held so writes land in order
    async fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(state)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;
        Ok(())
    }

    /// Apply `change` to a copy of the state, which replaces the live state only once persisted
    async fn commit<T, F>(&self, change: F) -> StoreResult<T>
    where
        F: FnOnce(&mut StoreState) -> StoreResult<T> + Send,
        T: Send,
    {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let result = change(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| DocumentSnapshot {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, data: Document, mode: WriteMode) -> StoreResult<()> {
        self.commit(|state| {
            let docs = state.collections.entry(collection.to_string()).or_default();
            match docs.get_mut(id) {
                Some(existing) if mode == WriteMode::Merge => existing.extend(data),
                _ => {
                    docs.insert(id.to_string(), data);
                }
            }
            Ok(())
        })
        .await
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.commit(|state| {
            let existing = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
            existing.extend(data);
            Ok(())
        })
        .await
    }

    async fn add(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.commit(|state| {
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), data);
            Ok(())
        })
        .await?;
        tracing::debug!("Added document {}/{}", collection, id);
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let exists = self
            .state
            .read()
            .await
            .collections
            .get(collection)
            .is_some_and(|docs| docs.contains_key(id));
        if !exists {
            return Ok(());
        }
        self.commit(|state| {
            if let Some(docs) = state.collections.get_mut(collection) {
                docs.remove(id);
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<DocumentSnapshot>> {
        let state = self.state.read().await;
        Ok(state.snapshots(collection).collect())
    }

    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<DocumentSnapshot>> {
        let state = self.state.read().await;
        Ok(state
            .snapshots(collection)
            .filter(|snapshot| snapshot.data.get(field) == Some(value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_set_replace_and_merge() {
        let store = LocalDocumentStore::in_memory();
        store
            .set("users", "u1", doc(json!({"name": "Ann", "email": "a@x.io"})), WriteMode::Replace)
            .await
            .unwrap();
        store
            .set("users", "u1", doc(json!({"name": "Anna"})), WriteMode::Merge)
            .await
            .unwrap();
        let snapshot = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(snapshot.data["name"], "Anna");
        assert_eq!(snapshot.data["email"], "a@x.io");

        store
            .set("users", "u1", doc(json!({"name": "Bob"})), WriteMode::Replace)
            .await
            .unwrap();
        let snapshot = store.get("users", "u1").await.unwrap().unwrap();
        assert!(snapshot.data.get("email").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = LocalDocumentStore::in_memory();
        let result = store.update("pets", "nope", doc(json!({"name": "x"}))).await;
        assert_eq!(result, Err(StoreError::NotFound("pets/nope".into())));
    }

    #[tokio::test]
    async fn test_add_generates_unique_ids() {
        let store = LocalDocumentStore::in_memory();
        let a = store.add("pets", doc(json!({"name": "a"}))).await.unwrap();
        let b = store.add("pets", doc(json!({"name": "b"}))).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list("pets").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = LocalDocumentStore::in_memory();
        assert!(store.delete("pets", "ghost").await.is_ok());
    }

    #[tokio::test]
    async fn test_query_eq_matches_field() {
        let store = LocalDocumentStore::in_memory();
        store.add("pets", doc(json!({"sellerId": "u1"}))).await.unwrap();
        store.add("pets", doc(json!({"sellerId": "u2"}))).await.unwrap();
        store.add("pets", doc(json!({"sellerId": "u1"}))).await.unwrap();
        let mine = store.query_eq("pets", "sellerId", &json!("u1")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(store
            .query_eq("others", "sellerId", &json!("u1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sub_collections_are_independent() {
        let store = LocalDocumentStore::in_memory();
        store
            .set("users/u1/favorites", "p1", doc(json!({"petName": "Rex"})), WriteMode::Replace)
            .await
            .unwrap();
        assert!(store.list("users/u2/favorites").await.unwrap().is_empty());
        assert_eq!(store.list("users/u1/favorites").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_to_record_includes_id() {
        #[derive(Deserialize)]
        struct Named {
            id: String,
            name: String,
        }
        let snapshot = DocumentSnapshot {
            id: "p7".into(),
            data: doc(json!({"name": "Kiwi"})),
        };
        let named: Named = snapshot.to_record().unwrap();
        assert_eq!(named.id, "p7");
        assert_eq!(named.name, "Kiwi");
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        assert!(to_document(&json!({"a": 1})).is_ok());
        assert!(matches!(to_document(&42), Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_persistence_across_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        {
            let store = LocalDocumentStore::open(&path).await.unwrap();
            store.add("pets", doc(json!({"name": "Rex"}))).await.unwrap();
        }

        {
            let store = LocalDocumentStore::open(&path).await.unwrap();
            let pets = store.list("pets").await.unwrap();
            assert_eq!(pets.len(), 1);
            assert_eq!(pets[0].data["name"], "Rex");
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = LocalDocumentStore::open(&path).await.unwrap();
        assert!(store.list("pets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_file_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let store = LocalDocumentStore::open(&path).await.unwrap();
        let kept = store.add("pets", doc(json!({"name": "Rex"}))).await.unwrap();

        // a directory in place of the state file makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let added = store.add("pets", doc(json!({"name": "Ghost"}))).await;
        assert!(matches!(added, Err(StoreError::Io(_))));
        let updated = store.update("pets", &kept, doc(json!({"name": "Max"}))).await;
        assert!(matches!(updated, Err(StoreError::Io(_))));
        let merged = store
            .set("pets", &kept, doc(json!({"age": 3})), WriteMode::Merge)
            .await;
        assert!(matches!(merged, Err(StoreError::Io(_))));
        assert!(store.delete("pets", &kept).await.is_err());

        let pets = store.list("pets").await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].data, doc(json!({"name": "Rex"})));
    }

    #[tokio::test]
    async fn test_store_opened_on_directory_rejects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::open(temp_dir.path()).await.unwrap();

        let result = store.add("pets", doc(json!({"name": "Ghost"}))).await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.list("pets").await.unwrap().is_empty());
    }
}
