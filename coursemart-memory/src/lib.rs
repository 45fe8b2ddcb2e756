//! In-memory adapter for the coursemart document store
//!
//! This crate provides an in-memory implementation of the `DocumentStore`
//! trait from the coursemart crate, useful for testing and development
//! scenarios where persistence is not required. The server falls back to it
//! when no database URL is configured.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use coursemart::{Collection, Document, DocumentStore, EntityId, StoreError, Timestamp};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Thread-safe in-memory document store
///
/// Documents are kept per collection in insertion order, which is the order
/// `find_all` reports them in.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    // Maps collection names to their documents, oldest first
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory document store
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    #[instrument(name = "memory.find_all", skip(self))]
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    #[instrument(name = "memory.find_by_id", skip(self))]
    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|document| document.id == id))
            .cloned())
    }

    #[instrument(name = "memory.insert", skip(self, body))]
    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;

        let now = Timestamp::now();
        let document = Document {
            id: EntityId::generate(),
            created_at: now,
            updated_at: now,
            body,
        };
        collections
            .entry(collection)
            .or_default()
            .push(document.clone());

        debug!(id = %document.id, "[memory.insert] stored document");
        Ok(document)
    }

    #[instrument(name = "memory.replace", skip(self, body))]
    async fn replace(
        &self,
        collection: Collection,
        id: EntityId,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;

        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|document| document.id == id))
        else {
            return Ok(None);
        };

        document.body = body;
        document.updated_at = Timestamp::now();
        Ok(Some(document.clone()))
    }

    #[instrument(name = "memory.delete", skip(self))]
    async fn delete(&self, collection: Collection, id: EntityId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;

        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|document| document.id != id);

        Ok(documents.len() < before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
