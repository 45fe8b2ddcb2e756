//! Deterministic fault injection for store-level error paths.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use coursemart::{Collection, Document, DocumentStore, EntityId, StoreError, StoreOperation};
use serde_json::Value;

/// Wraps a store and fails the operations it has been told to fail.
///
/// Failures are deterministic: an operation fails on every call until it is
/// healed. Everything else passes through to the inner store.
pub struct FaultyStore<S> {
    store: S,
    failing: Mutex<HashSet<StoreOperation>>,
}

impl<S> FaultyStore<S> {
    /// Wrap `store` with no failing operations.
    pub fn new(store: S) -> Self {
        Self {
            store,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Fail every future call to `operation`.
    #[must_use]
    pub fn failing(self, operation: StoreOperation) -> Self {
        self.fail(operation);
        self
    }

    /// Start failing `operation`.
    pub fn fail(&self, operation: StoreOperation) {
        self.failing
            .lock()
            .expect("fault set mutex should not be poisoned")
            .insert(operation);
    }

    /// Stop failing `operation`.
    pub fn heal(&self, operation: StoreOperation) {
        self.failing
            .lock()
            .expect("fault set mutex should not be poisoned")
            .remove(&operation);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    fn check(&self, operation: StoreOperation) -> Result<(), StoreError> {
        let failing = self
            .failing
            .lock()
            .expect("fault set mutex should not be poisoned")
            .contains(&operation);

        if failing {
            Err(StoreError::StoreFailure {
                operation,
                detail: "injected fault".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl<S> std::fmt::Debug for FaultyStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.check(StoreOperation::FindAll)?;
        self.store.find_all(collection).await
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Document>, StoreError> {
        self.check(StoreOperation::FindById)?;
        self.store.find_by_id(collection, id).await
    }

    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError> {
        self.check(StoreOperation::Insert)?;
        self.store.insert(collection, body).await
    }

    async fn replace(
        &self,
        collection: Collection,
        id: EntityId,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        self.check(StoreOperation::Replace)?;
        self.store.replace(collection, id, body).await
    }

    async fn delete(&self, collection: Collection, id: EntityId) -> Result<bool, StoreError> {
        self.check(StoreOperation::Delete)?;
        self.store.delete(collection, id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check(StoreOperation::Ping)?;
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursemart_memory::InMemoryDocumentStore;
    use serde_json::json;

    const DOCS: Collection = Collection::new("docs");

    #[tokio::test]
    async fn healthy_store_passes_through() {
        let store = FaultyStore::new(InMemoryDocumentStore::new());

        let inserted = store.insert(DOCS, json!({"n": 1})).await.expect("insert");
        let found = store.find_by_id(DOCS, inserted.id).await.expect("find");

        assert_eq!(found, Some(inserted));
    }

    #[tokio::test]
    async fn failing_operation_reports_store_failure() {
        let store = FaultyStore::new(InMemoryDocumentStore::new()).failing(StoreOperation::Insert);

        let error = store
            .insert(DOCS, json!({}))
            .await
            .expect_err("insert should fail");

        assert_eq!(
            error,
            StoreError::StoreFailure {
                operation: StoreOperation::Insert,
                detail: "injected fault".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn only_chosen_operations_fail() {
        let store = FaultyStore::new(InMemoryDocumentStore::new()).failing(StoreOperation::Delete);

        let inserted = store.insert(DOCS, json!({})).await.expect("insert");

        assert!(store.delete(DOCS, inserted.id).await.is_err());
        assert_eq!(store.find_all(DOCS).await.expect("find_all").len(), 1);
    }

    #[tokio::test]
    async fn healed_operation_succeeds_again() {
        let store = FaultyStore::new(InMemoryDocumentStore::new()).failing(StoreOperation::Ping);
        assert!(store.ping().await.is_err());

        store.heal(StoreOperation::Ping);

        assert!(store.ping().await.is_ok());
    }
}
