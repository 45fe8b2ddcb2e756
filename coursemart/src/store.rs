//! The persistence seam: documents, collections and the store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{EntityId, Timestamp};

/// Name of a document collection.
///
/// Each resource type owns exactly one collection; names are fixed at compile
/// time by [`Resource::COLLECTION`](crate::Resource::COLLECTION).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Collection(&'static str);

impl Collection {
    /// Wrap a static collection name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The collection name as stored by the backend.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// A stored document: store-owned metadata plus the schema-free body.
///
/// The body never contains the id or timestamps; those live beside it so a
/// client can never overwrite them.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: EntityId,
    /// When the document was inserted.
    pub created_at: Timestamp,
    /// When the document body was last written.
    pub updated_at: Timestamp,
    /// Entity fields as JSON.
    pub body: Value,
}

/// Identifies the document store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Reading a whole collection.
    FindAll,
    /// Reading a single document.
    FindById,
    /// Inserting a new document.
    Insert,
    /// Overwriting an existing document body.
    Replace,
    /// Removing a document.
    Delete,
    /// Connectivity check.
    Ping,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FindAll => write!(f, "find_all"),
            Self::FindById => write!(f, "find_by_id"),
            Self::Insert => write!(f, "insert"),
            Self::Replace => write!(f, "replace"),
            Self::Delete => write!(f, "delete"),
            Self::Ping => write!(f, "ping"),
        }
    }
}

/// Errors returned by document store backends.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed while executing an operation.
    #[error("{operation} failed: {detail}")]
    StoreFailure {
        /// Operation that was running.
        operation: StoreOperation,
        /// Backend-provided message.
        detail: String,
    },

    /// A document was read back but could not be decoded into its entity.
    #[error("document {id} in collection {collection} could not be decoded: {detail}")]
    CorruptDocument {
        /// Collection holding the document.
        collection: Collection,
        /// Offending document.
        id: EntityId,
        /// Decoder message.
        detail: String,
    },

    /// An entity could not be encoded into a document body.
    #[error("could not encode document for collection {collection}: {detail}")]
    EncodingFailed {
        /// Target collection.
        collection: Collection,
        /// Encoder message.
        detail: String,
    },
}

/// Schema-flexible persistence for entity collections.
///
/// Every operation touches at most one document, and writes are
/// unconditional: two concurrent replaces of the same document resolve as
/// last-write-wins. Implementations:
///
/// - `coursemart-memory`: in-process store for tests and development
/// - `coursemart-postgres`: PostgreSQL JSONB store
///
/// The shared behavioural contract lives in `coursemart-testing`.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Return every document in `collection`, oldest first.
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Return the document with `id`, or `None` when it does not exist.
    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Document>, StoreError>;

    /// Insert `body` under a freshly assigned id and return the stored document.
    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError>;

    /// Overwrite the body of `id`, keeping its id and creation time.
    ///
    /// Returns `None` when the document does not exist.
    async fn replace(
        &self,
        collection: Collection,
        id: EntityId,
        body: Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Remove `id`. Returns whether a document was removed.
    async fn delete(&self, collection: Collection, id: EntityId) -> Result<bool, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
