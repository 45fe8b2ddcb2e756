//! The generic CRUD resource contract.
//!
//! Shop and Event expose the same operations with the same error mapping;
//! only their fields, validation rules and allowed operations differ. A
//! [`Resource`] describes those differences and [`ResourceContract`]
//! implements the operations once on top of any [`DocumentStore`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::{ResourceError, ValidationError};
use crate::store::{Collection, Document, DocumentStore, StoreError};
use crate::types::{EntityId, Timestamp};

/// One operation of the resource contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOperation {
    /// Read the whole collection.
    List,
    /// Read one entity by id.
    Get,
    /// Validate and persist a new entity.
    Create,
    /// Merge changes into an existing entity.
    Update,
    /// Remove an entity by id.
    Delete,
}

impl ResourceOperation {
    const fn bit(self) -> u8 {
        match self {
            Self::List => 1,
            Self::Get => 1 << 1,
            Self::Create => 1 << 2,
            Self::Update => 1 << 3,
            Self::Delete => 1 << 4,
        }
    }
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// The set of operations a resource exposes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No operations at all.
    pub const NONE: Self = Self(0);

    /// List, Get, Create and Delete: everything except in-place updates.
    pub const READ_CREATE_DELETE: Self = Self::NONE
        .with(ResourceOperation::List)
        .with(ResourceOperation::Get)
        .with(ResourceOperation::Create)
        .with(ResourceOperation::Delete);

    /// Every operation.
    pub const ALL: Self = Self::READ_CREATE_DELETE.with(ResourceOperation::Update);

    /// This set plus `operation`.
    #[must_use]
    pub const fn with(self, operation: ResourceOperation) -> Self {
        Self(self.0 | operation.bit())
    }

    /// Whether `operation` is in the set.
    pub const fn allows(self, operation: ResourceOperation) -> bool {
        self.0 & operation.bit() != 0
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let allowed = [
            ResourceOperation::List,
            ResourceOperation::Get,
            ResourceOperation::Create,
            ResourceOperation::Update,
            ResourceOperation::Delete,
        ]
        .into_iter()
        .filter(|operation| self.allows(*operation));
        f.debug_set().entries(allowed).finish()
    }
}

/// An entity type managed through a [`ResourceContract`].
///
/// The implementing type is the persisted field set (everything except id
/// and timestamps). `Draft` is what a client submits to create one, `Patch`
/// what it submits to change one. Resources without updates use
/// [`std::convert::Infallible`] as their `Patch`.
pub trait Resource: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Collection holding this resource's documents.
    const COLLECTION: Collection;

    /// Name used in user-facing messages ("Course not found").
    const LABEL: &'static str;

    /// Operations this resource exposes.
    const CAPABILITIES: Capabilities;

    /// Create input.
    type Draft: Send;

    /// Update input.
    type Patch: Send;

    /// Turn a submitted draft into a valid field set.
    fn validate(draft: Self::Draft) -> Result<Self, ValidationError>;

    /// Merge `patch` into the stored field set, re-validating the result.
    fn apply_patch(self, patch: Self::Patch) -> Result<Self, ValidationError>;
}

/// A persisted entity: store metadata plus the resource's fields.
///
/// Serialises flat, as `{"_id", "createdAt", "updatedAt", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<R> {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    pub id: EntityId,
    /// Insert time.
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    /// Last write time.
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
    /// Entity fields.
    #[serde(flatten)]
    pub fields: R,
}

impl<R: Resource> Record<R> {
    /// Decode a stored document into a typed record.
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        let Document {
            id,
            created_at,
            updated_at,
            body,
        } = document;
        let fields = serde_json::from_value(body).map_err(|error| StoreError::CorruptDocument {
            collection: R::COLLECTION,
            id,
            detail: error.to_string(),
        })?;
        Ok(Self {
            id,
            created_at,
            updated_at,
            fields,
        })
    }
}

fn encode<R: Resource>(fields: &R) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(fields).map_err(|error| StoreError::EncodingFailed {
        collection: R::COLLECTION,
        detail: error.to_string(),
    })
}

/// List/Get/Create/Update/Delete for one resource type.
///
/// Every operation is a direct pass-through to one or two single-document
/// store calls. Operations outside `R::CAPABILITIES` fail with
/// [`ResourceError::Unsupported`] before the store is touched.
pub struct ResourceContract<R> {
    store: Arc<dyn DocumentStore>,
    resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceContract<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for ResourceContract<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContract").finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceContract<R> {
    /// Bind the contract to a store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            resource: PhantomData,
        }
    }

    fn require(operation: ResourceOperation) -> Result<(), ResourceError> {
        if R::CAPABILITIES.allows(operation) {
            Ok(())
        } else {
            Err(ResourceError::Unsupported {
                label: R::LABEL,
                operation,
            })
        }
    }

    fn parse_id(raw: &str) -> Result<EntityId, ResourceError> {
        EntityId::parse(raw).ok_or_else(|| ResourceError::InvalidId {
            raw: raw.to_string(),
        })
    }

    const fn not_found() -> ResourceError {
        ResourceError::NotFound { label: R::LABEL }
    }

    /// Every entity in store order.
    #[instrument(name = "resource.list", skip(self), fields(collection = %R::COLLECTION))]
    pub async fn list(&self) -> Result<Vec<Record<R>>, ResourceError> {
        Self::require(ResourceOperation::List)?;
        let documents = self.store.find_all(R::COLLECTION).await?;
        debug!(count = documents.len(), "[resource.list] loaded documents");
        documents
            .into_iter()
            .map(|document| Record::from_document(document).map_err(ResourceError::from))
            .collect()
    }

    /// The entity with id `raw_id`.
    #[instrument(name = "resource.get", skip(self), fields(collection = %R::COLLECTION))]
    pub async fn get(&self, raw_id: &str) -> Result<Record<R>, ResourceError> {
        Self::require(ResourceOperation::Get)?;
        let id = Self::parse_id(raw_id)?;
        let document = self
            .store
            .find_by_id(R::COLLECTION, id)
            .await?
            .ok_or_else(Self::not_found)?;
        Ok(Record::from_document(document)?)
    }

    /// Validate `draft` and persist it under a new id.
    #[instrument(name = "resource.create", skip(self, draft), fields(collection = %R::COLLECTION))]
    pub async fn create(&self, draft: R::Draft) -> Result<Record<R>, ResourceError> {
        Self::require(ResourceOperation::Create)?;
        let fields = R::validate(draft)?;
        let body = encode(&fields)?;
        let document = self.store.insert(R::COLLECTION, body).await?;
        info!(id = %document.id, "[resource.create] stored new {}", R::LABEL);
        Ok(Record::from_document(document)?)
    }

    /// Merge `patch` into the entity with id `raw_id`.
    ///
    /// Fields the patch leaves out keep their stored value. Concurrent
    /// updates are last-write-wins.
    #[instrument(name = "resource.update", skip(self, patch), fields(collection = %R::COLLECTION))]
    pub async fn update(&self, raw_id: &str, patch: R::Patch) -> Result<Record<R>, ResourceError> {
        Self::require(ResourceOperation::Update)?;
        let id = Self::parse_id(raw_id)?;
        let current = self
            .store
            .find_by_id(R::COLLECTION, id)
            .await?
            .ok_or_else(Self::not_found)?;
        let current = Record::<R>::from_document(current)?;
        let fields = current.fields.apply_patch(patch)?;
        let body = encode(&fields)?;
        let document = self
            .store
            .replace(R::COLLECTION, id, body)
            .await?
            .ok_or_else(Self::not_found)?;
        info!(id = %document.id, "[resource.update] updated {}", R::LABEL);
        Ok(Record::from_document(document)?)
    }

    /// Remove the entity with id `raw_id`, returning what was removed.
    #[instrument(name = "resource.delete", skip(self), fields(collection = %R::COLLECTION))]
    pub async fn delete(&self, raw_id: &str) -> Result<Record<R>, ResourceError> {
        Self::require(ResourceOperation::Delete)?;
        let id = Self::parse_id(raw_id)?;
        let document = self
            .store
            .find_by_id(R::COLLECTION, id)
            .await?
            .ok_or_else(Self::not_found)?;
        let record = Record::from_document(document)?;
        if !self.store.delete(R::COLLECTION, id).await? {
            return Err(Self::not_found());
        }
        info!(id = %id, "[resource.delete] deleted {}", R::LABEL);
        Ok(record)
    }
}
