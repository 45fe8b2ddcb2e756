//! PostgreSQL adapter for the coursemart document store
//!
//! Documents live in a single `coursemart_documents` table keyed by
//! `(collection, id)`, with the entity fields in a JSONB `body` column. The
//! schema is created by the embedded migrations, see
//! [`PostgresDocumentStore::migrate`].

#![forbid(unsafe_code)]

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursemart::{
    Collection, Document, DocumentStore, EntityId, StoreError, StoreOperation, Timestamp,
};
use nutype::nutype;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{query, Pool, Postgres, Row};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Setup failures of the PostgreSQL adapter.
///
/// Failures of individual store operations are reported as
/// [`StoreError::StoreFailure`] instead.
#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// The connection pool could not be created.
    #[error("failed to create postgres connection pool")]
    ConnectionFailed(#[source] sqlx::Error),

    /// An embedded migration could not be applied.
    #[error("failed to apply postgres migrations")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

/// Maximum number of database connections in the pool.
///
/// Must be at least 1, enforced by using `NonZeroU32` as the underlying type.
#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRef, Into))]
pub struct MaxConnections(NonZeroU32);

/// Configuration for the [`PostgresDocumentStore`] connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: MaxConnections,
    /// Timeout for acquiring a connection from the pool (default: 30 seconds)
    pub acquire_timeout: Duration,
    /// Idle timeout for connections in the pool (default: 10 minutes)
    pub idle_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        const DEFAULT_MAX_CONNECTIONS: NonZeroU32 = match NonZeroU32::new(10) {
            Some(v) => v,
            None => unreachable!(),
        };

        Self {
            max_connections: MaxConnections::new(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

const COLUMNS: &str = "id, body, created_at, updated_at";

/// [`DocumentStore`] backed by a PostgreSQL connection pool.
///
/// Clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Pool<Postgres>,
}

impl PostgresDocumentStore {
    /// Connect with the default pool configuration.
    pub async fn new<S: Into<String>>(connection_string: S) -> Result<Self, PostgresStoreError> {
        Self::with_config(connection_string, PostgresConfig::default()).await
    }

    /// Connect with a custom pool configuration.
    pub async fn with_config<S: Into<String>>(
        connection_string: S,
        config: PostgresConfig,
    ) -> Result<Self, PostgresStoreError> {
        let connection_string = connection_string.into();
        let max_connections: NonZeroU32 = config.max_connections.into();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.get())
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&connection_string)
            .await
            .map_err(PostgresStoreError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one shared with other components.
    pub const fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), PostgresStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(PostgresStoreError::MigrationFailed)?;
        info!("[postgres.migrate] schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(name = "postgres.find_all", skip(self))]
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let rows = query(&format!(
            "SELECT {COLUMNS} FROM coursemart_documents
             WHERE collection = $1
             ORDER BY created_at, id"
        ))
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, StoreOperation::FindAll))?;

        debug!(count = rows.len(), "[postgres.find_all] loaded documents");
        rows.iter()
            .map(|row| document_from_row(row, StoreOperation::FindAll))
            .collect()
    }

    #[instrument(name = "postgres.find_by_id", skip(self))]
    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Document>, StoreError> {
        let row = query(&format!(
            "SELECT {COLUMNS} FROM coursemart_documents
             WHERE collection = $1 AND id = $2"
        ))
        .bind(collection.as_str())
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, StoreOperation::FindById))?;

        row.map(|row| document_from_row(&row, StoreOperation::FindById))
            .transpose()
    }

    #[instrument(name = "postgres.insert", skip(self, body))]
    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError> {
        let id = EntityId::generate();
        let row = query(&format!(
            "INSERT INTO coursemart_documents (collection, id, body, created_at, updated_at)
             VALUES ($1, $2, $3, now(), now())
             RETURNING {COLUMNS}"
        ))
        .bind(collection.as_str())
        .bind(id.into_inner())
        .bind(Json(body))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, StoreOperation::Insert))?;

        info!(id = %id, "[postgres.insert] stored document");
        document_from_row(&row, StoreOperation::Insert)
    }

    #[instrument(name = "postgres.replace", skip(self, body))]
    async fn replace(
        &self,
        collection: Collection,
        id: EntityId,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        let row = query(&format!(
            "UPDATE coursemart_documents
             SET body = $3, updated_at = GREATEST(now(), updated_at)
             WHERE collection = $1 AND id = $2
             RETURNING {COLUMNS}"
        ))
        .bind(collection.as_str())
        .bind(id.into_inner())
        .bind(Json(body))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, StoreOperation::Replace))?;

        row.map(|row| document_from_row(&row, StoreOperation::Replace))
            .transpose()
    }

    #[instrument(name = "postgres.delete", skip(self))]
    async fn delete(&self, collection: Collection, id: EntityId) -> Result<bool, StoreError> {
        let result = query("DELETE FROM coursemart_documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, StoreOperation::Delete))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(name = "postgres.ping", skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, StoreOperation::Ping))?;
        Ok(())
    }
}

fn document_from_row(row: &PgRow, operation: StoreOperation) -> Result<Document, StoreError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|error| map_sqlx_error(error, operation))?;
    let id = EntityId::try_new(id).map_err(|_| StoreError::StoreFailure {
        operation,
        detail: format!("stored id {id} is not a UUIDv7"),
    })?;
    let Json(body): Json<Value> = row
        .try_get("body")
        .map_err(|error| map_sqlx_error(error, operation))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|error| map_sqlx_error(error, operation))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|error| map_sqlx_error(error, operation))?;

    Ok(Document {
        id,
        created_at: Timestamp::new(created_at),
        updated_at: Timestamp::new(updated_at),
        body,
    })
}

fn map_sqlx_error(error: sqlx::Error, operation: StoreOperation) -> StoreError {
    error!(
        error = %error,
        operation = %operation,
        "[postgres.database_error] database operation failed"
    );
    StoreError::StoreFailure {
        operation,
        detail: error.to_string(),
    }
}
