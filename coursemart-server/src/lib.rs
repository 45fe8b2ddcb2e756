//! HTTP service for the coursemart marketplace.
//!
//! Routes:
//!
//! - `/api/shops`: list, get, create and delete courses
//! - `/api/events`: list, get, create, update and delete events; mutations
//!   take multipart forms and need an admin bearer token
//! - `/api/health`: store round trip
//! - `/uploads/*`: uploaded event images
//!
//! The document store is PostgreSQL when `DATABASE_URL` is set and an
//! in-memory store otherwise. See [`config::ServerConfig`] for every setting.

#![forbid(unsafe_code)]

use std::io;
use std::sync::Arc;

use axum::Router;
use coursemart::DocumentStore;
use coursemart_memory::InMemoryDocumentStore;
use coursemart_postgres::{PostgresDocumentStore, PostgresStoreError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod uploads;

use config::{ConfigError, ServerConfig};
use state::AppState;
use uploads::ImageStore;

/// Reasons the server fails to start or stops serving.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The environment holds an unusable setting.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connecting to or migrating PostgreSQL failed.
    #[error(transparent)]
    Postgres(#[from] PostgresStoreError),

    /// The upload directory could not be created.
    #[error("failed to prepare upload directory: {0}")]
    UploadDir(#[source] io::Error),

    /// The listener could not bind.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address that was requested.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Connect the configured document store and prepare the upload directory.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, StartupError> {
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to postgres...");
            let store = PostgresDocumentStore::with_config(url.clone(), config.postgres.clone())
                .await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            warn!("Using the in-memory document store; data is lost on restart");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let images = ImageStore::new(&config.upload_dir);
    images.ensure_dir().await.map_err(StartupError::UploadDir)?;

    Ok(AppState::new(store, images, config.admin_tokens.clone()))
}

/// The application router for `state`.
pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    if config.admin_tokens.is_empty() {
        warn!("COURSEMART_ADMIN_TOKENS is empty; every event mutation will be rejected");
    }
    routes::router(state, config.max_upload_bytes)
}

/// Serve `app` on `listener` until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), StartupError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

/// Build everything from `config`, bind, and serve.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    info!("Initializing state...");
    let state = build_state(&config).await?;
    let app = build_app(state, &config);

    let address = config.bind_address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    info!("Server running on {address}");

    serve(listener, app).await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(error) => {
                warn!("Failed to install terminate handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
