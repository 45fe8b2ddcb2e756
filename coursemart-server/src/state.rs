//! Handler state shared across requests.

use std::sync::Arc;

use coursemart::{DocumentStore, Resource, ResourceContract};

use crate::auth::AdminTokens;
use crate::uploads::ImageStore;

/// Shared handler state: the document store plus upload and auth settings.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    images: ImageStore,
    admin_tokens: AdminTokens,
}

impl AppState {
    /// Bundle the store with upload and auth settings.
    pub fn new(store: Arc<dyn DocumentStore>, images: ImageStore, admin_tokens: AdminTokens) -> Self {
        Self {
            store,
            images,
            admin_tokens,
        }
    }

    /// The resource contract for `R`, bound to the shared store.
    pub fn contract<R: Resource>(&self) -> ResourceContract<R> {
        ResourceContract::new(Arc::clone(&self.store))
    }

    /// The document store behind every contract.
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Where event images are written.
    pub const fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Tokens accepted by [`AdminSession`](crate::auth::AdminSession).
    pub const fn admin_tokens(&self) -> &AdminTokens {
        &self.admin_tokens
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}
