//! Route table and middleware stack.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use coursemart::{Event, Shop};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{events, health, method_not_allowed, resource, route_not_found, shops};
use crate::state::AppState;
use crate::uploads::PUBLIC_PREFIX;

/// Build the full application router.
///
/// Shops expose no `PUT`: updates are outside their capability set, so the
/// verb falls through to the 405 handler.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let uploads = ServeDir::new(state.images().dir());

    Router::new()
        .route(
            "/api/shops",
            get(resource::list::<Shop>)
                .post(shops::create)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/shops/{id}",
            get(resource::show::<Shop>)
                .delete(resource::remove::<Shop>)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/events",
            get(resource::list::<Event>)
                .post(events::create)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/events/{id}",
            get(resource::show::<Event>)
                .put(events::update)
                .delete(events::remove)
                .fallback(method_not_allowed),
        )
        .route("/api/health", get(health::health).fallback(method_not_allowed))
        .nest_service(&format!("/{PUBLIC_PREFIX}"), uploads)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
