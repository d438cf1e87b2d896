//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use darkroom_core::MAX_IMAGE_BYTES;
use tower_http::trace::TraceLayer;

/// Multipart overhead allowance on top of the maximum image size.
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for load balancers)
        .route("/v1/health", get(handlers::health_check))
        // Image listing and upload
        .route(
            "/v1/images",
            get(handlers::list_images).post(handlers::upload_image),
        )
        // Static segments must be registered alongside /{id}; axum prefers
        // the static match.
        .route("/v1/images/search", get(handlers::search_images))
        .route("/v1/images/labels", get(handlers::get_all_labels))
        .route(
            "/v1/images/{id}",
            get(handlers::get_image).delete(handlers::delete_image),
        )
        .route("/v1/images/{id}/file", get(handlers::get_image_file))
        // Recognition pipeline callback
        .route("/v1/images/{id}/status", put(handlers::update_image_status))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + BODY_LIMIT_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
