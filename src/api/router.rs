//! API router.
//!
//! Returns a composable `Router` with every endpoint nested under `/api/`.
//!
//! Layer stack (outermost → innermost):
//! 1. Trace → 2. CORS → 3. Body limit → Handler

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the application router.
///
/// `max_upload_bytes` caps every request body (multipart included).
/// When `static_dir` is set, unmatched paths are served from it, with
/// `index.html` answering `/`.
pub fn api_router(ctx: ApiContext, max_upload_bytes: usize, static_dir: Option<&Path>) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/upload", post(endpoints::upload::single))
        .route("/batch-upload", post(endpoints::upload::batch))
        .route("/records", get(endpoints::records::list))
        .route(
            "/records/:id",
            get(endpoints::records::detail).delete(endpoints::records::remove),
        )
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/classify", post(endpoints::analyze::classify))
        .route("/export", get(endpoints::export::export))
        .route("/stats", get(endpoints::stats::summary))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
