//! HTTP API handlers for census-ingest

pub mod health;
pub mod review;
pub mod upload;

use axum::routing::{get, post};
use axum::Router;

pub use health::health_routes;

use crate::AppState;

/// Admin routes for uploads and review.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/profiles/upload", post(upload::upload_batch))
        .route("/admin/profiles/upload-csv", post(upload::upload_csv_legacy))
        .route("/admin/profiles/flagged", get(review::list_flagged))
        .route(
            "/admin/profiles/flagged/legacy",
            get(review::list_flagged_legacy),
        )
        .route("/admin/profiles/staged/summary", get(review::staged_summary))
        .route("/admin/profiles/:profile_id/edit", post(review::edit_flagged))
}
