//! Upload endpoints
//!
//! Accepts a spreadsheet as multipart form data, validates the declared
//! content type against the allow-list, then dispatches the pipeline as a
//! background task. The response carries the upload id immediately; per-row
//! outcomes are inspected later through the flagged list.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::header_translator::HeaderMapping;
use crate::services::pipeline::ProfilePipeline;
use crate::AppState;

/// Content types accepted for the staging pipeline.
const ALLOWED_CONTENT_TYPES: [&str; 3] = [
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// POST /admin/profiles/upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
}

/// POST /admin/profiles/upload
///
/// Staging pipeline: CSV or XLSX, full issue detection, clear-then-upsert
/// into the staging table.
pub async fn upload_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let (filename, content_type, bytes) = read_file_field(multipart).await?;

    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "content type '{}' not allowed",
            content_type
        )));
    }

    let upload_id = Uuid::new_v4();
    let submitted_at = Utc::now();
    tracing::info!(
        upload_id = %upload_id,
        filename = %filename,
        content_type = %content_type,
        size = bytes.len(),
        "Upload accepted"
    );

    let pipeline = ProfilePipeline::new(state.db.clone());
    spawn_pipeline(state, upload_id, move || async move {
        pipeline.run(&bytes, &filename, upload_id).await.map(|_| ())
    });

    Ok(Json(UploadResponse {
        upload_id,
        status: "processing".to_string(),
        submitted_at,
    }))
}

/// POST /admin/profiles/upload-csv
///
/// Legacy single-table pipeline: CSV only, required-field row check, email
/// issue rule, clean/flagged routed to separate tables.
pub async fn upload_csv_legacy(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let (filename, content_type, bytes) = read_file_field(multipart).await?;

    if content_type != "text/csv" {
        return Err(ApiError::UnsupportedMediaType(
            "only CSV files allowed".to_string(),
        ));
    }

    let upload_id = Uuid::new_v4();
    let submitted_at = Utc::now();
    tracing::info!(upload_id = %upload_id, filename = %filename, "Legacy upload accepted");

    let pipeline =
        ProfilePipeline::with_mapping(state.db.clone(), HeaderMapping::legacy_form());
    spawn_pipeline(state, upload_id, move || async move {
        pipeline
            .run_legacy(&bytes, &filename, upload_id)
            .await
            .map(|_| ())
    });

    Ok(Json(UploadResponse {
        upload_id,
        status: "processing".to_string(),
        submitted_at,
    }))
}

/// Pull the `file` field out of the multipart body.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<(String, String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("unreadable file field: {}", e)))?
            .to_vec();
        return Ok((filename, content_type, bytes));
    }

    Err(ApiError::BadRequest(
        "missing 'file' field in multipart body".to_string(),
    ))
}

/// Run a pipeline future in the background, recording failures on the app
/// state for the health endpoint.
fn spawn_pipeline<F, Fut>(state: AppState, upload_id: Uuid, run: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = crate::error::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match run().await {
            Ok(()) => {
                tracing::info!(upload_id = %upload_id, "Background pipeline completed");
            }
            Err(e) => {
                tracing::error!(upload_id = %upload_id, error = %e, "Background pipeline failed");
                *state.last_error.write().await = Some(e.to_string());
            }
        }
    });
}
