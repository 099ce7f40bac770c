//! Review endpoints for staged profiles
//!
//! Lists flagged profiles and accepts corrected edits; a successful edit
//! clears the row's issue list so it routes as clean on promotion.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::StagedProfile;
use crate::AppState;

/// One flagged profile, keyed by its identity key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedProfileResponse {
    pub profile_id: String,
    pub data: StagedProfile,
    pub issues: Vec<String>,
}

/// POST /admin/profiles/{profile_id}/edit request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFlaggedProfileRequest {
    pub profile_id: String,
    pub updated_data: StagedProfile,
    pub submitted_at: DateTime<Utc>,
}

/// POST /admin/profiles/{profile_id}/edit response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFlaggedProfileResponse {
    pub status: String,
    pub profile_id: String,
}

/// GET /admin/profiles/staged/summary response: staged names partitioned by
/// whether they already exist in the canonical store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedSummaryResponse {
    pub existing: Vec<String>,
    pub new: Vec<String>,
}

/// GET /admin/profiles/flagged
pub async fn list_flagged(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FlaggedProfileResponse>>> {
    let profiles = db::staging::list_flagged(&state.db).await?;
    Ok(Json(
        profiles
            .into_iter()
            .map(|profile| FlaggedProfileResponse {
                profile_id: profile.full_name.clone(),
                issues: profile.issues.clone(),
                data: profile,
            })
            .collect(),
    ))
}

/// GET /admin/profiles/flagged/legacy
pub async fn list_flagged_legacy(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FlaggedProfileResponse>>> {
    let profiles = db::flagged::list(&state.db).await?;
    Ok(Json(
        profiles
            .into_iter()
            .map(|profile| FlaggedProfileResponse {
                profile_id: profile.full_name.clone(),
                issues: profile.issues.clone(),
                data: profile,
            })
            .collect(),
    ))
}

/// POST /admin/profiles/{profile_id}/edit
///
/// The body must carry the same profile id as the path. On a successful
/// match the staged row is overwritten and its issues cleared.
pub async fn edit_flagged(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
    Json(request): Json<EditFlaggedProfileRequest>,
) -> ApiResult<Json<EditFlaggedProfileResponse>> {
    if profile_id != request.profile_id {
        return Err(ApiError::BadRequest("profile id mismatch".to_string()));
    }

    let mut updated = request.updated_data;
    updated.full_name = profile_id.clone();
    updated.last_modified = request.submitted_at;

    let matched = db::staging::apply_edit(&state.db, &updated).await?;
    if !matched {
        return Err(ApiError::NotFound(format!(
            "no staged profile for '{}'",
            profile_id
        )));
    }

    tracing::info!(identity_key = %profile_id, "Flagged profile edited, issues cleared");

    Ok(Json(EditFlaggedProfileResponse {
        status: "success".to_string(),
        profile_id,
    }))
}

/// GET /admin/profiles/staged/summary
pub async fn staged_summary(
    State(state): State<AppState>,
) -> ApiResult<Json<StagedSummaryResponse>> {
    let canonical: std::collections::HashSet<String> =
        db::profiles::all_names(&state.db).await?.into_iter().collect();
    let staged = db::staging::all_names(&state.db).await?;

    let (existing, new): (Vec<String>, Vec<String>) = staged
        .into_iter()
        .partition(|name| canonical.contains(name));

    Ok(Json(StagedSummaryResponse { existing, new }))
}
