//! Staging table operations
//!
//! Holds the latest batch's clean and flagged profiles pending human review.
//! A batch replaces prior staged rows for the identity keys it contains:
//! delete-by-key-set first, then upsert the new set.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StagedProfile;

use super::{profile_from_row, upsert_profile, PROFILE_COLUMNS};

const TABLE: &str = "staged_profiles";

/// Delete staged rows for the given identity keys. Must complete before the
/// batch's upserts so a corrected resubmission cannot leave stale rows.
pub async fn delete_by_names(pool: &SqlitePool, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!("DELETE FROM {TABLE} WHERE full_name IN ({placeholders})");
    let mut query = sqlx::query(&sql);
    for name in names {
        query = query.bind(name);
    }
    let deleted = query.execute(pool).await?.rows_affected();
    tracing::debug!(deleted, "Cleared prior staged rows");
    Ok(())
}

pub async fn upsert(pool: &SqlitePool, profile: &StagedProfile) -> Result<()> {
    upsert_profile(pool, TABLE, profile, true).await
}

/// Staged profiles with a non-empty issue list, for the review surface.
pub async fn list_flagged(pool: &SqlitePool) -> Result<Vec<StagedProfile>> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS}, issues FROM {TABLE} WHERE issues != '[]' ORDER BY full_name"
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter()
        .map(|row| profile_from_row(row, true).map_err(Into::into))
        .collect()
}

pub async fn get(pool: &SqlitePool, full_name: &str) -> Result<Option<StagedProfile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS}, issues FROM {TABLE} WHERE full_name = ?");
    let row = sqlx::query(&sql).bind(full_name).fetch_optional(pool).await?;
    row.as_ref()
        .map(|row| profile_from_row(row, true).map_err(Into::into))
        .transpose()
}

/// Apply a review edit: overwrite the staged row's data and clear its
/// issues. Returns false when no staged row matches the identity key.
pub async fn apply_edit(pool: &SqlitePool, profile: &StagedProfile) -> Result<bool> {
    let existing = get(pool, &profile.full_name).await?;
    if existing.is_none() {
        return Ok(false);
    }

    let mut cleared = profile.clone();
    cleared.issues = Vec::new();
    upsert(pool, &cleared).await?;
    Ok(true)
}

/// All identity keys currently staged.
pub async fn all_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as(&format!("SELECT full_name FROM {TABLE} ORDER BY full_name"))
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
