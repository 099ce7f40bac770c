//! Legacy flagged-profile table operations
//!
//! The first form version routed rows with issues into a dedicated table
//! instead of the staging area. Kept for the legacy CSV-only pipeline.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StagedProfile;

use super::{profile_from_row, upsert_profile, PROFILE_COLUMNS};

const TABLE: &str = "flagged_profiles";

pub async fn upsert(pool: &SqlitePool, profile: &StagedProfile) -> Result<()> {
    upsert_profile(pool, TABLE, profile, true).await
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<StagedProfile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS}, issues FROM {TABLE} ORDER BY full_name");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter()
        .map(|row| profile_from_row(row, true).map_err(Into::into))
        .collect()
}
