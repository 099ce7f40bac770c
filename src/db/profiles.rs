//! Canonical profile table operations
//!
//! The promoted store. The legacy pipeline upserts clean rows here directly;
//! the staging pipeline only reads it to compare staged names against
//! already-promoted ones.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StagedProfile;

use super::upsert_profile;

const TABLE: &str = "profiles";

pub async fn upsert(pool: &SqlitePool, profile: &StagedProfile) -> Result<()> {
    upsert_profile(pool, TABLE, profile, false).await
}

/// All identity keys in the canonical store.
pub async fn all_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT full_name FROM profiles ORDER BY full_name")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
