//! Database access for census-ingest
//!
//! One SQLite database with three logical tables, all keyed by the
//! title-cased full name: `profiles` (canonical store), `staged_profiles`
//! (latest batch, clean and flagged, pending review) and `flagged_profiles`
//! (legacy single-table routing).

pub mod flagged;
pub mod profiles;
pub mod staging;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::StagedProfile;

/// Columns shared by all three tables, minus the `issues` column.
pub(crate) const PROFILE_COLUMNS: &str = "full_name, bachelor_course, masters_course, ddp_or_minor, \
     intake_batch, overseas_experience, self_writeup, picture_url, \
     notable_achievements, hobbies, linkedin_link, instagram_link, \
     github_link, personal_email, last_modified";

/// Initialize database connection pool and bootstrap tables.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the profile tables if they don't exist.
///
/// List-valued columns (`notable_achievements`, `hobbies`, `issues`) hold
/// JSON arrays as TEXT.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    for (table, with_issues) in [
        ("profiles", false),
        ("staged_profiles", true),
        ("flagged_profiles", true),
    ] {
        let issues_column = if with_issues {
            "issues TEXT NOT NULL DEFAULT '[]',"
        } else {
            ""
        };
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                full_name TEXT PRIMARY KEY,
                bachelor_course TEXT,
                masters_course TEXT,
                ddp_or_minor TEXT,
                intake_batch TEXT,
                overseas_experience TEXT,
                self_writeup TEXT,
                picture_url TEXT,
                notable_achievements TEXT NOT NULL DEFAULT '[]',
                hobbies TEXT NOT NULL DEFAULT '[]',
                linkedin_link TEXT,
                instagram_link TEXT,
                github_link TEXT,
                personal_email TEXT,
                {issues_column}
                last_modified TEXT NOT NULL
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    tracing::info!("Database tables initialized (profiles, staged_profiles, flagged_profiles)");

    Ok(())
}

/// Upsert one profile into `table` (last-write-wins per identity key).
pub(crate) async fn upsert_profile(
    pool: &SqlitePool,
    table: &str,
    profile: &StagedProfile,
    with_issues: bool,
) -> Result<()> {
    let (issues_column, issues_placeholder, issues_update) = if with_issues {
        (", issues", ", ?", ", issues = excluded.issues")
    } else {
        ("", "", "")
    };

    let sql = format!(
        r#"
        INSERT INTO {table} ({PROFILE_COLUMNS}{issues_column})
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?{issues_placeholder})
        ON CONFLICT(full_name) DO UPDATE SET
            bachelor_course = excluded.bachelor_course,
            masters_course = excluded.masters_course,
            ddp_or_minor = excluded.ddp_or_minor,
            intake_batch = excluded.intake_batch,
            overseas_experience = excluded.overseas_experience,
            self_writeup = excluded.self_writeup,
            picture_url = excluded.picture_url,
            notable_achievements = excluded.notable_achievements,
            hobbies = excluded.hobbies,
            linkedin_link = excluded.linkedin_link,
            instagram_link = excluded.instagram_link,
            github_link = excluded.github_link,
            personal_email = excluded.personal_email,
            last_modified = excluded.last_modified{issues_update}
        "#
    );

    let achievements = serde_json::to_string(&profile.notable_achievements)
        .map_err(|e| Error::Internal(format!("encode achievements: {}", e)))?;
    let hobbies = serde_json::to_string(&profile.hobbies)
        .map_err(|e| Error::Internal(format!("encode hobbies: {}", e)))?;

    let mut query = sqlx::query(&sql)
        .bind(&profile.full_name)
        .bind(&profile.bachelor_course)
        .bind(&profile.masters_course)
        .bind(&profile.ddp_or_minor)
        .bind(&profile.intake_batch)
        .bind(&profile.overseas_experience)
        .bind(&profile.self_writeup)
        .bind(&profile.picture_url)
        .bind(achievements)
        .bind(hobbies)
        .bind(&profile.linkedin_link)
        .bind(&profile.instagram_link)
        .bind(&profile.github_link)
        .bind(&profile.personal_email)
        .bind(profile.last_modified);

    if with_issues {
        let issues = serde_json::to_string(&profile.issues)
            .map_err(|e| Error::Internal(format!("encode issues: {}", e)))?;
        query = query.bind(issues);
    }

    query.execute(pool).await.map_err(Error::from)?;
    Ok(())
}

/// Decode one row into a `StagedProfile`. Tables without an `issues` column
/// yield an empty issue list.
pub(crate) fn profile_from_row(row: &SqliteRow, with_issues: bool) -> sqlx::Result<StagedProfile> {
    let notable_achievements: String = row.try_get("notable_achievements")?;
    let hobbies: String = row.try_get("hobbies")?;
    let issues: String = if with_issues {
        row.try_get("issues")?
    } else {
        "[]".to_string()
    };
    let last_modified: DateTime<Utc> = row.try_get("last_modified")?;

    Ok(StagedProfile {
        full_name: row.try_get("full_name")?,
        bachelor_course: row.try_get("bachelor_course")?,
        masters_course: row.try_get("masters_course")?,
        ddp_or_minor: row.try_get("ddp_or_minor")?,
        intake_batch: row.try_get("intake_batch")?,
        overseas_experience: row.try_get("overseas_experience")?,
        self_writeup: row.try_get("self_writeup")?,
        picture_url: row.try_get("picture_url")?,
        notable_achievements: serde_json::from_str(&notable_achievements).unwrap_or_default(),
        hobbies: serde_json::from_str(&hobbies).unwrap_or_default(),
        linkedin_link: row.try_get("linkedin_link")?,
        instagram_link: row.try_get("instagram_link")?,
        github_link: row.try_get("github_link")?,
        personal_email: row.try_get("personal_email")?,
        issues: serde_json::from_str(&issues).unwrap_or_default(),
        last_modified,
    })
}
