//! Batch pipeline orchestration
//!
//! Drives one uploaded spreadsheet through read → translate → clean →
//! deduplicate → detect/fix → store. Format and decode failures abort the
//! batch before any store mutation; row-level defects never do.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{Error, Result};
use crate::models::{CanonicalProfile, DuplicateRecord, RawRecord, StagedProfile};
use crate::services::deduplicator::dedupe;
use crate::services::field_normalizer::{
    capitalise_first_word, clean_bachelor_course, clean_text, split_bullet_points, title_case,
};
use crate::services::header_translator::HeaderMapping;
use crate::services::issue_detector::{detect_and_fix, detect_email_issue};
use crate::services::sheet_reader::read_records;

/// Raw-header columns the legacy form treats as mandatory per row.
const LEGACY_REQUIRED: [&str; 3] = [
    "Full name (as per NRIC)",
    "What course are you from?",
    "Which intake batch are you from?",
];

const LEGACY_WRITEUP_PREFIX: &str = "Self write-up";

/// Outcome counts for one processed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub skipped: usize,
    pub clean: usize,
    pub flagged: usize,
    pub duplicates: Vec<DuplicateRecord>,
}

/// Orchestrates the ingest pipeline for uploaded batches.
pub struct ProfilePipeline {
    db: SqlitePool,
    mapping: HeaderMapping,
}

impl ProfilePipeline {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            mapping: HeaderMapping::current_form(),
        }
    }

    pub fn with_mapping(db: SqlitePool, mapping: HeaderMapping) -> Self {
        Self { db, mapping }
    }

    /// Run the staging pipeline on one uploaded batch.
    ///
    /// Surviving rows are stamped, issue-checked and staged; prior staged
    /// rows for the batch's identity keys are deleted first so the batch
    /// fully replaces them.
    pub async fn run(&self, bytes: &[u8], filename: &str, upload_id: Uuid) -> Result<BatchSummary> {
        let rows = read_records(bytes, filename)?;
        let total_rows = rows.len();
        tracing::info!(
            upload_id = %upload_id,
            rows = total_rows,
            mapping = self.mapping.name(),
            "Batch read"
        );

        let profiles: Vec<CanonicalProfile> = rows
            .iter()
            .filter_map(|row| {
                let translated = self.mapping.translate(row);
                self.mapping.into_profile(&translated).map(clean_profile)
            })
            .collect();
        let skipped = total_rows - profiles.len();

        let outcome = dedupe(profiles);
        for dup in &outcome.duplicates {
            tracing::info!(
                upload_id = %upload_id,
                identity_key = %dup.identity_key,
                dropped_row = dup.dropped_row,
                kept_row = dup.kept_row,
                "Dropped duplicate row"
            );
        }

        let now = Utc::now();
        let staged: Vec<StagedProfile> = outcome
            .survivors
            .into_iter()
            .map(|(key, mut profile)| {
                profile.full_name = key;
                detect_and_fix(profile, now)
            })
            .collect();

        let keys: Vec<String> = staged.iter().map(|p| p.full_name.clone()).collect();

        // Delete must land before the upserts; a corrected resubmission may
        // not leave stale flagged rows behind.
        db::staging::delete_by_names(&self.db, &keys).await?;
        let mut clean = 0;
        let mut flagged = 0;
        for profile in &staged {
            db::staging::upsert(&self.db, profile).await?;
            if profile.is_clean() {
                clean += 1;
            } else {
                flagged += 1;
            }
        }

        let summary = BatchSummary {
            total_rows,
            skipped,
            clean,
            flagged,
            duplicates: outcome.duplicates,
        };
        tracing::info!(
            upload_id = %upload_id,
            clean,
            flagged,
            skipped,
            duplicates = summary.duplicates.len(),
            "Batch staged"
        );
        Ok(summary)
    }

    /// Run the legacy single-table CSV pipeline. Construct the pipeline with
    /// [`HeaderMapping::legacy_form`] for this path.
    ///
    /// Rows missing any required column are skipped, never batch-fatal; the
    /// only issue rule is the email check; clean rows go straight into the
    /// canonical table, flagged rows into `flagged_profiles`. No staging
    /// replace semantics.
    pub async fn run_legacy(
        &self,
        bytes: &[u8],
        filename: &str,
        upload_id: Uuid,
    ) -> Result<BatchSummary> {
        if !filename.to_lowercase().ends_with(".csv") {
            return Err(Error::UnsupportedFormat(format!(
                "legacy pipeline accepts CSV only, got '{}'",
                filename
            )));
        }

        let rows = read_records(bytes, filename)?;
        let total_rows = rows.len();

        let writeup_column = rows
            .first()
            .and_then(|row| {
                row.entries()
                    .iter()
                    .map(|(header, _)| header.as_str())
                    .find(|header| header.starts_with(LEGACY_WRITEUP_PREFIX))
            })
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidInput("no 'Self write-up' column found in CSV".to_string())
            })?;

        let now = Utc::now();
        let mut clean = 0;
        let mut flagged = 0;
        let mut skipped = 0;

        for row in &rows {
            if !legacy_required_present(row, &writeup_column) {
                skipped += 1;
                continue;
            }

            let translated = self.mapping.translate(row);
            let Some(profile) = self.mapping.into_profile(&translated) else {
                skipped += 1;
                continue;
            };
            let profile = clean_profile(profile);

            let mut staged = legacy_staged(profile, now);
            staged.full_name = title_case(&staged.full_name);

            if staged.is_clean() {
                db::profiles::upsert(&self.db, &staged).await?;
                clean += 1;
            } else {
                db::flagged::upsert(&self.db, &staged).await?;
                flagged += 1;
            }
        }

        tracing::info!(
            upload_id = %upload_id,
            clean,
            flagged,
            skipped,
            "Legacy batch processed"
        );
        Ok(BatchSummary {
            total_rows,
            skipped,
            clean,
            flagged,
            duplicates: Vec::new(),
        })
    }
}

/// Clean every field of a translated profile: text cleaning everywhere, the
/// course-specific cleanup on top for the bachelor course.
fn clean_profile(mut profile: CanonicalProfile) -> CanonicalProfile {
    let clean = |field: Option<String>| field.as_deref().and_then(clean_text);

    profile.bachelor_course = clean(profile.bachelor_course)
        .map(|course| clean_bachelor_course(&course))
        .filter(|course| !course.is_empty());
    profile.masters_course = clean(profile.masters_course);
    profile.ddp_or_minor = clean(profile.ddp_or_minor);
    profile.intake_batch = clean(profile.intake_batch);
    profile.overseas_experience = clean(profile.overseas_experience);
    profile.self_writeup = clean(profile.self_writeup);
    profile.picture_url = clean(profile.picture_url);
    profile.notable_achievements = clean(profile.notable_achievements);
    profile.hobbies = clean(profile.hobbies);
    profile.linkedin_link = clean(profile.linkedin_link);
    profile.instagram_link = clean(profile.instagram_link);
    profile.github_link = clean(profile.github_link);
    profile.personal_email = clean(profile.personal_email);
    profile
}

fn legacy_required_present(row: &RawRecord, writeup_column: &str) -> bool {
    LEGACY_REQUIRED
        .iter()
        .all(|column| row.get_non_empty(column).is_some())
        && row.get_non_empty(writeup_column).is_some()
}

/// Legacy detection: split the list fields for the typed model, but the only
/// issue rule is the email check. No link repair here.
fn legacy_staged(profile: CanonicalProfile, now: chrono::DateTime<Utc>) -> StagedProfile {
    let split = |text: &Option<String>| {
        capitalise_first_word(split_bullet_points(text.as_deref().unwrap_or("")))
    };

    let issues: Vec<String> = detect_email_issue(profile.personal_email.as_deref())
        .into_iter()
        .collect();

    StagedProfile {
        notable_achievements: split(&profile.notable_achievements),
        hobbies: split(&profile.hobbies),
        full_name: profile.full_name,
        bachelor_course: profile.bachelor_course,
        masters_course: profile.masters_course,
        ddp_or_minor: profile.ddp_or_minor,
        intake_batch: profile.intake_batch,
        overseas_experience: profile.overseas_experience,
        self_writeup: profile.self_writeup,
        picture_url: profile.picture_url,
        linkedin_link: profile.linkedin_link,
        instagram_link: profile.instagram_link,
        github_link: profile.github_link,
        personal_email: profile.personal_email,
        issues,
        last_modified: now,
    }
}
