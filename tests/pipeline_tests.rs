//! End-to-end pipeline tests against an in-memory database

use sqlx::SqlitePool;
use uuid::Uuid;

use census_ingest::db;
use census_ingest::error::Error;
use census_ingest::models::StagedProfile;
use census_ingest::services::pipeline::ProfilePipeline;

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

const NAME: &str = "Full Name (as per NRIC)";
const MAJOR: &str = "What is your major? (e.g. MPE - Computer Engineering)";
const BATCH: &str = "Which intake batch are you from?";
const HOBBIES: &str = "Any interests/hobbies? (Up to 3!) Example on the right";
const LINKEDIN: &str = "LinkedIn Link (if any)";

/// Build a CSV with current-form headers from (name, major, batch, hobbies,
/// linkedin) tuples.
fn csv_batch(rows: &[(&str, &str, &str, &str, &str)]) -> Vec<u8> {
    let mut out = format!("{NAME},{MAJOR},{BATCH},{HOBBIES},{LINKEDIN}\n");
    for (name, major, batch, hobbies, linkedin) in rows {
        out.push_str(&format!(
            "{name},{major},{batch},\"{hobbies}\",{linkedin}\n"
        ));
    }
    out.into_bytes()
}

async fn staged_rows(pool: &SqlitePool) -> Vec<StagedProfile> {
    let mut rows = Vec::new();
    for name in db::staging::all_names(pool).await.unwrap() {
        rows.push(db::staging::get(pool, &name).await.unwrap().unwrap());
    }
    rows
}

#[tokio::test]
async fn batch_is_partitioned_into_clean_and_flagged() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let bytes = csv_batch(&[
        (
            "Jane Tan",
            "MPE - Computer Engineering;",
            "AY23/24 (August)",
            "Chess; Running",
            "https://www.linkedin.com/in/janetan",
        ),
        (
            "Bob Lim",
            "Engineering",
            "AY22/23",
            "Climbing",
            "boblim",
        ),
    ]);

    let summary = pipeline
        .run(&bytes, "batch.csv", Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(summary.clean, 1);
    assert_eq!(summary.flagged, 1);
    assert_eq!(summary.skipped, 0);

    let jane = db::staging::get(&pool, "Jane Tan").await.unwrap().unwrap();
    assert!(jane.is_clean());
    assert_eq!(jane.bachelor_course.as_deref(), Some("Computer Engineering"));
    assert_eq!(jane.intake_batch.as_deref(), Some("AY23/24"));
    assert_eq!(jane.hobbies, vec!["Chess", "Running"]);

    let bob = db::staging::get(&pool, "Bob Lim").await.unwrap().unwrap();
    assert_eq!(bob.issues, vec!["Linkedin Link appears invalid"]);
    // Repaired, stored, and still flagged.
    assert_eq!(
        bob.linkedin_link.as_deref(),
        Some("https://linkedin.com/in/boblim")
    );
}

#[tokio::test]
async fn duplicate_names_collapse_to_last_row() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let bytes = csv_batch(&[
        (
            "Jane Tan",
            "Engineering",
            "AY22/23",
            "Chess",
            "https://linkedin.com/in/old",
        ),
        (
            "jane tan ",
            "MPE - Computer Engineering",
            "AY23/24",
            "Running",
            "https://linkedin.com/in/new",
        ),
    ]);

    let summary = pipeline
        .run(&bytes, "batch.csv", Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(summary.duplicates.len(), 1);
    assert_eq!(summary.duplicates[0].identity_key, "Jane Tan");
    assert_eq!(summary.duplicates[0].dropped_row, 0);
    assert_eq!(summary.duplicates[0].kept_row, 1);

    let rows = staged_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].full_name, "Jane Tan");
    assert_eq!(rows[0].bachelor_course.as_deref(), Some("Computer Engineering"));
    assert_eq!(rows[0].intake_batch.as_deref(), Some("AY23/24"));
}

#[tokio::test]
async fn rows_without_full_name_are_excluded() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let bytes = csv_batch(&[
        ("", "Engineering", "AY22/23", "Chess", ""),
        ("   ", "Engineering", "AY22/23", "Chess", ""),
        ("Jane Tan", "Engineering", "AY22/23", "Chess", ""),
    ]);

    let summary = pipeline
        .run(&bytes, "batch.csv", Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(summary.skipped, 2);

    let rows = staged_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].full_name, "Jane Tan");
}

#[tokio::test]
async fn rerunning_a_batch_is_idempotent() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let bytes = csv_batch(&[
        ("Jane Tan", "Engineering", "AY22/23", "Chess", "janedoe"),
        ("Bob Lim", "Engineering", "AY22/23", "Running", ""),
    ]);

    pipeline
        .run(&bytes, "batch.csv", Uuid::new_v4())
        .await
        .unwrap();
    let first = staged_rows(&pool).await;

    pipeline
        .run(&bytes, "batch.csv", Uuid::new_v4())
        .await
        .unwrap();
    let second = staged_rows(&pool).await;

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        // Identical staged state modulo the batch timestamp.
        let mut a = a.clone();
        let mut b = b.clone();
        a.last_modified = b.last_modified;
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn corrected_resubmission_replaces_stale_flagged_row() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let bad = csv_batch(&[("Jane Tan", "Engineering", "AY22/23", "Chess", "janedoe")]);
    pipeline.run(&bad, "batch.csv", Uuid::new_v4()).await.unwrap();
    assert_eq!(db::staging::list_flagged(&pool).await.unwrap().len(), 1);

    let good = csv_batch(&[(
        "Jane Tan",
        "Engineering",
        "AY22/23",
        "Chess",
        "https://linkedin.com/in/janedoe",
    )]);
    pipeline.run(&good, "batch.csv", Uuid::new_v4()).await.unwrap();

    assert!(db::staging::list_flagged(&pool).await.unwrap().is_empty());
    let jane = db::staging::get(&pool, "Jane Tan").await.unwrap().unwrap();
    assert!(jane.is_clean());
}

#[tokio::test]
async fn unsupported_format_aborts_before_store_mutation() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let err = pipeline
        .run(b"{}", "batch.json", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert!(staged_rows(&pool).await.is_empty());
}

#[tokio::test]
async fn review_edit_clears_issues() {
    let pool = setup_test_db().await;
    let pipeline = ProfilePipeline::new(pool.clone());

    let bytes = csv_batch(&[("Jane Tan", "Engineering", "AY22/23", "Chess", "janedoe")]);
    pipeline.run(&bytes, "batch.csv", Uuid::new_v4()).await.unwrap();

    let mut edited = db::staging::get(&pool, "Jane Tan").await.unwrap().unwrap();
    edited.linkedin_link = Some("https://linkedin.com/in/janedoe".to_string());

    let matched = db::staging::apply_edit(&pool, &edited).await.unwrap();
    assert!(matched);

    let jane = db::staging::get(&pool, "Jane Tan").await.unwrap().unwrap();
    assert!(jane.is_clean());
    assert_eq!(
        jane.linkedin_link.as_deref(),
        Some("https://linkedin.com/in/janedoe")
    );

    // Editing an unknown key matches nothing.
    edited.full_name = "Nobody Here".to_string();
    assert!(!db::staging::apply_edit(&pool, &edited).await.unwrap());
}

mod legacy {
    use super::*;
    use census_ingest::services::header_translator::HeaderMapping;

    fn legacy_pipeline(pool: &SqlitePool) -> ProfilePipeline {
        ProfilePipeline::with_mapping(pool.clone(), HeaderMapping::legacy_form())
    }

    const LEGACY_NAME: &str = "Full name (as per NRIC)";
    const LEGACY_COURSE: &str = "What course are you from?";
    const LEGACY_BATCH: &str = "Which intake batch are you from?";
    const LEGACY_WRITEUP: &str = "Self write-up (e.g. Yuxuan's self write-up below). It'll be publicly available so you can also use it as a personal showcase page! (Limit: 200 words)";
    const LEGACY_EMAIL: &str = "Personal Email";

    fn legacy_csv(rows: &[(&str, &str, &str, &str, &str)]) -> Vec<u8> {
        let mut out = format!(
            "{LEGACY_NAME},{LEGACY_COURSE},{LEGACY_BATCH},\"{LEGACY_WRITEUP}\",{LEGACY_EMAIL}\n"
        );
        for (name, course, batch, writeup, email) in rows {
            out.push_str(&format!("{name},{course},{batch},{writeup},{email}\n"));
        }
        out.into_bytes()
    }

    #[tokio::test]
    async fn legacy_routes_by_email_rule() {
        let pool = setup_test_db().await;
        let pipeline = legacy_pipeline(&pool);

        let bytes = legacy_csv(&[
            ("Jane Tan", "Engineering", "AY22/23", "Hello!", "jane@example.com"),
            ("Bob Lim", "Engineering", "AY22/23", "Hi!", "not-an-email"),
        ]);

        let summary = pipeline
            .run_legacy(&bytes, "batch.csv", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(summary.clean, 1);
        assert_eq!(summary.flagged, 1);

        assert_eq!(db::profiles::all_names(&pool).await.unwrap(), vec!["Jane Tan"]);
        let flagged = db::flagged::list(&pool).await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].full_name, "Bob Lim");
        assert_eq!(flagged[0].issues, vec!["Invalid or missing email"]);
    }

    #[tokio::test]
    async fn legacy_skips_rows_missing_required_columns() {
        let pool = setup_test_db().await;
        let pipeline = legacy_pipeline(&pool);

        let bytes = legacy_csv(&[
            ("Jane Tan", "", "AY22/23", "Hello!", "jane@example.com"),
            ("Bob Lim", "Engineering", "AY22/23", "", "bob@example.com"),
            ("Alice Ng", "Engineering", "AY22/23", "Hey!", "alice@example.com"),
        ]);

        let summary = pipeline
            .run_legacy(&bytes, "batch.csv", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.clean, 1);
        assert_eq!(db::profiles::all_names(&pool).await.unwrap(), vec!["Alice Ng"]);
    }

    #[tokio::test]
    async fn legacy_rejects_non_csv() {
        let pool = setup_test_db().await;
        let pipeline = legacy_pipeline(&pool);

        let err = pipeline
            .run_legacy(b"", "batch.xlsx", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
