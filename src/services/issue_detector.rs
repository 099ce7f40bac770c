//! Structural issue detection and best-effort repair
//!
//! One pass over a cleaned profile produces both the ordered issue list and
//! the fixed record. Fixing and flagging are deliberately coupled: a field
//! that gets repaired keeps its issue entry so a reviewer still sees it.
//!
//! Issue order is deterministic: notable achievements, hobbies, then the
//! social links in linkedin/instagram/github order.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CanonicalProfile, StagedProfile};
use crate::services::field_normalizer::{capitalise_first_word, split_bullet_points};

/// One social-link field: display label, accepted URL shape, and the
/// canonical root used when repairing a bare handle.
struct SocialDomain {
    label: &'static str,
    pattern: &'static Lazy<Regex>,
    root: &'static str,
}

static LINKEDIN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?linkedin\.com/.+").unwrap());
static INSTAGRAM_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?instagram\.com/.+").unwrap());
static GITHUB_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?github\.com/.+").unwrap());

static LINKEDIN: SocialDomain = SocialDomain {
    label: "Linkedin Link",
    pattern: &LINKEDIN_URL,
    root: "https://linkedin.com/in/",
};
static INSTAGRAM: SocialDomain = SocialDomain {
    label: "Instagram Link",
    pattern: &INSTAGRAM_URL,
    root: "https://instagram.com/",
};
static GITHUB: SocialDomain = SocialDomain {
    label: "Github Link",
    pattern: &GITHUB_URL,
    root: "https://github.com/",
};

/// Inspect a cleaned profile, producing the staged record and its issues in
/// a single pass.
pub fn detect_and_fix(profile: CanonicalProfile, last_modified: DateTime<Utc>) -> StagedProfile {
    let mut issues = Vec::new();

    let notable_achievements = split_list_field(
        profile.notable_achievements.as_deref(),
        "Notable Achievements",
        &mut issues,
    );
    let hobbies = split_list_field(profile.hobbies.as_deref(), "Hobbies", &mut issues);

    let linkedin_link = check_social_link(profile.linkedin_link, &LINKEDIN, &mut issues);
    let instagram_link = check_social_link(profile.instagram_link, &INSTAGRAM, &mut issues);
    let github_link = check_social_link(profile.github_link, &GITHUB, &mut issues);

    StagedProfile {
        full_name: profile.full_name,
        bachelor_course: profile.bachelor_course,
        masters_course: profile.masters_course,
        ddp_or_minor: profile.ddp_or_minor,
        intake_batch: profile.intake_batch,
        overseas_experience: profile.overseas_experience,
        self_writeup: profile.self_writeup,
        picture_url: profile.picture_url,
        notable_achievements,
        hobbies,
        linkedin_link,
        instagram_link,
        github_link,
        personal_email: profile.personal_email,
        issues,
        last_modified,
    }
}

/// Legacy single-table rule: the only check the first form version ran.
pub fn detect_email_issue(email: Option<&str>) -> Option<String> {
    let email = email.unwrap_or("");
    if email.trim().is_empty() || !email.contains('@') {
        Some("Invalid or missing email".to_string())
    } else {
        None
    }
}

/// Split free text into a capitalised bullet list, flagging sources that
/// produce nothing. The (possibly empty) list is stored either way.
fn split_list_field(
    source: Option<&str>,
    label: &str,
    issues: &mut Vec<String>,
) -> Vec<String> {
    let Some(text) = source else {
        return Vec::new();
    };

    let points = capitalise_first_word(split_bullet_points(text));
    if points.is_empty() && !text.trim().is_empty() {
        issues.push(format!("{} format is invalid", label));
    }
    points
}

/// Validate a social link against its domain pattern, attempting one repair
/// on failure. The repaired value replaces the original without
/// re-validation, and the issue stays recorded either way.
fn check_social_link(
    value: Option<String>,
    domain: &SocialDomain,
    issues: &mut Vec<String>,
) -> Option<String> {
    let value = value?;
    if value.trim().is_empty() {
        return None;
    }
    if domain.pattern.is_match(&value) {
        return Some(value);
    }

    issues.push(format!("{} appears invalid", domain.label));

    let repaired = if !value.contains('/') {
        // A bare handle, possibly with a leading '@'.
        format!("{}{}", domain.root, value.trim_start_matches('@'))
    } else if !value.starts_with("http") {
        // A path without a scheme.
        format!("https://{}", value.trim_start_matches('/'))
    } else {
        value
    };

    tracing::debug!(label = domain.label, repaired = %repaired, "Repaired social link");
    Some(repaired)
}
