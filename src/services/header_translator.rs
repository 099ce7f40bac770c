//! Header translation for raw spreadsheet rows
//!
//! Historical form versions exported the same question under different
//! column titles. A `HeaderMapping` is the static lookup table for one form
//! generation: raw headers rename to canonical field names, unknown headers
//! pass through unchanged, and fields that appear under several legacy
//! headers resolve through an ordered candidate list (first non-empty wins).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CanonicalProfile, RawRecord};
use crate::services::field_normalizer::clean_text;

/// Intake batches reduce to the academic-year token, e.g. "AY23/24".
static ACADEMIC_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"AY\d{2}/\d{2}").unwrap());

/// A canonical field sourced from several legacy headers, tried in priority
/// order against the raw row.
struct CandidateRule {
    canonical: &'static str,
    sources: &'static [&'static str],
}

/// Static header lookup table for one form generation.
pub struct HeaderMapping {
    name: &'static str,
    renames: &'static [(&'static str, &'static str)],
    candidates: &'static [CandidateRule],
}

/// Current form export. Carries a dedicated major question (with the faculty
/// code baked into the example) alongside the older generic course question.
const CURRENT_RENAMES: &[(&str, &str)] = &[
    ("Full Name (as per NRIC)", "full_name"),
    ("Full name (as per NRIC)", "full_name"),
    ("What is your major? (e.g. MPE - Computer Engineering)", "bachelor_course"),
    ("What course are you from?", "bachelor_course"),
    ("If you are doing Masters, what is your masters course?", "masters_course"),
    (
        "If you are taking any DDP, Double Major or Minor, please specify: (eg. DDP with Business Administration)",
        "ddp_or_minor",
    ),
    // Mojibake variant seen in older exports of the same question.
    (
        "If you are taking any DDP, Double Major or Minor, please specify: (eg. DDP with Business Administration)\u{ca}",
        "ddp_or_minor",
    ),
    ("Which intake batch are you from?", "intake_batch"),
    (
        "(If applicable) Where did you go (or will be going) for SEP/summer/winter (school), NOC (location and company), internships (company)",
        "overseas_experience",
    ),
    (
        "Self write-up (e.g. Yuxuan's self write-up below). It'll be publicly available so you can also use it as a personal showcase page! (Limit: 200 words)",
        "self_writeup",
    ),
    ("Upload a picture of yourself! Example on the right", "picture_url"),
    ("Notable Achievements (if any, up to 3!) Example on the right", "notable_achievements"),
    ("Any interests/hobbies? (Up to 3!) Example on the right", "hobbies"),
    ("LinkedIn Link (if any)", "linkedin_link"),
    ("Instagram Link (if any)", "instagram_link"),
    ("GitHub Link (if any)", "github_link"),
    ("Personal Email", "personal_email"),
];

/// The specific major question outranks the generic course question when a
/// row answers both.
const CURRENT_CANDIDATES: &[CandidateRule] = &[CandidateRule {
    canonical: "bachelor_course",
    sources: &[
        "What is your major? (e.g. MPE - Computer Engineering)",
        "What course are you from?",
    ],
}];

/// Legacy single-table form: no GitHub question, generic course question only.
const LEGACY_RENAMES: &[(&str, &str)] = &[
    ("Full name (as per NRIC)", "full_name"),
    ("What course are you from?", "bachelor_course"),
    ("If you are doing Masters, what is your masters course?", "masters_course"),
    (
        "If you are taking any DDP, Double Major or Minor, please specify: (eg. DDP with Business Administration)\u{ca}",
        "ddp_or_minor",
    ),
    ("Which intake batch are you from?", "intake_batch"),
    (
        "(If applicable) Where did you go (or will be going) for SEP/summer/winter (school), NOC (location and company), internships (company)",
        "overseas_experience",
    ),
    (
        "Self write-up (e.g. Yuxuan's self write-up below). It'll be publicly available so you can also use it as a personal showcase page! (Limit: 200 words)",
        "self_writeup",
    ),
    ("Upload a picture of yourself! Example on the right", "picture_url"),
    ("Notable Achievements (if any, up to 3!) Example on the right", "notable_achievements"),
    ("Any interests/hobbies? (Up to 3!) Example on the right", "hobbies"),
    ("LinkedIn Link (if any)", "linkedin_link"),
    ("Instagram Link (if any)", "instagram_link"),
    ("Personal Email", "personal_email"),
];

const LEGACY_CANDIDATES: &[CandidateRule] = &[];

impl HeaderMapping {
    /// Mapping for the current form generation.
    pub fn current_form() -> Self {
        Self {
            name: "current",
            renames: CURRENT_RENAMES,
            candidates: CURRENT_CANDIDATES,
        }
    }

    /// Mapping for the legacy single-table form.
    pub fn legacy_form() -> Self {
        Self {
            name: "legacy",
            renames: LEGACY_RENAMES,
            candidates: LEGACY_CANDIDATES,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn rename(&self, header: &str) -> String {
        self.renames
            .iter()
            .find(|(raw, _)| *raw == header)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| header.to_string())
    }

    /// Translate a raw row's headers to canonical field names.
    ///
    /// Entry order is preserved, so when several input headers land on the
    /// same canonical name the later cell wins at lookup time. Candidate
    /// rules append their resolved value last for the same reason, and
    /// `intake_batch` is reduced to its academic-year token when one is
    /// present.
    pub fn translate(&self, raw: &RawRecord) -> RawRecord {
        let mut translated = raw.map_headers(|header| self.rename(header));

        for rule in self.candidates {
            let resolved = rule
                .sources
                .iter()
                .find_map(|source| raw.get_non_empty(source));
            if let Some(value) = resolved {
                translated.push(rule.canonical, value.to_string());
            }
        }

        let reduced_batch = translated
            .get_non_empty("intake_batch")
            .and_then(|batch| ACADEMIC_YEAR.find(batch))
            .map(|found| found.as_str().to_string());
        if let Some(batch) = reduced_batch {
            translated.push("intake_batch", batch);
        }

        translated
    }

    /// Build the typed profile from a translated row.
    ///
    /// Returns `None` when the row has no usable full name; such rows are
    /// excluded from both the clean and flagged outputs.
    pub fn into_profile(&self, translated: &RawRecord) -> Option<CanonicalProfile> {
        let full_name = translated
            .get_non_empty("full_name")
            .and_then(clean_text)?;

        let field = |key: &str| {
            translated
                .get_non_empty(key)
                .map(str::to_string)
        };

        Some(CanonicalProfile {
            full_name,
            bachelor_course: field("bachelor_course"),
            masters_course: field("masters_course"),
            ddp_or_minor: field("ddp_or_minor"),
            intake_batch: field("intake_batch"),
            overseas_experience: field("overseas_experience"),
            self_writeup: field("self_writeup"),
            picture_url: field("picture_url"),
            notable_achievements: field("notable_achievements"),
            hobbies: field("hobbies"),
            linkedin_link: field("linkedin_link"),
            instagram_link: field("instagram_link"),
            github_link: field("github_link"),
            personal_email: field("personal_email"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> RawRecord {
        cells
            .iter()
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renames_known_headers_and_passes_through_unknown() {
        let mapping = HeaderMapping::current_form();
        let translated = mapping.translate(&row(&[
            ("Full Name (as per NRIC)", "Jane Tan"),
            ("Timestamp", "2024-01-01"),
        ]));
        assert_eq!(translated.get("full_name"), Some("Jane Tan"));
        assert_eq!(translated.get("Timestamp"), Some("2024-01-01"));
    }

    #[test]
    fn specific_major_outranks_generic_course() {
        let mapping = HeaderMapping::current_form();
        let translated = mapping.translate(&row(&[
            ("What course are you from?", "Engineering"),
            (
                "What is your major? (e.g. MPE - Computer Engineering)",
                "MPE - Computer Engineering",
            ),
        ]));
        assert_eq!(
            translated.get("bachelor_course"),
            Some("MPE - Computer Engineering")
        );
    }

    #[test]
    fn generic_course_used_when_specific_blank() {
        let mapping = HeaderMapping::current_form();
        let translated = mapping.translate(&row(&[
            (
                "What is your major? (e.g. MPE - Computer Engineering)",
                "  ",
            ),
            ("What course are you from?", "Engineering"),
        ]));
        assert_eq!(translated.get("bachelor_course"), Some("Engineering"));
    }

    #[test]
    fn intake_batch_reduces_to_academic_year() {
        let mapping = HeaderMapping::current_form();
        let translated = mapping.translate(&row(&[(
            "Which intake batch are you from?",
            "AY23/24 (August intake)",
        )]));
        assert_eq!(translated.get("intake_batch"), Some("AY23/24"));
    }

    #[test]
    fn intake_batch_without_match_survives() {
        let mapping = HeaderMapping::current_form();
        let translated =
            mapping.translate(&row(&[("Which intake batch are you from?", "2023 intake")]));
        assert_eq!(translated.get("intake_batch"), Some("2023 intake"));
    }

    #[test]
    fn missing_full_name_yields_no_profile() {
        let mapping = HeaderMapping::current_form();
        let translated = mapping.translate(&row(&[
            ("Full Name (as per NRIC)", "   "),
            ("Personal Email", "jane@example.com"),
        ]));
        assert!(mapping.into_profile(&translated).is_none());
    }

    #[test]
    fn canonical_headers_pass_straight_through() {
        // Exports that already carry canonical column names need no mapping.
        let mapping = HeaderMapping::current_form();
        let translated = mapping.translate(&row(&[("full_name", "Jane Tan")]));
        let profile = mapping.into_profile(&translated).unwrap();
        assert_eq!(profile.full_name, "Jane Tan");
    }
}
