//! Data model for the profile ingest pipeline
//!
//! A spreadsheet row flows through three shapes: `RawRecord` (ordered cells
//! under arbitrary source headers), `CanonicalProfile` (typed fields under
//! canonical names, achievements/hobbies still raw text), and `StagedProfile`
//! (list fields split, issues attached, timestamp stamped), which is what the
//! store persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One spreadsheet row as an ordered sequence of (header, value) cells.
///
/// Order matters twice: header translation preserves input order, and when
/// two headers map to the same canonical name the later cell wins, so `get`
/// returns the last matching entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    entries: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.entries.push((header.into(), value.into()));
    }

    /// Last cell stored under `header`, if any.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Last non-blank cell stored under `header`, if any.
    pub fn get_non_empty(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .filter(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
            .find(|v| !v.trim().is_empty())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.trim().is_empty())
    }

    pub fn map_headers(&self, mut f: impl FnMut(&str) -> String) -> RawRecord {
        RawRecord {
            entries: self
                .entries
                .iter()
                .map(|(h, v)| (f(h), v.clone()))
                .collect(),
        }
    }
}

impl FromIterator<(String, String)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        RawRecord {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A row after header translation and field cleaning.
///
/// `full_name` is the only required field; rows without one never reach the
/// store. `notable_achievements` and `hobbies` hold the raw free text here;
/// the issue detector splits them into lists when building a `StagedProfile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub full_name: String,
    pub bachelor_course: Option<String>,
    pub masters_course: Option<String>,
    pub ddp_or_minor: Option<String>,
    pub intake_batch: Option<String>,
    pub overseas_experience: Option<String>,
    pub self_writeup: Option<String>,
    pub picture_url: Option<String>,
    pub notable_achievements: Option<String>,
    pub hobbies: Option<String>,
    pub linkedin_link: Option<String>,
    pub instagram_link: Option<String>,
    pub github_link: Option<String>,
    pub personal_email: Option<String>,
}

/// A profile as persisted in the staging store: canonical fields with the
/// list fields split, plus the issue list (empty iff clean) and the batch
/// timestamp. Keyed by the title-cased full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedProfile {
    pub full_name: String,
    pub bachelor_course: Option<String>,
    pub masters_course: Option<String>,
    pub ddp_or_minor: Option<String>,
    pub intake_batch: Option<String>,
    pub overseas_experience: Option<String>,
    pub self_writeup: Option<String>,
    pub picture_url: Option<String>,
    pub notable_achievements: Vec<String>,
    pub hobbies: Vec<String>,
    pub linkedin_link: Option<String>,
    pub instagram_link: Option<String>,
    pub github_link: Option<String>,
    pub personal_email: Option<String>,
    pub issues: Vec<String>,
    pub last_modified: DateTime<Utc>,
}

impl StagedProfile {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Provenance for a row dropped during deduplication: which row it was, what
/// it held, and which later row superseded it under the same identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub identity_key: String,
    pub dropped_row: usize,
    pub dropped: CanonicalProfile,
    pub kept_row: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_get_returns_last_entry() {
        let mut row = RawRecord::new();
        row.push("course", "Old Value");
        row.push("course", "New Value");
        assert_eq!(row.get("course"), Some("New Value"));
    }

    #[test]
    fn raw_record_get_non_empty_skips_blanks() {
        let mut row = RawRecord::new();
        row.push("course", "Kept");
        row.push("course", "   ");
        assert_eq!(row.get("course"), Some("   "));
        assert_eq!(row.get_non_empty("course"), Some("Kept"));
    }

    #[test]
    fn raw_record_is_empty_ignores_blank_cells() {
        let mut row = RawRecord::new();
        row.push("a", " ");
        row.push("b", "");
        assert!(row.is_empty());
        row.push("c", "x");
        assert!(!row.is_empty());
    }
}
