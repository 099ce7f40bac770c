//! Identity-key deduplication with provenance
//!
//! Collapses a batch of cleaned profiles onto their title-cased full name.
//! Strict last-write-wins: when two rows share a key, the later row in
//! original order replaces the earlier one and the earlier row is recorded
//! as a `DuplicateRecord`. No field merging across colliding rows.

use std::collections::HashMap;

use crate::models::{CanonicalProfile, DuplicateRecord};
use crate::services::field_normalizer::title_case;

/// Outcome of deduplicating one batch.
#[derive(Debug, Clone, Default)]
pub struct DedupeOutcome {
    /// Surviving profiles with their identity keys, in first-seen key order.
    pub survivors: Vec<(String, CanonicalProfile)>,
    /// Provenance for every dropped row, in the order rows were dropped.
    pub duplicates: Vec<DuplicateRecord>,
}

/// Deduplicate profiles in original row order.
///
/// Rows whose full name yields no usable identity key are silently dropped
/// and do not count as duplicates.
pub fn dedupe(profiles: Vec<CanonicalProfile>) -> DedupeOutcome {
    let mut key_order: Vec<String> = Vec::new();
    // identity key -> (row index, profile)
    let mut surviving: HashMap<String, (usize, CanonicalProfile)> = HashMap::new();
    let mut duplicates = Vec::new();

    for (row, profile) in profiles.into_iter().enumerate() {
        let key = title_case(&profile.full_name);
        if key.is_empty() {
            tracing::debug!(row, "Row has no usable identity key, dropping");
            continue;
        }

        match surviving.insert(key.clone(), (row, profile)) {
            None => key_order.push(key),
            Some((dropped_row, dropped)) => {
                tracing::info!(
                    identity_key = %key,
                    dropped_row,
                    kept_row = row,
                    "Duplicate identity key, keeping later row"
                );
                duplicates.push(DuplicateRecord {
                    identity_key: key,
                    dropped_row,
                    dropped,
                    kept_row: row,
                });
            }
        }
    }

    let survivors = key_order
        .into_iter()
        .filter_map(|key| {
            let (_, profile) = surviving.remove(&key)?;
            Some((key, profile))
        })
        .collect();

    DedupeOutcome {
        survivors,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, course: &str) -> CanonicalProfile {
        CanonicalProfile {
            full_name: name.to_string(),
            bachelor_course: Some(course.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn last_row_wins_and_provenance_is_recorded() {
        let outcome = dedupe(vec![
            named("Jane Tan", "Engineering"),
            named("jane tan ", "Computer Science"),
        ]);

        assert_eq!(outcome.survivors.len(), 1);
        let (key, kept) = &outcome.survivors[0];
        assert_eq!(key, "Jane Tan");
        assert_eq!(kept.bachelor_course.as_deref(), Some("Computer Science"));

        assert_eq!(outcome.duplicates.len(), 1);
        let dup = &outcome.duplicates[0];
        assert_eq!(dup.identity_key, "Jane Tan");
        assert_eq!(dup.dropped_row, 0);
        assert_eq!(dup.kept_row, 1);
        assert_eq!(dup.dropped.bachelor_course.as_deref(), Some("Engineering"));
    }

    #[test]
    fn distinct_keys_keep_first_seen_order() {
        let outcome = dedupe(vec![
            named("Bob Lim", "A"),
            named("Alice Ng", "B"),
            named("bob lim", "C"),
        ]);

        let keys: Vec<&str> = outcome
            .survivors
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["Bob Lim", "Alice Ng"]);
        assert_eq!(
            outcome.survivors[0].1.bachelor_course.as_deref(),
            Some("C")
        );
    }

    #[test]
    fn blank_names_are_dropped_silently() {
        let outcome = dedupe(vec![named("   ", "A"), named("Jane Tan", "B")]);
        assert_eq!(outcome.survivors.len(), 1);
        assert!(outcome.duplicates.is_empty());
    }
}
