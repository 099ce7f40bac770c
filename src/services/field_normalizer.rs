//! Per-field cleaning for translated profile rows
//!
//! Pure functions only; the pipeline applies these during row cleaning and
//! the issue detector reuses the splitting/capitalisation pair when it turns
//! free text into bullet lists.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading enumerator prefix: digits, dots, dashes, whitespace.
static ENUMERATOR_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.\-\s]+").unwrap());

/// Leading faculty code on a course name, e.g. "MPE - ".
static FACULTY_CODE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z ]*-\s*").unwrap());

/// Residual bullet glyph/dash/asterisk at the start of a split segment.
static BULLET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\u{2022}\u{00B7}\-*]+\s*").unwrap());

/// Separators tried when a field collapses to a single line, in priority
/// order. The first separator present in the line wins, not the "best" one.
const LINE_SEPARATORS: [char; 7] = ['\u{2022}', '*', '-', ';', ',', '.', '\u{00B7}'];

/// One known long-form program name that forms keep spelling out in full.
const PROGRAM_REMAP: (&str, &str) = ("Engineering Science Programme", "Engineering Science");

/// Strip each line's leading enumerator prefix and rejoin.
///
/// Returns `None` (not an empty string) when nothing survives trimming, so
/// callers can distinguish "cleared by cleaning" from "present but odd".
pub fn clean_text(value: &str) -> Option<String> {
    let cleaned = value
        .split('\n')
        .map(|line| ENUMERATOR_PREFIX.replace(line, "").into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Clean a self-reported bachelor course name.
///
/// Strips the all-caps faculty code prefix ("MPE - "), trailing semicolons
/// and whitespace, and remaps the one known long-form program name.
pub fn clean_bachelor_course(value: &str) -> String {
    let stripped = FACULTY_CODE_PREFIX.replace(value.trim(), "");
    let stripped = stripped.trim_end_matches([';', ' ', '\t']).trim();

    if stripped == PROGRAM_REMAP.0 {
        PROGRAM_REMAP.1.to_string()
    } else {
        stripped.to_string()
    }
}

/// Split free text into bullet points.
///
/// Newlines split first. If exactly one non-empty line remains, that line is
/// re-split by the first separator from [`LINE_SEPARATORS`] it contains.
/// Residual bullet glyphs are stripped from each segment and empty segments
/// discarded.
pub fn split_bullet_points(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.len() == 1 {
        let single = lines.remove(0);
        if let Some(sep) = LINE_SEPARATORS.iter().find(|sep| single.contains(**sep)) {
            lines = single
                .split(*sep)
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect();
        } else {
            lines.push(single);
        }
    }

    lines
        .iter()
        .map(|line| BULLET_PREFIX.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Uppercase the first character of each point, leaving the rest unchanged.
pub fn capitalise_first_word(points: Vec<String>) -> Vec<String> {
    points
        .into_iter()
        .map(|point| {
            let point = point.trim().to_string();
            let mut chars = point.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => point,
            }
        })
        .collect()
}

/// Title-case a full name for use as an identity key.
///
/// Trims, then uppercases the first letter and lowercases the rest of each
/// whitespace-separated word. "jane  tan " and "Jane Tan" collapse to the
/// same key.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
