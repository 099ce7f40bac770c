//! Pipeline components for census-ingest
//!
//! Each stage of the normalization pipeline lives in its own module; the
//! `pipeline` module drives them in sequence for one uploaded batch.

pub mod deduplicator;
pub mod field_normalizer;
pub mod header_translator;
pub mod issue_detector;
pub mod pipeline;
pub mod sheet_reader;
