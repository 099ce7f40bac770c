//! Raw file decoding into spreadsheet rows
//!
//! Dispatches on the uploaded filename's extension (`.csv` or `.xlsx`), so a
//! rejected format aborts the batch before any row touches the pipeline.
//! CSV bytes go through BOM-tolerant UTF-8 with a Windows-1252 fallback;
//! XLSX sheets are read through calamine from an in-memory cursor.

use std::io::Cursor;

use calamine::{Reader, Xlsx};

use crate::error::{Error, Result};
use crate::models::RawRecord;

/// Read an uploaded spreadsheet into ordered raw records.
///
/// The filename is used only for extension dispatch. Wholly empty rows are
/// skipped; cell values keep their surrounding whitespace trimmed.
pub fn read_records(bytes: &[u8], filename: &str) -> Result<Vec<RawRecord>> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_csv(bytes),
        "xlsx" => read_xlsx(bytes),
        other => Err(Error::UnsupportedFormat(format!(
            "unrecognized extension '.{}' on '{}'",
            other, filename
        ))),
    }
}

/// Decode CSV bytes, trying UTF-8 (BOM tolerated) then Windows-1252.
fn decode_text(bytes: &[u8]) -> Result<String> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return Ok(text.into_owned());
    }

    let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if !had_errors {
        tracing::debug!("CSV decoded as Windows-1252 after UTF-8 failure");
        return Ok(text.into_owned());
    }

    Err(Error::Decode(
        "file is not valid UTF-8 or Windows-1252".to_string(),
    ))
}

fn read_csv(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let text = decode_text(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Decode(format!("unreadable CSV headers: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Decode(format!("unreadable CSV row: {}", e)))?;
        let row: RawRecord = headers
            .iter()
            .zip(record.iter().chain(std::iter::repeat("")))
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }

    tracing::debug!(rows = rows.len(), "CSV read");
    Ok(rows)
}

fn read_xlsx(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::Decode(format!("unreadable XLSX workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::Decode("XLSX workbook has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Decode(format!("unreadable worksheet '{}': {}", sheet_name, e)))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for sheet_row in rows_iter {
        let row: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = sheet_row
                    .get(i)
                    .map(|cell| cell.to_string().trim().to_string())
                    .unwrap_or_default();
                (h.clone(), value)
            })
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }

    tracing::debug!(rows = rows.len(), sheet = %sheet_name, "XLSX read");
    Ok(rows)
}
