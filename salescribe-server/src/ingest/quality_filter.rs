//! Row parsing, quality filtering and content fingerprinting
//!
//! Row-level problems never fail a batch: a row whose date or amount cannot
//! be parsed is dropped and counted. Optional fields fall back to defaults.

use super::column_mapper::{CanonicalField, ColumnMapping};
use super::IngestError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use salescribe_common::models::{SalesRow, UNKNOWN};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Date layouts tried in order
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Date-time layouts whose date part is kept
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// `%Y` also matches one to three digit years, which are never valid here
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1000..=9999;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Accepted rows plus bookkeeping for one upload
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub rows: Vec<SalesRow>,
    /// Data rows seen (header excluded)
    pub rows_processed: u64,
    pub dropped_row_count: u64,
    /// SHA-256 hex of the content re-serialized with a comma delimiter
    pub fingerprint: String,
}

/// Parse every data row of `text`, keeping rows with a valid date and amount
pub fn filter_rows(
    text: &str,
    delimiter: u8,
    mapping: &ColumnMapping,
) -> Result<FilterOutcome, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut canonical = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let mut rows = Vec::new();
    let mut rows_processed: u64 = 0;
    let mut dropped: u64 = 0;
    let mut seen_header = false;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed row");
                if seen_header {
                    rows_processed += 1;
                    dropped += 1;
                }
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }

        canonical
            .write_record(&record)
            .map_err(|e| IngestError::UnreadableFile(format!("failed to normalize content: {}", e)))?;

        if !seen_header {
            seen_header = true;
            continue;
        }

        rows_processed += 1;
        match parse_row(&record, mapping) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    let normalized = canonical
        .into_inner()
        .map_err(|e| IngestError::UnreadableFile(format!("failed to normalize content: {}", e)))?;

    Ok(FilterOutcome {
        rows,
        rows_processed,
        dropped_row_count: dropped,
        fingerprint: fingerprint(&normalized),
    })
}

/// SHA-256 hex digest
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn parse_row(record: &csv::StringRecord, mapping: &ColumnMapping) -> Option<SalesRow> {
    let date = parse_date(mapping.cell(CanonicalField::Date, record)?)?;
    let amount = parse_amount(mapping.cell(CanonicalField::Amount, record)?)?;

    Some(SalesRow {
        date,
        product: text_or_unknown(mapping.cell(CanonicalField::Product, record)),
        category: text_or_unknown(mapping.cell(CanonicalField::Category, record)),
        amount,
        quantity: parse_quantity(mapping.cell(CanonicalField::Quantity, record)),
        region: text_or_unknown(mapping.cell(CanonicalField::Region, record)),
    })
}

/// Parse a date in any of the accepted layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok().filter(has_full_year))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.date())
                .filter(has_full_year)
        })
        .or_else(|| {
            // chrono accepts shorter digit runs for %Y%m%d
            if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
                NaiveDate::parse_from_str(raw, COMPACT_DATE_FORMAT).ok().filter(has_full_year)
            } else {
                None
            }
        })
}

fn has_full_year(date: &NaiveDate) -> bool {
    YEAR_RANGE.contains(&date.year())
}

/// Parse a non-negative monetary amount
///
/// Accepts a leading currency symbol, thousands separators and a decimal
/// comma (`12,5`, `1.234,50`). Returns `None` for negative or non-numeric input.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim().trim_start_matches(CURRENCY_SYMBOLS).trim();
    if raw.is_empty() {
        return None;
    }

    // The separator that appears last is the decimal one
    let normalized = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), _) => raw.replace(',', ""),
        (None, Some(_)) => match raw.split_once(',') {
            Some((whole, frac)) if !frac.contains(',') && (1..=2).contains(&frac.len()) => {
                format!("{}.{}", whole, frac)
            }
            _ => raw.replace(',', ""),
        },
        (None, None) => raw.to_string(),
    };

    Decimal::from_str(&normalized)
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

/// Parse a quantity; anything absent, fractional or negative means 1
pub fn parse_quantity(raw: Option<&str>) -> u32 {
    raw.map(|s| s.trim().replace(',', ""))
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(&s).ok())
        .filter(|q| !q.is_sign_negative() && q.fract().is_zero())
        .and_then(|q| q.to_u32())
        .unwrap_or(1)
}

/// Trimmed text, or `"Unknown"` when empty or absent
pub fn text_or_unknown(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
