//! Date-range scanning driver — enumerates log files, decodes the markers
//! relevant to a request, filters by time/station/loco/direction, and
//! paginates the resulting record stream.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::hexio::read_frames;
use crate::types::{DataSource, KavachError, Result, Sof};

pub const PAGE_SIZE: usize = 5000;

/// Parse a query-style datetime, accepting date-only or date-time forms,
/// `T` or space separator, and trailing percent-decoded artifacts.
/// Grounded in the original backend's `parseDateTime` fallback chain.
pub fn parse_query_datetime(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim().replace('T', " ");
    let s = s.replace('+', " "); // some clients percent-decode space as '+'

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d-%m-%Y %H:%M:%S",
        "%d-%m-%y %H:%M:%S",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Ok(dt);
        }
    }
    // Date-only fallbacks — treated as midnight.
    let date_formats = ["%Y-%m-%d", "%d-%m-%Y", "%d-%m-%y"];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
            return Ok(NaiveDateTime::new(date, NaiveTime::MIN));
        }
    }
    Err(KavachError::InvalidDateTime(raw.to_string()))
}

/// `from` is truncated to `:mm:00`, `to` to `:mm:59` (§4.4, §4.8) before the
/// per-record time-filter comparison.
pub fn normalize_range(from: NaiveDateTime, to: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let from = from
        .with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(from);
    let to = to
        .with_second(59)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(to);
    (from, to)
}

/// Parse a `dd-MM-yy.bin` filename into its encoded date; returns `None`
/// (file skipped) for anything that doesn't match.
pub fn parse_filename_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%d-%m-%y").ok()
}

/// Enumerate `*.bin` files under `log_dir` whose filename-encoded date
/// falls within `[from_date, to_date]`, sorted file-date ascending.
pub fn enumerate_files(log_dir: &Path, from_date: NaiveDate, to_date: NaiveDate) -> Vec<PathBuf> {
    let mut matches: Vec<(NaiveDate, PathBuf)> = Vec::new();
    let entries = match std::fs::read_dir(log_dir) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("kavach-core: failed to read log dir {}: {e}", log_dir.display());
            return Vec::new();
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("bin") {
            continue;
        }
        if let Some(date) = parse_filename_date(&path) {
            if date >= from_date && date <= to_date {
                matches.push((date, path));
            }
        }
    }
    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    matches.into_iter().map(|(_, p)| p).collect()
}

/// Decode every frame candidate under `markers` from a single file (or an
/// in-memory upload), tagging each with its originating `Sof` and
/// `DataSource`, and handing raw bytes plus metadata to `decode_fn`.
pub fn scan_source<T>(
    raw_frames: impl IntoIterator<Item = Vec<u8>>,
    data_source: DataSource,
    mut decode_fn: impl FnMut(&[u8], DataSource, Sof) -> Option<T>,
) -> Vec<T> {
    let mut out = Vec::new();
    for frame in raw_frames {
        if frame.len() < 2 {
            continue;
        }
        let sof = match (frame[0], frame[1]) {
            (0xAA, 0xAA) => Sof::Wireline,
            (0xBB, 0xBB) => Sof::Gprs,
            _ => continue,
        };
        if let Some(record) = decode_fn(&frame, data_source, sof) {
            out.push(record);
        }
    }
    out
}

/// Stream markers from an on-disk file.
pub fn scan_file<T>(
    path: &Path,
    markers: &[&str],
    decode_fn: impl FnMut(&[u8], DataSource, Sof) -> Option<T>,
) -> Vec<T> {
    let frames = read_frames(path, markers);
    scan_source(frames, DataSource::Bin, decode_fn)
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub total_rows: usize,
    pub total_pages: usize,
}

/// Paginate a full record vector at a stable page size of 5000, 1-based
/// page indexing. `total_rows` counts the whole set regardless of which
/// page is requested (§9 pagination design note).
pub fn paginate<T: Clone>(records: Vec<T>, page: usize) -> Page<T> {
    let total_rows = records.len();
    let total_pages = total_rows.div_ceil(PAGE_SIZE).max(1);
    let page = page.max(1);
    let start = (page - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(total_rows);
    let data = if start >= total_rows { Vec::new() } else { records[start..end].to_vec() };
    Page { data, page, total_rows, total_pages }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_datetime_iso_with_t() {
        let dt = parse_query_datetime("2024-11-01T10:20:30").unwrap();
        assert_eq!(dt.to_string(), "2024-11-01 10:20:30");
    }

    #[test]
    fn test_parse_query_datetime_date_only() {
        let dt = parse_query_datetime("2024-11-01").unwrap();
        assert_eq!(dt.to_string(), "2024-11-01 00:00:00");
    }

    #[test]
    fn test_normalize_range_truncates_seconds() {
        let from = NaiveDateTime::parse_from_str("2024-11-01 10:20:45", "%Y-%m-%d %H:%M:%S").unwrap();
        let to = NaiveDateTime::parse_from_str("2024-11-01 10:25:12", "%Y-%m-%d %H:%M:%S").unwrap();
        let (nfrom, nto) = normalize_range(from, to);
        assert_eq!(nfrom.second(), 0);
        assert_eq!(nto.second(), 59);
    }

    #[test]
    fn test_parse_filename_date() {
        let p = PathBuf::from("01-11-24.bin");
        assert_eq!(parse_filename_date(&p), NaiveDate::from_ymd_opt(2024, 11, 1));
    }

    #[test]
    fn test_parse_filename_date_invalid() {
        let p = PathBuf::from("not-a-date.bin");
        assert!(parse_filename_date(&p).is_none());
    }

    #[test]
    fn test_paginate_scenario_f() {
        let records: Vec<u32> = (0..12345).collect();
        let page = paginate(records, 3);
        assert_eq!(page.data.len(), 2345);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_rows, 12345);
    }

    #[test]
    fn test_paginate_out_of_range_page_is_empty() {
        let records: Vec<u32> = (0..10).collect();
        let page = paginate(records, 5);
        assert!(page.data.is_empty());
        assert_eq!(page.total_rows, 10);
    }
}
