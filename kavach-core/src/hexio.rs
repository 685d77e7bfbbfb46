//! Hex/byte I/O — read a daily log file and split it into frame candidates.
//!
//! The file is ASCII hex, uppercased and stripped of whitespace, then split
//! at known type-tagged magic prefixes. Splits preserve the marker at the
//! start of each candidate. Odd-length or non-hex candidates are discarded
//! by the caller (`hex_decode` returns `None` for them).

use std::path::Path;

use crate::types::hex_decode;

/// Markers recognized across the packet families (§4.1).
pub const MARKER_POSITION: &str = "AAAA12";
pub const MARKER_STATIONARY: &str = "AAAA11";
pub const MARKER_INTERLOCKING_PERIODIC: &str = "AAAA15";
pub const MARKER_INTERLOCKING_EVENT: &str = "AAAA16";
pub const MARKER_HEALTH_STATION: &str = "AAAA17";
pub const MARKER_HEALTH_ONBOARD: &str = "AAAA18";
pub const MARKER_HEALTH_ONBOARD_GPRS: &str = "BBBB18";
pub const MARKER_FAULT: &str = "AAAA19";
pub const MARKER_FAULT_GPRS: &str = "BBBB19";

/// Split an uppercased, whitespace-free hex string at every occurrence of
/// any of `markers`, preserving the marker at the start of each resulting
/// piece. The prefix before the first marker (if any) is dropped, mirroring
/// the original's `raw.replace("AAAA15", "\nAAAA15")` + split-and-drop-empty
/// behavior.
pub fn split_candidates(hex: &str, markers: &[&str]) -> Vec<String> {
    if markers.is_empty() || hex.is_empty() {
        return Vec::new();
    }

    // Collect every marker occurrence as a (byte_offset, marker_len) pair,
    // then cut the string at each boundary in order.
    let mut cut_points: Vec<usize> = Vec::new();
    for marker in markers {
        let mlen = marker.len();
        let mut start = 0;
        while let Some(found) = hex[start..].find(marker) {
            cut_points.push(start + found);
            start += found + mlen;
        }
    }
    cut_points.sort_unstable();
    cut_points.dedup();

    if cut_points.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(cut_points.len());
    for (i, &start) in cut_points.iter().enumerate() {
        let end = cut_points.get(i + 1).copied().unwrap_or(hex.len());
        out.push(hex[start..end].to_string());
    }
    out
}

/// Clean raw file bytes into an uppercased, CR/LF-stripped hex string.
fn clean_hex(raw: &[u8]) -> String {
    let mut s = String::with_capacity(raw.len());
    for &b in raw {
        let c = b as char;
        if c == '\r' || c == '\n' || c.is_whitespace() {
            continue;
        }
        s.push(c.to_ascii_uppercase());
    }
    s
}

/// Read a log file and yield each frame candidate matching `markers` as raw
/// bytes. Odd-length or non-hex candidates are silently discarded. Returns
/// an empty vector (not an error) when the file cannot be opened — the
/// caller continues to the next file per the date-range driver's per-file
/// fault tolerance.
pub fn read_frames(path: &Path, markers: &[&str]) -> Vec<Vec<u8>> {
    let raw = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("kavach-core: failed to read {}: {e}", path.display());
            return Vec::new();
        }
    };
    frames_from_bytes(&raw, markers)
}

/// Same as [`read_frames`] but over an in-memory buffer (the `UPLOAD`
/// data-source path for the by-date POST endpoints).
pub fn frames_from_bytes(raw: &[u8], markers: &[&str]) -> Vec<Vec<u8>> {
    let hex = clean_hex(raw);
    split_candidates(&hex, markers)
        .into_iter()
        .filter_map(|candidate| hex_decode(&candidate))
        .collect()
}
