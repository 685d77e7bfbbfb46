//! Shared types and the error taxonomy for kavach-core.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// All errors produced by kavach-core, matching the error taxonomy of the
/// decode-and-query core: invalid timestamps, frame-shape violations, and
/// the handful of field-level validation failures a decoder can raise.
#[derive(Debug, Error)]
pub enum KavachError {
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),
    #[error("expected marker not found: {0}")]
    InvalidMarker(String),
    #[error("frame truncated at offset {offset} (needed {needed} more byte(s))")]
    TruncatedFrame { offset: usize, needed: usize },
    #[error("message_length {declared} does not match frame size {actual}")]
    InvalidMessageLength { declared: usize, actual: usize },
    #[error("invalid field value: {0}")]
    InvalidFieldValue(String),
    #[error("CRC mismatch: computed {computed:#010X}, declared {declared:#010X}")]
    CrcMismatch { computed: u32, declared: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, KavachError>;

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode a hex string into bytes. Case-insensitive, must be even length.
/// Returns `None` for odd-length or non-hex input rather than erroring —
/// callers (hexio::read_frames) discard such candidates silently.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as an uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

// ---------------------------------------------------------------------------
// Frame-level enums
// ---------------------------------------------------------------------------

/// Start-of-frame marker: wireline/E1 path (`AAAA`) or GPRS path (`BBBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sof {
    #[serde(rename = "AAAA")]
    Wireline,
    #[serde(rename = "BBBB")]
    Gprs,
}

impl Sof {
    pub fn from_bytes(b: [u8; 2]) -> Option<Sof> {
        match b {
            [0xAA, 0xAA] => Some(Sof::Wireline),
            [0xBB, 0xBB] => Some(Sof::Gprs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sof::Wireline => "AAAA",
            Sof::Gprs => "BBBB",
        }
    }
}

/// Where a scanned frame came from: the on-disk daily log, or an in-memory
/// upload handed directly to a decode endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    #[serde(rename = "BIN")]
    Bin,
    #[serde(rename = "UPLOAD")]
    Upload,
}

/// Active radio/link byte from the stationary-KAVACH and position headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActiveRadio {
    Radio1,
    Radio2,
    Ethernet1,
    Ethernet2,
    Unknown,
}

impl From<u8> for ActiveRadio {
    fn from(b: u8) -> Self {
        match b {
            0xF1 => ActiveRadio::Radio1,
            0xF2 => ActiveRadio::Radio2,
            0xE1 => ActiveRadio::Ethernet1,
            0xE2 => ActiveRadio::Ethernet2,
            _ => ActiveRadio::Unknown,
        }
    }
}

/// Reporting subsystem role for a 0x19 fault packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultOrigin {
    Stationary,
    #[serde(rename = "LOCO")]
    Loco,
    Tsrms,
}

impl FaultOrigin {
    pub fn from_byte(b: u8) -> Option<FaultOrigin> {
        match b {
            0x11 => Some(FaultOrigin::Stationary),
            0x22 => Some(FaultOrigin::Loco),
            0x33 => Some(FaultOrigin::Tsrms),
            _ => None,
        }
    }

    /// Canonical uppercase label emitted on the assembled record (§8
    /// scenario A: `fault_origin="LOCO"`).
    pub fn label(&self) -> &'static str {
        match self {
            FaultOrigin::Stationary => "STATIONARY",
            FaultOrigin::Loco => "LOCO",
            FaultOrigin::Tsrms => "TSRMS",
        }
    }
}

/// Fault item kind within a 0x19 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    Fault,
    Recovery,
}

impl FaultKind {
    pub fn from_byte(b: u8) -> Option<FaultKind> {
        match b {
            1 => Some(FaultKind::Fault),
            2 => Some(FaultKind::Recovery),
            _ => None,
        }
    }

    /// Raw wire value, the inverse of [`FaultKind::from_byte`].
    pub fn code(&self) -> u8 {
        match self {
            FaultKind::Fault => 1,
            FaultKind::Recovery => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Date/time assembly
// ---------------------------------------------------------------------------

/// Build an `event_time` from the packed (day, month, year-2000, hh, mm, ss)
/// header fields, rejecting out-of-range components per the invariants in
/// the data model (`1<=day<=31`, `1<=month<=12`, `hh<=23`, `mm<=59`, `ss<=59`).
pub fn make_datetime(
    day: u8,
    month: u8,
    year2: u8,
    hh: u8,
    mm: u8,
    ss: u8,
) -> Result<NaiveDateTime> {
    if !(1..=31).contains(&day)
        || !(1..=12).contains(&month)
        || hh > 23
        || mm > 59
        || ss > 59
    {
        return Err(KavachError::InvalidDateTime(format!(
            "{day:02}-{month:02}-{year2:02} {hh:02}:{mm:02}:{ss:02}"
        )));
    }
    let year = 2000 + year2 as i32;
    let date = chrono::NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
        KavachError::InvalidDateTime(format!("{day:02}-{month:02}-{year2:02}"))
    })?;
    let time = chrono::NaiveTime::from_hms_opt(hh as u32, mm as u32, ss as u32).ok_or_else(|| {
        KavachError::InvalidDateTime(format!("{hh:02}:{mm:02}:{ss:02}"))
    })?;
    Ok(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(hex_decode("4840D6"), Some(vec![0x48, 0x40, 0xD6]));
        assert_eq!(hex_encode(&[0x48, 0x40, 0xD6]), "4840D6");
    }

    #[test]
    fn test_hex_decode_rejects_odd_and_nonhex() {
        assert_eq!(hex_decode("ABC"), None);
        assert_eq!(hex_decode("ZZZZ"), None);
    }

    #[test]
    fn test_sof_from_bytes() {
        assert_eq!(Sof::from_bytes([0xAA, 0xAA]), Some(Sof::Wireline));
        assert_eq!(Sof::from_bytes([0xBB, 0xBB]), Some(Sof::Gprs));
        assert_eq!(Sof::from_bytes([0x11, 0x11]), None);
    }

    #[test]
    fn test_active_radio() {
        assert_eq!(ActiveRadio::from(0xF1), ActiveRadio::Radio1);
        assert_eq!(ActiveRadio::from(0x00), ActiveRadio::Unknown);
    }

    #[test]
    fn test_make_datetime_valid() {
        let dt = make_datetime(1, 2, 25, 10, 11, 12).unwrap();
        assert_eq!(dt.to_string(), "2025-02-01 10:11:12");
    }

    #[test]
    fn test_make_datetime_rejects_bad_hour() {
        assert!(make_datetime(1, 2, 25, 24, 0, 0).is_err());
    }

    #[test]
    fn test_make_datetime_rejects_bad_month() {
        assert!(make_datetime(1, 13, 25, 0, 0, 0).is_err());
    }

    #[test]
    fn test_fault_origin_from_byte() {
        assert_eq!(FaultOrigin::from_byte(0x22), Some(FaultOrigin::Loco));
        assert_eq!(FaultOrigin::from_byte(0x99), None);
    }
}
