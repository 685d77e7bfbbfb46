//! Interlocking decoders (0x15 periodic, 0x16 event-driven).

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::bitreader::reverse_bytes;
use crate::relays::{RelayStatus, RelayTable};
use crate::types::{make_datetime, KavachError, Result};

const HEADER_MIN_LEN: usize = 18;

#[derive(Debug, Clone, Serialize)]
pub struct InterlockingHeader {
    pub station_id: u16,
    pub event_time: NaiveDateTime,
    pub frame_number: u32,
}

fn read_header(raw: &[u8]) -> Result<InterlockingHeader> {
    if raw.len() < HEADER_MIN_LEN {
        return Err(KavachError::TruncatedFrame {
            offset: raw.len(),
            needed: HEADER_MIN_LEN - raw.len(),
        });
    }
    let station_id = u16::from_be_bytes([raw[7], raw[8]]);
    let day = raw[12];
    let month = raw[13];
    let year2 = raw[14];
    let hh = raw[15];
    let mm = raw[16];
    let ss = raw[17];
    let event_time = make_datetime(day, month, year2, hh, mm, ss)?;
    let frame_number = hh as u32 * 3600 + mm as u32 * 60 + ss as u32 + 1;
    Ok(InterlockingHeader { station_id, event_time, frame_number })
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayReading {
    pub index: usize,
    pub name: String,
    pub status: RelayStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodicReport {
    pub header: InterlockingHeader,
    pub relays: Vec<RelayReading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayEvent {
    pub relay_addr: u16,
    pub name: Option<String>,
    pub status: RelayStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub header: InterlockingHeader,
    pub events: Vec<RelayEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub enum InterlockingPacket {
    Periodic(PeriodicReport),
    Event(EventReport),
}

/// Decode a 0x15 periodic relay-bitmap frame. `relay_table` resolves each
/// bit index to a relay name/polarity; a requested `station_code` mismatch
/// against the looked-up station is reported via the returned station_id
/// so the caller (driver) can skip the packet per the filter rule.
pub fn decode_periodic(raw: &[u8], relay_table: &RelayTable) -> Result<PeriodicReport> {
    let header = read_header(raw)?;
    if raw.len() <= 21 {
        return Err(KavachError::TruncatedFrame { offset: raw.len(), needed: 22 - raw.len() });
    }
    let bitmap_bytes = &raw[21..];
    let reversed = reverse_bytes(bitmap_bytes);

    let mut relays = Vec::with_capacity(relay_table.len());
    for i in 0..relay_table.len() {
        let byte_idx = i / 8;
        if byte_idx >= reversed.len() {
            break;
        }
        let bit_in_byte = 7 - (i % 8); // MSB first
        let bit = (reversed[byte_idx] >> bit_in_byte) & 1;
        if let Some(relay) = relay_table.by_index(i) {
            relays.push(RelayReading {
                index: i,
                name: relay.name.clone(),
                status: RelayStatus::from_bitmap_bit(bit, relay.is_tpr()),
            });
        }
    }

    Ok(PeriodicReport { header, relays })
}

/// Decode a 0x16 event-driven frame: `event_count` triplets of
/// `(relay_addr_hi, relay_addr_lo, status)` starting at byte index 19.
pub fn decode_event(raw: &[u8], relay_table: &RelayTable) -> Result<EventReport> {
    let header = read_header(raw)?;
    if raw.len() <= 18 {
        return Err(KavachError::TruncatedFrame { offset: raw.len(), needed: 19 - raw.len() });
    }
    let event_count = raw[18] as usize;
    let mut events = Vec::with_capacity(event_count);
    let mut pos = 19usize;
    for _ in 0..event_count {
        if pos + 3 > raw.len() {
            break;
        }
        let relay_addr = u16::from_be_bytes([raw[pos], raw[pos + 1]]);
        let status_byte = raw[pos + 2];
        pos += 3;

        let relay = relay_table.by_addr(relay_addr);
        let is_tpr = relay.map(|r| r.is_tpr()).unwrap_or(false);
        events.push(RelayEvent {
            relay_addr,
            name: relay.map(|r| r.name.clone()),
            status: RelayStatus::from_event_status(status_byte, is_tpr),
        });
    }

    Ok(EventReport { header, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relays::RelayInfo;

    fn raw_header(station_id: u16) -> Vec<u8> {
        let mut raw = vec![0xAA, 0xAA, 0x15, 0x00, 0x10, 0x00, 0x01];
        raw.extend_from_slice(&station_id.to_be_bytes());
        raw.extend_from_slice(&[0x00, 0x00, 0x01]); // padding to reach index 12
        raw.extend_from_slice(&[0x01, 0x02, 0x19]); // date
        raw.extend_from_slice(&[0x0A, 0x0B, 0x0C]); // time
        raw
    }

    fn table() -> RelayTable {
        RelayTable::new(vec![
            RelayInfo { index: 0, name: "X_TPR".into(), addr: 0x0001 },
            RelayInfo { index: 1, name: "Y_BPR".into(), addr: 0x0002 },
        ])
    }

    #[test]
    fn test_periodic_bitmap_scenario_b() {
        let mut raw = raw_header(7);
        raw.extend_from_slice(&[0x01, 0x00]); // bitmap "0100" hex in spec example
        let report = decode_periodic(&raw, &table()).unwrap();
        assert_eq!(report.relays[0].status, RelayStatus::PickedUp);
        assert_eq!(report.relays[1].status, RelayStatus::DropDown);
    }

    #[test]
    fn test_frame_number_formula() {
        let h = raw_header(1);
        let hdr = read_header(&h).unwrap();
        assert_eq!(hdr.frame_number, 10 * 3600 + 11 * 60 + 12 + 1);
    }

    #[test]
    fn test_event_decode_basic() {
        let mut raw = raw_header(1);
        raw.push(0x01); // event_count
        raw.extend_from_slice(&[0x00, 0x01, 0x01]); // relay_addr=1, status=01
        let report = decode_event(&raw, &table()).unwrap();
        assert_eq!(report.events.len(), 1);
        // TPR + status 0x01 -> DropDown (mirrors the periodic path inverted)
        assert_eq!(report.events[0].status, RelayStatus::DropDown);
    }

    #[test]
    fn test_event_truncated_header() {
        let raw = vec![0xAA, 0xAA, 0x16];
        assert!(matches!(decode_event(&raw, &table()), Err(KavachError::TruncatedFrame { .. })));
    }
}
