//! Health decoders (0x17 stationary, 0x18 onboard) — id-tagged event lists
//! whose per-event payload size is looked up from a fixed table.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::types::{make_datetime, KavachError, Result};

const HEADER_LEN: usize = 14; // up to and including time, per §4.7

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthFamily {
    Stationary, // 0x17
    Onboard,    // 0x18
}

/// Authoritative event-size tables (§6), bytes per event_id.
fn event_size(family: HealthFamily, event_id: u16) -> usize {
    match family {
        HealthFamily::Stationary => match event_id {
            1..=20 => 1,
            21 => 2,
            22 => 1,
            23 => 2,
            24 => 1,
            25..=26 => 1,
            27..=37 => 1,
            38..=42 => 2,
            43..=44 => 4,
            45 => 2,
            _ => 2,
        },
        HealthFamily::Onboard => match event_id {
            1..=16 => 1,
            17 => 2,
            18..=26 => 1,
            27..=28 => 2,
            29..=32 => 1,
            33..=38 => 2,
            39..=40 => 4,
            41..=45 => 1,
            46..=47 => 3,
            48 => 4,
            49..=54 => 1,
            55..=56 => 2,
            57 => 4,
            _ => 2,
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthHeader {
    pub stationary_kavach_id: u16,
    pub nms_system_id: u16,
    pub system_version: u8,
    pub event_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthEvent {
    pub event_id: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthPacket {
    pub header: HealthHeader,
    pub events: Vec<HealthEvent>,
}

/// Decode a 0x17/0x18 health packet. Stops silently (without error) if the
/// remaining bytes cannot accommodate the next declared entry.
pub fn decode(raw: &[u8], family: HealthFamily) -> Result<HealthPacket> {
    if raw.len() < HEADER_LEN + 1 {
        return Err(KavachError::TruncatedFrame { offset: raw.len(), needed: HEADER_LEN + 1 - raw.len() });
    }
    let stationary_kavach_id = u16::from_be_bytes([raw[3], raw[4]]);
    let nms_system_id = u16::from_be_bytes([raw[5], raw[6]]);
    let system_version = raw[7];
    let day = raw[8];
    let month = raw[9];
    let year2 = raw[10];
    let hh = raw[11];
    let mm = raw[12];
    let ss = raw[13];
    let event_time = make_datetime(day, month, year2, hh, mm, ss)?;

    let event_count = raw[HEADER_LEN] as usize;
    let mut events = Vec::with_capacity(event_count);
    let mut pos = HEADER_LEN + 1;
    for _ in 0..event_count {
        if pos + 2 > raw.len() {
            break;
        }
        let event_id = u16::from_be_bytes([raw[pos], raw[pos + 1]]);
        pos += 2;
        let size = event_size(family, event_id);
        if pos + size > raw.len() {
            break;
        }
        events.push(HealthEvent { event_id, data: raw[pos..pos + size].to_vec() });
        pos += size;
    }

    Ok(HealthPacket {
        header: HealthHeader { stationary_kavach_id, nms_system_id, system_version, event_time },
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut raw = vec![0xAA, 0xAA, 0x17];
        raw.extend_from_slice(&[0x00, 0x02]); // stationary_kavach_id
        raw.extend_from_slice(&[0x00, 0x03]); // nms_system_id
        raw.push(0x01); // system_version
        raw.extend_from_slice(&[0x01, 0x02, 0x19]); // date
        raw.extend_from_slice(&[0x0A, 0x0B, 0x0C]); // time
        raw
    }

    #[test]
    fn test_decode_single_1byte_event() {
        let mut raw = header_bytes();
        raw.push(0x01); // event_count
        raw.extend_from_slice(&[0x00, 0x05]); // event_id 5 -> 1 byte
        raw.push(0x42);
        let pkt = decode(&raw, HealthFamily::Stationary).unwrap();
        assert_eq!(pkt.events.len(), 1);
        assert_eq!(pkt.events[0].data, vec![0x42]);
    }

    #[test]
    fn test_decode_4byte_event_id_43() {
        let mut raw = header_bytes();
        raw.push(0x01);
        raw.extend_from_slice(&[0x00, 43]);
        raw.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        let pkt = decode(&raw, HealthFamily::Stationary).unwrap();
        assert_eq!(pkt.events[0].data, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_decode_stops_silently_on_truncated_entry() {
        let mut raw = header_bytes();
        raw.push(0x02); // declares 2 events
        raw.extend_from_slice(&[0x00, 0x05]);
        raw.push(0x42); // first event complete
        // second event_id declared but no payload bytes follow
        raw.extend_from_slice(&[0x00, 43]);
        let pkt = decode(&raw, HealthFamily::Stationary).unwrap();
        assert_eq!(pkt.events.len(), 1);
    }

    #[test]
    fn test_onboard_event_size_table_default() {
        assert_eq!(event_size(HealthFamily::Onboard, 57), 4);
        assert_eq!(event_size(HealthFamily::Onboard, 999), 2);
    }
}
