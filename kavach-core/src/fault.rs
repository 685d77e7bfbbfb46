//! Fault report decoder (0x19) — header + up to 10 fault items + CRC32.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::crc::crc32_reflected;
use crate::types::{make_datetime, FaultKind, FaultOrigin, KavachError, Result};

pub const MAX_FAULT_COUNT: u8 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct FaultHeader {
    pub message_length: u16,
    pub message_sequence: u16,
    pub kavach_subsystem_id: u32,
    pub nms_system_id: u16,
    pub system_version: u8,
    pub event_time: NaiveDateTime,
    pub subsystem_type: FaultOrigin,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaultItem {
    pub module_id: u8,
    pub fault_type: FaultKind,
    pub fault_code: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaultPacket {
    pub header: FaultHeader,
    pub items: Vec<FaultItem>,
}

/// Decode a 0x19 fault packet. Validates `message_length`, `fault_count`,
/// per-item `fault_type`, and the trailing CRC32 — any failure rejects the
/// whole frame (the CRC is actually enforced for this family, unlike the
/// others where it is read but not checked).
pub fn decode(raw: &[u8]) -> Result<FaultPacket> {
    const HEADER_LEN: usize = 2 + 1 + 2 + 2 + 3 + 2 + 1 + 3 + 3 + 1 + 1;
    if raw.len() < HEADER_LEN {
        return Err(KavachError::TruncatedFrame { offset: raw.len(), needed: HEADER_LEN - raw.len() });
    }

    let message_length = u16::from_be_bytes([raw[3], raw[4]]);
    let total_bytes = raw.len();
    if message_length as usize != total_bytes - 2 {
        return Err(KavachError::InvalidMessageLength {
            declared: message_length as usize,
            actual: total_bytes - 2,
        });
    }

    let message_sequence = u16::from_be_bytes([raw[5], raw[6]]);
    let kavach_subsystem_id = ((raw[7] as u32) << 16) | ((raw[8] as u32) << 8) | raw[9] as u32;
    let nms_system_id = u16::from_be_bytes([raw[10], raw[11]]);
    let system_version = raw[12];
    let day = raw[13];
    let month = raw[14];
    let year2 = raw[15];
    let hh = raw[16];
    let mm = raw[17];
    let ss = raw[18];
    let event_time = make_datetime(day, month, year2, hh, mm, ss)?;

    let subsystem_byte = raw[19];
    let subsystem_type = FaultOrigin::from_byte(subsystem_byte).ok_or_else(|| {
        KavachError::InvalidFieldValue(format!("subsystem_type {subsystem_byte:#04X}"))
    })?;

    let fault_count = raw[20];
    if fault_count > MAX_FAULT_COUNT {
        return Err(KavachError::InvalidFieldValue(format!(
            "fault_count {fault_count} exceeds {MAX_FAULT_COUNT}"
        )));
    }

    let mut items = Vec::with_capacity(fault_count as usize);
    let mut pos = 21usize;
    for _ in 0..fault_count {
        if pos + 4 > total_bytes {
            return Err(KavachError::TruncatedFrame { offset: pos, needed: (pos + 4) - total_bytes });
        }
        let module_id = raw[pos];
        let type_byte = raw[pos + 1];
        let fault_code = u16::from_be_bytes([raw[pos + 2], raw[pos + 3]]);
        let fault_type = FaultKind::from_byte(type_byte)
            .ok_or_else(|| KavachError::InvalidFieldValue(format!("fault type {type_byte}")))?;
        items.push(FaultItem { module_id, fault_type, fault_code });
        pos += 4;
    }

    if total_bytes < 4 || pos + 4 != total_bytes {
        return Err(KavachError::InvalidMessageLength { declared: message_length as usize, actual: total_bytes - 2 });
    }

    let declared_crc = u32::from_be_bytes([
        raw[total_bytes - 4],
        raw[total_bytes - 3],
        raw[total_bytes - 2],
        raw[total_bytes - 1],
    ]);
    let computed_crc = crc32_reflected(&raw[2..total_bytes - 4]);
    if computed_crc != declared_crc {
        return Err(KavachError::CrcMismatch { computed: computed_crc, declared: declared_crc });
    }

    Ok(FaultPacket {
        header: FaultHeader {
            message_length,
            message_sequence,
            kavach_subsystem_id,
            nms_system_id,
            system_version,
            event_time,
            subsystem_type,
        },
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hex_decode;

    fn build_frame(items: &[(u8, u8, u16)]) -> Vec<u8> {
        let mut body = vec![0x19]; // message_type
        // placeholder length, patched below
        body.extend_from_slice(&[0x00, 0x00]);
        body.extend_from_slice(&[0x00, 0x01]); // sequence
        body.extend_from_slice(&[0x00, 0x00, 0x01]); // kavach_subsystem_id
        body.extend_from_slice(&[0x00, 0x02]); // nms_system_id
        body.push(0x01); // version
        body.extend_from_slice(&[0x01, 0x02, 0x19]); // date
        body.extend_from_slice(&[0x0A, 0x0B, 0x0C]); // time
        body.push(0x22); // subsystem_type LOCO
        body.push(items.len() as u8);
        for &(module, ftype, code) in items {
            body.push(module);
            body.push(ftype);
            body.extend_from_slice(&code.to_be_bytes());
        }
        // total frame = SOF(2) + body; message_length = total - 2
        let total_len = 2 + body.len() + 4; // + CRC
        let message_length = (total_len - 2) as u16;
        body[1] = (message_length >> 8) as u8;
        body[2] = (message_length & 0xFF) as u8;

        let crc = crc32_reflected(&body);
        let mut frame = vec![0xAA, 0xAA];
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&crc.to_be_bytes());
        frame
    }

    #[test]
    fn test_decode_single_fault_scenario_a() {
        let raw = build_frame(&[(0x05, 0x01, 0x002A)]);
        let pkt = decode(&raw).unwrap();
        assert!(matches!(pkt.header.subsystem_type, FaultOrigin::Loco));
        assert_eq!(pkt.items.len(), 1);
        assert_eq!(pkt.items[0].fault_code, 0x002A);
        assert_eq!(pkt.header.event_time.to_string(), "2025-02-01 10:11:12");
    }

    #[test]
    fn test_decode_rejects_bad_crc() {
        let mut raw = build_frame(&[(0x05, 0x01, 0x002A)]);
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        assert!(matches!(decode(&raw), Err(KavachError::CrcMismatch { .. })));
    }

    #[test]
    fn test_decode_rejects_too_many_faults() {
        let items: Vec<(u8, u8, u16)> = (0..11).map(|i| (i, 1, i as u16)).collect();
        let raw = build_frame(&items);
        assert!(matches!(decode(&raw), Err(KavachError::InvalidFieldValue(_))));
    }

    #[test]
    fn test_decode_rejects_bad_message_length() {
        let mut raw = build_frame(&[(0x05, 0x01, 0x002A)]);
        raw[3] = 0xFF; // corrupt message_length high byte
        assert!(matches!(decode(&raw), Err(KavachError::InvalidMessageLength { .. })));
    }

    #[test]
    fn test_hex_decode_smoke() {
        assert!(hex_decode("AA").is_some());
    }
}
