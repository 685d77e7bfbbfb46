//! Loco position-info decoder (0x12) — Regular and Access-Request payloads.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::bitreader::{BitCursor, ByteCursor};
use crate::types::{make_datetime, ActiveRadio, KavachError, Result};

pub const HEADER_LEN: usize = 19;

#[derive(Debug, Clone, Serialize)]
pub struct PosHeader {
    pub message_length: u16,
    pub message_sequence: u16,
    pub stationary_kavach_id: u16,
    pub nms_system_id: u16,
    pub system_version: u8,
    pub event_time: NaiveDateTime,
    pub active_radio: ActiveRadio,
}

fn read_header(cur: &mut ByteCursor<'_>) -> Result<PosHeader> {
    let _message_type = cur.u8()?;
    let message_length = cur.u16()?;
    let message_sequence = cur.u16()?;
    let stationary_kavach_id = cur.u16()?;
    let nms_system_id = cur.u16()?;
    let system_version = cur.u8()?;
    let day = cur.u8()?;
    let month = cur.u8()?;
    let year2 = cur.u8()?;
    let hh = cur.u8()?;
    let mm = cur.u8()?;
    let ss = cur.u8()?;
    let active_radio = ActiveRadio::from(cur.u8()?);
    let event_time = make_datetime(day, month, year2, hh, mm, ss)?;
    Ok(PosHeader {
        message_length,
        message_sequence,
        stationary_kavach_id,
        nms_system_id,
        system_version,
        event_time,
        active_radio,
    })
}

/// Speed class mapping shared by the loco-speed and TSR-universal tables.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SpeedValue {
    Kmh(u32),
    Label(&'static str),
}

pub fn decode_speed_class(code: u32) -> SpeedValue {
    match code {
        0 => SpeedValue::Label("Dead Stop"),
        1..=50 => SpeedValue::Kmh(code * 5),
        51..=61 => SpeedValue::Label("Reserved"),
        62 => SpeedValue::Kmh(8),
        _ => SpeedValue::Label("Unknown"),
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum MovementDir {
    Nominal,
    Reverse,
    Unidentified,
}

impl From<u32> for MovementDir {
    fn from(v: u32) -> Self {
        match v {
            1 => MovementDir::Nominal,
            2 => MovementDir::Reverse,
            _ => MovementDir::Unidentified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PosRegular {
    pub header: PosHeader,
    pub frame_number: u32,
    pub source_loco_id: u32,
    pub source_loco_version: u32,
    pub absolute_loco_location: u32,
    pub l_doubt_over: u32,
    pub l_doubt_under: u32,
    pub train_integrity: u32,
    pub train_length: u32,
    pub train_speed: u32,
    pub movement_dir: MovementDir,
    pub emergency_status: u32,
    pub loco_mode: u32,
    pub last_rfid_tag: u32,
    pub tag_dup: u32,
    pub tag_link_info: u32,
    pub tin: u32,
    pub brake_applied: u32,
    pub new_ma_reply: u32,
    pub last_ref_profile_num: u32,
    pub signal_override: u32,
    pub info_ack: u32,
    pub onboard_health: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PosAccessRequest {
    pub header: PosHeader,
    pub frame_number: u32,
    pub source_loco_id: u32,
    pub source_loco_version: u32,
    pub absolute_loco_location: u32,
    pub train_length: u32,
    pub train_speed: u32,
    pub movement_dir: MovementDir,
    pub emergency_status: u32,
    pub loco_mode: u32,
    pub approaching_station_id: u32,
    pub last_rfid_tag: u32,
    pub tin: u32,
    pub longitude: u32,
    pub latitude: u32,
    pub loco_rnd_num_rl: u32,
}

#[derive(Debug, Clone, Serialize)]
pub enum PosPacket {
    Regular(PosRegular),
    AccessRequest(PosAccessRequest),
}

/// `loco_id` sentinels rejected across position/graph processing (§4.9).
pub fn is_loco_id_sentinel(loco_id: u32) -> bool {
    loco_id == 0 || loco_id == 0xFFFFF
}

pub fn decode(raw: &[u8]) -> Result<PosPacket> {
    if raw.len() < HEADER_LEN + 3 {
        return Err(KavachError::TruncatedFrame { offset: raw.len(), needed: HEADER_LEN + 3 - raw.len() });
    }
    let mut byte_cur = ByteCursor::new(raw);
    byte_cur.skip(2)?; // SOF
    let header = read_header(&mut byte_cur)?;
    byte_cur.skip(2)?; // SOF-TX

    let type_byte_pos = byte_cur.position();
    let mut bits = BitCursor::at_bit(raw, type_byte_pos * 8);
    let pkt_type = bits.bits(4)?;

    match pkt_type {
        0b1010 => decode_regular(header, &mut bits),
        0b1101 => decode_access_request(header, &mut bits),
        other => Err(KavachError::InvalidFieldValue(format!(
            "unexpected position-info inner packet_type {other:#06b}"
        ))),
    }
}

fn decode_regular(header: PosHeader, bits: &mut BitCursor) -> Result<PosPacket> {
    let _pkt_length = bits.bits(7)?;
    let frame_number = bits.bits(17)?;
    let source_loco_id = bits.bits(20)?;
    let source_loco_version = bits.bits(3)?;
    let absolute_loco_location = bits.bits(23)?;
    let l_doubt_over = bits.bits(9)?;
    let l_doubt_under = bits.bits(9)?;
    let train_integrity = bits.bits(2)?;
    let train_length = bits.bits(11)?;
    let train_speed = bits.bits(9)?;
    let movement_dir = MovementDir::from(bits.bits(2)?);
    let emergency_status = bits.bits(3)?;
    let loco_mode = bits.bits(4)?;
    let last_rfid_tag = bits.bits(10)?;
    let tag_dup = bits.bits(1)?;
    let tag_link_info = bits.bits(3)?;
    let tin = bits.bits(9)?;
    let brake_applied = bits.bits(3)?;
    let new_ma_reply = bits.bits(2)?;
    let last_ref_profile_num = bits.bits(4)?;
    let signal_override = bits.bits(1)?;
    let info_ack = bits.bits(4)?;
    bits.skip(2)?; // spare
    let onboard_health = bits.bits(24)?;
    // 64 trailing bits (MAC + CRC) are read but not verified (§1 non-goals).
    let _ = bits.skip(64);

    if is_loco_id_sentinel(source_loco_id) {
        return Err(KavachError::InvalidFieldValue(format!(
            "source_loco_id {source_loco_id:#07X} is a sentinel value"
        )));
    }

    Ok(PosPacket::Regular(PosRegular {
        header,
        frame_number,
        source_loco_id,
        source_loco_version,
        absolute_loco_location,
        l_doubt_over,
        l_doubt_under,
        train_integrity,
        train_length,
        train_speed,
        movement_dir,
        emergency_status,
        loco_mode,
        last_rfid_tag,
        tag_dup,
        tag_link_info,
        tin,
        brake_applied,
        new_ma_reply,
        last_ref_profile_num,
        signal_override,
        info_ack,
        onboard_health,
    }))
}

fn decode_access_request(header: PosHeader, bits: &mut BitCursor) -> Result<PosPacket> {
    let _length = bits.bits(7)?;
    let frame_number = bits.bits(17)?;
    let source_loco_id = bits.bits(20)?;
    let source_loco_version = bits.bits(3)?;
    let absolute_loco_location = bits.bits(23)?;
    let train_length = bits.bits(11)?;
    let train_speed = bits.bits(9)?;
    let movement_dir = MovementDir::from(bits.bits(2)?);
    let emergency_status = bits.bits(3)?;
    let loco_mode = bits.bits(4)?;
    let approaching_station_id = bits.bits(16)?;
    let last_rfid_tag = bits.bits(10)?;
    let tin = bits.bits(9)?;
    let longitude = bits.bits(21)?;
    let latitude = bits.bits(20)?;
    let loco_rnd_num_rl = bits.bits(4)?;

    Ok(PosPacket::AccessRequest(PosAccessRequest {
        header,
        frame_number,
        source_loco_id,
        source_loco_version,
        absolute_loco_location,
        train_length,
        train_speed,
        movement_dir,
        emergency_status,
        loco_mode,
        approaching_station_id,
        last_rfid_tag,
        tin,
        longitude,
        latitude,
        loco_rnd_num_rl,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_regular_frame() -> Vec<u8> {
        // Header (19B) + SOF-TX (2B) + enough payload bits for a minimal
        // Regular packet (pkt_type=0b1010) followed by 64 trailing bits.
        let mut raw = vec![0xAA, 0xAA]; // SOF
        raw.push(0x12); // message_type
        raw.extend_from_slice(&[0x00, 0x20]); // message_length
        raw.extend_from_slice(&[0x00, 0x01]); // message_sequence
        raw.extend_from_slice(&[0x00, 0x02]); // stationary_kavach_id
        raw.extend_from_slice(&[0x00, 0x03]); // nms_system_id
        raw.push(0x01); // system_version
        raw.extend_from_slice(&[0x01, 0x02, 0x19]); // date
        raw.extend_from_slice(&[0x0A, 0x0B, 0x0C]); // time
        raw.push(0xF1); // active_radio
        raw.extend_from_slice(&[0xAA, 0xAA]); // SOF-TX
        // payload: pkt_type(4)=1010, then zero-filled bits for the rest,
        // padded out generously so every field read succeeds.
        raw.extend_from_slice(&[0xA0; 40]);
        raw
    }

    #[test]
    fn test_decode_regular_rejects_sentinel_loco_id() {
        let raw = sample_regular_frame();
        // With an all-zero-ish payload, source_loco_id will be 0 -> sentinel.
        let result = decode(&raw);
        assert!(matches!(result, Err(KavachError::InvalidFieldValue(_))));
    }

    #[test]
    fn test_decode_rejects_unexpected_inner_type() {
        let mut raw = sample_regular_frame();
        // Flip the payload's leading nibble to something invalid (0b0001).
        raw[21] = 0x10;
        let result = decode(&raw);
        assert!(matches!(result, Err(KavachError::InvalidFieldValue(_))));
    }

    #[test]
    fn test_speed_class_mapping() {
        assert!(matches!(decode_speed_class(0), SpeedValue::Label("Dead Stop")));
        assert!(matches!(decode_speed_class(1), SpeedValue::Kmh(5)));
        assert!(matches!(decode_speed_class(50), SpeedValue::Kmh(250)));
        assert!(matches!(decode_speed_class(51), SpeedValue::Label("Reserved")));
        assert!(matches!(decode_speed_class(61), SpeedValue::Label("Reserved")));
        assert!(matches!(decode_speed_class(62), SpeedValue::Kmh(8)));
        assert!(matches!(decode_speed_class(63), SpeedValue::Label("Unknown")));
    }

    #[test]
    fn test_is_loco_id_sentinel() {
        assert!(is_loco_id_sentinel(0));
        assert!(is_loco_id_sentinel(0xFFFFF));
        assert!(!is_loco_id_sentinel(1234));
    }

    #[test]
    fn test_decode_truncated_frame() {
        let raw = vec![0xAA, 0xAA, 0x12];
        assert!(matches!(decode(&raw), Err(KavachError::TruncatedFrame { .. })));
    }
}
