//! Stationary-KAVACH radio packet decoder (0x11) — Regular, Access and
//! Emergency variants, plus the eight Regular sub-packet types.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::bitreader::BitCursor;
use crate::pos::decode_speed_class;
use crate::types::{make_datetime, ActiveRadio, KavachError, Result};

pub const HEADER_LEN: usize = 19;

#[derive(Debug, Clone, Serialize)]
pub struct StaHeader {
    pub message_length: u16,
    pub message_sequence: u16,
    pub stationary_kavach_id: u16,
    pub nms_system_id: u16,
    pub system_version: u8,
    pub event_time: NaiveDateTime,
    pub active_radio: ActiveRadio,
}

fn read_header(raw: &[u8]) -> Result<(StaHeader, usize)> {
    if raw.len() < HEADER_LEN {
        return Err(KavachError::TruncatedFrame { offset: raw.len(), needed: HEADER_LEN - raw.len() });
    }
    let message_length = u16::from_be_bytes([raw[3], raw[4]]);
    let message_sequence = u16::from_be_bytes([raw[5], raw[6]]);
    let stationary_kavach_id = u16::from_be_bytes([raw[7], raw[8]]);
    let nms_system_id = u16::from_be_bytes([raw[9], raw[10]]);
    let system_version = raw[11];
    let day = raw[12];
    let month = raw[13];
    let year2 = raw[14];
    let hh = raw[15];
    let mm = raw[16];
    let ss = raw[17];
    let active_radio = ActiveRadio::from(raw[18]);
    let event_time = make_datetime(day, month, year2, hh, mm, ss)?;
    Ok((
        StaHeader {
            message_length,
            message_sequence,
            stationary_kavach_id,
            nms_system_id,
            system_version,
            event_time,
            active_radio,
        },
        HEADER_LEN,
    ))
}

/// Locate the `A5 C3` payload marker (or a bare `C3` fallback, as the
/// original graph-path re-derivation tolerates) after the fixed header,
/// returning the byte offset immediately past it.
fn find_payload_start(raw: &[u8]) -> Option<usize> {
    for i in HEADER_LEN..raw.len().saturating_sub(1) {
        if raw[i] == 0xA5 && raw[i + 1] == 0xC3 {
            return Some(i + 2);
        }
    }
    for i in HEADER_LEN..raw.len() {
        if raw[i] == 0xC3 {
            return Some(i + 1);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Sub-packet types (Regular payload)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SignalInfo {
    pub stop: u32,
    pub override_flag: u32,
    pub sig_type: u32,
    pub line_name: u32,
    pub line_no: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementAuthority {
    pub frame_offset: u32,
    pub dest_loco_sos: u32,
    pub train_section_type: u32,
    pub signal_info: SignalInfo,
    pub cur_aspect: u32,
    pub next_aspect: u32,
    pub appr_sig_dist: u32,
    pub authority_type: u32,
    pub authorized_speed: Option<u32>,
    pub ma_wrt_sig: u32,
    pub req_shorten_ma: u32,
    pub new_ma: Option<u32>,
    pub trn_len_info_sts: u32,
    pub trn_len_info_type: Option<u32>,
    pub ref_frame_num_tlm: Option<u32>,
    pub ref_offset_int_tlm: Option<u32>,
    pub next_stn_comm: u32,
    pub appr_stn_ilc_ibs_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeedProfileEntry {
    pub dist: u32,
    pub class: u32,
    pub speed: Option<u32>,
    pub sp_a: Option<u32>,
    pub sp_b: Option<u32>,
    pub sp_c: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradientEntry {
    pub dist: u32,
    pub direction: u32,
    pub value: u32,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LcGateEntry {
    pub dist: u32,
    pub id_num: u32,
    pub suffix: u32,
    pub manning: u32,
    pub class: u32,
    pub auto_whistle: u32,
    pub whistle_type: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnoutSpeedEntry {
    pub speed: u32,
    pub diff_dist: Option<u32>,
    pub rel_dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLinkEntry {
    pub dist_next_rfid: u32,
    pub next_rfid_id: u32,
    pub dup_tag_dir: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLinking {
    pub dist_dup_tag: u32,
    pub entries: Vec<TagLinkEntry>,
    pub abs_loc_reset: u32,
    pub start_dist: Option<u32>,
    pub adj_loco_dir: Option<u32>,
    pub abs_loc_correction: Option<u32>,
    pub adj_line_cnt: Option<u32>,
    pub line_tin: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackConditionEntry {
    pub cond_type: u32,
    pub start_dist: u32,
    pub length: u32,
    pub reserved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TsrEntry {
    pub id: u32,
    pub dist: u32,
    pub length: u32,
    pub class: u32,
    pub univ_speed: Option<u32>,
    pub sp_a: Option<u32>,
    pub sp_b: Option<u32>,
    pub sp_c: Option<u32>,
    pub whistle: u32,
}

#[derive(Debug, Clone, Serialize)]
pub enum SubPacket {
    MovementAuthority(MovementAuthority),
    StaticSpeedProfile(Vec<SpeedProfileEntry>),
    Gradient(Vec<GradientEntry>),
    LcGate(Vec<LcGateEntry>),
    TurnoutSpeed(Vec<TurnoutSpeedEntry>),
    TagLinking(TagLinking),
    TrackCondition(Vec<TrackConditionEntry>),
    Tsr(Vec<TsrEntry>),
    /// TSR sub-packet observed with `tsr_status != 2` — skipped entirely,
    /// no entries emitted (scenario C).
    TsrSkipped,
    Unknown { sub_type: u32 },
}

fn decode_movement_authority(b: &mut BitCursor) -> Result<SubPacket> {
    let frame_offset = b.bits(4)?;
    let dest_loco_sos = b.bits(4)?;
    let train_section_type = b.bits(2)?;
    let stop = b.bits(1)?;
    let override_flag = b.bits(1)?;
    let sig_type = b.bits(6)?;
    let line_name = b.bits(4)?;
    let line_no = b.bits(5)?;
    let cur_aspect = b.bits(6)?;
    let next_aspect = b.bits(6)?;
    let appr_sig_dist = b.bits(15)?;
    let authority_type = b.bits(2)?;
    let authorized_speed = if authority_type == 0b01 { Some(b.bits(6)?) } else { None };
    let ma_wrt_sig = b.bits(16)?;
    let req_shorten_ma = b.bits(1)?;
    let new_ma = if req_shorten_ma != 0 { Some(b.bits(16)?) } else { None };
    let trn_len_info_sts = b.bits(1)?;
    let (trn_len_info_type, ref_frame_num_tlm, ref_offset_int_tlm) = if trn_len_info_sts != 0 {
        (Some(b.bits(1)?), Some(b.bits(17)?), Some(b.bits(8)?))
    } else {
        (None, None, None)
    };
    let next_stn_comm = b.bits(1)?;
    let appr_stn_ilc_ibs_id = if next_stn_comm != 0 { Some(b.bits(16)?) } else { None };

    Ok(SubPacket::MovementAuthority(MovementAuthority {
        frame_offset,
        dest_loco_sos,
        train_section_type,
        signal_info: SignalInfo { stop, override_flag, sig_type, line_name, line_no },
        cur_aspect,
        next_aspect,
        appr_sig_dist,
        authority_type,
        authorized_speed,
        ma_wrt_sig,
        req_shorten_ma,
        new_ma,
        trn_len_info_sts,
        trn_len_info_type,
        ref_frame_num_tlm,
        ref_offset_int_tlm,
        next_stn_comm,
        appr_stn_ilc_ibs_id,
    }))
}

fn decode_static_speed_profile(b: &mut BitCursor) -> Result<SubPacket> {
    let count = b.bits(5)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let dist = b.bits(15)?;
        let class = b.bits(1)?;
        if class == 0 {
            entries.push(SpeedProfileEntry { dist, class, speed: Some(b.bits(6)?), sp_a: None, sp_b: None, sp_c: None });
        } else {
            let sp_a = b.bits(6)?;
            let sp_b = b.bits(6)?;
            let sp_c = b.bits(6)?;
            entries.push(SpeedProfileEntry { dist, class, speed: None, sp_a: Some(sp_a), sp_b: Some(sp_b), sp_c: Some(sp_c) });
        }
    }
    Ok(SubPacket::StaticSpeedProfile(entries))
}

fn decode_gradient(b: &mut BitCursor) -> Result<SubPacket> {
    let count = b.bits(5)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let dist = b.bits(15)?;
        let direction = b.bits(1)?;
        let value = b.bits(5)?;
        entries.push(GradientEntry { dist, direction, value, valid: value <= 30 });
    }
    Ok(SubPacket::Gradient(entries))
}

fn decode_lc_gate(b: &mut BitCursor) -> Result<SubPacket> {
    let count = b.bits(5)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(LcGateEntry {
            dist: b.bits(15)?,
            id_num: b.bits(10)?,
            suffix: b.bits(3)?,
            manning: b.bits(1)?,
            class: b.bits(3)?,
            auto_whistle: b.bits(1)?,
            whistle_type: b.bits(2)?,
        });
    }
    Ok(SubPacket::LcGate(entries))
}

fn decode_turnout_speed(b: &mut BitCursor) -> Result<SubPacket> {
    let count = b.bits(2)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let speed = b.bits(5)?;
        if (1..=18).contains(&speed) {
            entries.push(TurnoutSpeedEntry { speed, diff_dist: Some(b.bits(15)?), rel_dist: Some(b.bits(12)?) });
        } else {
            entries.push(TurnoutSpeedEntry { speed, diff_dist: None, rel_dist: None });
        }
    }
    Ok(SubPacket::TurnoutSpeed(entries))
}

fn decode_tag_linking(b: &mut BitCursor, sub_start_bit: usize, sub_bits: usize) -> Result<SubPacket> {
    let dist_dup_tag = b.bits(4)?;
    let rfid_count = b.bits(6)?;
    let end_bit = sub_start_bit + sub_bits;
    let mut entries = Vec::new();
    for _ in 0..rfid_count.min(62) {
        if b.position() + 22 > end_bit {
            break;
        }
        entries.push(TagLinkEntry {
            dist_next_rfid: b.bits(11)?,
            next_rfid_id: b.bits(10)?,
            dup_tag_dir: b.bits(1)?,
        });
    }

    let abs_loc_reset = if b.position() < end_bit { b.bits(1)? } else { 0 };
    let mut start_dist = None;
    let mut adj_loco_dir = None;
    let mut abs_loc_correction = None;
    let mut adj_line_cnt = None;
    let mut line_tin = Vec::new();
    if abs_loc_reset != 0 {
        start_dist = Some(b.bits(15)?);
        adj_loco_dir = Some(b.bits(2)?);
        abs_loc_correction = Some(b.bits(23)?);
        let cnt = b.bits(3)?;
        adj_line_cnt = Some(cnt);
        for _ in 0..cnt.min(5) {
            if b.position() + 9 > end_bit {
                break;
            }
            line_tin.push(b.bits(9)?);
        }
    }

    Ok(SubPacket::TagLinking(TagLinking {
        dist_dup_tag,
        entries,
        abs_loc_reset,
        start_dist,
        adj_loco_dir,
        abs_loc_correction,
        adj_line_cnt,
        line_tin,
    }))
}

fn decode_track_condition(b: &mut BitCursor) -> Result<SubPacket> {
    let count = b.bits(4)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let cond_type = b.bits(4)?;
        let start_dist = b.bits(15)?;
        let length = b.bits(15)?;
        entries.push(TrackConditionEntry { cond_type, start_dist, length, reserved: cond_type > 9 });
    }
    Ok(SubPacket::TrackCondition(entries))
}

fn decode_tsr(b: &mut BitCursor) -> Result<SubPacket> {
    let tsr_status = b.bits(2)?;
    if tsr_status != 2 {
        return Ok(SubPacket::TsrSkipped);
    }
    let count = b.bits(5)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = b.bits(8)?;
        let dist = b.bits(15)?;
        let length = b.bits(15)?;
        let class = b.bits(1)?;
        let (univ_speed, sp_a, sp_b, sp_c) = if class == 0 {
            (Some(b.bits(6)?), None, None, None)
        } else {
            (None, Some(b.bits(6)?), Some(b.bits(6)?), Some(b.bits(6)?))
        };
        let whistle = b.bits(2)?;
        entries.push(TsrEntry { id, dist, length, class, univ_speed, sp_a, sp_b, sp_c, whistle });
    }
    Ok(SubPacket::Tsr(entries))
}

/// Re-expose the shared speed-class table (0x12 and TSR-universal share it).
pub fn tsr_universal_speed(code: u32) -> crate::pos::SpeedValue {
    decode_speed_class(code)
}

// ---------------------------------------------------------------------------
// Regular / Access / Emergency packets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StaRegular {
    pub header: StaHeader,
    pub frame_num: u32,
    pub source_stn_id: u32,
    pub source_version: u32,
    pub dest_loco_id: u32,
    pub ref_profile_id: u32,
    pub last_ref_rfid: u32,
    pub dist_pkt_start: i32,
    pub pkt_direction: u32,
    pub sub_packets: Vec<SubPacket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaAccess {
    pub header: StaHeader,
    pub frame_num: u32,
    pub source_stn_id: u32,
    pub source_version: u32,
    pub dest_loco_id: u32,
    pub uplink_freq: u32,
    pub downlink_freq: u32,
    pub tdma: u32,
    pub rnd_rs: u32,
    pub stn_tdma: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaEmergency {
    pub header: StaHeader,
    pub frame_num: u32,
    pub source_stn_id: u32,
    pub source_version: u32,
    pub stn_loc: u32,
    pub gen_sos_call: u32,
}

#[derive(Debug, Clone, Serialize)]
pub enum StaPacket {
    Regular(StaRegular),
    Access(StaAccess),
    Emergency(StaEmergency),
}

pub fn decode(raw: &[u8]) -> Result<StaPacket> {
    let (header, _) = read_header(raw)?;
    let payload_start =
        find_payload_start(raw).ok_or_else(|| KavachError::InvalidMarker("A5 C3".into()))?;

    let mut bits = BitCursor::at_bit(raw, payload_start * 8);
    let pkt_type = bits.bits(4)?;

    match pkt_type {
        0b1001 => decode_regular(header, &mut bits),
        0b1011 => decode_access(header, &mut bits),
        0b1100 => decode_emergency(header, &mut bits),
        other => Err(KavachError::InvalidFieldValue(format!(
            "unexpected stationary-kavach inner packet_type {other:#06b}"
        ))),
    }
}

fn decode_regular(header: StaHeader, bits: &mut BitCursor) -> Result<StaPacket> {
    let _pkt_length = bits.bits(10)?;
    let frame_num = bits.bits(17)?;
    let source_stn_id = bits.bits(16)?;
    let source_version = bits.bits(3)?;
    let dest_loco_id = bits.bits(20)?;
    let ref_profile_id = bits.bits(4)?;
    let last_ref_rfid = bits.bits(10)?;
    let dist_pkt_start = bits.signed_bits(15)?;
    let pkt_direction = bits.bits(2)?;
    bits.skip(3)?; // pad

    let mut sub_packets = Vec::new();
    // Sub-packets continue until only the trailing 64 bits (MAC+CRC) remain.
    while bits.remaining() > 64 {
        let sub_start_bit = bits.position();
        let sub_type = match bits.bits(4) {
            Ok(v) => v,
            Err(_) => break,
        };
        let sub_len_bytes = match bits.bits(7) {
            Ok(v) => v,
            Err(_) => break,
        };
        let sub_bits = (sub_len_bytes as usize) * 8;
        let resync_to = sub_start_bit + sub_bits;

        let decoded = match sub_type {
            0b0000 => decode_movement_authority(bits),
            0b0001 => decode_static_speed_profile(bits),
            0b0010 => decode_gradient(bits),
            0b0011 => decode_lc_gate(bits),
            0b0100 => decode_turnout_speed(bits),
            0b0101 => decode_tag_linking(bits, sub_start_bit, sub_bits),
            0b0110 => decode_track_condition(bits),
            0b0111 => decode_tsr(bits),
            other => Ok(SubPacket::Unknown { sub_type: other }),
        };

        if let Ok(sp) = decoded {
            if !matches!(sp, SubPacket::TsrSkipped) {
                sub_packets.push(sp);
            }
        }

        // The declared length is authoritative: resync regardless of what
        // the per-type decoder actually consumed, even on decode failure.
        if resync_to > bits.len() {
            break;
        }
        bits.set_position(resync_to);
    }

    Ok(StaPacket::Regular(StaRegular {
        header,
        frame_num,
        source_stn_id,
        source_version,
        dest_loco_id,
        ref_profile_id,
        last_ref_rfid,
        dist_pkt_start,
        pkt_direction,
        sub_packets,
    }))
}

fn decode_access(header: StaHeader, bits: &mut BitCursor) -> Result<StaPacket> {
    let _pkt_length = bits.bits(7)?;
    let frame_num = bits.bits(17)?;
    let source_stn_id = bits.bits(16)?;
    let source_version = bits.bits(3)?;
    let dest_loco_id = bits.bits(20)?;
    let uplink_freq = bits.bits(12)?;
    let downlink_freq = bits.bits(12)?;
    let tdma = bits.bits(7)?;
    let rnd_rs = bits.bits(16)?;
    let stn_tdma = bits.bits(7)?;
    // mac:32, crc:32 — read but not verified for this family.
    let _ = bits.skip(64);

    Ok(StaPacket::Access(StaAccess {
        header,
        frame_num,
        source_stn_id,
        source_version,
        dest_loco_id,
        uplink_freq,
        downlink_freq,
        tdma,
        rnd_rs,
        stn_tdma,
    }))
}

fn decode_emergency(header: StaHeader, bits: &mut BitCursor) -> Result<StaPacket> {
    let _pkt_length = bits.bits(7)?;
    let frame_num = bits.bits(17)?;
    let source_stn_id = bits.bits(16)?;
    let source_version = bits.bits(3)?;
    let stn_loc = bits.bits(23)?;
    let gen_sos_call = bits.bits(1)?;
    bits.skip(1)?; // pad
    let _crc = bits.bits(32)?;

    Ok(StaPacket::Emergency(StaEmergency {
        header,
        frame_num,
        source_stn_id,
        source_version,
        stn_loc,
        gen_sos_call,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut raw = vec![0xAA, 0xAA, 0x11];
        raw.extend_from_slice(&[0x00, 0x30]); // message_length
        raw.extend_from_slice(&[0x00, 0x01]); // message_sequence
        raw.extend_from_slice(&[0x00, 0x02]); // stationary_kavach_id
        raw.extend_from_slice(&[0x00, 0x03]); // nms_system_id
        raw.push(0x01); // system_version
        raw.extend_from_slice(&[0x01, 0x02, 0x19]); // date
        raw.extend_from_slice(&[0x0A, 0x0B, 0x0C]); // time
        raw.push(0xF2); // active_radio
        raw
    }

    #[test]
    fn test_find_payload_start_with_marker() {
        let mut raw = header_bytes();
        raw.extend_from_slice(&[0x01, 0xA5, 0xC3, 0x99]);
        assert_eq!(find_payload_start(&raw), Some(HEADER_LEN + 3));
    }

    #[test]
    fn test_find_payload_start_bare_c3_fallback() {
        let mut raw = header_bytes();
        raw.extend_from_slice(&[0x01, 0xC3, 0x99]);
        assert_eq!(find_payload_start(&raw), Some(HEADER_LEN + 2));
    }

    #[test]
    fn test_decode_rejects_missing_marker() {
        let raw = header_bytes();
        assert!(matches!(decode(&raw), Err(KavachError::InvalidMarker(_))));
    }

    #[test]
    fn test_emergency_decode_minimal() {
        let mut raw = header_bytes();
        raw.extend_from_slice(&[0xA5, 0xC3]);
        // pkt_type 0b1100 then a generous run of zero bits plus trailing crc
        raw.extend_from_slice(&[0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let result = decode(&raw).unwrap();
        assert!(matches!(result, StaPacket::Emergency(_)));
    }

    #[test]
    fn test_tsr_skipped_when_status_not_two() {
        // tsr_status bits = 01 (not 2) -> TsrSkipped, no panic/entries.
        let mut bits = BitCursor::new(&[0b0100_0000]);
        let sp = decode_tsr(&mut bits).unwrap();
        assert!(matches!(sp, SubPacket::TsrSkipped));
    }

    #[test]
    fn test_gradient_value_validity() {
        // dist:15=0, direction:1=0, value:5=31 (> 30, invalid)
        let mut bits = BitCursor::new(&[0; 3]);
        bits.set_position(0);
        // craft count=1 then an entry with value=31
        // count(5)=00001, dist(15)=0..., direction(1)=0, value(5)=11111
        let buf: [u8; 4] = [0b0000_1000, 0b0000_0000, 0b0000_0001, 0b1111_0000];
        let mut bits = BitCursor::new(&buf);
        let sp = decode_gradient(&mut bits).unwrap();
        if let SubPacket::Gradient(entries) = sp {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].value, 31);
            assert!(!entries[0].valid);
        } else {
            panic!("expected Gradient");
        }
    }

    #[test]
    fn test_regular_round_trip_single_ma_sub_packet() {
        // Regular header (frame_num=5, source_stn_id=7, source_version=1,
        // dest_loco_id=9, ref_profile_id=2, last_ref_rfid=3,
        // dist_pkt_start=10, pkt_direction=1) followed by one MA sub-packet
        // (sub_len_bytes=11) and a zeroed 64-bit MAC+CRC tail.
        let mut raw = header_bytes();
        raw.extend_from_slice(&[0xA5, 0xC3]);
        raw.extend_from_slice(&[
            0x90, 0x00, 0x00, 0x0A, 0x00, 0x0E, 0x40, 0x00, 0x24, 0x80, 0x30, 0x01, 0x48, 0x01,
            0x66, 0x08, 0x29, 0x28, 0x31, 0x00, 0x32, 0x00, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ]);

        let result = decode(&raw).unwrap();
        let reg = match result {
            StaPacket::Regular(r) => r,
            other => panic!("expected Regular, got {other:?}"),
        };
        assert_eq!(reg.frame_num, 5);
        assert_eq!(reg.source_stn_id, 7);
        assert_eq!(reg.source_version, 1);
        assert_eq!(reg.dest_loco_id, 9);
        assert_eq!(reg.ref_profile_id, 2);
        assert_eq!(reg.last_ref_rfid, 3);
        assert_eq!(reg.dist_pkt_start, 10);
        assert_eq!(reg.pkt_direction, 1);
        assert_eq!(reg.sub_packets.len(), 1);
        match &reg.sub_packets[0] {
            SubPacket::MovementAuthority(ma) => {
                assert_eq!(ma.frame_offset, 3);
                assert_eq!(ma.train_section_type, 1);
                assert_eq!(ma.signal_info.sig_type, 5);
                assert_eq!(ma.signal_info.line_name, 2);
                assert_eq!(ma.signal_info.line_no, 10);
                assert_eq!(ma.cur_aspect, 3);
                assert_eq!(ma.next_aspect, 4);
                assert_eq!(ma.appr_sig_dist, 100);
                assert_eq!(ma.authority_type, 0);
                assert_eq!(ma.authorized_speed, None);
                assert_eq!(ma.ma_wrt_sig, 200);
                assert_eq!(ma.new_ma, None);
            }
            other => panic!("expected MovementAuthority, got {other:?}"),
        }
    }

    #[test]
    fn test_regular_resync_survives_past_first_sub_packet() {
        // Same frame as above plus a second, unknown-type sub-packet
        // (sub_type=0b1111, sub_len_bytes=3) before the MAC+CRC tail. If the
        // resync stride overshoots (the old `sub_start_bit + 11 + sub_bits`
        // bug), the second sub-packet's header is read out of alignment and
        // this does not come back as `Unknown { sub_type: 0b1111 }`.
        let mut raw = header_bytes();
        raw.extend_from_slice(&[0xA5, 0xC3]);
        raw.extend_from_slice(&[
            0x90, 0x00, 0x00, 0x0A, 0x00, 0x0E, 0x40, 0x00, 0x24, 0x80, 0x30, 0x01, 0x48, 0x01,
            0x66, 0x08, 0x29, 0x28, 0x31, 0x00, 0x32, 0x00, 0x19, 0x00, 0xF0, 0x60, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);

        let result = decode(&raw).unwrap();
        let reg = match result {
            StaPacket::Regular(r) => r,
            other => panic!("expected Regular, got {other:?}"),
        };
        assert_eq!(reg.sub_packets.len(), 2);
        assert!(matches!(reg.sub_packets[0], SubPacket::MovementAuthority(_)));
        assert!(matches!(reg.sub_packets[1], SubPacket::Unknown { sub_type: 0b1111 }));
    }
}
