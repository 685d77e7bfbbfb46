//! Record assembly — normalizes decoder output into a single flat,
//! tagged-variant record with common metadata plus unit-scaled,
//! packet-specific fields (§9 dynamic-property records design note).

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::fault::FaultPacket;
use crate::health::HealthPacket;
use crate::interlocking::{EventReport, PeriodicReport};
use crate::pos::{decode_speed_class, PosAccessRequest, PosRegular, SpeedValue};
use crate::stationary::{StaAccess, StaEmergency, StaRegular};
use crate::types::{DataSource, Sof};

#[derive(Debug, Clone, Serialize)]
pub struct CommonMeta {
    pub event_time: NaiveDateTime,
    pub data_source: DataSource,
    pub sof: Sof,
    pub packet_type: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "recordType")]
pub enum Record {
    PosRegular {
        #[serde(flatten)]
        meta: CommonMeta,
        frame_number: u32,
        source_loco_id: u32,
        absolute_loco_location: u32,
        train_speed_kmh: SpeedValue,
        movement_dir: String,
        loco_mode: u32,
    },
    PosAccess {
        #[serde(flatten)]
        meta: CommonMeta,
        frame_number: u32,
        source_loco_id: u32,
        approaching_station_id: u32,
        longitude: u32,
        latitude: u32,
    },
    StaRegular {
        #[serde(flatten)]
        meta: CommonMeta,
        frame_num: u32,
        source_stn_id: u32,
        dest_loco_id: u32,
        sub_packet_count: usize,
    },
    StaAccess {
        #[serde(flatten)]
        meta: CommonMeta,
        frame_num: u32,
        source_stn_id: u32,
        dest_loco_id: u32,
    },
    StaEmergency {
        #[serde(flatten)]
        meta: CommonMeta,
        frame_num: u32,
        source_stn_id: u32,
        gen_sos_call: bool,
    },
    InterlockingPeriodic {
        #[serde(flatten)]
        meta: CommonMeta,
        station_id: u16,
        frame_number: u32,
        relay_count: usize,
    },
    InterlockingEvent {
        #[serde(flatten)]
        meta: CommonMeta,
        station_id: u16,
        frame_number: u32,
        event_count: usize,
    },
    Fault {
        #[serde(flatten)]
        meta: CommonMeta,
        fault_origin: String,
        module_id: u8,
        fault_type: String,
        fault_code: String,
    },
    Health {
        #[serde(flatten)]
        meta: CommonMeta,
        stationary_kavach_id: u16,
        event_count: usize,
    },
}

fn base(event_time: NaiveDateTime, data_source: DataSource, sof: Sof, packet_type: u8) -> CommonMeta {
    CommonMeta { event_time, data_source, sof, packet_type }
}

pub fn from_pos_regular(p: &PosRegular, data_source: DataSource, sof: Sof) -> Record {
    Record::PosRegular {
        meta: base(p.header.event_time, data_source, sof, 0x12),
        frame_number: p.frame_number,
        source_loco_id: p.source_loco_id,
        absolute_loco_location: p.absolute_loco_location,
        train_speed_kmh: decode_speed_class(p.train_speed.min(63)),
        movement_dir: format!("{:?}", p.movement_dir),
        loco_mode: p.loco_mode,
    }
}

pub fn from_pos_access(p: &PosAccessRequest, data_source: DataSource, sof: Sof) -> Record {
    Record::PosAccess {
        meta: base(p.header.event_time, data_source, sof, 0x12),
        frame_number: p.frame_number,
        source_loco_id: p.source_loco_id,
        approaching_station_id: p.approaching_station_id,
        longitude: p.longitude,
        latitude: p.latitude,
    }
}

pub fn from_sta_regular(p: &StaRegular, data_source: DataSource, sof: Sof) -> Record {
    Record::StaRegular {
        meta: base(p.header.event_time, data_source, sof, 0x11),
        frame_num: p.frame_num,
        source_stn_id: p.source_stn_id,
        dest_loco_id: p.dest_loco_id,
        sub_packet_count: p.sub_packets.len(),
    }
}

pub fn from_sta_access(p: &StaAccess, data_source: DataSource, sof: Sof) -> Record {
    Record::StaAccess {
        meta: base(p.header.event_time, data_source, sof, 0x11),
        frame_num: p.frame_num,
        source_stn_id: p.source_stn_id,
        dest_loco_id: p.dest_loco_id,
    }
}

pub fn from_sta_emergency(p: &StaEmergency, data_source: DataSource, sof: Sof) -> Record {
    Record::StaEmergency {
        meta: base(p.header.event_time, data_source, sof, 0x11),
        frame_num: p.frame_num,
        source_stn_id: p.source_stn_id,
        gen_sos_call: p.gen_sos_call != 0,
    }
}

pub fn from_periodic(p: &PeriodicReport, data_source: DataSource, sof: Sof) -> Record {
    Record::InterlockingPeriodic {
        meta: base(p.header.event_time, data_source, sof, 0x15),
        station_id: p.header.station_id,
        frame_number: p.header.frame_number,
        relay_count: p.relays.len(),
    }
}

pub fn from_event(p: &EventReport, data_source: DataSource, sof: Sof) -> Record {
    Record::InterlockingEvent {
        meta: base(p.header.event_time, data_source, sof, 0x16),
        station_id: p.header.station_id,
        frame_number: p.header.frame_number,
        event_count: p.events.len(),
    }
}

/// One record per fault item, inheriting the packet header timestamp/ids.
pub fn from_fault(p: &FaultPacket, data_source: DataSource, sof: Sof) -> Vec<Record> {
    p.items
        .iter()
        .map(|item| Record::Fault {
            meta: base(p.header.event_time, data_source, sof, 0x19),
            fault_origin: p.header.subsystem_type.label().to_string(),
            module_id: item.module_id,
            fault_type: format!("{:02}", item.fault_type.code()),
            fault_code: format!("{:04X}", item.fault_code),
        })
        .collect()
}

pub fn from_health(p: &HealthPacket, data_source: DataSource, sof: Sof, packet_type: u8) -> Record {
    Record::Health {
        meta: base(p.header.event_time, data_source, sof, packet_type),
        stationary_kavach_id: p.header.stationary_kavach_id,
        event_count: p.events.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::make_datetime;

    #[test]
    fn test_fault_record_fan_out_matches_item_count() {
        use crate::fault::{FaultHeader, FaultItem};
        use crate::types::{FaultKind, FaultOrigin};

        let header = FaultHeader {
            message_length: 0,
            message_sequence: 0,
            kavach_subsystem_id: 1,
            nms_system_id: 2,
            system_version: 1,
            event_time: make_datetime(1, 2, 25, 10, 11, 12).unwrap(),
            subsystem_type: FaultOrigin::Loco,
        };
        let pkt = FaultPacket {
            header,
            items: vec![
                FaultItem { module_id: 1, fault_type: FaultKind::Fault, fault_code: 0x10 },
                FaultItem { module_id: 2, fault_type: FaultKind::Recovery, fault_code: 0x20 },
            ],
        };
        let records = from_fault(&pkt, DataSource::Bin, Sof::Wireline);
        assert_eq!(records.len(), 2);
        match &records[0] {
            Record::Fault { fault_origin, fault_type, .. } => {
                assert_eq!(fault_origin, "LOCO");
                assert_eq!(fault_type, "01");
            }
            other => panic!("expected Record::Fault, got {other:?}"),
        }
        match &records[1] {
            Record::Fault { fault_type, .. } => assert_eq!(fault_type, "02"),
            other => panic!("expected Record::Fault, got {other:?}"),
        }
    }
}
