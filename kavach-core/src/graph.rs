//! Graph meta/data — distinct loco/date/direction sets and (x,y) projections
//! over 0x12-Regular packets for the four graph types.
//!
//! Preserves an intentional asymmetry from the source: the loco set takes
//! only the first valid loco observed per file, while the date and
//! direction sets accumulate across every packet in every file (§4.9, §9).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::pos::{is_loco_id_sentinel, MovementDir, PosRegular};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum GraphDirection {
    Nominal,
    Reverse,
    Unidentified,
}

impl From<MovementDir> for GraphDirection {
    fn from(d: MovementDir) -> Self {
        match d {
            MovementDir::Nominal => GraphDirection::Nominal,
            MovementDir::Reverse => GraphDirection::Reverse,
            MovementDir::Unidentified => GraphDirection::Unidentified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphMeta {
    pub loco_ids: Vec<u32>,
    pub dates: Vec<NaiveDate>,
    pub directions: Vec<GraphDirection>,
}

/// Accumulates meta sets while scanning files in order. Call
/// [`GraphMetaBuilder::visit_file`] once per file with that file's decoded
/// Regular packets (in in-file byte order).
#[derive(Default)]
pub struct GraphMetaBuilder {
    loco_ids: BTreeSet<u32>,
    dates: BTreeSet<NaiveDate>,
    directions: BTreeSet<GraphDirection>,
}

impl GraphMetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit_file(&mut self, file_date: NaiveDate, packets: &[PosRegular]) {
        let mut first_valid_loco: Option<u32> = None;
        for p in packets {
            self.dates.insert(file_date);
            self.directions.insert(GraphDirection::from(p.movement_dir));
            if first_valid_loco.is_none() && !is_loco_id_sentinel(p.source_loco_id) {
                first_valid_loco = Some(p.source_loco_id);
            }
        }
        if let Some(loco_id) = first_valid_loco {
            self.loco_ids.insert(loco_id);
        }
    }

    pub fn finish(self) -> GraphMeta {
        GraphMeta {
            loco_ids: self.loco_ids.into_iter().collect(),
            dates: self.dates.into_iter().collect(),
            directions: self.directions.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GraphType {
    LocationSpeed,
    LocationMode,
    TimeSpeed,
    TimeMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphPoint {
    pub x: u32,
    pub y: u32,
}

/// Project `(x, y)` pairs for one graph type from a set of Regular packets
/// already filtered by loco id / date range / direction.
pub fn project(packets: &[PosRegular], graph_type: GraphType) -> Vec<GraphPoint> {
    packets
        .iter()
        .filter(|p| !is_loco_id_sentinel(p.source_loco_id))
        .map(|p| {
            let (x, y) = match graph_type {
                GraphType::LocationSpeed => (p.absolute_loco_location, p.train_speed),
                GraphType::LocationMode => (p.absolute_loco_location, p.loco_mode),
                GraphType::TimeSpeed => (p.frame_number, p.train_speed),
                GraphType::TimeMode => (p.frame_number, p.loco_mode),
            };
            GraphPoint { x, y }
        })
        .collect()
}
