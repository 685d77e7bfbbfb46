//! Per-station relay table — maps a bit/relay index to its name for a given
//! station, and classifies `_TPR` (Track Proving Relay) suffix polarity.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayInfo {
    pub index: usize,
    pub name: String,
    pub addr: u16,
}

impl RelayInfo {
    pub fn is_tpr(&self) -> bool {
        self.name.ends_with("_TPR")
    }
}

/// Logical status after polarity resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelayStatus {
    PickedUp,
    DropDown,
}

impl RelayStatus {
    /// 0x15 periodic bitmap polarity: TPR relays invert (0 → PickedUp,
    /// 1 → DropDown); all others are direct (1 → PickedUp, 0 → DropDown).
    pub fn from_bitmap_bit(bit: u8, is_tpr: bool) -> RelayStatus {
        match (is_tpr, bit) {
            (true, 0) => RelayStatus::PickedUp,
            (true, _) => RelayStatus::DropDown,
            (false, 1) => RelayStatus::PickedUp,
            (false, _) => RelayStatus::DropDown,
        }
    }

    /// 0x16 event-driven status byte polarity — deliberately the mirror
    /// image of [`from_bitmap_bit`]: TPR `01 → DropDown` else `PickedUp`;
    /// non-TPR `01 → PickedUp` else `DropDown`. This asymmetry is preserved
    /// verbatim, not a bug.
    pub fn from_event_status(status: u8, is_tpr: bool) -> RelayStatus {
        match (is_tpr, status) {
            (true, 0x01) => RelayStatus::DropDown,
            (true, _) => RelayStatus::PickedUp,
            (false, 0x01) => RelayStatus::PickedUp,
            (false, _) => RelayStatus::DropDown,
        }
    }
}

/// Read-only relay table for one station.
pub struct RelayTable {
    relays: Vec<RelayInfo>,
}

impl RelayTable {
    pub fn new(relays: Vec<RelayInfo>) -> Self {
        RelayTable { relays }
    }

    /// A small built-in table used when no station-specific table has been
    /// loaded — enough relays to exercise the periodic bitmap and the
    /// event-driven path in isolation.
    pub fn builtin_default() -> Self {
        RelayTable::new(vec![
            RelayInfo { index: 0, name: "HR_TPR".into(), addr: 0x0001 },
            RelayInfo { index: 1, name: "LX_BPR".into(), addr: 0x0002 },
            RelayInfo { index: 2, name: "UQ_TPR".into(), addr: 0x0003 },
            RelayInfo { index: 3, name: "TC_BPR".into(), addr: 0x0004 },
        ])
    }

    pub fn by_index(&self, index: usize) -> Option<&RelayInfo> {
        self.relays.get(index)
    }

    pub fn by_addr(&self, addr: u16) -> Option<&RelayInfo> {
        self.relays.iter().find(|r| r.addr == addr)
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }
}
