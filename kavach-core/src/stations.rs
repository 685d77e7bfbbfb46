//! Station master table — a process-wide, read-only lookup, initialized
//! once at startup (§5). Seeded from the Areca/SFM corridor station list.

use serde::Serialize;

/// One row of the station master list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StationInfo {
    pub station_id: u32,
    pub station_name: &'static str,
    pub station_code: &'static str,
    pub firm: &'static str,
}

/// Built-in seed table, reproduced from the station master data source.
pub const BUILTIN_STATIONS: &[StationInfo] = &[
    StationInfo { station_id: 1037, station_name: "SECUNDERABAD", station_code: "SFM", firm: "Areca" },
    StationInfo { station_id: 1038, station_name: "SITAFALMANDI(SFM)", station_code: "FAL", firm: "Areca" },
    StationInfo { station_id: 1039, station_name: "KACHEGUDA", station_code: "BUD", firm: "Areca" },
    StationInfo { station_id: 1040, station_name: "FALAKNUMA", station_code: "TMX-SHNR", firm: "Areca" },
    StationInfo { station_id: 1041, station_name: "BUDVEL", station_code: "BDL", firm: "Areca" },
    StationInfo { station_id: 1042, station_name: "UMDANAGAR", station_code: "UMD", firm: "Areca" },
    StationInfo { station_id: 1072, station_name: "JUKAL", station_code: "JUL", firm: "Areca" },
    StationInfo { station_id: 1044, station_name: "TIMMAPUR", station_code: "TIM", firm: "Areca" },
    StationInfo { station_id: 1073, station_name: "LC23A (TMX-SHNR)", station_code: "TMX-SHNR", firm: "Areca" },
    StationInfo { station_id: 1045, station_name: "SHADNAGAR", station_code: "SHAD", firm: "Areca" },
    StationInfo { station_id: 1047, station_name: "BALANAGAR", station_code: "BLN", firm: "Areca" },
    StationInfo { station_id: 1048, station_name: "LC39(BABR-GLY)", station_code: "BABR-GLY", firm: "Areca" },
    StationInfo { station_id: 1049, station_name: "GOLLAPALLI", station_code: "GOLPAL", firm: "Areca" },
    StationInfo { station_id: 1050, station_name: "JADCHERLA", station_code: "JADCHERLA", firm: "Areca" },
    StationInfo { station_id: 1051, station_name: "DIVITPALLI", station_code: "DIVI", firm: "Areca" },
    StationInfo { station_id: 1052, station_name: "MAHBUBNAGAR", station_code: "MAHNAGAR", firm: "Areca" },
    StationInfo { station_id: 1054, station_name: "MANYAMKONDA", station_code: "MANYAM", firm: "Areca" },
    StationInfo { station_id: 1055, station_name: "DEVARAKADRA JN", station_code: "DEVARKAD", firm: "Areca" },
    StationInfo { station_id: 1056, station_name: "KAUKUNTLA", station_code: "KAUKUN", firm: "Areca" },
    StationInfo { station_id: 1057, station_name: "WANAPARTHI ROAD", station_code: "WANAP", firm: "Areca" },
    StationInfo { station_id: 601, station_name: "ARECA A(ARC AMSA)", station_code: "ARC_AMSA", firm: "Areca" },
    StationInfo { station_id: 602, station_name: "ARECA B(ARC AMSB)", station_code: "ARC_AMSB", firm: "Areca" },
];

/// Read-only station master table, handed to decoders/driver that need to
/// resolve a `station_id` or `station_code`.
pub struct StationTable {
    rows: &'static [StationInfo],
}

impl StationTable {
    pub fn builtin() -> Self {
        StationTable { rows: BUILTIN_STATIONS }
    }

    pub fn by_id(&self, station_id: u32) -> Option<&'static StationInfo> {
        self.rows.iter().find(|s| s.station_id == station_id)
    }

    pub fn by_code(&self, code: &str) -> Option<&'static StationInfo> {
        self.rows.iter().find(|s| s.station_code.eq_ignore_ascii_case(code))
    }

    pub fn all(&self) -> &'static [StationInfo] {
        self.rows
    }
}

impl Default for StationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let t = StationTable::builtin();
        let s = t.by_id(1037).unwrap();
        assert_eq!(s.station_code, "SFM");
    }

    #[test]
    fn test_lookup_by_code_case_insensitive() {
        let t = StationTable::builtin();
        assert_eq!(t.by_code("sfm").unwrap().station_id, 1037);
    }

    #[test]
    fn test_lookup_unknown() {
        let t = StationTable::builtin();
        assert!(t.by_id(999999).is_none());
        assert!(t.by_code("NOPE").is_none());
    }
}
