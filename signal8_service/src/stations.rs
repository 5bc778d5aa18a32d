//! Reference station registry for Signal 8 corroboration.
//!
//! Defines the canonical list of Hong Kong Observatory automatic weather
//! stations whose 10-minute mean winds are used as ground truth. This is the
//! single source of truth for station identity and ordering: every interval
//! in a timeline carries exactly these stations, in exactly this order.

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single reference station.
#[derive(Debug)]
pub struct ReferenceStation {
    /// URL-safe slug used in published payloads.
    pub station_id: &'static str,
    /// Name as it appears in the "Automatic Weather Station" CSV column.
    pub csv_name: &'static str,
    pub name_en: &'static str,
    pub name_zh: &'static str,
}

/// The eight reference stations, in canonical order.
///
/// Order matters: it fixes the station layout of every interval and breaks
/// ties when two stations share the event's peak mean wind.
pub static REFERENCE_STATIONS: &[ReferenceStation] = &[
    ReferenceStation {
        station_id: "cheung-chau",
        csv_name: "Cheung Chau",
        name_en: "Cheung Chau",
        name_zh: "長洲",
    },
    ReferenceStation {
        station_id: "chek-lap-kok",
        csv_name: "Chek Lap Kok",
        name_en: "Chek Lap Kok",
        name_zh: "赤鱲角",
    },
    ReferenceStation {
        station_id: "kai-tak",
        csv_name: "Kai Tak",
        name_en: "Kai Tak",
        name_zh: "啟德",
    },
    ReferenceStation {
        station_id: "lau-fau-shan",
        csv_name: "Lau Fau Shan",
        name_en: "Lau Fau Shan",
        name_zh: "流浮山",
    },
    ReferenceStation {
        station_id: "sai-kung",
        csv_name: "Sai Kung",
        name_en: "Sai Kung",
        name_zh: "西貢",
    },
    ReferenceStation {
        station_id: "sha-tin",
        csv_name: "Sha Tin",
        name_en: "Sha Tin",
        name_zh: "沙田",
    },
    ReferenceStation {
        station_id: "ta-kwu-ling",
        csv_name: "Ta Kwu Ling",
        name_en: "Ta Kwu Ling",
        name_zh: "打鼓嶺",
    },
    ReferenceStation {
        station_id: "tsing-yi",
        csv_name: "Tsing Yi",
        name_en: "Tsing Yi",
        name_zh: "青衣",
    },
];

/// Size of the reference network.
pub const REFERENCE_STATION_COUNT: usize = 8;

/// Looks up a station by its CSV name. Returns `None` for any station
/// outside the reference network.
pub fn find_by_csv_name(csv_name: &str) -> Option<&'static ReferenceStation> {
    REFERENCE_STATIONS.iter().find(|s| s.csv_name == csv_name)
}

pub fn is_reference_station(csv_name: &str) -> bool {
    find_by_csv_name(csv_name).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
