/// Tag keys and values shared across the pipeline stages.
/// These constants keep the OSM vocabulary in one place.

// Tags written by the enricher
pub const ELE_TAG: &str = "ele";
pub const ELE_SOURCE_TAG: &str = "ele:source";
pub const ELE_SOURCE_SRTM: &str = "SRTM";

// Tags read by the filter and the exporter
pub const NAME_TAG: &str = "name";
pub const REF_TAG: &str = "ref";
pub const TOURISM_TAG: &str = "tourism";
pub const RAILWAY_TAG: &str = "railway";

pub const ALPINE_HUT: &str = "alpine_hut";
pub const RAILWAY_TYPES: [&str; 2] = ["station", "halt"];
pub const ACCOMMODATION_TYPES: [&str; 6] = [
    "hotel",
    "guest_house",
    "alpine_hut",
    "chalet",
    "hostel",
    "motel",
];

// Upstream endpoints
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_OPENTOPO_URL: &str = "https://api.opentopodata.org/v1/srtm30m";
pub const DEFAULT_OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";
pub const DEFAULT_OSM_API_URL: &str = "https://api.openstreetmap.org/api/0.6";
pub const OSM_WEB_URL: &str = "https://www.openstreetmap.org";

pub const DEFAULT_AREA_NAME: &str = "România";
pub const DEFAULT_ADMIN_LEVEL: u8 = 2;

pub const DEFAULT_CHANGESET_COMMENT: &str = "Add elevation data";
pub const CREATED_BY: &str = "osm-elevation";
pub const USER_AGENT: &str = "osm-elevation/0.1";

// Plausibility band: Black Sea coast to a margin above Moldoveanu (2544 m)
pub const DEFAULT_MIN_ELEVATION: f64 = 0.0;
pub const DEFAULT_MAX_ELEVATION: f64 = 2600.0;
pub const DEFAULT_INVALID_EXAMPLE_LIMIT: usize = 3;

pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;
pub const DEFAULT_QUERY_PAUSE_MS: u64 = 2000;
pub const PROGRESS_INTERVAL: usize = 10;

// Snapshot and report files under the output directory
pub const RAW_SNAPSHOT_FILE: &str = "osm_data_raw.json";
pub const FILTERED_SNAPSHOT_FILE: &str = "osm_data_filtered.json";
pub const ENRICHED_SNAPSHOT_FILE: &str = "osm_data_enriched.json";
pub const VALIDATED_SNAPSHOT_FILE: &str = "osm_data_validated.json";
pub const UPLOAD_REPORT_FILE: &str = "osm_data_upload_report.json";
pub const DEFAULT_CSV_FILE: &str = "elevation_data.csv";
