// Adapters for the ports in app::ports

pub mod csv_export;
pub mod elevation;
pub mod http_client;
pub mod osm_api;
pub mod overpass;

pub use csv_export::CsvExporter;
pub use elevation::{provider_for, OpenElevationProvider, OpenTopoDataProvider};
pub use http_client::{HttpClient, RetryPolicy};
pub use osm_api::OsmApiClient;
pub use overpass::OverpassQueryService;
